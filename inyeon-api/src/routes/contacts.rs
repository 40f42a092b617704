/// Contact ("내 사람") endpoints
///
/// Every query is filtered by the caller's user id, so another user's contact
/// id behaves exactly like a missing one (404).
///
/// # Endpoints
///
/// - `GET    /v1/contacts` - all contacts, by name
/// - `GET    /v1/contacts/pinned` - pinned contacts, by name
/// - `GET    /v1/contacts/regular?page=&limit=` - unpinned page, by name
/// - `POST   /v1/contacts` - create from a contact form
/// - `GET    /v1/contacts/:id` - contact with its plans
/// - `PUT    /v1/contacts/:id` - replace from a contact form
/// - `PATCH  /v1/contacts/:id/pin` - `{ "is_pinned": bool }`
/// - `DELETE /v1/contacts/:id`

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use inyeon_shared::{
    auth::middleware::AuthContext,
    models::contact::{Contact, ContactItem, ContactWithPlans, RegularPage, DEFAULT_PAGE_LIMIT},
    validation::contact::ContactForm,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Upper bound for `limit`
const MAX_PAGE_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_LIMIT
}

impl PageQuery {
    /// Clamps `page` and `limit`; a page whose row offset overflows is a 400
    fn normalized(self) -> ApiResult<(i64, i64)> {
        let page = self.page.max(0);
        let limit = self.limit.clamp(1, MAX_PAGE_LIMIT);

        if RegularPage::offset(page, limit).is_none() {
            return Err(ApiError::BadRequest("page is out of range".to_string()));
        }
        Ok((page, limit))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PinRequest {
    pub is_pinned: bool,
}

fn not_found() -> ApiError {
    ApiError::NotFound("Contact not found".to_string())
}

pub async fn list_contacts(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Contact>>> {
    Ok(Json(Contact::list_by_user(&state.db, auth.user_id).await?))
}

pub async fn list_pinned(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<ContactItem>>> {
    Ok(Json(Contact::list_pinned(&state.db, auth.user_id).await?))
}

/// `next_page` is set iff the page came back full
pub async fn list_regular(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<RegularPage>> {
    let (page, limit) = query.normalized()?;
    Ok(Json(Contact::list_regular(&state.db, auth.user_id, page, limit).await?))
}

pub async fn get_contact(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(contacts_id): Path<Uuid>,
) -> ApiResult<Json<ContactWithPlans>> {
    let contact = Contact::find_with_plans(&state.db, contacts_id, auth.user_id)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(contact))
}

pub async fn create_contact(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(form): Json<ContactForm>,
) -> ApiResult<(StatusCode, Json<Contact>)> {
    let input = form.to_input().map_err(ApiError::from_field_errors)?;
    let contact = Contact::create(&state.db, auth.user_id, input).await?;

    tracing::info!(user_id = %auth.user_id, contacts_id = %contact.contacts_id, "Contact created");
    Ok((StatusCode::CREATED, Json(contact)))
}

pub async fn update_contact(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(contacts_id): Path<Uuid>,
    Json(form): Json<ContactForm>,
) -> ApiResult<Json<Contact>> {
    let input = form.to_input().map_err(ApiError::from_field_errors)?;
    let contact = Contact::update(&state.db, contacts_id, auth.user_id, input)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(contact))
}

pub async fn pin_contact(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(contacts_id): Path<Uuid>,
    Json(req): Json<PinRequest>,
) -> ApiResult<Json<Contact>> {
    let contact = Contact::set_pinned(&state.db, contacts_id, auth.user_id, req.is_pinned)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(contact))
}

/// Plans linked to the contact keep existing with `contacts_id` cleared
pub async fn delete_contact(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(contacts_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !Contact::delete(&state.db, contacts_id, auth.user_id).await? {
        return Err(not_found());
    }

    tracing::info!(user_id = %auth.user_id, contacts_id = %contacts_id, "Contact deleted");
    Ok(StatusCode::NO_CONTENT)
}
