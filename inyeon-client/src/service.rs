/// Backend operations
///
/// One method per API route. Each method has a fixed failure message: when
/// the request fails or the server answers with an error, the failure is
/// logged and returned as [`ServiceError::Failed`] carrying that message.
/// Rejections the server words itself (bad credentials, duplicates, expired
/// session) come back as [`ServiceError::Rejected`], and 422 bodies as
/// per-field [`ServiceError::Invalid`].
///
/// No batching. A signed-in call answered with 401 exchanges the refresh
/// token once and is retried with the new access token; the new pair is
/// published as [`AuthEvent::TokenRefreshed`] so the auth store persists it.
///
/// # Example
///
/// ```no_run
/// use inyeon_client::{config::ClientConfig, service::ApiService};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(ClientConfig::new("http://localhost:8080", "local-storage.json"));
/// let api = ApiService::new(config)?;
///
/// api.sign_in("a@b.com", "Abcdef1!").await?;
/// let pinned = api.fetch_pinned_contacts().await?;
/// println!("{} pinned", pinned.len());
/// # Ok(())
/// # }
/// ```

use crate::{
    config::ClientConfig,
    error::{ServiceError, ServiceResult},
    session::events::{AuthEvent, AuthEvents},
};
use inyeon_shared::{
    auth::jwt::Session,
    calendar::YearMonth,
    messages,
    models::{
        contact::{Contact, ContactItem, ContactWithPlans, RegularPage, DEFAULT_PAGE_LIMIT},
        place::{Place, PlaceSearchResponse},
        plan::{Plan, PlanDates, PlanDetail},
        user::{AuthProvider, UserProfile},
    },
    validation::{
        contact::ContactForm,
        plan::PlanForm,
        signin::{ChangePasswordForm, SignInForm},
        signup::SignUpForm,
        FieldErrors,
    },
};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Body of every successful sign-in style call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub session: Session,
}

/// Result of a uniqueness check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateCheck {
    pub exists: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct AuthorizeResponse {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    field: String,
    message: String,
}

/// Maps an error response to a domain error
fn rejection(status: StatusCode, body: Option<ErrorBody>, failure: &'static str) -> ServiceError {
    match body {
        Some(body) if status == StatusCode::UNPROCESSABLE_ENTITY && !body.details.is_empty() => {
            let errors: FieldErrors = body
                .details
                .into_iter()
                .map(|detail| (detail.field, detail.message))
                .collect();
            ServiceError::Invalid(errors)
        }
        Some(body)
            if !body.message.is_empty()
                && matches!(
                    status,
                    StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::CONFLICT
                ) =>
        {
            ServiceError::Rejected {
                status: status.as_u16(),
                message: body.message,
            }
        }
        _ => ServiceError::Failed(failure),
    }
}

/// HTTP client for the Inyeon API
#[derive(Clone)]
pub struct ApiService {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
    session: Arc<RwLock<Option<Session>>>,
    events: Option<AuthEvents>,
}

impl ApiService {
    pub fn new(config: Arc<ClientConfig>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            config,
            session: Arc::new(RwLock::new(None)),
            events: None,
        })
    }

    /// Publishes refreshed tokens on `events`
    pub fn with_events(mut self, events: AuthEvents) -> Self {
        self.events = Some(events);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    /// Installs tokens restored from storage or received from a sign-in
    pub async fn set_session(&self, session: Option<Session>) {
        *self.session.write().await = session;
    }

    fn url(&self, path: &str) -> String {
        self.config.endpoint(path)
    }

    async fn authorized(&self, builder: RequestBuilder) -> ServiceResult<RequestBuilder> {
        match self.session.read().await.as_ref() {
            Some(session) => Ok(builder.bearer_auth(&session.access_token)),
            None => Err(ServiceError::NotSignedIn),
        }
    }

    async fn send(
        &self,
        builder: RequestBuilder,
        operation: &'static str,
        failure: &'static str,
    ) -> ServiceResult<Response> {
        let response = builder.send().await.map_err(|e| {
            tracing::error!(operation, "Request failed: {}", e);
            ServiceError::Failed(failure)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.json::<ErrorBody>().await.ok();
        tracing::error!(
            operation,
            status = status.as_u16(),
            message = body.as_ref().map(|b| b.message.as_str()).unwrap_or_default(),
            "Backend rejected request"
        );

        Err(rejection(status, body, failure))
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        operation: &'static str,
        failure: &'static str,
    ) -> ServiceResult<T> {
        let response = self.send(builder, operation, failure).await?;
        response.json::<T>().await.map_err(|e| {
            tracing::error!(operation, "Unexpected response body: {}", e);
            ServiceError::Failed(failure)
        })
    }

    /// Sends with the bearer token; on 401 refreshes once and resends
    async fn send_with_refresh(
        &self,
        builder: RequestBuilder,
        operation: &'static str,
        failure: &'static str,
    ) -> ServiceResult<Response> {
        let retry = builder.try_clone();
        let first = self
            .send(self.authorized(builder).await?, operation, failure)
            .await;

        match (first, retry) {
            (Err(e), Some(retry)) if e.is_unauthorized() => {
                if let Err(refresh_error) = self.refresh_session().await {
                    tracing::warn!(operation, "Session refresh failed: {}", refresh_error);
                    return Err(e);
                }
                tracing::debug!(operation, "Retrying with refreshed session");
                self.send(self.authorized(retry).await?, operation, failure)
                    .await
            }
            (result, _) => result,
        }
    }

    async fn fetch_authorized<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        operation: &'static str,
        failure: &'static str,
    ) -> ServiceResult<T> {
        let response = self.send_with_refresh(builder, operation, failure).await?;
        response.json::<T>().await.map_err(|e| {
            tracing::error!(operation, "Unexpected response body: {}", e);
            ServiceError::Failed(failure)
        })
    }

    async fn send_authorized(
        &self,
        builder: RequestBuilder,
        operation: &'static str,
        failure: &'static str,
    ) -> ServiceResult<()> {
        self.send_with_refresh(builder, operation, failure)
            .await
            .map(|_| ())
    }

    // Contacts

    /// All of the user's contacts, by name
    pub async fn get_contacts(&self) -> ServiceResult<Vec<Contact>> {
        let request = self.http.get(self.url("/contacts"));
        self.fetch_authorized(request, "get_contacts", messages::FETCH_CONTACTS_FAILED)
            .await
    }

    pub async fn get_contact_with_plans(&self, contacts_id: Uuid) -> ServiceResult<ContactWithPlans> {
        let request = self.http.get(self.url(&format!("/contacts/{}", contacts_id)));
        self.fetch_authorized(request, "get_contact_with_plans", messages::FETCH_CONTACT_DETAIL_FAILED)
            .await
    }

    pub async fn fetch_pinned_contacts(&self) -> ServiceResult<Vec<ContactItem>> {
        let request = self.http.get(self.url("/contacts/pinned"));
        self.fetch_authorized(request, "fetch_pinned_contacts", messages::FETCH_PINNED_FAILED)
            .await
    }

    /// One page of unpinned contacts; `next_page` is set iff the page is full
    pub async fn fetch_regular_contacts(&self, page: i64) -> ServiceResult<RegularPage> {
        let request = self
            .http
            .get(self.url("/contacts/regular"))
            .query(&[("page", page), ("limit", DEFAULT_PAGE_LIMIT)]);
        self.fetch_authorized(request, "fetch_regular_contacts", messages::FETCH_CONTACTS_FAILED)
            .await
    }

    pub async fn insert_contact(&self, form: &ContactForm) -> ServiceResult<Contact> {
        let request = self.http.post(self.url("/contacts")).json(form);
        self.fetch_authorized(request, "insert_contact", messages::INSERT_CONTACT_FAILED)
            .await
    }

    pub async fn update_contact(&self, contacts_id: Uuid, form: &ContactForm) -> ServiceResult<Contact> {
        let request = self
            .http
            .put(self.url(&format!("/contacts/{}", contacts_id)))
            .json(form);
        self.fetch_authorized(request, "update_contact", messages::UPDATE_CONTACT_FAILED)
            .await
    }

    pub async fn update_contact_pin(&self, contacts_id: Uuid, is_pinned: bool) -> ServiceResult<Contact> {
        let request = self
            .http
            .patch(self.url(&format!("/contacts/{}/pin", contacts_id)))
            .json(&json!({ "is_pinned": is_pinned }));
        self.fetch_authorized(request, "update_contact_pin", messages::PIN_CONTACT_FAILED)
            .await
    }

    pub async fn delete_contact(&self, contacts_id: Uuid) -> ServiceResult<()> {
        let request = self.http.delete(self.url(&format!("/contacts/{}", contacts_id)));
        self.send_authorized(request, "delete_contact", messages::DELETE_CONTACT_FAILED)
            .await
    }

    // Plans

    /// Plans overlapping the month in the configured calendar offset
    pub async fn get_monthly_plans(&self, month: YearMonth) -> ServiceResult<Vec<Plan>> {
        let request = self.http.get(self.url("/plans")).query(&[
            ("year", month.year),
            ("month", month.month as i32),
            ("offset_minutes", self.config.utc_offset_minutes),
        ]);
        self.fetch_authorized(request, "get_monthly_plans", messages::FETCH_CALENDAR_FAILED)
            .await
    }

    pub async fn get_upcoming_plans(&self) -> ServiceResult<Vec<PlanDetail>> {
        let request = self
            .http
            .get(self.url("/plans/upcoming"))
            .query(&[("offset_minutes", self.config.utc_offset_minutes)]);
        self.fetch_authorized(request, "get_upcoming_plans", messages::FETCH_PLAN_FAILED)
            .await
    }

    pub async fn get_plan(&self, plan_id: Uuid) -> ServiceResult<PlanDetail> {
        let request = self.http.get(self.url(&format!("/plans/{}", plan_id)));
        self.fetch_authorized(request, "get_plan", messages::FETCH_PLAN_FAILED)
            .await
    }

    pub async fn insert_plan(&self, form: &PlanForm) -> ServiceResult<Plan> {
        let request = self.http.post(self.url("/plans")).json(form);
        self.fetch_authorized(request, "insert_plan", messages::INSERT_PLAN_FAILED)
            .await
    }

    pub async fn update_plan(&self, plan_id: Uuid, form: &PlanForm) -> ServiceResult<Plan> {
        let request = self.http.put(self.url(&format!("/plans/{}", plan_id))).json(form);
        self.fetch_authorized(request, "update_plan", messages::UPDATE_PLAN_FAILED)
            .await
    }

    /// Drag-and-drop; only start and end change
    pub async fn update_plan_dates(&self, plan_id: Uuid, dates: PlanDates) -> ServiceResult<Plan> {
        let request = self
            .http
            .patch(self.url(&format!("/plans/{}/dates", plan_id)))
            .json(&dates);
        self.fetch_authorized(request, "update_plan_dates", messages::MOVE_PLAN_FAILED)
            .await
    }

    pub async fn delete_plan(&self, plan_id: Uuid) -> ServiceResult<()> {
        let request = self.http.delete(self.url(&format!("/plans/{}", plan_id)));
        self.send_authorized(request, "delete_plan", messages::DELETE_PLAN_FAILED)
            .await
    }

    pub async fn search_places(&self, keyword: &str) -> ServiceResult<Vec<Place>> {
        if keyword.trim().is_empty() {
            return Ok(Vec::new());
        }

        let request = self
            .http
            .get(self.url("/places/search"))
            .query(&[("query", keyword)]);
        let response: PlaceSearchResponse = self
            .fetch_authorized(request, "search_places", messages::PLACE_SEARCH_FAILED)
            .await?;

        Ok(response.documents)
    }

    // Auth

    /// Creates the account and keeps the returned session
    pub async fn sign_up(&self, form: &SignUpForm) -> ServiceResult<AuthResponse> {
        let request = self.http.post(self.url("/auth/signup")).json(form);
        let auth: AuthResponse = self
            .fetch(request, "sign_up", messages::SIGN_UP_REJECTED)
            .await?;

        self.set_session(Some(auth.session.clone())).await;
        Ok(auth)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> ServiceResult<AuthResponse> {
        let form = SignInForm {
            email: email.to_string(),
            password: password.to_string(),
        };
        let request = self.http.post(self.url("/auth/signin")).json(&form);
        let auth: AuthResponse = self
            .fetch(request, "sign_in", messages::INVALID_CREDENTIALS)
            .await?;

        self.set_session(Some(auth.session.clone())).await;
        Ok(auth)
    }

    /// Ends the session
    ///
    /// Local tokens are dropped whatever the server answers; the result only
    /// reports whether the server saw the sign-out.
    pub async fn sign_out(&self) -> ServiceResult<()> {
        if self.session.read().await.is_none() {
            return Ok(());
        }

        let request = self.http.post(self.url("/auth/signout"));
        let result = self
            .send_authorized(request, "sign_out", messages::SIGN_OUT_FAILED)
            .await;

        self.set_session(None).await;
        result
    }

    /// Exchanges the refresh token for a new pair and publishes it
    pub async fn refresh_session(&self) -> ServiceResult<Session> {
        let refresh_token = match self.session.read().await.as_ref() {
            Some(session) => session.refresh_token.clone(),
            None => return Err(ServiceError::NotSignedIn),
        };

        let request = self
            .http
            .post(self.url("/auth/refresh"))
            .json(&json!({ "refresh_token": refresh_token }));
        let session: Session = self
            .fetch(request, "refresh_session", messages::SESSION_EXPIRED)
            .await?;

        self.set_session(Some(session.clone())).await;
        if let Some(events) = &self.events {
            events.emit(AuthEvent::TokenRefreshed {
                session: session.clone(),
            });
        }
        Ok(session)
    }

    pub async fn current_user(&self) -> ServiceResult<UserProfile> {
        let request = self.http.get(self.url("/auth/me"));
        self.fetch_authorized(request, "current_user", messages::NOT_SIGNED_IN)
            .await
    }

    pub async fn email_duplicate_test(&self, email: &str) -> ServiceResult<DuplicateCheck> {
        let request = self
            .http
            .get(self.url("/auth/duplicates/email"))
            .query(&[("email", email)]);
        self.fetch(request, "email_duplicate_test", messages::CHECK_EMAIL_FORMAT)
            .await
    }

    pub async fn nickname_duplicate_test(&self, nickname: &str) -> ServiceResult<DuplicateCheck> {
        let request = self
            .http
            .get(self.url("/auth/duplicates/nickname"))
            .query(&[("nickname", nickname)]);
        self.fetch(request, "nickname_duplicate_test", messages::CHECK_NICKNAME_FORMAT)
            .await
    }

    /// Provider authorize URL to open in the browser
    pub async fn oauth_sign_in(&self, provider: AuthProvider) -> ServiceResult<String> {
        let request = self.http.get(self.url(&format!("/auth/oauth/{}", provider)));
        let response: AuthorizeResponse = self
            .fetch(request, "oauth_sign_in", messages::OAUTH_FAILED)
            .await?;

        Ok(response.url)
    }

    pub async fn send_password_reset_email(&self, email: &str) -> ServiceResult<()> {
        let request = self
            .http
            .post(self.url("/auth/password/reset"))
            .json(&json!({ "email": email }));
        self.send(request, "send_password_reset_email", messages::RESET_EMAIL_FAILED)
            .await
            .map(|_| ())
    }

    /// Signs in with the token from a recovery link
    pub async fn recover_session(&self, token: &str) -> ServiceResult<AuthResponse> {
        let request = self
            .http
            .post(self.url("/auth/recover"))
            .json(&json!({ "token": token }));
        let auth: AuthResponse = self
            .fetch(request, "recover_session", messages::RECOVERY_LINK_INVALID)
            .await?;

        self.set_session(Some(auth.session.clone())).await;
        Ok(auth)
    }

    pub async fn change_password(&self, form: &ChangePasswordForm) -> ServiceResult<()> {
        let request = self.http.put(self.url("/auth/password")).json(form);
        self.send_authorized(request, "change_password", messages::CHANGE_PASSWORD_FAILED)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(message: &str, details: Vec<(&str, &str)>) -> Option<ErrorBody> {
        Some(ErrorBody {
            message: message.to_string(),
            details: details
                .into_iter()
                .map(|(field, message)| ErrorDetail {
                    field: field.to_string(),
                    message: message.to_string(),
                })
                .collect(),
        })
    }

    #[test]
    fn test_conflict_keeps_server_message() {
        let error = rejection(
            StatusCode::CONFLICT,
            body(messages::DUPLICATE_EMAIL, vec![]),
            messages::SIGN_UP_REJECTED,
        );
        assert_eq!(error.to_string(), messages::DUPLICATE_EMAIL);
    }

    #[test]
    fn test_validation_details_become_field_errors() {
        let error = rejection(
            StatusCode::UNPROCESSABLE_ENTITY,
            body("Validation failed", vec![("name", messages::CONTACT_NAME_REQUIRED)]),
            messages::INSERT_CONTACT_FAILED,
        );

        let errors = error.field_errors().expect("Should carry field errors");
        assert_eq!(errors["name"], messages::CONTACT_NAME_REQUIRED);
    }

    #[test]
    fn test_server_errors_use_operation_message() {
        let error = rejection(
            StatusCode::INTERNAL_SERVER_ERROR,
            body("An internal error occurred", vec![]),
            messages::DELETE_PLAN_FAILED,
        );
        assert_eq!(error.to_string(), messages::DELETE_PLAN_FAILED);

        let error = rejection(StatusCode::NOT_FOUND, None, messages::FETCH_PLAN_FAILED);
        assert_eq!(error.to_string(), messages::FETCH_PLAN_FAILED);
    }

    #[tokio::test]
    async fn test_signed_out_calls_fail_before_sending() {
        let config = Arc::new(ClientConfig::new("http://127.0.0.1:1", "unused.json"));
        let api = ApiService::new(config).unwrap();

        assert!(matches!(api.get_contacts().await, Err(ServiceError::NotSignedIn)));
        assert!(matches!(api.refresh_session().await, Err(ServiceError::NotSignedIn)));
        assert!(api.sign_out().await.is_ok());
        assert!(api.search_places("  ").await.unwrap().is_empty());
    }
}
