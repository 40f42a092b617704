/// Plan endpoints
///
/// # Endpoints
///
/// - `GET    /v1/plans?year=&month=[&offset_minutes=]` - plans overlapping the month
/// - `GET    /v1/plans/upcoming[?offset_minutes=]` - next 30 days with contact names
/// - `POST   /v1/plans` - create from a plan form
/// - `GET    /v1/plans/:id` - plan with contact name
/// - `PUT    /v1/plans/:id` - replace from a plan form
/// - `PATCH  /v1/plans/:id/dates` - drag-and-drop move, `{ start_date, end_date }`
/// - `DELETE /v1/plans/:id`
///
/// Month boundaries are computed in the calendar offset (KST unless
/// configured or overridden per request).

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{FixedOffset, Utc};
use inyeon_shared::{
    auth::middleware::AuthContext,
    calendar::{self, MonthWindow, YearMonth},
    models::{
        contact::Contact,
        plan::{NewPlan, Plan, PlanDates, PlanDetail},
    },
    validation::plan::PlanForm,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MonthQuery {
    pub year: i32,
    pub month: u32,
    pub offset_minutes: Option<i32>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct OffsetQuery {
    pub offset_minutes: Option<i32>,
}

fn not_found() -> ApiError {
    ApiError::NotFound("Plan not found".to_string())
}

fn resolve_offset(state: &AppState, requested: Option<i32>) -> ApiResult<FixedOffset> {
    match requested {
        Some(minutes) => calendar::offset_from_minutes(minutes)
            .ok_or_else(|| ApiError::BadRequest(format!("Invalid offset_minutes: {}", minutes))),
        None => Ok(state.calendar_offset()),
    }
}

/// Rejects a plan linked to someone else's contact
async fn ensure_contact_owned(state: &AppState, user_id: Uuid, plan: &NewPlan) -> ApiResult<()> {
    if let Some(contacts_id) = plan.contacts_id {
        Contact::find_for_user(&state.db, contacts_id, user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Contact not found".to_string()))?;
    }
    Ok(())
}

pub async fn list_monthly(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<MonthQuery>,
) -> ApiResult<Json<Vec<Plan>>> {
    let month = YearMonth::new(query.year, query.month)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid month: {}-{}", query.year, query.month)))?;
    let window = MonthWindow::new(month, resolve_offset(&state, query.offset_minutes)?);

    let plans = Plan::list_overlapping(&state.db, auth.user_id, window.start, window.end).await?;
    tracing::debug!(user_id = %auth.user_id, month = %month, count = plans.len(), "Monthly plans");

    Ok(Json(plans))
}

pub async fn list_upcoming(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<OffsetQuery>,
) -> ApiResult<Json<Vec<PlanDetail>>> {
    let (from, to) = calendar::upcoming_window(Utc::now(), resolve_offset(&state, query.offset_minutes)?);
    Ok(Json(Plan::list_upcoming(&state.db, auth.user_id, from, to).await?))
}

pub async fn get_plan(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(plan_id): Path<Uuid>,
) -> ApiResult<Json<PlanDetail>> {
    let plan = Plan::find_detail(&state.db, plan_id, auth.user_id)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(plan))
}

pub async fn create_plan(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(form): Json<PlanForm>,
) -> ApiResult<(StatusCode, Json<Plan>)> {
    let new_plan = form.to_new_plan().map_err(ApiError::from_field_errors)?;
    ensure_contact_owned(&state, auth.user_id, &new_plan).await?;

    let plan = Plan::create(&state.db, auth.user_id, new_plan).await?;
    tracing::info!(user_id = %auth.user_id, plan_id = %plan.plan_id, "Plan created");

    Ok((StatusCode::CREATED, Json(plan)))
}

pub async fn update_plan(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(plan_id): Path<Uuid>,
    Json(form): Json<PlanForm>,
) -> ApiResult<Json<Plan>> {
    let new_plan = form.to_new_plan().map_err(ApiError::from_field_errors)?;
    ensure_contact_owned(&state, auth.user_id, &new_plan).await?;

    let plan = Plan::update(&state.db, plan_id, auth.user_id, new_plan)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(plan))
}

/// Rewrites only `start_date` and `end_date`
pub async fn move_plan(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(plan_id): Path<Uuid>,
    Json(dates): Json<PlanDates>,
) -> ApiResult<Json<Plan>> {
    let plan = Plan::update_dates(&state.db, plan_id, auth.user_id, dates)
        .await?
        .ok_or_else(not_found)?;

    tracing::debug!(user_id = %auth.user_id, plan_id = %plan_id, "Plan moved");
    Ok(Json(plan))
}

pub async fn delete_plan(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(plan_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !Plan::delete(&state.db, plan_id, auth.user_id).await? {
        return Err(not_found());
    }

    tracing::info!(user_id = %auth.user_id, plan_id = %plan_id, "Plan deleted");
    Ok(StatusCode::NO_CONTENT)
}
