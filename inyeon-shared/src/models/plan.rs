/// Plans (calendar appointments)
///
/// A plan belongs to one user and optionally links one of that user's
/// contacts. `location` is a [`Place`] copied at selection time and stored as
/// JSONB, so later changes on the place provider do not affect saved plans.
///
/// All reads and writes filter on `user_id`, including the drag-and-drop
/// date rewrite and delete.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE plans (
///     plan_id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     contacts_id UUID REFERENCES contacts(contacts_id) ON DELETE SET NULL,
///     title VARCHAR(255) NOT NULL,
///     detail TEXT,
///     priority plan_priority,
///     start_date TIMESTAMPTZ NOT NULL,
///     end_date TIMESTAMPTZ NOT NULL,
///     location JSONB,
///     colors VARCHAR(16),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::place::Place;

/// Color tag used when the form leaves it blank
pub const DEFAULT_PLAN_COLOR: &str = "#2F80ED";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "plan_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PlanPriority {
    Low,
    Medium,
    High,
}

impl PlanPriority {
    /// Label shown by the priority picker
    pub fn label(priority: Option<Self>) -> &'static str {
        match priority {
            Some(PlanPriority::High) => "높음",
            Some(PlanPriority::Medium) => "중간",
            Some(PlanPriority::Low) => "낮음",
            None => "없음",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Plan {
    pub plan_id: Uuid,
    pub user_id: Uuid,
    pub contacts_id: Option<Uuid>,
    pub title: String,
    pub detail: Option<String>,
    pub priority: Option<PlanPriority>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: Option<Json<Place>>,
    pub colors: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A plan joined with its contact's name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PlanDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub plan: Plan,
    pub contact_name: Option<String>,
}

/// Write payload for create and full update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPlan {
    pub contacts_id: Option<Uuid>,
    pub title: String,
    pub detail: Option<String>,
    pub priority: Option<PlanPriority>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: Option<Place>,
    pub colors: Option<String>,
}

/// Drag-and-drop payload; only the dates move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanDates {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

const PLAN_COLUMNS: &str = "plan_id, user_id, contacts_id, title, detail, priority, start_date, \
                            end_date, location, colors, created_at";

const DETAIL_COLUMNS: &str = "p.plan_id, p.user_id, p.contacts_id, p.title, p.detail, p.priority, \
                              p.start_date, p.end_date, p.location, p.colors, p.created_at, \
                              c.name AS contact_name";

impl Plan {
    /// Plans overlapping `[window_start, window_end]`
    ///
    /// A plan is included when it starts on or before the window end and ends
    /// on or after the window start, so multi-day plans crossing a month edge
    /// show up in both months.
    pub async fn list_overlapping(
        pool: &PgPool,
        user_id: Uuid,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM plans WHERE user_id = $1 AND start_date <= $3 AND end_date >= $2 \
             ORDER BY start_date ASC",
            PLAN_COLUMNS
        );

        sqlx::query_as::<_, Plan>(&query)
            .bind(user_id)
            .bind(window_start)
            .bind(window_end)
            .fetch_all(pool)
            .await
    }

    /// Plans starting within `[from, to]`, ascending, with contact names
    pub async fn list_upcoming(
        pool: &PgPool,
        user_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PlanDetail>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM plans p LEFT JOIN contacts c ON c.contacts_id = p.contacts_id \
             WHERE p.user_id = $1 AND p.start_date >= $2 AND p.start_date <= $3 \
             ORDER BY p.start_date ASC",
            DETAIL_COLUMNS
        );

        sqlx::query_as::<_, PlanDetail>(&query)
            .bind(user_id)
            .bind(from)
            .bind(to)
            .fetch_all(pool)
            .await
    }

    pub async fn find_detail(
        pool: &PgPool,
        plan_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<PlanDetail>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM plans p LEFT JOIN contacts c ON c.contacts_id = p.contacts_id \
             WHERE p.plan_id = $1 AND p.user_id = $2",
            DETAIL_COLUMNS
        );

        sqlx::query_as::<_, PlanDetail>(&query)
            .bind(plan_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(pool: &PgPool, user_id: Uuid, data: NewPlan) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO plans \
             (user_id, contacts_id, title, detail, priority, start_date, end_date, location, colors) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
            PLAN_COLUMNS
        );

        sqlx::query_as::<_, Plan>(&query)
            .bind(user_id)
            .bind(data.contacts_id)
            .bind(data.title)
            .bind(data.detail)
            .bind(data.priority)
            .bind(data.start_date)
            .bind(data.end_date)
            .bind(data.location.map(Json))
            .bind(data.colors)
            .fetch_one(pool)
            .await
    }

    /// Full edit from the plan form
    pub async fn update(
        pool: &PgPool,
        plan_id: Uuid,
        user_id: Uuid,
        data: NewPlan,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE plans SET contacts_id = $3, title = $4, detail = $5, priority = $6, \
             start_date = $7, end_date = $8, location = $9, colors = $10 \
             WHERE plan_id = $1 AND user_id = $2 RETURNING {}",
            PLAN_COLUMNS
        );

        sqlx::query_as::<_, Plan>(&query)
            .bind(plan_id)
            .bind(user_id)
            .bind(data.contacts_id)
            .bind(data.title)
            .bind(data.detail)
            .bind(data.priority)
            .bind(data.start_date)
            .bind(data.end_date)
            .bind(data.location.map(Json))
            .bind(data.colors)
            .fetch_optional(pool)
            .await
    }

    /// Drag-and-drop move; no other column is touched
    pub async fn update_dates(
        pool: &PgPool,
        plan_id: Uuid,
        user_id: Uuid,
        dates: PlanDates,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE plans SET start_date = $3, end_date = $4 \
             WHERE plan_id = $1 AND user_id = $2 RETURNING {}",
            PLAN_COLUMNS
        );

        sqlx::query_as::<_, Plan>(&query)
            .bind(plan_id)
            .bind(user_id)
            .bind(dates.start_date)
            .bind(dates.end_date)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, plan_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM plans WHERE plan_id = $1 AND user_id = $2")
            .bind(plan_id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Builds a row from a write payload without touching the database
    pub fn from_new(plan_id: Uuid, user_id: Uuid, data: NewPlan, created_at: DateTime<Utc>) -> Self {
        Self {
            plan_id,
            user_id,
            contacts_id: data.contacts_id,
            title: data.title,
            detail: data.detail,
            priority: data.priority,
            start_date: data.start_date,
            end_date: data.end_date,
            location: data.location.map(Json),
            colors: data.colors,
            created_at,
        }
    }

    /// Returns a copy with only start and end replaced
    pub fn moved(&self, dates: PlanDates) -> Self {
        Self {
            start_date: dates.start_date,
            end_date: dates.end_date,
            ..self.clone()
        }
    }

    /// Whether the plan overlaps `[start, end]`
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_date <= end && self.end_date >= start
    }

    pub fn color(&self) -> &str {
        self.colors.as_deref().unwrap_or(DEFAULT_PLAN_COLOR)
    }

    pub fn place(&self) -> Option<&Place> {
        self.location.as_ref().map(|json| &json.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn plan(start: DateTime<Utc>, end: DateTime<Utc>) -> Plan {
        Plan {
            plan_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            contacts_id: None,
            title: "점심".to_string(),
            detail: Some("회사 근처".to_string()),
            priority: Some(PlanPriority::High),
            start_date: start,
            end_date: end,
            location: Some(Json(Place::from_text("강남역"))),
            colors: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_moved_only_changes_dates() {
        let start = Utc.with_ymd_and_hms(2025, 3, 10, 3, 0, 0).unwrap();
        let original = plan(start, start);
        let new_start = Utc.with_ymd_and_hms(2025, 3, 12, 3, 0, 0).unwrap();

        let moved = original.moved(PlanDates {
            start_date: new_start,
            end_date: new_start,
        });

        assert_eq!(moved.start_date, new_start);
        assert_eq!(moved.end_date, new_start);
        assert_eq!(moved.plan_id, original.plan_id);
        assert_eq!(moved.title, original.title);
        assert_eq!(moved.detail, original.detail);
        assert_eq!(moved.priority, original.priority);
        assert_eq!(moved.location, original.location);
    }

    #[test]
    fn test_from_new_keeps_location() {
        let start = Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap();
        let data = NewPlan {
            contacts_id: None,
            title: "산책".to_string(),
            detail: None,
            priority: None,
            start_date: start,
            end_date: start,
            location: Some(Place::from_text("한강공원")),
            colors: None,
        };

        let plan = Plan::from_new(Uuid::new_v4(), Uuid::new_v4(), data, start);

        assert_eq!(plan.place().map(|p| p.place_name.as_str()), Some("한강공원"));
        assert_eq!(plan.color(), DEFAULT_PLAN_COLOR);
    }

    #[test]
    fn test_overlaps_window_edges() {
        let window_start = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let window_end = Utc.with_ymd_and_hms(2025, 3, 31, 23, 59, 59).unwrap();

        let crossing = plan(
            Utc.with_ymd_and_hms(2025, 2, 27, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 2, 0, 0, 0).unwrap(),
        );
        let before = plan(
            Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 2, 2, 0, 0, 0).unwrap(),
        );

        assert!(crossing.overlaps(window_start, window_end));
        assert!(!before.overlaps(window_start, window_end));
    }

    #[test]
    fn test_default_color() {
        let start = Utc::now();
        let mut p = plan(start, start);
        assert_eq!(p.color(), "#2F80ED");

        p.colors = Some("#FF0000".to_string());
        assert_eq!(p.color(), "#FF0000");
    }

    #[test]
    fn test_priority_labels_and_wire_format() {
        assert_eq!(PlanPriority::label(Some(PlanPriority::High)), "높음");
        assert_eq!(PlanPriority::label(None), "없음");
        assert_eq!(
            serde_json::to_string(&PlanPriority::Medium).expect("Should serialize"),
            "\"medium\""
        );
    }

    #[test]
    fn test_detail_flattens_plan() {
        let start = Utc::now();
        let detail = PlanDetail {
            plan: plan(start, start),
            contact_name: Some("영희".to_string()),
        };

        let json = serde_json::to_value(&detail).expect("Should serialize");
        assert_eq!(json["title"], "점심");
        assert_eq!(json["contact_name"], "영희");
        assert_eq!(json["location"]["place_name"], "강남역");

        let back: PlanDetail = serde_json::from_value(json).expect("Should deserialize");
        assert_eq!(back, detail);
    }
}
