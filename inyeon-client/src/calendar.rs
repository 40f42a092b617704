/// Month calendar controller
///
/// # Flow
///
/// ```text
/// load()            plans for the month (cached 1 day) + holidays -> events
/// navigate(action)  move month, load, prefetch the next month in that direction
/// select_slot(t)    quick-create draft seeded with t
/// select_event(id)  plan detail
/// move_event(..)    optimistic move, one date update, rollback on failure
/// ```
///
/// Holiday events are decorations: they are never draggable and never sent
/// to the backend. A failed holiday fetch only logs; the month still shows.

use crate::{
    cache::{QueryCache, QueryKey},
    error::{ServiceError, ServiceResult},
    holidays::HolidayProvider,
    notice::{Notice, Notices},
    source::DataSource,
};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use inyeon_shared::{
    calendar::{self, CalendarEvent, Holiday, Navigate, YearMonth},
    messages,
    models::{
        place::Place,
        plan::{Plan, PlanDates, PlanDetail},
    },
    validation::plan::PlanForm,
};
use std::sync::Arc;
use uuid::Uuid;

/// A drag-and-drop move shown before the backend confirmed it
#[derive(Debug, Clone)]
pub struct PendingMove {
    pub plan_id: Uuid,
    pub dates: PlanDates,
    snapshot: Vec<CalendarEvent>,
}

pub struct Calendar {
    source: Arc<dyn DataSource>,
    holidays: Arc<dyn HolidayProvider>,
    cache: QueryCache,
    notices: Notices,
    offset: FixedOffset,
    month: YearMonth,
    events: Vec<CalendarEvent>,
    draft: Option<PlanForm>,
    selected: Option<PlanDetail>,
}

impl Calendar {
    pub fn new(
        source: Arc<dyn DataSource>,
        holidays: Arc<dyn HolidayProvider>,
        cache: QueryCache,
        notices: Notices,
        offset: FixedOffset,
        today: NaiveDate,
    ) -> Self {
        Self {
            source,
            holidays,
            cache,
            notices,
            offset,
            month: YearMonth::of(today),
            events: Vec::new(),
            draft: None,
            selected: None,
        }
    }

    pub fn month(&self) -> YearMonth {
        self.month
    }

    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    pub fn draft(&self) -> Option<&PlanForm> {
        self.draft.as_ref()
    }

    pub fn selected(&self) -> Option<&PlanDetail> {
        self.selected.as_ref()
    }

    async fn month_plans(&self, month: YearMonth) -> ServiceResult<Vec<Plan>> {
        let key = QueryKey::MonthlyPlans {
            year: month.year,
            month: month.month,
        };
        self.cache
            .get_or_fetch(key, || self.source.get_monthly_plans(month))
            .await
    }

    async fn month_holidays(&self, month: YearMonth) -> Vec<Holiday> {
        let year = month.year;
        let result = self
            .cache
            .get_or_fetch(QueryKey::Holidays { year }, || self.holidays.holidays(year))
            .await;

        match result {
            Ok(holidays) => holidays
                .into_iter()
                .filter(|h| YearMonth::of(h.date) == month)
                .collect(),
            Err(e) => {
                tracing::warn!(year, "Showing month without holidays: {}", e);
                Vec::new()
            }
        }
    }

    /// Rebuilds the events of the current month
    pub async fn load(&mut self) -> ServiceResult<()> {
        let plans = self
            .month_plans(self.month)
            .await
            .map_err(|e| self.notices.report(e))?;
        let holidays = self.month_holidays(self.month).await;

        self.events = calendar::build_events(&plans, &holidays, self.offset);
        tracing::debug!(month = %self.month, count = self.events.len(), "Calendar loaded");
        Ok(())
    }

    /// Warms the cache for the month `action` would show
    pub async fn prefetch(&self, action: Navigate, today: NaiveDate) {
        let target = self.month.navigate(action, today);
        if let Err(e) = self.month_plans(target).await {
            tracing::debug!(month = %target, "Prefetch failed: {}", e);
        }
    }

    pub async fn navigate(&mut self, action: Navigate, today: NaiveDate) -> ServiceResult<()> {
        self.month = self.month.navigate(action, today);
        self.selected = None;
        self.load().await?;

        if action != Navigate::Today {
            self.prefetch(action, today).await;
        }
        Ok(())
    }

    /// Opens the quick-create popover for the clicked day
    pub fn select_slot(&mut self, start: DateTime<Utc>) -> &PlanForm {
        self.draft.insert(PlanForm::draft_at(start))
    }

    pub fn close_draft(&mut self) {
        self.draft = None;
    }

    pub async fn select_event(&mut self, plan_id: Uuid) -> ServiceResult<&PlanDetail> {
        let detail = self
            .cache
            .get_or_fetch(QueryKey::Plan(plan_id), || self.source.get_plan(plan_id))
            .await
            .map_err(|e| self.notices.report(e))?;

        let detail: &PlanDetail = self.selected.insert(detail);
        Ok(detail)
    }

    async fn after_plan_write(&mut self, notice: &'static str) -> ServiceResult<()> {
        self.cache.invalidate_plans();
        self.notices.push(Notice::success(notice));
        self.load().await
    }

    /// Saves the quick-create form
    pub async fn create_plan(&mut self, form: &PlanForm) -> ServiceResult<Plan> {
        form.to_new_plan().map_err(ServiceError::Invalid)?;

        let plan = self
            .source
            .insert_plan(form)
            .await
            .map_err(|e| self.notices.report(e))?;

        self.draft = None;
        self.after_plan_write(messages::PLAN_ADDED).await?;
        Ok(plan)
    }

    pub async fn update_plan(&mut self, plan_id: Uuid, form: &PlanForm) -> ServiceResult<Plan> {
        form.to_new_plan().map_err(ServiceError::Invalid)?;

        let plan = self
            .source
            .update_plan(plan_id, form)
            .await
            .map_err(|e| self.notices.report(e))?;

        self.selected = None;
        self.after_plan_write(messages::PLAN_UPDATED).await?;
        Ok(plan)
    }

    pub async fn delete_plan(&mut self, plan_id: Uuid) -> ServiceResult<()> {
        self.source
            .delete_plan(plan_id)
            .await
            .map_err(|e| self.notices.report(e))?;

        self.selected = None;
        self.after_plan_write(messages::PLAN_DELETED).await
    }

    /// Shows the event at its new position, marked pending
    ///
    /// Returns `None` for holidays and unknown events; nothing moves then.
    pub fn begin_move(&mut self, plan_id: Uuid, dates: PlanDates) -> Option<PendingMove> {
        let index = self
            .events
            .iter()
            .position(|e| e.id == Some(plan_id) && e.is_draggable())?;

        let snapshot = self.events.clone();
        let event = &mut self.events[index];
        event.start = dates.start_date;
        event.end = dates.end_date;
        event.pending = true;

        Some(PendingMove {
            plan_id,
            dates,
            snapshot,
        })
    }

    /// Applies the backend's answer to a pending move
    pub fn settle_move(&mut self, pending: PendingMove, result: ServiceResult<Plan>) -> ServiceResult<Plan> {
        match result {
            Ok(plan) => {
                if let Some(event) = self.events.iter_mut().find(|e| e.id == Some(plan.plan_id)) {
                    *event = CalendarEvent::from_plan(&plan);
                }
                self.cache.invalidate_plans();
                Ok(plan)
            }
            Err(e) => {
                tracing::warn!(plan_id = %pending.plan_id, "Rolling back moved plan");
                self.events = pending.snapshot;
                Err(self.notices.report(e))
            }
        }
    }

    /// Drag-and-drop: rewrites only start and end with one update call
    pub async fn move_event(&mut self, plan_id: Uuid, dates: PlanDates) -> ServiceResult<Option<Plan>> {
        let Some(pending) = self.begin_move(plan_id, dates) else {
            return Ok(None);
        };

        let result = self.source.update_plan_dates(plan_id, pending.dates).await;
        self.settle_move(pending, result).map(Some)
    }

    /// Next 30 days, with contact names
    pub async fn upcoming(&self) -> ServiceResult<Vec<PlanDetail>> {
        self.cache
            .get_or_fetch(QueryKey::UpcomingPlans, || self.source.get_upcoming_plans())
            .await
            .map_err(|e| self.notices.report(e))
    }

    /// Keyword search for the plan location field
    pub async fn search_places(&self, keyword: &str) -> ServiceResult<Vec<Place>> {
        self.source
            .search_places(keyword)
            .await
            .map_err(|e| self.notices.report(e))
    }
}
