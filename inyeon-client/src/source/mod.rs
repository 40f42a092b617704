/// Where contacts and plans come from
///
/// Picked once per session: [`RemoteSource`] talks to the API,
/// [`DemoSource`] serves an in-memory sandbox. Controllers only see the
/// trait, so the same contact book and calendar code runs in both modes.
///
/// # Contract
///
/// Implementations must:
/// 1. Return rows scoped to the signed-in (or demo) user only
/// 2. Keep the pinned/regular partition and `next_page` rule of the API
/// 3. Fail with a [`ServiceError`](crate::error::ServiceError) that already
///    carries the localized message

pub mod demo;
pub mod remote;

pub use demo::DemoSource;
pub use remote::RemoteSource;

use crate::error::ServiceResult;
use async_trait::async_trait;
use inyeon_shared::{
    calendar::YearMonth,
    models::{
        contact::{Contact, ContactItem, ContactWithPlans, RegularPage},
        place::Place,
        plan::{Plan, PlanDates, PlanDetail},
    },
    validation::{contact::ContactForm, plan::PlanForm},
};
use uuid::Uuid;

#[async_trait]
pub trait DataSource: Send + Sync {
    fn is_demo(&self) -> bool;

    async fn get_contacts(&self) -> ServiceResult<Vec<Contact>>;

    async fn get_contact_with_plans(&self, contacts_id: Uuid) -> ServiceResult<ContactWithPlans>;

    async fn fetch_pinned_contacts(&self) -> ServiceResult<Vec<ContactItem>>;

    async fn fetch_regular_contacts(&self, page: i64) -> ServiceResult<RegularPage>;

    async fn insert_contact(&self, form: &ContactForm) -> ServiceResult<Contact>;

    async fn update_contact(&self, contacts_id: Uuid, form: &ContactForm) -> ServiceResult<Contact>;

    async fn update_contact_pin(&self, contacts_id: Uuid, is_pinned: bool) -> ServiceResult<Contact>;

    async fn delete_contact(&self, contacts_id: Uuid) -> ServiceResult<()>;

    async fn get_monthly_plans(&self, month: YearMonth) -> ServiceResult<Vec<Plan>>;

    async fn get_upcoming_plans(&self) -> ServiceResult<Vec<PlanDetail>>;

    async fn get_plan(&self, plan_id: Uuid) -> ServiceResult<PlanDetail>;

    async fn insert_plan(&self, form: &PlanForm) -> ServiceResult<Plan>;

    async fn update_plan(&self, plan_id: Uuid, form: &PlanForm) -> ServiceResult<Plan>;

    async fn update_plan_dates(&self, plan_id: Uuid, dates: PlanDates) -> ServiceResult<Plan>;

    async fn delete_plan(&self, plan_id: Uuid) -> ServiceResult<()>;

    async fn search_places(&self, keyword: &str) -> ServiceResult<Vec<Place>>;
}
