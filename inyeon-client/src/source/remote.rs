/// API-backed data source
use super::DataSource;
use crate::{error::ServiceResult, service::ApiService};
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

#[derive(Clone)]
pub struct RemoteSource {
    api: ApiService,
}

impl RemoteSource {
    pub fn new(api: ApiService) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiService {
        &self.api
    }
}

#[async_trait]
impl DataSource for RemoteSource {
    fn is_demo(&self) -> bool {
        false
    }

    async fn get_contacts(&self) -> ServiceResult<Vec<Contact>> {
        self.api.get_contacts().await
    }

    async fn get_contact_with_plans(&self, contacts_id: Uuid) -> ServiceResult<ContactWithPlans> {
        self.api.get_contact_with_plans(contacts_id).await
    }

    async fn fetch_pinned_contacts(&self) -> ServiceResult<Vec<ContactItem>> {
        self.api.fetch_pinned_contacts().await
    }

    async fn fetch_regular_contacts(&self, page: i64) -> ServiceResult<RegularPage> {
        self.api.fetch_regular_contacts(page).await
    }

    async fn insert_contact(&self, form: &ContactForm) -> ServiceResult<Contact> {
        self.api.insert_contact(form).await
    }

    async fn update_contact(&self, contacts_id: Uuid, form: &ContactForm) -> ServiceResult<Contact> {
        self.api.update_contact(contacts_id, form).await
    }

    async fn update_contact_pin(&self, contacts_id: Uuid, is_pinned: bool) -> ServiceResult<Contact> {
        self.api.update_contact_pin(contacts_id, is_pinned).await
    }

    async fn delete_contact(&self, contacts_id: Uuid) -> ServiceResult<()> {
        self.api.delete_contact(contacts_id).await
    }

    async fn get_monthly_plans(&self, month: YearMonth) -> ServiceResult<Vec<Plan>> {
        self.api.get_monthly_plans(month).await
    }

    async fn get_upcoming_plans(&self) -> ServiceResult<Vec<PlanDetail>> {
        self.api.get_upcoming_plans().await
    }

    async fn get_plan(&self, plan_id: Uuid) -> ServiceResult<PlanDetail> {
        self.api.get_plan(plan_id).await
    }

    async fn insert_plan(&self, form: &PlanForm) -> ServiceResult<Plan> {
        self.api.insert_plan(form).await
    }

    async fn update_plan(&self, plan_id: Uuid, form: &PlanForm) -> ServiceResult<Plan> {
        self.api.update_plan(plan_id, form).await
    }

    async fn update_plan_dates(&self, plan_id: Uuid, dates: PlanDates) -> ServiceResult<Plan> {
        self.api.update_plan_dates(plan_id, dates).await
    }

    async fn delete_plan(&self, plan_id: Uuid) -> ServiceResult<()> {
        self.api.delete_plan(plan_id).await
    }

    async fn search_places(&self, keyword: &str) -> ServiceResult<Vec<Place>> {
        self.api.search_places(keyword).await
    }
}
