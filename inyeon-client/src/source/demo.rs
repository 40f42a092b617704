/// Demo mode sandbox
///
/// An in-memory data set (one demo user, a handful of contacts and plans
/// around "now") that answers every read like the API would. Pinning is a
/// local state change; every other write is refused with
/// [`ServiceError::DemoRestricted`]. Nothing is persisted.

use super::DataSource;
use crate::error::{ServiceError, ServiceResult};
use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use inyeon_shared::{
    calendar::{self, MonthWindow, YearMonth},
    messages,
    models::{
        contact::{Contact, ContactInput, ContactItem, ContactWithPlans, RegularPage, DEFAULT_PAGE_LIMIT},
        place::Place,
        plan::{NewPlan, Plan, PlanDates, PlanDetail, PlanPriority},
        user::{AuthProvider, UserProfile},
    },
    validation::{contact::ContactForm, plan::PlanForm},
};
use std::sync::RwLock;
use uuid::Uuid;

/// Fixed id so demo rows are recognizable in logs
pub const DEMO_USER_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_de30);

pub fn demo_user() -> UserProfile {
    UserProfile {
        id: DEMO_USER_ID,
        email: "demo@inyeon.app".to_string(),
        nickname: "체험하기".to_string(),
        provider: AuthProvider::Email,
        email_confirmed: true,
        profile_img: None,
    }
}

#[derive(Debug, Clone)]
struct DemoData {
    contacts: Vec<Contact>,
    plans: Vec<Plan>,
}

fn contact(name: &str, relationship: &str, pinned: bool, birth: Option<NaiveDate>, created_at: DateTime<Utc>) -> Contact {
    let mut contact = Contact::from_input(
        Uuid::new_v4(),
        DEMO_USER_ID,
        ContactInput {
            name: name.to_string(),
            relationship_level: relationship.to_string(),
            birth,
            ..Default::default()
        },
        created_at,
    );
    contact.is_pinned = pinned;
    contact
}

fn plan(contact: &Contact, title: &str, start: DateTime<Utc>, hours: i64, extra: impl FnOnce(&mut NewPlan)) -> Plan {
    let mut data = NewPlan {
        contacts_id: Some(contact.contacts_id),
        title: title.to_string(),
        detail: None,
        priority: None,
        start_date: start,
        end_date: start + Duration::hours(hours),
        location: None,
        colors: None,
    };
    extra(&mut data);
    Plan::from_new(Uuid::new_v4(), DEMO_USER_ID, data, start - Duration::days(7))
}

impl DemoData {
    fn seed(now: DateTime<Utc>) -> Self {
        let contacts = vec![
            contact("김민지", "절친", true, NaiveDate::from_ymd_opt(1995, 4, 12), now),
            contact("박서준", "소울메이트", true, NaiveDate::from_ymd_opt(1994, 11, 3), now),
            contact("이하늘", "친구", false, None, now),
            contact("최유진", "친구", false, NaiveDate::from_ymd_opt(1996, 7, 21), now),
            contact("정우성", "비즈니스", false, None, now),
            contact("한지우", "지인", false, None, now),
            contact("오세훈", "친구", false, None, now),
        ];

        let plans = vec![
            plan(&contacts[0], "점심 약속", now + Duration::days(2), 2, |p| {
                p.location = Some(Place::from_text("강남역"));
                p.priority = Some(PlanPriority::Medium);
            }),
            plan(&contacts[1], "생일 파티", now + Duration::days(9), 4, |p| {
                p.colors = Some("#EB5757".to_string());
                p.priority = Some(PlanPriority::High);
            }),
            plan(&contacts[2], "등산", now - Duration::days(5), 6, |p| {
                p.detail = Some("북한산 입구에서 만나기".to_string());
            }),
            plan(&contacts[4], "미팅", now + Duration::days(40), 1, |p| {
                p.colors = Some("#27AE60".to_string());
            }),
        ];

        Self { contacts, plans }
    }

    fn contact_name(&self, contacts_id: Option<Uuid>) -> Option<String> {
        let id = contacts_id?;
        self.contacts
            .iter()
            .find(|c| c.contacts_id == id)
            .map(|c| c.name.clone())
    }

    fn detail(&self, plan: &Plan) -> PlanDetail {
        PlanDetail {
            plan: plan.clone(),
            contact_name: self.contact_name(plan.contacts_id),
        }
    }

    fn sorted_items(&self, pinned: bool) -> Vec<ContactItem> {
        let mut items: Vec<ContactItem> = self
            .contacts
            .iter()
            .filter(|c| c.is_pinned == pinned)
            .map(Contact::item)
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        items
    }
}

pub struct DemoSource {
    data: RwLock<DemoData>,
    offset: FixedOffset,
}

impl DemoSource {
    pub fn new(offset: FixedOffset) -> Self {
        Self::seeded(Utc::now(), offset)
    }

    /// Demo data placed around `now`
    pub fn seeded(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self {
            data: RwLock::new(DemoData::seed(now)),
            offset,
        }
    }

    pub fn user(&self) -> UserProfile {
        demo_user()
    }

    fn read<T>(&self, f: impl FnOnce(&DemoData) -> T) -> T {
        match self.data.read() {
            Ok(data) => f(&data),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }

    fn write<T>(&self, f: impl FnOnce(&mut DemoData) -> T) -> T {
        match self.data.write() {
            Ok(mut data) => f(&mut data),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    fn restricted<T>(operation: &'static str) -> ServiceResult<T> {
        tracing::info!(operation, "Blocked in demo mode");
        Err(ServiceError::DemoRestricted)
    }
}

const DEMO_PLACES: [(&str, &str); 4] = [
    ("강남역 2호선", "서울 강남구 강남대로 396"),
    ("광화문광장", "서울 종로구 세종대로 172"),
    ("서울숲", "서울 성동구 뚝섬로 273"),
    ("북한산국립공원", "서울 강북구 삼양로173길 504"),
];

#[async_trait]
impl DataSource for DemoSource {
    fn is_demo(&self) -> bool {
        true
    }

    async fn get_contacts(&self) -> ServiceResult<Vec<Contact>> {
        Ok(self.read(|data| {
            let mut contacts = data.contacts.clone();
            contacts.sort_by(|a, b| a.name.cmp(&b.name));
            contacts
        }))
    }

    async fn get_contact_with_plans(&self, contacts_id: Uuid) -> ServiceResult<ContactWithPlans> {
        self.read(|data| {
            let contact = data
                .contacts
                .iter()
                .find(|c| c.contacts_id == contacts_id)
                .cloned()
                .ok_or(ServiceError::Failed(messages::FETCH_CONTACT_DETAIL_FAILED))?;

            let mut plans: Vec<Plan> = data
                .plans
                .iter()
                .filter(|p| p.contacts_id == Some(contacts_id))
                .cloned()
                .collect();
            plans.sort_by_key(|p| p.start_date);

            Ok(ContactWithPlans { contact, plans })
        })
    }

    async fn fetch_pinned_contacts(&self) -> ServiceResult<Vec<ContactItem>> {
        Ok(self.read(|data| data.sorted_items(true)))
    }

    async fn fetch_regular_contacts(&self, page: i64) -> ServiceResult<RegularPage> {
        let page = page.max(0);
        let Some(offset) = RegularPage::offset(page, DEFAULT_PAGE_LIMIT)
            .and_then(|offset| usize::try_from(offset).ok())
        else {
            return Ok(RegularPage::empty());
        };

        Ok(self.read(|data| {
            let rows = data
                .sorted_items(false)
                .into_iter()
                .skip(offset)
                .take(DEFAULT_PAGE_LIMIT as usize)
                .collect();
            RegularPage::from_rows(rows, page, DEFAULT_PAGE_LIMIT)
        }))
    }

    async fn insert_contact(&self, _form: &ContactForm) -> ServiceResult<Contact> {
        Self::restricted("insert_contact")
    }

    async fn update_contact(&self, _contacts_id: Uuid, _form: &ContactForm) -> ServiceResult<Contact> {
        Self::restricted("update_contact")
    }

    /// The one write allowed in demo mode
    async fn update_contact_pin(&self, contacts_id: Uuid, is_pinned: bool) -> ServiceResult<Contact> {
        self.write(|data| {
            let contact = data
                .contacts
                .iter_mut()
                .find(|c| c.contacts_id == contacts_id)
                .ok_or(ServiceError::Failed(messages::PIN_CONTACT_FAILED))?;
            contact.is_pinned = is_pinned;
            Ok(contact.clone())
        })
    }

    async fn delete_contact(&self, _contacts_id: Uuid) -> ServiceResult<()> {
        Self::restricted("delete_contact")
    }

    async fn get_monthly_plans(&self, month: YearMonth) -> ServiceResult<Vec<Plan>> {
        let window = MonthWindow::new(month, self.offset);
        Ok(self.read(|data| {
            let mut plans: Vec<Plan> = data
                .plans
                .iter()
                .filter(|p| window.overlaps(p.start_date, p.end_date))
                .cloned()
                .collect();
            plans.sort_by_key(|p| p.start_date);
            plans
        }))
    }

    async fn get_upcoming_plans(&self) -> ServiceResult<Vec<PlanDetail>> {
        let (from, to) = calendar::upcoming_window(Utc::now(), self.offset);
        Ok(self.read(|data| {
            let mut plans: Vec<PlanDetail> = data
                .plans
                .iter()
                .filter(|p| p.start_date >= from && p.start_date <= to)
                .map(|p| data.detail(p))
                .collect();
            plans.sort_by_key(|d| d.plan.start_date);
            plans
        }))
    }

    async fn get_plan(&self, plan_id: Uuid) -> ServiceResult<PlanDetail> {
        self.read(|data| {
            data.plans
                .iter()
                .find(|p| p.plan_id == plan_id)
                .map(|p| data.detail(p))
                .ok_or(ServiceError::Failed(messages::FETCH_PLAN_FAILED))
        })
    }

    async fn insert_plan(&self, _form: &PlanForm) -> ServiceResult<Plan> {
        Self::restricted("insert_plan")
    }

    async fn update_plan(&self, _plan_id: Uuid, _form: &PlanForm) -> ServiceResult<Plan> {
        Self::restricted("update_plan")
    }

    async fn update_plan_dates(&self, _plan_id: Uuid, _dates: PlanDates) -> ServiceResult<Plan> {
        Self::restricted("update_plan_dates")
    }

    async fn delete_plan(&self, _plan_id: Uuid) -> ServiceResult<()> {
        Self::restricted("delete_plan")
    }

    async fn search_places(&self, keyword: &str) -> ServiceResult<Vec<Place>> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Ok(Vec::new());
        }

        Ok(DEMO_PLACES
            .iter()
            .enumerate()
            .filter(|(_, (name, _))| name.contains(keyword))
            .map(|(i, (name, address))| Place {
                place_name: name.to_string(),
                road_address_name: Some(address.to_string()),
                id: Some(format!("demo-{}", i)),
                ..Default::default()
            })
            .collect())
    }
}
