/// Contacts ("내 사람")
///
/// Every query here filters on `user_id`; a contact is never readable or
/// writable by anyone but its owner.
///
/// The contact list is split in two partitions: pinned contacts (fetched in
/// full) and regular contacts (fetched in pages of `limit` rows ordered by
/// name). Toggling the pin moves a contact between the partitions on the next
/// fetch.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE contacts (
///     contacts_id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     relationship_level VARCHAR(50) NOT NULL DEFAULT '친구',
///     notes TEXT,
///     phone VARCHAR(20),
///     email VARCHAR(255),
///     birth DATE,
///     contacts_profile_img TEXT,
///     is_pinned BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::plan::Plan;

/// Default page size for the regular partition
pub const DEFAULT_PAGE_LIMIT: i64 = 10;

/// Relationship labels offered by the contact form
pub const RELATIONSHIP_LEVELS: [&str; 5] = ["소울메이트", "절친", "친구", "지인", "비즈니스"];

/// Relationship assigned when the form leaves it blank
pub const DEFAULT_RELATIONSHIP: &str = "친구";

/// Full contact row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Contact {
    pub contacts_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub relationship_level: String,
    pub notes: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub birth: Option<NaiveDate>,
    pub contacts_profile_img: Option<String>,
    pub is_pinned: bool,
    pub created_at: DateTime<Utc>,
}

/// List projection used by the pinned and regular partitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ContactItem {
    pub contacts_id: Uuid,
    pub name: String,
    pub relationship_level: String,
    pub contacts_profile_img: Option<String>,
    pub is_pinned: bool,
}

impl From<&Contact> for ContactItem {
    fn from(contact: &Contact) -> Self {
        Self {
            contacts_id: contact.contacts_id,
            name: contact.name.clone(),
            relationship_level: contact.relationship_level.clone(),
            contacts_profile_img: contact.contacts_profile_img.clone(),
            is_pinned: contact.is_pinned,
        }
    }
}

/// Normalized write payload
///
/// Produced from the contact form; blank optional fields are already `None`
/// so they are stored as NULL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInput {
    pub name: String,
    pub relationship_level: String,
    pub notes: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub birth: Option<NaiveDate>,
    pub contacts_profile_img: Option<String>,
}

/// A contact together with the plans linked to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactWithPlans {
    #[serde(flatten)]
    pub contact: Contact,
    pub plans: Vec<Plan>,
}

/// One page of the regular partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegularPage {
    pub contacts: Vec<ContactItem>,

    /// `Some(page + 1)` iff the page came back full
    pub next_page: Option<i64>,
}

impl RegularPage {
    /// Wraps fetched rows; a full page implies there may be more
    pub fn from_rows(contacts: Vec<ContactItem>, page: i64, limit: i64) -> Self {
        let next_page = if contacts.len() as i64 == limit {
            page.checked_add(1)
        } else {
            None
        };

        Self { contacts, next_page }
    }

    /// Page past the last row
    pub fn empty() -> Self {
        Self {
            contacts: Vec::new(),
            next_page: None,
        }
    }

    /// Row offset of `page`, or `None` when it does not fit in an i64
    pub fn offset(page: i64, limit: i64) -> Option<i64> {
        page.checked_mul(limit)
    }
}

const CONTACT_COLUMNS: &str = "contacts_id, user_id, name, relationship_level, notes, phone, email, \
                               birth, contacts_profile_img, is_pinned, created_at";

/// Contact row with its plans aggregated to a JSON array
#[derive(sqlx::FromRow)]
struct ContactPlansRow {
    #[sqlx(flatten)]
    contact: Contact,
    plans: Json<Vec<Plan>>,
}

const ITEM_COLUMNS: &str = "contacts_id, name, relationship_level, contacts_profile_img, is_pinned";

impl Contact {
    /// All of a user's contacts ordered by name
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM contacts WHERE user_id = $1 ORDER BY name ASC",
            CONTACT_COLUMNS
        );

        sqlx::query_as::<_, Contact>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Pinned partition, ordered by name
    pub async fn list_pinned(pool: &PgPool, user_id: Uuid) -> Result<Vec<ContactItem>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM contacts WHERE user_id = $1 AND is_pinned = TRUE ORDER BY name ASC",
            ITEM_COLUMNS
        );

        sqlx::query_as::<_, ContactItem>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// One page of the regular partition
    ///
    /// Rows `page * limit .. page * limit + limit` of the unpinned contacts
    /// ordered by name. A page whose offset overflows is empty.
    pub async fn list_regular(
        pool: &PgPool,
        user_id: Uuid,
        page: i64,
        limit: i64,
    ) -> Result<RegularPage, sqlx::Error> {
        let Some(offset) = RegularPage::offset(page, limit) else {
            return Ok(RegularPage::empty());
        };

        let query = format!(
            "SELECT {} FROM contacts WHERE user_id = $1 AND is_pinned = FALSE \
             ORDER BY name ASC LIMIT $2 OFFSET $3",
            ITEM_COLUMNS
        );

        let rows = sqlx::query_as::<_, ContactItem>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;

        Ok(RegularPage::from_rows(rows, page, limit))
    }

    pub async fn find_for_user(
        pool: &PgPool,
        contacts_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM contacts WHERE contacts_id = $1 AND user_id = $2",
            CONTACT_COLUMNS
        );

        sqlx::query_as::<_, Contact>(&query)
            .bind(contacts_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Contact detail with its plans ordered by start, in one read
    pub async fn find_with_plans(
        pool: &PgPool,
        contacts_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ContactWithPlans>, sqlx::Error> {
        let query = format!(
            "SELECT {}, COALESCE(( \
                 SELECT json_agg(p ORDER BY p.start_date ASC) FROM plans p \
                 WHERE p.contacts_id = c.contacts_id AND p.user_id = c.user_id \
             ), '[]'::json) AS plans \
             FROM contacts c WHERE c.contacts_id = $1 AND c.user_id = $2",
            CONTACT_COLUMNS
        );

        let row = sqlx::query_as::<_, ContactPlansRow>(&query)
            .bind(contacts_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(|row| ContactWithPlans {
            contact: row.contact,
            plans: row.plans.0,
        }))
    }

    pub async fn create(pool: &PgPool, user_id: Uuid, data: ContactInput) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO contacts \
             (user_id, name, relationship_level, notes, phone, email, birth, contacts_profile_img) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            CONTACT_COLUMNS
        );

        sqlx::query_as::<_, Contact>(&query)
            .bind(user_id)
            .bind(data.name)
            .bind(data.relationship_level)
            .bind(data.notes)
            .bind(data.phone)
            .bind(data.email)
            .bind(data.birth)
            .bind(data.contacts_profile_img)
            .fetch_one(pool)
            .await
    }

    /// Overwrites every editable field
    ///
    /// Returns `None` if the contact does not exist or belongs to someone else.
    pub async fn update(
        pool: &PgPool,
        contacts_id: Uuid,
        user_id: Uuid,
        data: ContactInput,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE contacts SET name = $3, relationship_level = $4, notes = $5, phone = $6, \
             email = $7, birth = $8, contacts_profile_img = $9 \
             WHERE contacts_id = $1 AND user_id = $2 RETURNING {}",
            CONTACT_COLUMNS
        );

        sqlx::query_as::<_, Contact>(&query)
            .bind(contacts_id)
            .bind(user_id)
            .bind(data.name)
            .bind(data.relationship_level)
            .bind(data.notes)
            .bind(data.phone)
            .bind(data.email)
            .bind(data.birth)
            .bind(data.contacts_profile_img)
            .fetch_optional(pool)
            .await
    }

    pub async fn set_pinned(
        pool: &PgPool,
        contacts_id: Uuid,
        user_id: Uuid,
        is_pinned: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE contacts SET is_pinned = $3 WHERE contacts_id = $1 AND user_id = $2 RETURNING {}",
            CONTACT_COLUMNS
        );

        sqlx::query_as::<_, Contact>(&query)
            .bind(contacts_id)
            .bind(user_id)
            .bind(is_pinned)
            .fetch_optional(pool)
            .await
    }

    /// Returns `true` if a row was deleted
    pub async fn delete(pool: &PgPool, contacts_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM contacts WHERE contacts_id = $1 AND user_id = $2")
            .bind(contacts_id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub fn item(&self) -> ContactItem {
        ContactItem::from(self)
    }

    /// Builds an unpinned row from a write payload without touching the database
    pub fn from_input(contacts_id: Uuid, user_id: Uuid, data: ContactInput, created_at: DateTime<Utc>) -> Self {
        Self {
            contacts_id,
            user_id,
            name: data.name,
            relationship_level: data.relationship_level,
            notes: data.notes,
            phone: data.phone,
            email: data.email,
            birth: data.birth,
            contacts_profile_img: data.contacts_profile_img,
            is_pinned: false,
            created_at,
        }
    }
}
