/// Contact book ("내 사람") controller
///
/// Lists are read through the query cache; every write invalidates the
/// contact keys so the next read sees the change (pinning moves a contact
/// from the regular partition to the pinned one on the next fetch).
///
/// Form failures come back as [`ServiceError::Invalid`] for inline display;
/// every other failure is also pushed as a notice.

use crate::{
    cache::{QueryCache, QueryKey},
    error::{ServiceError, ServiceResult},
    notice::{Notice, Notices},
    source::DataSource,
};
use inyeon_shared::{
    messages,
    models::contact::{Contact, ContactItem, ContactWithPlans, RegularPage},
    validation::contact::ContactForm,
};
use std::sync::Arc;
use uuid::Uuid;

/// Regular contacts loaded so far (infinite scroll)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegularList {
    pub contacts: Vec<ContactItem>,
    /// Page to request next; `None` once a short page came back
    pub next_page: Option<i64>,
}

impl RegularList {
    pub fn new() -> Self {
        Self {
            contacts: Vec::new(),
            next_page: Some(0),
        }
    }

    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }
}

#[derive(Clone)]
pub struct ContactBook {
    source: Arc<dyn DataSource>,
    cache: QueryCache,
    notices: Notices,
}

impl ContactBook {
    pub fn new(source: Arc<dyn DataSource>, cache: QueryCache, notices: Notices) -> Self {
        Self { source, cache, notices }
    }

    pub async fn all(&self) -> ServiceResult<Vec<Contact>> {
        self.cache
            .get_or_fetch(QueryKey::Contacts, || self.source.get_contacts())
            .await
            .map_err(|e| self.notices.report(e))
    }

    pub async fn pinned(&self) -> ServiceResult<Vec<ContactItem>> {
        self.cache
            .get_or_fetch(QueryKey::PinnedContacts, || self.source.fetch_pinned_contacts())
            .await
            .map_err(|e| self.notices.report(e))
    }

    pub async fn regular_page(&self, page: i64) -> ServiceResult<RegularPage> {
        self.cache
            .get_or_fetch(QueryKey::RegularContacts { page }, || {
                self.source.fetch_regular_contacts(page)
            })
            .await
            .map_err(|e| self.notices.report(e))
    }

    /// Appends the next page; a no-op once the list is complete
    pub async fn load_more(&self, list: &mut RegularList) -> ServiceResult<()> {
        let Some(page) = list.next_page else {
            return Ok(());
        };

        let fetched = self.regular_page(page).await?;
        list.contacts.extend(fetched.contacts);
        list.next_page = fetched.next_page;
        Ok(())
    }

    pub async fn detail(&self, contacts_id: Uuid) -> ServiceResult<ContactWithPlans> {
        self.cache
            .get_or_fetch(QueryKey::ContactDetail(contacts_id), || {
                self.source.get_contact_with_plans(contacts_id)
            })
            .await
            .map_err(|e| self.notices.report(e))
    }

    pub async fn set_pinned(&self, contacts_id: Uuid, is_pinned: bool) -> ServiceResult<Contact> {
        let contact = self
            .source
            .update_contact_pin(contacts_id, is_pinned)
            .await
            .map_err(|e| self.notices.report(e))?;

        self.cache.invalidate_contacts();
        Ok(contact)
    }

    pub async fn add(&self, form: &ContactForm) -> ServiceResult<Contact> {
        form.to_input().map_err(ServiceError::Invalid)?;

        let contact = self
            .source
            .insert_contact(form)
            .await
            .map_err(|e| self.notices.report(e))?;

        self.cache.invalidate_contacts();
        self.notices.push(Notice::success(messages::contact_added(&contact.name)));
        Ok(contact)
    }

    pub async fn edit(&self, contacts_id: Uuid, form: &ContactForm) -> ServiceResult<Contact> {
        form.to_input().map_err(ServiceError::Invalid)?;

        let contact = self
            .source
            .update_contact(contacts_id, form)
            .await
            .map_err(|e| self.notices.report(e))?;

        // Plans show the contact's name
        self.cache.invalidate_contacts();
        self.cache.invalidate_plans();
        self.notices.push(Notice::success(messages::contact_updated(&contact.name)));
        Ok(contact)
    }

    /// Linked plans stay, unlinked, so plan keys go too
    pub async fn delete(&self, contacts_id: Uuid) -> ServiceResult<()> {
        self.source
            .delete_contact(contacts_id)
            .await
            .map_err(|e| self.notices.report(e))?;

        self.cache.invalidate_contacts();
        self.cache.invalidate_plans();
        self.notices.push(Notice::success(messages::CONTACT_DELETED));
        Ok(())
    }
}
