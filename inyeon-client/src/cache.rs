/// Query cache
///
/// Results of reads are kept per [`QueryKey`] until their stale time passes
/// or a mutation invalidates them. Values are stored as JSON so one cache
/// holds every result type.
///
/// | Key                  | Stale time |
/// |----------------------|------------|
/// | monthly plans        | 1 day      |
/// | everything else      | 1 minute   |

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

pub const MONTH_STALE_TIME: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Contacts,
    PinnedContacts,
    RegularContacts { page: i64 },
    ContactDetail(Uuid),
    MonthlyPlans { year: i32, month: u32 },
    UpcomingPlans,
    Plan(Uuid),
    Holidays { year: i32 },
}

impl QueryKey {
    pub fn stale_time(&self) -> Duration {
        match self {
            QueryKey::MonthlyPlans { .. } | QueryKey::Holidays { .. } => MONTH_STALE_TIME,
            _ => DEFAULT_STALE_TIME,
        }
    }

    /// Keys a contact write can change
    pub fn is_contact(&self) -> bool {
        matches!(
            self,
            QueryKey::Contacts
                | QueryKey::PinnedContacts
                | QueryKey::RegularContacts { .. }
                | QueryKey::ContactDetail(_)
        )
    }

    /// Keys a plan write can change (contact details list their plans)
    pub fn is_plan(&self) -> bool {
        matches!(
            self,
            QueryKey::MonthlyPlans { .. }
                | QueryKey::UpcomingPlans
                | QueryKey::Plan(_)
                | QueryKey::ContactDetail(_)
        )
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Instant,
}

#[derive(Debug, Clone, Default)]
pub struct QueryCache {
    entries: Arc<Mutex<HashMap<QueryKey, Entry>>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_entries<T>(&self, f: impl FnOnce(&mut HashMap<QueryKey, Entry>) -> T) -> T {
        match self.entries.lock() {
            Ok(mut entries) => f(&mut entries),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    /// Fresh cached value, if any
    pub fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let now = Instant::now();
        let value = self.with_entries(|entries| match entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        })?;

        serde_json::from_value(value).ok()
    }

    pub fn insert<T: Serialize>(&self, key: QueryKey, value: &T) {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(?key, "Not caching unserializable value: {}", e);
                return;
            }
        };

        let entry = Entry {
            value,
            expires_at: Instant::now() + key.stale_time(),
        };
        self.with_entries(|entries| entries.insert(key, entry));
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        let now = Instant::now();
        self.with_entries(|entries| entries.get(key).is_some_and(|e| e.expires_at > now))
    }

    pub fn invalidate(&self, key: &QueryKey) {
        self.with_entries(|entries| entries.remove(key));
    }

    pub fn invalidate_where(&self, predicate: impl Fn(&QueryKey) -> bool) {
        self.with_entries(|entries| entries.retain(|key, _| !predicate(key)));
    }

    pub fn invalidate_contacts(&self) {
        self.invalidate_where(QueryKey::is_contact);
    }

    pub fn invalidate_plans(&self) {
        self.invalidate_where(QueryKey::is_plan);
    }

    pub fn clear(&self) {
        self.with_entries(|entries| entries.clear());
    }

    /// Returns the cached value or runs `fetch` and caches its success
    pub async fn get_or_fetch<T, E, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get(&key) {
            tracing::trace!(?key, "Cache hit");
            return Ok(value);
        }

        let value = fetch().await?;
        self.insert(key, &value);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entries_go_stale() {
        let cache = QueryCache::new();
        cache.insert(QueryKey::PinnedContacts, &vec!["a".to_string()]);
        cache.insert(QueryKey::MonthlyPlans { year: 2025, month: 3 }, &1);

        tokio::time::advance(Duration::from_secs(61)).await;

        assert!(cache.get::<Vec<String>>(&QueryKey::PinnedContacts).is_none());
        assert_eq!(cache.get::<i32>(&QueryKey::MonthlyPlans { year: 2025, month: 3 }), Some(1));
    }

    #[tokio::test]
    async fn test_plan_invalidation_keeps_contact_lists() {
        let cache = QueryCache::new();
        cache.insert(QueryKey::PinnedContacts, &0);
        cache.insert(QueryKey::ContactDetail(Uuid::nil()), &0);
        cache.insert(QueryKey::MonthlyPlans { year: 2025, month: 3 }, &0);
        cache.insert(QueryKey::UpcomingPlans, &0);

        cache.invalidate_plans();

        assert!(cache.contains(&QueryKey::PinnedContacts));
        assert!(!cache.contains(&QueryKey::ContactDetail(Uuid::nil())));
        assert!(!cache.contains(&QueryKey::MonthlyPlans { year: 2025, month: 3 }));
        assert!(!cache.contains(&QueryKey::UpcomingPlans));
    }

    #[tokio::test]
    async fn test_get_or_fetch_caches_success_only() {
        let cache = QueryCache::new();

        let failed: Result<i32, &str> = cache.get_or_fetch(QueryKey::UpcomingPlans, || async { Err("down") }).await;
        assert!(failed.is_err());
        assert!(!cache.contains(&QueryKey::UpcomingPlans));

        let first: Result<i32, &str> = cache.get_or_fetch(QueryKey::UpcomingPlans, || async { Ok(7) }).await;
        let second: Result<i32, &str> = cache.get_or_fetch(QueryKey::UpcomingPlans, || async { Ok(8) }).await;
        assert_eq!(first, Ok(7));
        assert_eq!(second, Ok(7));
    }
}
