/// Client composition root
///
/// Wires one data source, one query cache, one notice queue and the auth
/// store together. `connect` talks to the API and restores the persisted
/// session; `demo` serves the in-memory sandbox and never signs in.

use crate::{
    account::{Account, SignUpFlow},
    cache::QueryCache,
    calendar::Calendar,
    config::ClientConfig,
    contacts::ContactBook,
    holidays::{HolidayClient, HolidayProvider, StaticHolidays},
    notice::Notices,
    service::ApiService,
    session::{AuthEvents, AuthStore, LocalStorage, Subscription},
    source::{demo::demo_user, DataSource, DemoSource, RemoteSource},
};
use chrono::NaiveDate;
use inyeon_shared::models::user::UserProfile;
use std::sync::Arc;

pub struct InyeonClient {
    config: Arc<ClientConfig>,
    api: ApiService,
    storage: Arc<LocalStorage>,
    events: AuthEvents,
    store: AuthStore,
    subscription: Option<Subscription>,
    source: Arc<dyn DataSource>,
    holidays: Arc<dyn HolidayProvider>,
    cache: QueryCache,
    notices: Notices,
}

impl InyeonClient {
    async fn assemble(config: ClientConfig, demo: bool) -> anyhow::Result<Self> {
        let config = Arc::new(config);
        let events = AuthEvents::new();
        let api = ApiService::new(config.clone())?.with_events(events.clone());
        let storage = Arc::new(LocalStorage::new(config.storage_path.clone()));
        let notices = Notices::new();
        let store = AuthStore::load(storage.clone(), notices.clone()).await;
        let subscription = Some(store.start(&events));

        let source: Arc<dyn DataSource> = if demo {
            Arc::new(DemoSource::new(config.calendar_offset()))
        } else {
            Arc::new(RemoteSource::new(api.clone()))
        };

        let holidays: Arc<dyn HolidayProvider> = match HolidayClient::from_config(&config) {
            Some(client) => Arc::new(client),
            None => {
                tracing::warn!("HOLIDAY_SERVICE_KEY is not set; calendar shows no holidays");
                Arc::new(StaticHolidays::default())
            }
        };

        Ok(Self {
            config,
            api,
            storage,
            events,
            store,
            subscription,
            source,
            holidays,
            cache: QueryCache::new(),
            notices,
        })
    }

    /// Remote mode, resuming the session saved by an earlier run
    pub async fn connect(config: ClientConfig) -> anyhow::Result<Self> {
        let client = Self::assemble(config, false).await?;

        if let Some(session) = client.store.persisted_session().await {
            tracing::info!("Restoring saved session");
            client.api.set_session(Some(session)).await;
        }
        Ok(client)
    }

    /// Demo mode: sandbox data, no account
    pub async fn demo(config: ClientConfig) -> anyhow::Result<Self> {
        let client = Self::assemble(config, true).await?;
        tracing::info!("Demo mode started");
        Ok(client)
    }

    /// Replaces the holiday feed (tests, offline runs)
    pub fn with_holidays(mut self, holidays: Arc<dyn HolidayProvider>) -> Self {
        self.holidays = holidays;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn is_demo(&self) -> bool {
        self.source.is_demo()
    }

    /// Signed-in user, or the demo user in demo mode
    pub async fn user(&self) -> Option<UserProfile> {
        if self.is_demo() {
            return Some(demo_user());
        }
        self.store.user().await
    }

    pub fn store(&self) -> &AuthStore {
        &self.store
    }

    pub fn events(&self) -> &AuthEvents {
        &self.events
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    pub fn account(&self) -> Account {
        Account::new(
            Arc::new(self.api.clone()),
            self.events.clone(),
            self.storage.clone(),
            self.cache.clone(),
            self.notices.clone(),
        )
    }

    pub fn sign_up(&self) -> SignUpFlow {
        SignUpFlow::new(Arc::new(self.api.clone()), self.events.clone(), self.notices.clone())
    }

    pub fn contacts(&self) -> ContactBook {
        ContactBook::new(self.source.clone(), self.cache.clone(), self.notices.clone())
    }

    pub fn calendar(&self, today: NaiveDate) -> Calendar {
        Calendar::new(
            self.source.clone(),
            self.holidays.clone(),
            self.cache.clone(),
            self.notices.clone(),
            self.config.calendar_offset(),
            today,
        )
    }

    /// Stops following auth events
    pub fn shutdown(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.stop();
        }
    }
}

impl Drop for InyeonClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}
