/// Global auth store
///
/// Holds the signed-in user and the derived `is_sign_in` flag, persisted
/// under `user-state`. The store changes only through its setters and
/// through the subscription task started by [`AuthStore::start`], which
/// follows [`AuthEvent`]s:
///
/// | Event              | Effect                                                  |
/// |--------------------|---------------------------------------------------------|
/// | `SignedIn`         | set user, persist tokens, welcome notice once per user  |
/// | `PasswordRecovery` | set user, persist tokens                                |
/// | `UserUpdated`      | replace user                                            |
/// | `TokenRefreshed`   | persist tokens                                          |
/// | `SignedOut`        | clear user, remove tokens and the welcome marker        |

use super::{
    events::{AuthEvent, AuthEvents},
    storage::{LocalStorage, StorageError, AUTH_SESSION, USER_STATE, WELCOME_SHOWN},
};
use crate::notice::{Notice, Notices};
use inyeon_shared::{auth::jwt::Session, messages, models::user::UserProfile};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast::error::RecvError, RwLock};
use tokio::task::JoinHandle;

/// What is persisted under `user-state`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthState {
    pub user: Option<UserProfile>,
    pub is_sign_in: bool,
}

#[derive(Clone)]
pub struct AuthStore {
    state: Arc<RwLock<AuthState>>,
    storage: Arc<LocalStorage>,
    notices: Notices,
}

impl AuthStore {
    /// Restores the persisted state; a corrupt entry starts signed out
    pub async fn load(storage: Arc<LocalStorage>, notices: Notices) -> Self {
        let state = match storage.get::<AuthState>(USER_STATE).await {
            Ok(state) => state.unwrap_or_default(),
            Err(e) => {
                tracing::warn!("Discarding persisted user state: {}", e);
                AuthState::default()
            }
        };

        Self {
            state: Arc::new(RwLock::new(state)),
            storage,
            notices,
        }
    }

    pub async fn snapshot(&self) -> AuthState {
        self.state.read().await.clone()
    }

    pub async fn user(&self) -> Option<UserProfile> {
        self.state.read().await.user.clone()
    }

    pub async fn is_sign_in(&self) -> bool {
        self.state.read().await.is_sign_in
    }

    /// Tokens persisted by an earlier sign-in
    pub async fn persisted_session(&self) -> Option<Session> {
        self.storage.get(AUTH_SESSION).await.ok().flatten()
    }

    pub async fn set_user(&self, user: UserProfile) -> Result<(), StorageError> {
        let state = AuthState {
            user: Some(user),
            is_sign_in: true,
        };
        *self.state.write().await = state.clone();
        self.storage.set(USER_STATE, &state).await
    }

    /// Clears the user and removes the persisted entries
    ///
    /// The welcome marker goes too, so the next sign-in greets again.
    pub async fn sign_out(&self) -> Result<(), StorageError> {
        *self.state.write().await = AuthState::default();
        self.storage.remove(USER_STATE).await?;
        self.storage.remove(AUTH_SESSION).await?;
        self.storage.remove(WELCOME_SHOWN).await
    }

    /// Applies one auth-state notification
    pub async fn apply(&self, event: AuthEvent) -> Result<(), StorageError> {
        match event {
            AuthEvent::SignedIn { user, session } => {
                let user_id = user.id;
                let nickname = user.nickname.clone();
                self.set_user(user).await?;
                self.storage.set(AUTH_SESSION, &session).await?;

                if self.storage.claim_welcome(user_id).await? {
                    self.notices.push(Notice::success(messages::welcome(&nickname)));
                }
            }
            AuthEvent::PasswordRecovery { user, session } => {
                self.set_user(user).await?;
                self.storage.set(AUTH_SESSION, &session).await?;
            }
            AuthEvent::UserUpdated { user } => self.set_user(user).await?,
            AuthEvent::TokenRefreshed { session } => self.storage.set(AUTH_SESSION, &session).await?,
            AuthEvent::SignedOut => self.sign_out().await?,
        }
        Ok(())
    }

    /// Subscribes to auth events until [`Subscription::stop`]
    pub fn start(&self, events: &AuthEvents) -> Subscription {
        let mut receiver = events.subscribe();
        let store = self.clone();

        let handle = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        let name = event.name();
                        if let Err(e) = store.apply(event).await {
                            tracing::error!(event = name, "Failed to persist auth state: {}", e);
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Auth store fell behind");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        Subscription { handle }
    }
}

/// Running auth-event subscription
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    pub fn stop(self) {
        self.handle.abort();
    }
}
