/// Auth-state notifications
///
/// The account flows publish an [`AuthEvent`] after every change of the
/// signed-in identity; stores subscribe and update themselves. A broadcast
/// channel lets every open window see the same events.

use inyeon_shared::{auth::jwt::Session, models::user::UserProfile};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn { user: UserProfile, session: Session },
    SignedOut,
    /// Signed in through a recovery link; the next screen changes the password
    PasswordRecovery { user: UserProfile, session: Session },
    UserUpdated { user: UserProfile },
    TokenRefreshed { session: Session },
}

impl AuthEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AuthEvent::SignedIn { .. } => "SIGNED_IN",
            AuthEvent::SignedOut => "SIGNED_OUT",
            AuthEvent::PasswordRecovery { .. } => "PASSWORD_RECOVERY",
            AuthEvent::UserUpdated { .. } => "USER_UPDATED",
            AuthEvent::TokenRefreshed { .. } => "TOKEN_REFRESHED",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthEvents {
    sender: broadcast::Sender<AuthEvent>,
}

impl AuthEvents {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.sender.subscribe()
    }

    /// Returns how many subscribers saw the event
    pub fn emit(&self, event: AuthEvent) -> usize {
        tracing::debug!(event = event.name(), "Auth state changed");
        self.sender.send(event).unwrap_or(0)
    }
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new()
    }
}
