/// Account flows: sign-in, sign-out, OAuth, password recovery
///
/// Every successful change of identity is published as an [`AuthEvent`] so
/// the auth store (and any other window) follows along. The backend calls go
/// through [`AccountService`], implemented by [`ApiService`].

use crate::{
    cache::QueryCache,
    error::{ServiceError, ServiceResult},
    notice::{Notice, Notices},
    service::{ApiService, AuthResponse, DuplicateCheck},
    session::{
        events::{AuthEvent, AuthEvents},
        storage::{LocalStorage, SAVED_EMAIL},
    },
};
use async_trait::async_trait;
use inyeon_shared::{
    auth::jwt::Session,
    messages,
    models::user::{AuthProvider, UserProfile},
    validation::{
        signin::{ChangePasswordForm, PasswordResetForm, SignInForm},
        signup::SignUpForm,
        Form,
    },
};
use std::sync::Arc;

/// Auth operations of the backend
#[async_trait]
pub trait AccountService: Send + Sync {
    async fn email_duplicate_test(&self, email: &str) -> ServiceResult<DuplicateCheck>;

    async fn nickname_duplicate_test(&self, nickname: &str) -> ServiceResult<DuplicateCheck>;

    async fn sign_up(&self, form: &SignUpForm) -> ServiceResult<AuthResponse>;

    async fn sign_in(&self, email: &str, password: &str) -> ServiceResult<AuthResponse>;

    async fn sign_out(&self) -> ServiceResult<()>;

    async fn oauth_sign_in(&self, provider: AuthProvider) -> ServiceResult<String>;

    /// Installs tokens received out of band and loads their user
    async fn adopt_session(&self, session: Session) -> ServiceResult<UserProfile>;

    async fn send_password_reset_email(&self, email: &str) -> ServiceResult<()>;

    async fn recover_session(&self, token: &str) -> ServiceResult<AuthResponse>;

    async fn change_password(&self, form: &ChangePasswordForm) -> ServiceResult<()>;

    async fn current_user(&self) -> ServiceResult<UserProfile>;
}

#[async_trait]
impl AccountService for ApiService {
    async fn email_duplicate_test(&self, email: &str) -> ServiceResult<DuplicateCheck> {
        ApiService::email_duplicate_test(self, email).await
    }

    async fn nickname_duplicate_test(&self, nickname: &str) -> ServiceResult<DuplicateCheck> {
        ApiService::nickname_duplicate_test(self, nickname).await
    }

    async fn sign_up(&self, form: &SignUpForm) -> ServiceResult<AuthResponse> {
        ApiService::sign_up(self, form).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> ServiceResult<AuthResponse> {
        ApiService::sign_in(self, email, password).await
    }

    async fn sign_out(&self) -> ServiceResult<()> {
        ApiService::sign_out(self).await
    }

    async fn oauth_sign_in(&self, provider: AuthProvider) -> ServiceResult<String> {
        ApiService::oauth_sign_in(self, provider).await
    }

    async fn adopt_session(&self, session: Session) -> ServiceResult<UserProfile> {
        self.set_session(Some(session)).await;
        let user = self.current_user().await;
        if user.is_err() {
            self.set_session(None).await;
        }
        user
    }

    async fn send_password_reset_email(&self, email: &str) -> ServiceResult<()> {
        ApiService::send_password_reset_email(self, email).await
    }

    async fn recover_session(&self, token: &str) -> ServiceResult<AuthResponse> {
        ApiService::recover_session(self, token).await
    }

    async fn change_password(&self, form: &ChangePasswordForm) -> ServiceResult<()> {
        ApiService::change_password(self, form).await
    }

    async fn current_user(&self) -> ServiceResult<UserProfile> {
        ApiService::current_user(self).await
    }
}

/// Parses the fragment the OAuth callback redirects to
///
/// `#access_token=..&refresh_token=..&expires_in=..&token_type=Bearer` on
/// success, `#error=oauth_failed&error_description=..` on failure.
pub fn parse_oauth_fragment(fragment: &str) -> ServiceResult<Session> {
    let fragment = fragment.trim_start_matches('#');
    let mut access_token = None;
    let mut refresh_token = None;
    let mut expires_in = None;
    let mut token_type = None;

    for (key, value) in url::form_urlencoded::parse(fragment.as_bytes()) {
        match key.as_ref() {
            "access_token" => access_token = Some(value.into_owned()),
            "refresh_token" => refresh_token = Some(value.into_owned()),
            "expires_in" => expires_in = value.parse::<i64>().ok(),
            "token_type" => token_type = Some(value.into_owned()),
            "error_description" => tracing::warn!("OAuth sign-in failed: {}", value),
            _ => {}
        }
    }

    match (access_token, refresh_token, expires_in) {
        (Some(access_token), Some(refresh_token), Some(expires_in)) => Ok(Session {
            access_token,
            refresh_token,
            token_type: token_type.unwrap_or_else(|| "Bearer".to_string()),
            expires_in,
        }),
        _ => Err(ServiceError::Failed(messages::OAUTH_FAILED)),
    }
}

/// Cached queries belong to one user, so any change of identity clears them
pub struct Account {
    service: Arc<dyn AccountService>,
    events: AuthEvents,
    storage: Arc<LocalStorage>,
    cache: QueryCache,
    notices: Notices,
}

impl Account {
    pub fn new(
        service: Arc<dyn AccountService>,
        events: AuthEvents,
        storage: Arc<LocalStorage>,
        cache: QueryCache,
        notices: Notices,
    ) -> Self {
        Self {
            service,
            events,
            storage,
            cache,
            notices,
        }
    }

    fn signed_in(&self, user: &UserProfile, session: Session) {
        self.cache.clear();
        self.events.emit(AuthEvent::SignedIn {
            user: user.clone(),
            session,
        });
    }

    /// Email remembered by an earlier sign-in
    pub async fn saved_email(&self) -> Option<String> {
        self.storage.get(SAVED_EMAIL).await.ok().flatten()
    }

    /// Validates, signs in and optionally remembers the email
    pub async fn sign_in(&self, form: &SignInForm, remember_email: bool) -> ServiceResult<UserProfile> {
        let errors = form.field_errors();
        if !errors.is_empty() {
            return Err(ServiceError::Invalid(errors));
        }

        let auth = self
            .service
            .sign_in(&form.email, &form.password)
            .await
            .map_err(|e| self.notices.report(e))?;

        if remember_email {
            self.storage.set(SAVED_EMAIL, &form.email).await?;
        } else {
            self.storage.remove(SAVED_EMAIL).await?;
        }

        self.signed_in(&auth.user, auth.session);
        Ok(auth.user)
    }

    /// Always ends the local session
    ///
    /// An expired session (401) means the server already dropped it, so that
    /// counts as success. Other failures are reported after signing out.
    pub async fn sign_out(&self) -> ServiceResult<()> {
        let result = self.service.sign_out().await;

        self.cache.clear();
        self.events.emit(AuthEvent::SignedOut);

        match result {
            Err(e) if e.is_unauthorized() => {
                tracing::debug!("Session already expired on the server");
                Ok(())
            }
            Err(e) => Err(self.notices.report(e)),
            Ok(()) => Ok(()),
        }
    }

    /// Provider page to open for OAuth sign-in
    pub async fn oauth_url(&self, provider: AuthProvider) -> ServiceResult<String> {
        self.service
            .oauth_sign_in(provider)
            .await
            .map_err(|e| self.notices.report(e))
    }

    /// Finishes OAuth sign-in from the redirect fragment
    pub async fn complete_oauth(&self, fragment: &str) -> ServiceResult<UserProfile> {
        let result = match parse_oauth_fragment(fragment) {
            Ok(session) => self
                .service
                .adopt_session(session.clone())
                .await
                .map(|user| (user, session)),
            Err(e) => Err(e),
        };

        let (user, session) = result.map_err(|e| self.notices.report(e))?;
        self.signed_in(&user, session);
        Ok(user)
    }

    pub async fn request_password_reset(&self, form: &PasswordResetForm) -> ServiceResult<()> {
        let errors = form.field_errors();
        if !errors.is_empty() {
            return Err(ServiceError::Invalid(errors));
        }

        self.service
            .send_password_reset_email(&form.email)
            .await
            .map_err(|e| self.notices.report(e))
    }

    /// Opens the change-password step from a recovery link token
    pub async fn recover(&self, token: &str) -> ServiceResult<UserProfile> {
        let auth = self
            .service
            .recover_session(token)
            .await
            .map_err(|e| self.notices.report(e))?;

        self.cache.clear();
        self.events.emit(AuthEvent::PasswordRecovery {
            user: auth.user.clone(),
            session: auth.session,
        });
        Ok(auth.user)
    }

    pub async fn change_password(&self, form: &ChangePasswordForm) -> ServiceResult<()> {
        let errors = form.field_errors();
        if !errors.is_empty() {
            return Err(ServiceError::Invalid(errors));
        }

        self.service
            .change_password(form)
            .await
            .map_err(|e| self.notices.report(e))?;

        match self.service.current_user().await {
            Ok(user) => {
                self.events.emit(AuthEvent::UserUpdated { user });
            }
            Err(e) => tracing::warn!("Password changed but the user could not be reloaded: {}", e),
        }
        Ok(())
    }
}

/// Sign-up form controller
///
/// Submitting requires a valid form and both uniqueness checks passed for
/// the current email and nickname. Editing a checked field clears its check.
pub struct SignUpFlow {
    service: Arc<dyn AccountService>,
    events: AuthEvents,
    notices: Notices,
    form: SignUpForm,
    email_checked: Option<String>,
    nickname_checked: Option<String>,
}

impl SignUpFlow {
    pub fn new(service: Arc<dyn AccountService>, events: AuthEvents, notices: Notices) -> Self {
        Self {
            service,
            events,
            notices,
            form: SignUpForm::default(),
            email_checked: None,
            nickname_checked: None,
        }
    }

    pub fn form(&self) -> &SignUpForm {
        &self.form
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        let email = email.into();
        if self.email_checked.as_deref() != Some(email.as_str()) {
            self.email_checked = None;
        }
        self.form.email = email;
    }

    pub fn set_nickname(&mut self, nickname: impl Into<String>) {
        let nickname = nickname.into();
        if self.nickname_checked.as_deref() != Some(nickname.as_str()) {
            self.nickname_checked = None;
        }
        self.form.nickname = nickname;
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.form.password = password.into();
    }

    pub fn set_password_check(&mut self, password_check: impl Into<String>) {
        self.form.password_check = password_check.into();
    }

    /// Inline messages for the current input
    pub fn field_errors(&self) -> inyeon_shared::validation::FieldErrors {
        self.form.field_errors()
    }

    pub fn is_email_checked(&self) -> bool {
        self.email_checked.as_deref() == Some(self.form.email.as_str())
    }

    pub fn is_nickname_checked(&self) -> bool {
        self.nickname_checked.as_deref() == Some(self.form.nickname.as_str())
    }

    /// Runs the email check; the check passes only for a well-formed, unused email
    pub async fn check_email(&mut self) -> ServiceResult<DuplicateCheck> {
        self.email_checked = None;
        let email = self.form.email.clone();

        let check = self
            .service
            .email_duplicate_test(&email)
            .await
            .map_err(|e| self.notices.report(e))?;

        if check.exists {
            self.notices.push(Notice::error(messages::DUPLICATE_EMAIL));
        } else if self.form.field_errors().contains_key("email") {
            self.notices.push(Notice::error(messages::CHECK_EMAIL_FORMAT));
        } else {
            self.notices.push(Notice::success(messages::EMAIL_AVAILABLE));
            self.email_checked = Some(email);
        }

        Ok(check)
    }

    pub async fn check_nickname(&mut self) -> ServiceResult<DuplicateCheck> {
        self.nickname_checked = None;
        let nickname = self.form.nickname.clone();

        let check = self
            .service
            .nickname_duplicate_test(&nickname)
            .await
            .map_err(|e| self.notices.report(e))?;

        if check.exists {
            self.notices.push(Notice::error(messages::DUPLICATE_NICKNAME));
        } else if self.form.field_errors().contains_key("nickname") {
            self.notices.push(Notice::error(messages::CHECK_NICKNAME_FORMAT));
        } else {
            self.notices.push(Notice::success(messages::NICKNAME_AVAILABLE));
            self.nickname_checked = Some(nickname);
        }

        Ok(check)
    }

    /// Creates the account and signs in
    pub async fn submit(&mut self) -> ServiceResult<UserProfile> {
        let errors = self.form.field_errors();
        if !errors.is_empty() {
            return Err(ServiceError::Invalid(errors));
        }

        if !self.is_email_checked() || !self.is_nickname_checked() {
            return Err(self.notices.report(ServiceError::DuplicateCheckRequired));
        }

        let auth = self
            .service
            .sign_up(&self.form)
            .await
            .map_err(|e| self.notices.report(e))?;

        self.notices.push(Notice::success(messages::SIGN_UP_COMPLETE));
        self.events.emit(AuthEvent::SignedIn {
            user: auth.user.clone(),
            session: auth.session,
        });
        Ok(auth.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_oauth_fragment() {
        let session = parse_oauth_fragment(
            "#access_token=a.b.c&refresh_token=d.e.f&expires_in=86400&token_type=Bearer",
        )
        .unwrap();

        assert_eq!(session.access_token, "a.b.c");
        assert_eq!(session.refresh_token, "d.e.f");
        assert_eq!(session.expires_in, 86_400);
    }

    #[test]
    fn test_parse_oauth_error_fragment() {
        let error = parse_oauth_fragment("#error=oauth_failed&error_description=denied").unwrap_err();
        assert_eq!(error.to_string(), messages::OAUTH_FAILED);
    }
}
