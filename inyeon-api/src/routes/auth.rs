/// Account and session endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/signup` - create an email account and sign in
/// - `POST /v1/auth/signin` - email/password sign-in
/// - `POST /v1/auth/refresh` - new session from a refresh token
/// - `POST /v1/auth/signout` - end the session (bearer)
/// - `GET  /v1/auth/duplicates/email?email=` - email check
/// - `GET  /v1/auth/duplicates/nickname?nickname=` - nickname check
/// - `GET  /v1/auth/confirm?token=` - email confirmation link
/// - `POST /v1/auth/password/reset` - email a recovery link
/// - `POST /v1/auth/recover` - exchange a recovery token for a session
/// - `PUT  /v1/auth/password` - set a new password (bearer)
/// - `GET  /v1/auth/me` - current profile (bearer)
///
/// Sessions are stateless JWT pairs, so sign-out only has to be recorded;
/// the client drops its tokens.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    mailer::{confirmation_email, recovery_email},
    routes::validated,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Redirect,
    Extension, Json,
};
use inyeon_shared::{
    auth::{
        jwt::{self, Session},
        middleware::AuthContext,
        password, tokens,
    },
    messages,
    models::{
        auth_token::{AuthToken, TokenPurpose},
        user::{AuthProvider, CreateUser, User, UserProfile},
    },
    validation::{
        signin::{ChangePasswordForm, PasswordResetForm, SignInForm},
        signup::{validate_email_address, validate_nickname, SignUpForm},
    },
};
use serde::{Deserialize, Serialize};
use url::Url;

/// Profile plus session, returned by every sign-in path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub session: Session,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct NicknameQuery {
    #[serde(default)]
    pub nickname: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateResponse {
    pub exists: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct RecoverRequest {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResetResponse {
    pub sent: bool,
}

async fn start_session(state: &AppState, user: &User) -> ApiResult<AuthResponse> {
    let session = jwt::issue_session(user.id, state.jwt_secret())?;
    User::record_login(&state.db, user.id).await?;

    Ok(AuthResponse {
        user: user.profile(),
        session,
    })
}

/// Creates an email account, emails a confirmation link and signs in
///
/// # Errors
///
/// - `422`: a field failed validation
/// - `409`: email or nickname already taken
pub async fn sign_up(
    State(state): State<AppState>,
    Json(form): Json<SignUpForm>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    validated(&form)?;

    if User::email_exists(&state.db, &form.email).await? {
        return Err(ApiError::Conflict(messages::DUPLICATE_EMAIL.to_string()));
    }
    if User::nickname_exists(&state.db, &form.nickname).await? {
        return Err(ApiError::Conflict(messages::DUPLICATE_NICKNAME.to_string()));
    }

    let password_hash = password::hash_password(&form.password)?;

    // A concurrent sign-up can still win the race; the unique indexes turn
    // that into the same 409
    let user = User::create(
        &state.db,
        CreateUser {
            email: form.email.clone(),
            nickname: form.nickname.clone(),
            password_hash: Some(password_hash),
            provider: AuthProvider::Email,
            email_confirmed: false,
            profile_img: None,
        },
    )
    .await?;

    let (_, token) = AuthToken::issue(&state.db, user.id, TokenPurpose::EmailConfirmation).await?;
    let link = format!("{}/v1/auth/confirm?token={}", state.config.api.public_url, token);
    if let Err(e) = state
        .mailer
        .send(confirmation_email(&user.email, &user.nickname, link))
        .await
    {
        tracing::warn!(user_id = %user.id, "Confirmation email failed: {}", e);
    }

    tracing::info!(user_id = %user.id, "User signed up");

    let response = start_session(&state, &user).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Email/password sign-in
///
/// Unknown email, wrong password and OAuth-only accounts all get the same
/// 401 so the response does not reveal which accounts exist.
pub async fn sign_in(
    State(state): State<AppState>,
    Json(form): Json<SignInForm>,
) -> ApiResult<Json<AuthResponse>> {
    validated(&form)?;

    let invalid = || ApiError::Unauthorized(messages::INVALID_CREDENTIALS.to_string());

    let user = User::find_by_email(&state.db, &form.email)
        .await?
        .ok_or_else(invalid)?;

    if !password::verify_account_password(&form.password, user.password_hash.as_deref())? {
        return Err(invalid());
    }

    Ok(Json(start_session(&state, &user).await?))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<Session>> {
    let session = jwt::refresh_session(&req.refresh_token, state.jwt_secret())?;
    Ok(Json(session))
}

pub async fn sign_out(Extension(auth): Extension<AuthContext>) -> StatusCode {
    tracing::info!(user_id = %auth.user_id, "User signed out");
    StatusCode::NO_CONTENT
}

/// Sign-up check: is this email taken?
pub async fn email_duplicate(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> ApiResult<Json<DuplicateResponse>> {
    if validate_email_address(&query.email).is_err() {
        return Err(ApiError::BadRequest(messages::CHECK_EMAIL_FORMAT.to_string()));
    }

    let exists = User::email_exists(&state.db, &query.email).await?;
    Ok(Json(DuplicateResponse {
        exists,
        message: if exists { messages::DUPLICATE_EMAIL } else { messages::EMAIL_AVAILABLE }.to_string(),
    }))
}

/// Sign-up check: is this nickname taken?
pub async fn nickname_duplicate(
    State(state): State<AppState>,
    Query(query): Query<NicknameQuery>,
) -> ApiResult<Json<DuplicateResponse>> {
    if validate_nickname(&query.nickname).is_err() {
        return Err(ApiError::BadRequest(messages::CHECK_NICKNAME_FORMAT.to_string()));
    }

    let exists = User::nickname_exists(&state.db, &query.nickname).await?;
    Ok(Json(DuplicateResponse {
        exists,
        message: if exists { messages::DUPLICATE_NICKNAME } else { messages::NICKNAME_AVAILABLE }
            .to_string(),
    }))
}

/// Target of the emailed confirmation link
pub async fn confirm_email(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> ApiResult<Redirect> {
    let invalid = || ApiError::BadRequest(messages::RECOVERY_LINK_INVALID.to_string());

    if !tokens::is_well_formed(&query.token) {
        return Err(invalid());
    }

    let token = AuthToken::consume(&state.db, &query.token, TokenPurpose::EmailConfirmation)
        .await?
        .ok_or_else(invalid)?;

    User::confirm_email(&state.db, token.user_id).await?;
    tracing::info!(user_id = %token.user_id, "Email confirmed");

    Ok(Redirect::to(&state.config.redirects.finish_signup))
}

/// Emails a recovery link to the change-password page
///
/// Answers 202 whether or not the account exists.
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(form): Json<PasswordResetForm>,
) -> ApiResult<(StatusCode, Json<ResetResponse>)> {
    validated(&form)?;

    match User::find_by_email(&state.db, &form.email).await? {
        Some(user) => {
            let (_, token) = AuthToken::issue(&state.db, user.id, TokenPurpose::PasswordRecovery).await?;
            let link = recovery_link(&state.config.redirects.change_password, &token)?;

            state
                .mailer
                .send(recovery_email(&user.email, link))
                .await
                .map_err(|e| ApiError::InternalError(format!("{}: {}", messages::RESET_EMAIL_FAILED, e)))?;

            tracing::info!(user_id = %user.id, "Password recovery requested");
        }
        None => tracing::debug!("Password recovery requested for unknown email"),
    }

    Ok((StatusCode::ACCEPTED, Json(ResetResponse { sent: true })))
}

fn recovery_link(change_password_url: &str, token: &str) -> ApiResult<String> {
    let mut url = Url::parse(change_password_url)
        .map_err(|e| ApiError::InternalError(format!("Invalid REDIRECT_TO_CHANGE_PASSWORD: {}", e)))?;
    url.query_pairs_mut().append_pair("token", token);
    Ok(url.to_string())
}

/// Exchanges a recovery token for a session
///
/// The client then reports a password-recovery auth event and shows the
/// change-password form.
pub async fn recover_session(
    State(state): State<AppState>,
    Json(req): Json<RecoverRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let invalid = || ApiError::BadRequest(messages::RECOVERY_LINK_INVALID.to_string());

    if !tokens::is_well_formed(&req.token) {
        return Err(invalid());
    }

    let token = AuthToken::consume(&state.db, &req.token, TokenPurpose::PasswordRecovery)
        .await?
        .ok_or_else(invalid)?;

    let user = User::find_by_id(&state.db, token.user_id)
        .await?
        .ok_or_else(invalid)?;

    Ok(Json(start_session(&state, &user).await?))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(form): Json<ChangePasswordForm>,
) -> ApiResult<StatusCode> {
    validated(&form)?;

    let password_hash = password::hash_password(&form.password)?;
    if !User::update_password(&state.db, auth.user_id, &password_hash).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = %auth.user_id, "Password changed");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<UserProfile>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user.profile()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovery_link_appends_token() {
        let link = recovery_link("http://localhost:3000/change-password", "abc").expect("Link should build");
        assert_eq!(link, "http://localhost:3000/change-password?token=abc");

        let link = recovery_link("https://inyeon.app/pw?from=mail", "abc").expect("Link should build");
        assert_eq!(link, "https://inyeon.app/pw?from=mail&token=abc");
    }

    #[test]
    fn test_recovery_link_rejects_bad_base() {
        assert!(recovery_link("not a url", "abc").is_err());
    }
}
