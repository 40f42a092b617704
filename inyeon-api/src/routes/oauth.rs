/// OAuth endpoints
///
/// - `GET /v1/auth/oauth/{provider}` - `{ "url": "<authorize URL>" }`
/// - `GET /v1/auth/oauth/{provider}/callback?code=&state=` - redirects to
///   `REDIRECT_TO` with the session (or an error) in the fragment
///
/// A first sign-in creates the account with a generated nickname; an
/// existing account with the same email is signed in as is, unless it is an
/// unconfirmed password account. The provider must have verified the email.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    oauth::{self, OAuthError, OAuthProfile},
};
use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    Json,
};
use inyeon_shared::{
    auth::jwt,
    models::user::{AuthProvider, CreateUser, User},
};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Nickname suffixes tried before giving up
const NICKNAME_ATTEMPTS: usize = 10;

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthorizeResponse {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

pub async fn authorize(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> ApiResult<Json<AuthorizeResponse>> {
    let provider = oauth::parse_provider(&provider)?;
    let client = state.oauth.client_config(provider)?;

    let state_token = oauth::create_state(provider, state.jwt_secret())?;
    let redirect_uri = state.config.oauth_callback_url(provider.as_str());
    let url = oauth::authorize_url(provider, client, &redirect_uri, &state_token)?;

    Ok(Json(AuthorizeResponse { url: url.to_string() }))
}

/// Always redirects the browser; failures land on the front end as
/// `#error=oauth_failed`
pub async fn callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
) -> Redirect {
    let base = state.config.redirects.after_sign_in.clone();

    match complete_sign_in(&state, &provider, query).await {
        Ok(session) => Redirect::to(&oauth::session_redirect(&base, &session)),
        Err(e) => {
            tracing::error!(provider = %provider, "OAuth sign-in failed: {}", e);
            Redirect::to(&oauth::error_redirect(&base, &e.to_string()))
        }
    }
}

async fn complete_sign_in(
    state: &AppState,
    provider: &str,
    query: CallbackQuery,
) -> Result<jwt::Session, ApiError> {
    let provider = oauth::parse_provider(provider)?;

    if let Some(error) = query.error {
        return Err(OAuthError::Exchange(error).into());
    }
    let code = query
        .code
        .ok_or_else(|| OAuthError::Exchange("Missing code".to_string()))?;
    let state_token = query
        .state
        .ok_or_else(|| OAuthError::InvalidState("Missing state".to_string()))?;

    oauth::validate_state(&state_token, provider, state.jwt_secret())?;

    let redirect_uri = state.config.oauth_callback_url(provider.as_str());
    let access_token = state.oauth.exchange_code(provider, &code, &redirect_uri).await?;
    let profile = state.oauth.fetch_profile(provider, &access_token).await?;

    let user = find_or_create_user(state, provider, profile).await?;
    User::record_login(&state.db, user.id).await?;
    tracing::info!(user_id = %user.id, provider = %provider, "OAuth sign-in");

    Ok(jwt::issue_session(user.id, state.jwt_secret())?)
}

async fn find_or_create_user(
    state: &AppState,
    provider: AuthProvider,
    profile: OAuthProfile,
) -> ApiResult<User> {
    let email = oauth::verified_email(&profile)?.to_string();

    if let Some(user) = User::find_by_email(&state.db, &email).await? {
        oauth::check_link(&user)?;
        return Ok(user);
    }

    let stem = oauth::nickname_stem(profile.name.as_deref());
    let mut nickname = None;
    for _ in 0..NICKNAME_ATTEMPTS {
        let candidate = oauth::nickname_candidate(&stem, rand::thread_rng().gen_range(0..100));
        if !User::nickname_exists(&state.db, &candidate).await? {
            nickname = Some(candidate);
            break;
        }
    }
    let nickname = nickname.ok_or_else(|| {
        ApiError::Conflict(inyeon_shared::messages::DUPLICATE_NICKNAME.to_string())
    })?;

    let user = User::create(
        &state.db,
        CreateUser {
            email,
            nickname,
            password_hash: None,
            provider,
            email_confirmed: true,
            profile_img: profile.picture,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, provider = %provider, "User created from OAuth profile");
    Ok(user)
}
