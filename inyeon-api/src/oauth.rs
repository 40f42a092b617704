/// Google and Kakao sign-in
///
/// Authorization code flow:
///
/// 1. `GET /v1/auth/oauth/{provider}` returns the provider's authorize URL.
///    Its `state` is a short-lived HS256 token naming the provider, so the
///    callback needs no server-side storage.
/// 2. The provider redirects to `/v1/auth/oauth/{provider}/callback` with a
///    `code`; we exchange it, read the profile and find or create the user.
/// 3. The browser is sent to `REDIRECT_TO` with the session in the URL
///    fragment (`#access_token=..&refresh_token=..`).
///
/// Google is asked for `access_type=offline&prompt=consent` and Kakao for
/// `auth_type=reauthenticate`, so credentials are re-entered on every sign-in.
///
/// Only emails the provider has verified are used. An existing account with
/// the same email is signed in unless it is an unconfirmed password account,
/// which anyone could have registered with someone else's address.

use chrono::{Duration, Utc};
use inyeon_shared::{
    auth::jwt::Session,
    models::user::{AuthProvider, User},
    validation::signup::{is_nickname_char, NICKNAME_MAX_CHARS, NICKNAME_MIN_CHARS},
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::config::{OAuthClientConfig, OAuthConfig};

/// How long an authorize URL stays usable
const STATE_TTL_MINUTES: i64 = 10;

/// Fallback nickname stem when the provider name has too few usable chars
const NICKNAME_FALLBACK: &str = "인연";

/// Digits appended to a generated nickname
const NICKNAME_SUFFIX_DIGITS: usize = 2;

#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("{0} sign-in is not configured")]
    NotConfigured(AuthProvider),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Code exchange failed: {0}")]
    Exchange(String),

    #[error("Profile request failed: {0}")]
    Profile(String),

    #[error("Provider did not share an email address")]
    MissingEmail,

    #[error("Provider has not verified the email address")]
    UnverifiedEmail,

    #[error("An unconfirmed account already uses this email")]
    UnconfirmedAccount,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Provider endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub authorize: &'static str,
    pub token: &'static str,
    pub userinfo: &'static str,
    pub scope: Option<&'static str>,
}

pub fn endpoints(provider: AuthProvider) -> Option<ProviderEndpoints> {
    match provider {
        AuthProvider::Google => Some(ProviderEndpoints {
            authorize: "https://accounts.google.com/o/oauth2/v2/auth",
            token: "https://oauth2.googleapis.com/token",
            userinfo: "https://openidconnect.googleapis.com/v1/userinfo",
            scope: Some("openid email profile"),
        }),
        AuthProvider::Kakao => Some(ProviderEndpoints {
            authorize: "https://kauth.kakao.com/oauth/authorize",
            token: "https://kauth.kakao.com/oauth/token",
            userinfo: "https://kapi.kakao.com/v2/user/me",
            scope: None,
        }),
        AuthProvider::Email => None,
    }
}

/// Parses the `{provider}` path segment
pub fn parse_provider(segment: &str) -> Result<AuthProvider, OAuthError> {
    AuthProvider::from_oauth_segment(segment)
        .ok_or_else(|| OAuthError::UnknownProvider(segment.to_string()))
}

/// Signed `state` parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthStateClaims {
    pub provider: AuthProvider,
    pub nonce: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn create_state(provider: AuthProvider, secret: &str) -> Result<String, OAuthError> {
    let now = Utc::now();
    let claims = OAuthStateClaims {
        provider,
        nonce: Uuid::new_v4().simple().to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::minutes(STATE_TTL_MINUTES)).timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| OAuthError::InvalidState(e.to_string()))
}

/// Checks signature, expiry and that the callback is for the same provider
pub fn validate_state(
    state: &str,
    provider: AuthProvider,
    secret: &str,
) -> Result<OAuthStateClaims, OAuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let claims = decode::<OAuthStateClaims>(
        state,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| OAuthError::InvalidState(e.to_string()))?
    .claims;

    if claims.provider != provider {
        return Err(OAuthError::InvalidState(format!(
            "State issued for {}, callback for {}",
            claims.provider, provider
        )));
    }

    Ok(claims)
}

/// Builds the provider's authorize URL
pub fn authorize_url(
    provider: AuthProvider,
    client: &OAuthClientConfig,
    redirect_uri: &str,
    state: &str,
) -> Result<Url, OAuthError> {
    let endpoints = endpoints(provider).ok_or_else(|| OAuthError::UnknownProvider(provider.to_string()))?;
    let mut url = Url::parse(endpoints.authorize).map_err(|e| OAuthError::Exchange(e.to_string()))?;

    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("client_id", &client.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("state", state);

        if let Some(scope) = endpoints.scope {
            query.append_pair("scope", scope);
        }

        match provider {
            AuthProvider::Google => {
                query
                    .append_pair("access_type", "offline")
                    .append_pair("prompt", "consent");
            }
            AuthProvider::Kakao => {
                query.append_pair("auth_type", "reauthenticate");
            }
            AuthProvider::Email => {}
        }
    }

    Ok(url)
}

/// The parts of a provider profile we keep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OAuthProfile {
    pub email: Option<String>,
    pub email_verified: bool,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    name: Option<String>,
    picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KakaoUser {
    #[serde(default)]
    kakao_account: KakaoAccount,
}

#[derive(Debug, Default, Deserialize)]
struct KakaoAccount {
    email: Option<String>,
    #[serde(default)]
    is_email_valid: bool,
    #[serde(default)]
    is_email_verified: bool,
    #[serde(default)]
    profile: KakaoProfile,
}

#[derive(Debug, Default, Deserialize)]
struct KakaoProfile {
    nickname: Option<String>,
    profile_image_url: Option<String>,
}

/// Reads a userinfo body for the given provider
pub fn parse_profile(provider: AuthProvider, body: &str) -> Result<OAuthProfile, OAuthError> {
    let profile = match provider {
        AuthProvider::Google => {
            let info: GoogleUserInfo =
                serde_json::from_str(body).map_err(|e| OAuthError::Profile(e.to_string()))?;
            OAuthProfile {
                email: info.email,
                email_verified: info.email_verified,
                name: info.name,
                picture: info.picture,
            }
        }
        AuthProvider::Kakao => {
            let user: KakaoUser =
                serde_json::from_str(body).map_err(|e| OAuthError::Profile(e.to_string()))?;
            let account = user.kakao_account;
            OAuthProfile {
                email: account.email,
                email_verified: account.is_email_valid && account.is_email_verified,
                name: account.profile.nickname,
                picture: account.profile.profile_image_url,
            }
        }
        AuthProvider::Email => return Err(OAuthError::UnknownProvider(provider.to_string())),
    };

    Ok(profile)
}

/// The profile's email, if the provider vouches for it
pub fn verified_email(profile: &OAuthProfile) -> Result<&str, OAuthError> {
    let email = profile.email.as_deref().ok_or(OAuthError::MissingEmail)?;
    if !profile.email_verified {
        return Err(OAuthError::UnverifiedEmail);
    }
    Ok(email)
}

/// Whether an OAuth sign-in may take over `existing`
pub fn check_link(existing: &User) -> Result<(), OAuthError> {
    if existing.provider == AuthProvider::Email && !existing.email_confirmed {
        return Err(OAuthError::UnconfirmedAccount);
    }
    Ok(())
}

/// Token exchange and profile lookup against the real providers
#[derive(Debug, Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
    config: OAuthConfig,
}

impl OAuthClient {
    pub fn new(http: reqwest::Client, config: OAuthConfig) -> Self {
        Self { http, config }
    }

    pub fn client_config(&self, provider: AuthProvider) -> Result<&OAuthClientConfig, OAuthError> {
        match provider {
            AuthProvider::Google => self.config.google.as_ref(),
            AuthProvider::Kakao => self.config.kakao.as_ref(),
            AuthProvider::Email => None,
        }
        .ok_or(OAuthError::NotConfigured(provider))
    }

    /// Exchanges an authorization code for a provider access token
    pub async fn exchange_code(
        &self,
        provider: AuthProvider,
        code: &str,
        redirect_uri: &str,
    ) -> Result<String, OAuthError> {
        let client = self.client_config(provider)?;
        let endpoints = endpoints(provider).ok_or(OAuthError::NotConfigured(provider))?;

        let response = self
            .http
            .post(endpoints.token)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
                ("client_id", client.client_id.as_str()),
                ("client_secret", client.client_secret.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OAuthError::Exchange(format!("{}: {}", status, body)));
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    pub async fn fetch_profile(
        &self,
        provider: AuthProvider,
        access_token: &str,
    ) -> Result<OAuthProfile, OAuthError> {
        let endpoints = endpoints(provider).ok_or(OAuthError::NotConfigured(provider))?;

        let response = self
            .http
            .get(endpoints.userinfo)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OAuthError::Profile(response.status().to_string()));
        }

        let body = response.text().await?;
        parse_profile(provider, &body)
    }
}

/// Nickname stem derived from the provider's display name
///
/// Keeps only allowed characters and leaves room for the numeric suffix.
pub fn nickname_stem(name: Option<&str>) -> String {
    let stem: String = name
        .unwrap_or_default()
        .chars()
        .filter(|c| is_nickname_char(*c) && !c.is_whitespace())
        .take(NICKNAME_MAX_CHARS - NICKNAME_SUFFIX_DIGITS)
        .collect();

    if stem.chars().count() < NICKNAME_MIN_CHARS {
        NICKNAME_FALLBACK.to_string()
    } else {
        stem
    }
}

/// `stem` plus a two-digit suffix
pub fn nickname_candidate(stem: &str, suffix: u8) -> String {
    format!("{}{:02}", stem, suffix % 100)
}

/// Browser redirect carrying a fresh session in the fragment
pub fn session_redirect(base: &str, session: &Session) -> String {
    let fragment = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("access_token", &session.access_token)
        .append_pair("refresh_token", &session.refresh_token)
        .append_pair("expires_in", &session.expires_in.to_string())
        .append_pair("token_type", &session.token_type)
        .finish();

    format!("{}#{}", base, fragment)
}

/// Browser redirect reporting a failed sign-in
pub fn error_redirect(base: &str, description: &str) -> String {
    let fragment = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("error", "oauth_failed")
        .append_pair("error_description", description)
        .finish();

    format!("{}#{}", base, fragment)
}
