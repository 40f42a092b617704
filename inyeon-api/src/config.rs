/// Configuration for the API server
///
/// Loaded from environment variables (and `.env` in development).
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
/// - `API_HOST` / `API_PORT`: bind address (default: 0.0.0.0:8080)
/// - `API_PUBLIC_URL`: externally reachable base URL, used in emailed links
///   and OAuth callbacks (default: http://localhost:8080)
/// - `CORS_ORIGINS`: comma separated origins, `*` for permissive (default: *)
/// - `PRODUCTION`: enables HSTS (default: false)
/// - `JWT_SECRET`: session signing secret, at least 32 characters (required)
/// - `KAKAO_REST_API_KEY`: place search key (optional; search is disabled without it)
/// - `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET`: Google sign-in (optional)
/// - `KAKAO_CLIENT_ID` / `KAKAO_CLIENT_SECRET`: Kakao sign-in (optional)
/// - `REDIRECT_TO`: where the browser lands after OAuth sign-in
/// - `REDIRECT_TO_FINISH_SIGNUP`: where email confirmation links land
/// - `REDIRECT_TO_CHANGE_PASSWORD`: the change-password page recovery links open
/// - `CALENDAR_UTC_OFFSET_MINUTES`: calendar offset (default: 540, KST)
///
/// # Example
///
/// ```no_run
/// use inyeon_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use inyeon_shared::calendar::{offset_from_minutes, DEFAULT_UTC_OFFSET_MINUTES};
use serde::{Deserialize, Serialize};
use std::env;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub oauth: OAuthConfig,
    pub places: PlacesConfig,
    pub redirects: RedirectConfig,
    pub calendar: CalendarConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Base URL without trailing slash
    pub public_url: String,

    pub cors_origins: Vec<String>,

    /// Enables HSTS
    pub production: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// At least 32 characters. Generate with `openssl rand -hex 32`
    pub secret: String,
}

/// OAuth client credentials; a provider without credentials is disabled
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OAuthConfig {
    pub google: Option<OAuthClientConfig>,
    pub kakao: Option<OAuthClientConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthClientConfig {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacesConfig {
    pub kakao_rest_api_key: Option<String>,
    pub search_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectConfig {
    /// After OAuth sign-in
    pub after_sign_in: String,
    /// After following the email confirmation link
    pub finish_signup: String,
    /// Change-password page opened by recovery links
    pub change_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    pub utc_offset_minutes: i32,
}

/// Default Kakao local keyword search endpoint
pub const KAKAO_KEYWORD_SEARCH_URL: &str = "https://dapi.kakao.com/v2/local/search/keyword.json";

impl Config {
    /// Loads `.env` if present, then reads the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value does
    /// not parse
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let opt = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = var("API_HOST", "0.0.0.0");
        let port = var("API_PORT", "8080").parse::<u16>()?;
        let public_url = var("API_PUBLIC_URL", &format!("http://localhost:{}", port))
            .trim_end_matches('/')
            .to_string();
        let cors_origins = var("CORS_ORIGINS", "*")
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();
        let production = var("PRODUCTION", "false").parse::<bool>()?;

        let database_url = opt("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;
        let max_connections = var("DATABASE_MAX_CONNECTIONS", "10").parse::<u32>()?;

        let jwt_secret = opt("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;
        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let client = |id_key: &str, secret_key: &str| match (opt(id_key), opt(secret_key)) {
            (Some(client_id), Some(client_secret)) => Some(OAuthClientConfig {
                client_id,
                client_secret,
            }),
            _ => None,
        };

        let frontend = var("REDIRECT_TO", "http://localhost:3000");
        let utc_offset_minutes = var(
            "CALENDAR_UTC_OFFSET_MINUTES",
            &DEFAULT_UTC_OFFSET_MINUTES.to_string(),
        )
        .parse::<i32>()?;
        if offset_from_minutes(utc_offset_minutes).is_none() {
            anyhow::bail!("CALENDAR_UTC_OFFSET_MINUTES must be within ±1439");
        }

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                public_url,
                cors_origins,
                production,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig { secret: jwt_secret },
            oauth: OAuthConfig {
                google: client("GOOGLE_CLIENT_ID", "GOOGLE_CLIENT_SECRET"),
                kakao: client("KAKAO_CLIENT_ID", "KAKAO_CLIENT_SECRET"),
            },
            places: PlacesConfig {
                kakao_rest_api_key: opt("KAKAO_REST_API_KEY"),
                search_url: var("KAKAO_SEARCH_URL", KAKAO_KEYWORD_SEARCH_URL),
            },
            redirects: RedirectConfig {
                finish_signup: var("REDIRECT_TO_FINISH_SIGNUP", &format!("{}/signup/finish", frontend)),
                change_password: var(
                    "REDIRECT_TO_CHANGE_PASSWORD",
                    &format!("{}/change-password", frontend),
                ),
                after_sign_in: frontend,
            },
            calendar: CalendarConfig { utc_offset_minutes },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Redirect URI registered with the OAuth provider
    pub fn oauth_callback_url(&self, provider: &str) -> String {
        format!("{}/v1/auth/oauth/{}/callback", self.api.public_url, provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("DATABASE_URL", "postgresql://localhost/inyeon"),
        ("JWT_SECRET", "test-secret-key-at-least-32-bytes-long"),
    ];

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&REQUIRED)).expect("Config should load");

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.api.public_url, "http://localhost:8080");
        assert_eq!(config.api.cors_origins, vec!["*".to_string()]);
        assert!(!config.api.production);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.calendar.utc_offset_minutes, 540);
        assert!(config.oauth.google.is_none());
        assert!(config.places.kakao_rest_api_key.is_none());
        assert_eq!(config.places.search_url, KAKAO_KEYWORD_SEARCH_URL);
        assert_eq!(config.redirects.change_password, "http://localhost:3000/change-password");
    }

    #[test]
    fn test_missing_required() {
        assert!(Config::from_lookup(lookup_from(&[REQUIRED[1]])).is_err());
        assert!(Config::from_lookup(lookup_from(&[REQUIRED[0]])).is_err());
    }

    #[test]
    fn test_short_jwt_secret_rejected() {
        let result = Config::from_lookup(lookup_from(&[REQUIRED[0], ("JWT_SECRET", "short")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_oauth_needs_both_credentials() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("GOOGLE_CLIENT_ID", "gid"));
        pairs.push(("KAKAO_CLIENT_ID", "kid"));
        pairs.push(("KAKAO_CLIENT_SECRET", "ksecret"));

        let config = Config::from_lookup(lookup_from(&pairs)).expect("Config should load");
        assert!(config.oauth.google.is_none());
        assert_eq!(config.oauth.kakao.map(|k| k.client_id), Some("kid".to_string()));
    }

    #[test]
    fn test_callback_url() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("API_PUBLIC_URL", "https://api.inyeon.app/"));
        pairs.push(("CORS_ORIGINS", "https://inyeon.app, https://www.inyeon.app"));

        let config = Config::from_lookup(lookup_from(&pairs)).expect("Config should load");
        assert_eq!(
            config.oauth_callback_url("kakao"),
            "https://api.inyeon.app/v1/auth/oauth/kakao/callback"
        );
        assert_eq!(config.api.cors_origins.len(), 2);
    }

    #[test]
    fn test_invalid_offset_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("CALENDAR_UTC_OFFSET_MINUTES", "5000"));
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());
    }
}
