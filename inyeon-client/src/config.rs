/// Client configuration
///
/// Loaded from the environment the same way the server loads its own:
///
/// - `INYEON_API_URL`: API base URL (default `http://localhost:8080`)
/// - `INYEON_STORAGE_PATH`: local storage file (default `.inyeon/local-storage.json`)
/// - `HOLIDAY_SERVICE_KEY`: public holiday feed key (optional)
/// - `HOLIDAY_API_URL`: holiday feed endpoint override
/// - `CALENDAR_UTC_OFFSET_MINUTES`: month boundaries offset (default 540, KST)
/// - `INYEON_REQUEST_TIMEOUT_SECONDS`: per-request timeout (default 10)

use chrono::FixedOffset;
use inyeon_shared::calendar;
use std::path::PathBuf;
use std::time::Duration;

/// Public holiday feed (`getRestDeInfo`)
pub const HOLIDAY_API_URL: &str =
    "https://apis.data.go.kr/B090041/openapi/service/SpcdeInfoService/getRestDeInfo";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub storage_path: PathBuf,
    pub holiday_service_key: Option<String>,
    pub holiday_url: String,
    pub utc_offset_minutes: i32,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, storage_path: impl Into<PathBuf>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            storage_path: storage_path.into(),
            holiday_service_key: None,
            holiday_url: HOLIDAY_API_URL.to_string(),
            utc_offset_minutes: calendar::DEFAULT_UTC_OFFSET_MINUTES,
            request_timeout: Duration::from_secs(10),
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::new(
            lookup("INYEON_API_URL").unwrap_or_else(|| "http://localhost:8080".to_string()),
            lookup("INYEON_STORAGE_PATH").unwrap_or_else(|| ".inyeon/local-storage.json".to_string()),
        );

        config.holiday_service_key = lookup("HOLIDAY_SERVICE_KEY").filter(|key| !key.is_empty());
        if let Some(url) = lookup("HOLIDAY_API_URL") {
            config.holiday_url = url;
        }
        if let Some(minutes) = lookup("CALENDAR_UTC_OFFSET_MINUTES") {
            config.utc_offset_minutes = minutes.parse()?;
        }
        if let Some(seconds) = lookup("INYEON_REQUEST_TIMEOUT_SECONDS") {
            config.request_timeout = Duration::from_secs(seconds.parse()?);
        }

        if calendar::offset_from_minutes(config.utc_offset_minutes).is_none() {
            anyhow::bail!(
                "CALENDAR_UTC_OFFSET_MINUTES out of range: {}",
                config.utc_offset_minutes
            );
        }

        Ok(config)
    }

    /// Calendar offset; falls back to KST for an out-of-range value
    pub fn calendar_offset(&self) -> FixedOffset {
        calendar::offset_from_minutes(self.utc_offset_minutes).unwrap_or_else(calendar::kst)
    }

    /// Builds `{base_url}/v1{path}`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/v1{}", self.base_url, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<ClientConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClientConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.utc_offset_minutes, 540);
        assert!(config.holiday_service_key.is_none());
        assert_eq!(config.holiday_url, HOLIDAY_API_URL);
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let config = load(&[("INYEON_API_URL", "https://api.inyeon.app/")]).unwrap();
        assert_eq!(config.endpoint("/contacts"), "https://api.inyeon.app/v1/contacts");
    }

    #[test]
    fn test_blank_holiday_key_is_ignored() {
        let config = load(&[("HOLIDAY_SERVICE_KEY", "")]).unwrap();
        assert!(config.holiday_service_key.is_none());
    }

    #[test]
    fn test_rejects_bad_offset() {
        assert!(load(&[("CALENDAR_UTC_OFFSET_MINUTES", "100000")]).is_err());
        assert!(load(&[("CALENDAR_UTC_OFFSET_MINUTES", "soon")]).is_err());
    }
}
