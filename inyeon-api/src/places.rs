/// Kakao local keyword search client
///
/// The REST key never leaves the server; clients call
/// `GET /v1/places/search?query=` and get the provider's `documents` back.

use inyeon_shared::models::place::{Place, PlaceSearchResponse};
use reqwest::header::AUTHORIZATION;

use crate::config::PlacesConfig;

#[derive(Debug, thiserror::Error)]
pub enum PlaceSearchError {
    #[error("KAKAO_REST_API_KEY is not set")]
    NotConfigured,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Provider returned {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Debug, Clone)]
pub struct PlaceSearchClient {
    http: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
}

impl PlaceSearchClient {
    pub fn new(http: reqwest::Client, config: &PlacesConfig) -> Self {
        Self {
            http,
            api_key: config.kakao_rest_api_key.clone(),
            endpoint: config.search_url.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Searches places by keyword
    ///
    /// A blank keyword returns nothing without calling the provider.
    pub async fn search(&self, keyword: &str) -> Result<Vec<Place>, PlaceSearchError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Ok(Vec::new());
        }
        let api_key = self.api_key.as_deref().ok_or(PlaceSearchError::NotConfigured)?;

        let response = self
            .http
            .get(&self.endpoint)
            .header(AUTHORIZATION, authorization_value(api_key))
            .query(&[("query", keyword)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PlaceSearchError::Status(response.status()));
        }

        let body: PlaceSearchResponse = response.json().await?;
        tracing::debug!(keyword, results = body.documents.len(), "Place search");

        Ok(body.documents)
    }
}

fn authorization_value(api_key: &str) -> String {
    format!("KakaoAK {}", api_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(key: Option<&str>) -> PlaceSearchClient {
        PlaceSearchClient::new(
            reqwest::Client::new(),
            &PlacesConfig {
                kakao_rest_api_key: key.map(str::to_string),
                // Unroutable; tests below never reach the network
                search_url: "http://127.0.0.1:9/search".to_string(),
            },
        )
    }

    #[test]
    fn test_authorization_header() {
        assert_eq!(authorization_value("abc123"), "KakaoAK abc123");
    }

    #[tokio::test]
    async fn test_blank_keyword_returns_nothing() {
        let results = client(None).search("   ").await.expect("Blank search should succeed");
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_missing_key() {
        let search = client(None);
        assert!(!search.is_configured());
        assert!(matches!(
            search.search("강남역").await,
            Err(PlaceSearchError::NotConfigured)
        ));
    }
}
