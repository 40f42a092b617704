/// Public holiday feed
///
/// Reads `getRestDeInfo` for one year and keeps the entries flagged
/// `isHoliday = Y`. The feed is loose about shapes: `items` is an empty
/// string when there is nothing, `item` is an object for a single entry and
/// an array otherwise, and `locdate` is a number or a string.

use crate::{
    config::ClientConfig,
    error::{ServiceError, ServiceResult},
};
use async_trait::async_trait;
use inyeon_shared::{calendar::Holiday, messages};
use serde::Deserialize;
use serde_json::Value;

#[async_trait]
pub trait HolidayProvider: Send + Sync {
    async fn holidays(&self, year: i32) -> ServiceResult<Vec<Holiday>>;
}

/// Fixed list, for demo mode and tests
#[derive(Debug, Clone, Default)]
pub struct StaticHolidays(pub Vec<Holiday>);

#[async_trait]
impl HolidayProvider for StaticHolidays {
    async fn holidays(&self, year: i32) -> ServiceResult<Vec<Holiday>> {
        use chrono::Datelike;
        Ok(self.0.iter().filter(|h| h.date.year() == year).cloned().collect())
    }
}

#[derive(Debug, Deserialize)]
struct FeedEnvelope {
    response: FeedResponse,
}

#[derive(Debug, Deserialize)]
struct FeedResponse {
    body: Option<FeedBody>,
}

#[derive(Debug, Deserialize)]
struct FeedBody {
    #[serde(default)]
    items: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedItem {
    date_name: String,
    #[serde(default)]
    is_holiday: String,
    locdate: Value,
}

impl FeedItem {
    fn into_holiday(self) -> Option<Holiday> {
        if self.is_holiday != "Y" {
            return None;
        }

        let locdate = match &self.locdate {
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.clone(),
            _ => return None,
        };
        Holiday::from_locdate(&locdate, self.date_name)
    }
}

/// Parses one feed response body
pub fn parse_holidays(body: &str) -> Result<Vec<Holiday>, serde_json::Error> {
    let envelope: FeedEnvelope = serde_json::from_str(body)?;

    let item = match envelope.response.body.map(|b| b.items) {
        Some(Value::Object(mut items)) => items.remove("item").unwrap_or(Value::Null),
        _ => Value::Null,
    };

    let items: Vec<FeedItem> = match item {
        Value::Array(_) => serde_json::from_value(item)?,
        Value::Object(_) => vec![serde_json::from_value(item)?],
        _ => Vec::new(),
    };

    let mut holidays: Vec<Holiday> = items.into_iter().filter_map(FeedItem::into_holiday).collect();
    holidays.sort_by_key(|h| h.date);
    Ok(holidays)
}

pub struct HolidayClient {
    http: reqwest::Client,
    endpoint: String,
    service_key: String,
}

impl HolidayClient {
    /// `None` when no service key is configured
    pub fn from_config(config: &ClientConfig) -> Option<Self> {
        let service_key = config.holiday_service_key.clone()?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .ok()?;

        Some(Self {
            http,
            endpoint: config.holiday_url.clone(),
            service_key,
        })
    }
}

#[async_trait]
impl HolidayProvider for HolidayClient {
    async fn holidays(&self, year: i32) -> ServiceResult<Vec<Holiday>> {
        let failed = |e: &dyn std::fmt::Display| {
            tracing::error!(year, "Holiday feed failed: {}", e);
            ServiceError::Failed(messages::HOLIDAYS_FAILED)
        };

        let sol_year = year.to_string();
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("serviceKey", self.service_key.as_str()),
                ("solYear", sol_year.as_str()),
                ("numOfRows", "100"),
                ("_type", "json"),
            ])
            .send()
            .await
            .map_err(|e| failed(&e))?;

        if !response.status().is_success() {
            return Err(failed(&response.status()));
        }

        let body = response.text().await.map_err(|e| failed(&e))?;
        let holidays = parse_holidays(&body).map_err(|e| failed(&e))?;

        tracing::debug!(year, count = holidays.len(), "Holidays loaded");
        Ok(holidays)
    }
}
