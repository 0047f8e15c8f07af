//! HTTP client for the Warframe alert API.
//!
//! This module provides the [`WarframeRequester`] struct for requesting the raw
//! alert records of a platform.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use mockall::automock;
use reqwest::Client;
use serde_json::Value;

use crate::{store::Platform, warframe::FetchError};

/// HTTP client for requesting alerts from the Warframe API.
///
/// # Examples
///
/// ```ignore
/// let requester = WarframeRequester::new("https://api.warframestat.us", Duration::from_secs(10))?;
/// let records = requester.get_alerts(Platform::Pc).await?;
/// println!("Alerts: {:?}", records);
/// ```
pub struct WarframeRequester {
    /// Base URL of the API, without trailing slash
    url: String,
    /// HTTP client
    client: Client,
}

/// Trait for requesting raw alert records.
///
/// This trait abstracts the HTTP operations for easier testing with mocks.
#[automock]
#[async_trait]
pub trait Requester: Send + Sync {
    /// Fetches the raw alert records of `platform`.
    async fn get_alerts(&self, platform: Platform) -> Result<Vec<Value>, FetchError>;
}

impl WarframeRequester {
    /// Create a new [WarframeRequester].
    ///
    /// # Arguments
    ///
    /// * `url` - The base URL of the alert API.
    /// * `timeout` - Upper bound for a whole request, connection included.
    pub fn new(url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(WarframeRequester {
            url: url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl Requester for WarframeRequester {
    /// Request `/{platform}/alerts` to get the current alerts.
    ///
    /// This api call returns a json array of alerts:
    /// ```json
    /// [
    ///   { "missionType": "Survival", "reward": "Nitain Extract", "expiry": "2024-01-02T00:00:00.000Z" },
    ///   { "mission": { "type": "Defense", "reward": { "asString": "Orokin Reactor" } }, "expiry": "..." }
    /// ]
    /// ```
    /// Records are returned untouched, see [`AlertFetcher`](crate::warframe::AlertFetcher)
    /// for their interpretation.
    async fn get_alerts(&self, platform: Platform) -> Result<Vec<Value>, FetchError> {
        let url = format!("{}/{}/alerts", &self.url, platform.path_segment());
        info!("request alerts for platform {}", platform);
        debug!("request {}", &url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let records: Vec<Value> = response
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))?;

        debug!("response from {} -> {} records", &url, records.len());

        Ok(records)
    }
}
