//! Alert fetching and expiry filtering.
//!
//! This module provides the [`AlertFetcher`], which turns the raw records of the
//! alert API into the [`Alert`]s worth caching.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde_json::Value;

use crate::{
    store::{Alert, Platform},
    time_source::TimeSource,
    warframe::{FetchError, Requester, response_structs::AlertResponse},
};

/// Fetches the alerts of a platform and keeps only those that have not expired.
pub struct AlertFetcher {
    /// Requester issuing the HTTP calls
    requester: Arc<dyn Requester>,
    /// Clock the expiry filter compares against
    time_source: Arc<dyn TimeSource>,
}

impl AlertFetcher {
    pub fn new(requester: Arc<dyn Requester>, time_source: Arc<dyn TimeSource>) -> Self {
        AlertFetcher {
            requester,
            time_source,
        }
    }

    /// Fetches the current alerts of `platform`.
    ///
    /// Only records whose expiry parses and is strictly after the fetch time are
    /// kept. Missing mission types and rewards become `"N/A"`.
    ///
    /// # Errors
    ///
    /// Returns the [`FetchError`] of the requester on transport, HTTP or body
    /// failures. Individual malformed records are skipped, not reported.
    pub async fn fetch(&self, platform: Platform) -> Result<Vec<Alert>, FetchError> {
        let records = self.requester.get_alerts(platform).await?;
        let fetch_time = self.time_source.now();

        let alerts = Self::filter_alerts(records, fetch_time);
        info!(
            "fetched {} active alerts for platform {}",
            alerts.len(),
            platform
        );

        Ok(alerts)
    }

    /// Converts raw records into alerts expiring strictly after `fetch_time`.
    fn filter_alerts(records: Vec<Value>, fetch_time: DateTime<Utc>) -> Vec<Alert> {
        records
            .into_iter()
            .filter_map(|record| {
                let response: AlertResponse = match serde_json::from_value(record) {
                    Ok(response) => response,
                    Err(e) => {
                        warn!("ignore malformed alert record: {}", e);
                        return None;
                    }
                };

                let Some(expiry) = response.expiry() else {
                    debug!("ignore alert with unparsable expiry {:?}", response.expiry);
                    return None;
                };

                if expiry <= fetch_time {
                    debug!("ignore alert expired at {}", expiry.to_rfc3339());
                    return None;
                }

                Some(Alert::new(&response.mission_type(), &response.reward(), expiry))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{time_source::MockTimeSource, warframe::MockRequester};
    use chrono::TimeZone;
    use mockall::predicate::eq;
    use serde_json::json;

    fn fetch_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn create_fetcher(requester: MockRequester) -> AlertFetcher {
        let mut time_source = MockTimeSource::new();
        time_source.expect_now().return_const(fetch_time());
        AlertFetcher::new(Arc::new(requester), Arc::new(time_source))
    }

    #[tokio::test]
    async fn test_fetch_keeps_only_future_expiries() {
        let mut requester = MockRequester::new();
        requester
            .expect_get_alerts()
            .with(eq(Platform::Pc))
            .times(1)
            .returning(|_| {
                Ok(vec![
                    json!({"missionType": "Old", "reward": "a", "expiry": "2023-12-31T23:59:59Z"}),
                    json!({"missionType": "New", "reward": "b", "expiry": "2024-01-02T00:00:00Z"}),
                ])
            });

        let alerts = create_fetcher(requester).fetch(Platform::Pc).await.unwrap();

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].mission_type, "New");
        assert_eq!(
            alerts[0].expiry,
            Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_fetch_excludes_expiry_equal_to_fetch_time() {
        let mut requester = MockRequester::new();
        requester.expect_get_alerts().returning(|_| {
            Ok(vec![
                json!({"missionType": "Edge", "reward": "a", "expiry": "2024-01-01T00:00:00Z"}),
            ])
        });

        let alerts = create_fetcher(requester).fetch(Platform::Pc).await.unwrap();

        assert!(alerts.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_excludes_unparsable_and_missing_expiry() {
        let mut requester = MockRequester::new();
        requester.expect_get_alerts().returning(|_| {
            Ok(vec![
                json!({"missionType": "Bad", "reward": "a", "expiry": "soon"}),
                json!({"missionType": "Missing", "reward": "a"}),
                json!("not an object"),
                json!({"expiry": "2024-01-01T06:00:00Z"}),
            ])
        });

        let alerts = create_fetcher(requester).fetch(Platform::Pc).await.unwrap();

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].mission_type, "N/A");
        assert_eq!(alerts[0].reward, "N/A");
    }

    #[tokio::test]
    async fn test_fetch_keeps_record_with_scalar_mission() {
        let mut requester = MockRequester::new();
        requester.expect_get_alerts().returning(|_| {
            Ok(vec![
                json!({"missionType": "Spy", "reward": "Forma", "expiry": "2024-01-02T00:00:00Z", "mission": "oops"}),
                json!({"missionType": "Rescue", "reward": "Forma", "expiry": "2024-01-02T00:00:00Z", "mission": 3}),
            ])
        });

        let alerts = create_fetcher(requester).fetch(Platform::Pc).await.unwrap();

        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].mission_type, "Spy");
        assert_eq!(alerts[1].mission_type, "Rescue");
    }

    #[tokio::test]
    async fn test_fetch_propagates_requester_error() {
        let mut requester = MockRequester::new();
        requester
            .expect_get_alerts()
            .returning(|_| Err(FetchError::Status(500)));

        let result = create_fetcher(requester).fetch(Platform::Ps4).await;

        assert_eq!(result, Err(FetchError::Status(500)));
    }
}
