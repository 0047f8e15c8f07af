//! Background job: purge expired alerts from the cached snapshot.
//!
//! Alerts expire between two refreshes; this job removes them on its own interval
//! so stale entries never outlive the hour.

use std::{sync::Arc, time::Duration};

use log::{debug, error, info};
use tokio::{sync::watch, task::JoinHandle, time};

use crate::{
    store::{AlertStore, StorageError},
    time_source::TimeSource,
};

/// Periodic sweep deleting alerts whose expiry has passed.
pub struct CleanupJob {
    store: Arc<AlertStore>,
    time_source: Arc<dyn TimeSource>,
    interval: Duration,
}

impl CleanupJob {
    pub fn new(store: Arc<AlertStore>, time_source: Arc<dyn TimeSource>, interval: Duration) -> Self {
        CleanupJob {
            store,
            time_source,
            interval,
        }
    }

    /// Deletes the alerts expired at the current instant.
    ///
    /// # Returns
    ///
    /// The number of deleted alerts.
    pub async fn run_once(&self) -> Result<usize, StorageError> {
        let now = self.time_source.now();
        let deleted = self.store.delete_expired_alerts(now).await?;

        if deleted > 0 {
            info!("cleaned {} expired alerts", deleted);
        } else {
            debug!("no expired alerts to clean");
        }

        Ok(deleted)
    }

    /// Spawns the job. The first sweep happens immediately.
    ///
    /// Failures are logged and the job keeps running. The task stops when
    /// `shutdown` flips to `true` or its sender is dropped.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                "cleaning expired alerts every {} seconds",
                self.interval.as_secs()
            );
            let mut interval = time::interval(self.interval);

            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = shutdown.changed() => {
                        debug!("alert cleanup stopped");
                        break;
                    }
                }

                if let Err(e) = self.run_once().await {
                    error!("alert cleanup failed: {}", e);
                }
            }
        })
    }
}
