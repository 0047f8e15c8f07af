//! Alert synchronization with the remote API.
//!
//! This module provides the [`AlertSyncEngine`] which refreshes the cached alert
//! snapshot, either on demand or on a fixed polling interval, and publishes the
//! outcome of every refresh as a [`SyncEvent`].

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use log::{debug, error, info, warn};
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
    time,
};

use crate::{
    store::{Alert, AlertStore, Platform},
    warframe::{AlertFetcher, FetchError},
};

/// Capacity of the sync event channel.
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Outcome of a refresh, published to every subscriber.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncEvent {
    /// The snapshot of `platform` was fetched and stored.
    Refreshed {
        platform: Platform,
        alerts: Vec<Alert>,
    },
    /// Fetching failed; the stored snapshot was left untouched.
    FetchFailed {
        platform: Platform,
        error: FetchError,
    },
    /// Fetching succeeded but the snapshot could not be stored.
    StoreFailed { platform: Platform, message: String },
}

/// What happened to a refresh request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// No refresh was running, a new one started.
    Started,
    /// A refresh is in flight; this request runs right after it.
    Queued,
    /// The engine is shut down.
    Ignored,
}

/// In-flight guard of the engine.
///
/// At most one refresh runs at a time. Requests arriving meanwhile share a single
/// queued slot, the most recent platform winning.
#[derive(Default)]
struct RefreshSlot {
    /// Handle of the task running refreshes, if any
    worker: Option<JoinHandle<()>>,
    /// Platform to refresh once the running refresh completes
    queued: Option<Platform>,
    /// Set on shutdown; no refresh starts afterwards
    closed: bool,
}

/// Keeps the cached alert snapshot in sync with the remote API.
///
/// # Concurrency
///
/// [`AlertSyncEngine::refresh`] never runs two fetches at once, so concurrent
/// requests cannot race on the order of `replace_alerts` calls. The stored
/// snapshot is always the result of the last refresh that succeeded.
pub struct AlertSyncEngine {
    /// Fetcher issuing the API calls and filtering expired alerts
    fetcher: Arc<AlertFetcher>,
    /// Store receiving the snapshots
    store: Arc<AlertStore>,
    /// In-flight guard
    slot: Arc<Mutex<RefreshSlot>>,
    /// Refresh outcomes
    events: broadcast::Sender<SyncEvent>,
    /// Flipped on shutdown; interrupts the fetch in flight
    stop: watch::Sender<bool>,
}

impl AlertSyncEngine {
    pub fn new(fetcher: AlertFetcher, store: Arc<AlertStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (stop, _) = watch::channel(false);

        AlertSyncEngine {
            fetcher: Arc::new(fetcher),
            store,
            slot: Arc::new(Mutex::new(RefreshSlot::default())),
            events,
            stop,
        }
    }

    /// Subscribes to the outcome of every subsequent refresh.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Requests a refresh of the alerts of `platform`.
    ///
    /// The fetch and the store update run on a background task; the result is
    /// published as a [`SyncEvent`]. If a refresh is already in flight, the request
    /// is queued and replaces any request queued before it.
    pub fn refresh(&self, platform: Platform) -> RefreshOutcome {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);

        if slot.closed {
            debug!("engine is shut down, ignoring refresh of {}", platform);
            return RefreshOutcome::Ignored;
        }

        if slot.worker.is_some() {
            if let Some(previous) = slot.queued.replace(platform) {
                debug!("queued refresh of {} replaces refresh of {}", platform, previous);
            }
            debug!("refresh in flight, queued refresh of {}", platform);
            return RefreshOutcome::Queued;
        }

        let fetcher = Arc::clone(&self.fetcher);
        let store = Arc::clone(&self.store);
        let events = self.events.clone();
        let worker_slot = Arc::clone(&self.slot);
        let mut stop = self.stop.subscribe();

        // The worker cannot observe the slot before the handle is stored: it needs
        // the lock that is held until this function returns.
        slot.worker = Some(tokio::spawn(async move {
            let mut platform = platform;
            loop {
                Self::run_refresh(&fetcher, &store, &events, &mut stop, platform).await;

                let next = {
                    let mut slot = worker_slot.lock().unwrap_or_else(PoisonError::into_inner);
                    let next = slot.queued.take();
                    if next.is_none() {
                        slot.worker = None;
                    }
                    next
                };

                match next {
                    Some(next) => platform = next,
                    None => break,
                }
            }
        }));

        RefreshOutcome::Started
    }

    /// Refreshes the alerts of the stored platform.
    ///
    /// # Returns
    ///
    /// `None` if no platform has been selected yet.
    pub async fn refresh_current(&self) -> Option<RefreshOutcome> {
        let Some(platform) = self.store.get_platform().await else {
            debug!("no platform selected, skipping alert refresh");
            return None;
        };
        Some(self.refresh(platform))
    }

    /// Starts a background task refreshing the stored platform every `interval`.
    ///
    /// The first refresh happens immediately. The task stops when `shutdown`
    /// flips to `true` or its sender is dropped.
    pub fn spawn_polling(
        self: &Arc<Self>,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let engine = Arc::clone(self);

        tokio::spawn(async move {
            info!("polling alerts every {} seconds", interval.as_secs());
            let mut interval = time::interval(interval);

            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = shutdown.changed() => {
                        debug!("alert polling stopped");
                        break;
                    }
                }

                engine.refresh_current().await;
            }
        })
    }

    /// Stops accepting refreshes and waits for the one in flight, if any.
    ///
    /// A refresh still fetching is dropped without touching the store. A refresh
    /// already writing its snapshot finishes the write before this returns, so the
    /// document on disk always matches the snapshot in memory.
    pub async fn shutdown(&self) {
        let worker = {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            slot.closed = true;
            slot.queued = None;
            slot.worker.take()
        };
        self.stop.send_replace(true);

        if let Some(worker) = worker {
            info!("waiting for the in-flight alert refresh");
            if let Err(e) = worker.await {
                error!("alert refresh ended abnormally: {}", e);
            }
        }
    }

    async fn run_refresh(
        fetcher: &AlertFetcher,
        store: &AlertStore,
        events: &broadcast::Sender<SyncEvent>,
        stop: &mut watch::Receiver<bool>,
        platform: Platform,
    ) {
        debug!("refreshing alerts of {}", platform);

        let fetched = tokio::select! {
            fetched = fetcher.fetch(platform) => fetched,
            _ = stop.wait_for(|stopped| *stopped) => {
                debug!("refresh of {} dropped on shutdown", platform);
                return;
            }
        };

        let event = match fetched {
            Ok(alerts) => match store.replace_alerts(alerts.clone()).await {
                Ok(()) => SyncEvent::Refreshed { platform, alerts },
                Err(e) => {
                    error!("failed to store alerts of {}: {}", platform, e);
                    SyncEvent::StoreFailed {
                        platform,
                        message: e.to_string(),
                    }
                }
            },
            Err(error) => {
                warn!("failed to fetch alerts of {}: {}", platform, error);
                SyncEvent::FetchFailed { platform, error }
            }
        };

        if events.send(event).is_err() {
            debug!("no subscriber for the refresh of {}", platform);
        }
    }
}
