//! Application context wiring the store, the alert synchronization and the
//! reminders together.
//!
//! This module provides the [`App`] which owns every long-lived component and
//! exposes the operations the console calls.
//!
//! # Runtime Behavior
//!
//! Once started, the application runs in the background:
//!
//! 1. **Alert Polling Task**: refreshes the alerts of the selected platform every
//!    `polling_interval` seconds
//! 2. **Alert Cleanup Task**: deletes expired alerts every `cleanup_interval` seconds
//! 3. **Reminder Timers**: one task per scheduled reminder
//!
//! Results reach the console through the channels returned by
//! [`App::subscribe_sync`] and [`App::subscribe_reminder_fired`].

use std::{
    path::Path,
    sync::{Arc, Mutex, PoisonError},
};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use log::{error, info, warn};
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
};

use crate::{
    alerts::{AlertSyncEngine, CleanupJob, RefreshOutcome, SyncEvent},
    config::{Config, Schedule},
    reminders::{ReminderError, ReminderFired, ReminderScheduler},
    store::{Alert, AlertStore, Platform, Reminder, ReminderType, StorageError},
    time_source::{SystemTimeSource, TimeSource},
    warframe::{AlertFetcher, Requester, WarframeRequester},
};

/// Name of the store document inside the data directory.
const STORE_FILE_NAME: &str = "store.json";

/// Top-level application context.
///
/// # Lifecycle
///
/// Subscribe to the event channels, then call [`App::start`]. Call
/// [`App::shutdown`] before exiting so that timers and background jobs stop
/// cleanly.
///
/// # Examples
///
/// ```ignore
/// let config = Config::load("config.yaml")?;
/// let app = App::new(&config, Path::new("./data")).await?;
///
/// let mut sync_events = app.subscribe_sync();
/// app.start().await;
///
/// app.set_platform(Platform::Pc).await?;
/// println!("{:?}", sync_events.recv().await?);
///
/// app.shutdown().await;
/// ```
pub struct App {
    /// Durable cache shared by every component
    store: Arc<AlertStore>,
    /// Alert refreshes
    engine: Arc<AlertSyncEngine>,
    /// Reminder timers
    scheduler: ReminderScheduler,
    /// Clock shared by the components
    time_source: Arc<dyn TimeSource>,
    /// Background job intervals
    schedule: Schedule,
    /// Platform applied on start when the store has none
    default_platform: Option<Platform>,
    /// Stops the background jobs
    shutdown: watch::Sender<bool>,
    /// Handles of the background jobs
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl App {
    /// Creates the application from its configuration.
    ///
    /// The store document is `store.json` inside `data_path`, which is created if
    /// needed.
    ///
    /// # Errors
    ///
    /// Fails if the data directory cannot be created, the HTTP client cannot be
    /// built or the store document cannot be read.
    pub async fn new(config: &Config, data_path: &Path) -> anyhow::Result<App> {
        tokio::fs::create_dir_all(data_path).await?;

        let requester = WarframeRequester::new(&config.api.url, config.api.timeout())?;

        let app = Self::with_parts(
            config,
            data_path,
            Arc::new(requester),
            Arc::new(SystemTimeSource),
        )
        .await?;

        Ok(app)
    }

    /// Creates the application with the given requester and clock.
    ///
    /// # Errors
    ///
    /// Returns the [`StorageError`] of [`AlertStore::open`].
    pub async fn with_parts(
        config: &Config,
        data_path: &Path,
        requester: Arc<dyn Requester>,
        time_source: Arc<dyn TimeSource>,
    ) -> Result<App, StorageError> {
        let store = Arc::new(AlertStore::open(data_path.join(STORE_FILE_NAME)).await?);
        let fetcher = AlertFetcher::new(requester, Arc::clone(&time_source));
        let engine = Arc::new(AlertSyncEngine::new(fetcher, Arc::clone(&store)));
        let scheduler = ReminderScheduler::new(Arc::clone(&store), Arc::clone(&time_source));
        let (shutdown, _) = watch::channel(false);

        Ok(App {
            store,
            engine,
            scheduler,
            time_source,
            schedule: Schedule {
                polling_interval: config.schedule.polling_interval,
                cleanup_interval: config.schedule.cleanup_interval,
            },
            default_platform: config.default_platform,
            shutdown,
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Starts the background jobs and re-arms the stored reminders.
    ///
    /// The configured default platform is stored first if no platform was selected
    /// yet, so the first polling tick already has something to refresh.
    pub async fn start(&self) {
        if let Some(platform) = self.default_platform {
            if self.store.get_platform().await.is_none() {
                info!("no platform selected, using default platform {}", platform);
                if let Err(e) = self.store.set_platform(platform).await {
                    warn!("failed to store default platform {}: {}", platform, e);
                }
            }
        }

        self.scheduler.start().await;

        let polling = self
            .engine
            .spawn_polling(self.schedule.polling_interval(), self.shutdown.subscribe());
        let cleanup = CleanupJob::new(
            Arc::clone(&self.store),
            Arc::clone(&self.time_source),
            self.schedule.cleanup_interval(),
        )
        .spawn(self.shutdown.subscribe());

        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend([polling, cleanup]);

        info!("application started");
    }

    /// Stops the background jobs, the in-flight refresh and every reminder timer.
    ///
    /// Store writes already started complete before this returns.
    pub async fn shutdown(&self) {
        info!("shutting down");

        self.shutdown.send_replace(true);
        self.engine.shutdown().await;
        self.scheduler.shutdown().await;

        let tasks: Vec<JoinHandle<()>> = self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for result in join_all(tasks).await {
            if let Err(e) = result {
                error!("background job ended abnormally: {}", e);
            }
        }
    }

    pub fn subscribe_sync(&self) -> broadcast::Receiver<SyncEvent> {
        self.engine.subscribe()
    }

    pub fn subscribe_reminder_fired(&self) -> broadcast::Receiver<ReminderFired> {
        self.scheduler.subscribe()
    }

    /// Requests a refresh of the alerts of `platform`.
    pub fn refresh_alerts(&self, platform: Platform) -> RefreshOutcome {
        self.engine.refresh(platform)
    }

    /// Requests a refresh of the alerts of the selected platform.
    ///
    /// # Returns
    ///
    /// `None` if no platform has been selected yet.
    pub async fn refresh_current(&self) -> Option<RefreshOutcome> {
        self.engine.refresh_current().await
    }

    pub async fn get_platform(&self) -> Option<Platform> {
        self.store.get_platform().await
    }

    /// Stores the selected platform, then refreshes its alerts.
    ///
    /// # Errors
    ///
    /// Returns the [`StorageError`] of the write; no refresh is requested then.
    pub async fn set_platform(&self, platform: Platform) -> Result<RefreshOutcome, StorageError> {
        self.store.set_platform(platform).await?;
        Ok(self.engine.refresh(platform))
    }

    /// Creates and arms a reminder, see [`ReminderScheduler::create`].
    pub async fn create_reminder(
        &self,
        reminder_type: ReminderType,
        details: &str,
        scheduled_time: DateTime<Utc>,
    ) -> Result<Reminder, ReminderError> {
        self.scheduler
            .create(reminder_type, details, scheduled_time)
            .await
    }

    /// Cancels a scheduled reminder.
    ///
    /// # Returns
    ///
    /// `false` if the reminder already fired or was cancelled before.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReminderNotFound`] for an unknown id.
    pub async fn cancel_reminder(&self, id: u64) -> Result<bool, StorageError> {
        if self.store.get_reminder(id).await.is_none() {
            return Err(StorageError::ReminderNotFound(id));
        }
        self.scheduler.cancel(id).await
    }

    pub async fn list_active_reminders(&self) -> Vec<Reminder> {
        self.store.list_active_reminders().await
    }

    pub async fn list_alerts(&self) -> Vec<Alert> {
        self.store.list_alerts().await
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.time_source.now()
    }
}
