//! Reminder scheduler: persistence, timers and firing.
//!
//! This module provides the [`ReminderScheduler`] which owns the in-memory timers
//! of the scheduled reminders.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use log::{debug, error, info, warn};
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
    time,
};

use crate::{
    reminders::{ReminderError, ReminderFired, ValidationError},
    store::{AlertStore, Reminder, ReminderDraft, ReminderType, StorageError},
    time_source::TimeSource,
};

/// Capacity of the fired reminder channel.
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Armed timer of one reminder.
struct Timer {
    handle: JoinHandle<()>,
    /// Set once the timer started firing; it can no longer be cancelled
    firing: bool,
}

type Timers = Arc<Mutex<HashMap<u64, Timer>>>;

/// Everything a timer task needs once its reminder is due.
struct TimerContext {
    id: u64,
    details: String,
    late: bool,
    delay: Duration,
    store: Arc<AlertStore>,
    timers: Timers,
    fired: broadcast::Sender<ReminderFired>,
    shutdown: watch::Receiver<bool>,
}

/// Schedules reminders and fires each of them exactly once.
///
/// # Lifecycle
///
/// - [`ReminderScheduler::start`] re-arms the reminders left scheduled by a
///   previous run
/// - [`ReminderScheduler::create`] persists and arms a new reminder
/// - [`ReminderScheduler::shutdown`] stops every sleeping timer without side
///   effects and waits for the ones already firing
///
/// # Examples
///
/// ```ignore
/// let scheduler = ReminderScheduler::new(store, Arc::new(SystemTimeSource));
/// let mut fired = scheduler.subscribe();
/// scheduler.start().await;
///
/// let reminder = scheduler
///     .create(ReminderType::Alerts, "Check the Nitain alert", Utc::now() + Duration::minutes(30))
///     .await?;
/// let event = fired.recv().await?;
/// assert_eq!(event.id, reminder.id);
/// ```
pub struct ReminderScheduler {
    /// Store holding the reminder rows
    store: Arc<AlertStore>,
    /// Clock used to validate requests and compute delays
    time_source: Arc<dyn TimeSource>,
    /// Armed timers by reminder id
    timers: Timers,
    /// Fired reminders
    fired: broadcast::Sender<ReminderFired>,
    /// Stops sleeping timers
    shutdown: watch::Sender<bool>,
}

impl ReminderScheduler {
    pub fn new(store: Arc<AlertStore>, time_source: Arc<dyn TimeSource>) -> Self {
        let (fired, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (shutdown, _) = watch::channel(false);

        ReminderScheduler {
            store,
            time_source,
            timers: Arc::new(Mutex::new(HashMap::new())),
            fired,
            shutdown,
        }
    }

    /// Subscribes to the reminders firing from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ReminderFired> {
        self.fired.subscribe()
    }

    /// Re-arms the reminders the store holds as scheduled.
    ///
    /// Reminders already due fire immediately with `late` set.
    ///
    /// # Returns
    ///
    /// The number of timers armed.
    pub async fn start(&self) -> usize {
        let reminders = self.store.list_active_reminders().await;
        let now = self.time_source.now();
        let mut armed = 0;

        for reminder in reminders {
            if self.is_armed(reminder.id) {
                continue;
            }

            let late = reminder.scheduled_time <= now;
            if late {
                warn!(
                    "reminder {} was due at {}, firing it now",
                    reminder.id,
                    reminder.scheduled_time.to_rfc3339()
                );
            }

            self.arm(reminder.id, reminder.details, reminder.scheduled_time, late);
            armed += 1;
        }

        info!("reminder scheduler started with {} armed reminders", armed);

        armed
    }

    /// Creates a reminder and arms its timer.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::EmptyDetails`] if `details` is blank
    /// - [`ValidationError::NotInFuture`] if `scheduled_time` is not after now
    /// - [`ReminderError::Storage`] if the reminder cannot be persisted
    ///
    /// Nothing is persisted or armed on error.
    pub async fn create(
        &self,
        reminder_type: ReminderType,
        details: &str,
        scheduled_time: DateTime<Utc>,
    ) -> Result<Reminder, ReminderError> {
        let details = details.trim();
        if details.is_empty() {
            return Err(ValidationError::EmptyDetails.into());
        }
        if scheduled_time <= self.time_source.now() {
            return Err(ValidationError::NotInFuture(scheduled_time).into());
        }

        let id = self
            .store
            .insert_reminder(ReminderDraft {
                reminder_type,
                details: details.to_owned(),
                scheduled_time,
            })
            .await?;
        let reminder = self
            .store
            .get_reminder(id)
            .await
            .ok_or(StorageError::ReminderNotFound(id))?;

        self.arm(id, reminder.details.clone(), scheduled_time, false);

        Ok(reminder)
    }

    /// Disarms a reminder and marks it as cancelled.
    ///
    /// # Returns
    ///
    /// `false` if no timer was armed for `id`, e.g. because the reminder already
    /// fired or is firing right now.
    pub async fn cancel(&self, id: u64) -> Result<bool, StorageError> {
        let timer = {
            let mut timers = self.timers.lock().unwrap_or_else(PoisonError::into_inner);
            match timers.get(&id) {
                Some(timer) if !timer.firing => timers.remove(&id),
                _ => None,
            }
        };

        let Some(timer) = timer else {
            debug!("no armed timer for reminder {}", id);
            return Ok(false);
        };

        timer.handle.abort();
        self.store.cancel_reminder(id).await
    }

    /// Stops every timer.
    ///
    /// Sleeping timers exit without notifying or touching the store. Timers that
    /// already started firing complete their transition before this returns.
    pub async fn shutdown(&self) {
        self.shutdown.send_replace(true);

        let handles: Vec<JoinHandle<()>> = self
            .timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .map(|(_, timer)| timer.handle)
            .collect();

        info!("stopping {} reminder timers", handles.len());
        for result in join_all(handles).await {
            if let Err(e) = result {
                error!("reminder timer ended abnormally: {}", e);
            }
        }
    }

    fn is_armed(&self, id: u64) -> bool {
        self.timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
    }

    /// Spawns the timer of reminder `id`, replacing any previous one.
    fn arm(&self, id: u64, details: String, scheduled_time: DateTime<Utc>, late: bool) {
        let delay = (scheduled_time - self.time_source.now())
            .to_std()
            .unwrap_or(Duration::ZERO);

        // The lock is held until the handle is stored so the timer cannot look
        // itself up before it is registered.
        let mut timers = self.timers.lock().unwrap_or_else(PoisonError::into_inner);

        if *self.shutdown.borrow() {
            warn!("scheduler is shut down, not arming reminder {}", id);
            return;
        }

        let handle = tokio::spawn(Self::run_timer(TimerContext {
            id,
            details,
            late,
            delay,
            store: Arc::clone(&self.store),
            timers: Arc::clone(&self.timers),
            fired: self.fired.clone(),
            shutdown: self.shutdown.subscribe(),
        }));

        debug!("armed reminder {} to fire in {} seconds", id, delay.as_secs());

        if let Some(previous) = timers.insert(
            id,
            Timer {
                handle,
                firing: false,
            },
        ) {
            previous.handle.abort();
        }
    }

    async fn run_timer(mut ctx: TimerContext) {
        tokio::select! {
            _ = time::sleep(ctx.delay) => {}
            _ = ctx.shutdown.wait_for(|stopped| *stopped) => {
                debug!("timer of reminder {} stopped", ctx.id);
                return;
            }
        }

        {
            let mut timers = ctx.timers.lock().unwrap_or_else(PoisonError::into_inner);
            match timers.get_mut(&ctx.id) {
                Some(timer) => timer.firing = true,
                // Disarmed by a cancel or a shutdown while waking up
                None => return,
            }
        }

        info!("firing reminder {}", ctx.id);
        let event = ReminderFired {
            id: ctx.id,
            details: ctx.details,
            late: ctx.late,
        };
        if ctx.fired.send(event).is_err() {
            warn!("no subscriber notified for reminder {}", ctx.id);
        }

        if let Err(e) = ctx.store.complete_reminder(ctx.id).await {
            error!(
                "reminder {} fired but its completion was not persisted: {}",
                ctx.id, e
            );
        }

        ctx.timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&ctx.id);
    }
}
