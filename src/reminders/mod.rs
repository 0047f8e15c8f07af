//! User reminders.
//!
//! A reminder is a one-shot notification scheduled at a future instant. The
//! [`ReminderScheduler`] persists reminders through the
//! [`AlertStore`](crate::store::AlertStore), keeps one timer per scheduled reminder
//! and publishes a [`ReminderFired`] event when a timer expires.
//!
//! Timers live in memory only. On start, the scheduler re-arms every reminder the
//! store still holds as scheduled; reminders whose time passed while the
//! application was down fire immediately and are flagged as late.

mod scheduler;

use chrono::{DateTime, Utc};

pub use crate::reminders::scheduler::ReminderScheduler;
use crate::store::StorageError;

/// Notification published when a reminder fires.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReminderFired {
    pub id: u64,
    pub details: String,
    /// Whether the reminder was due before the scheduler started
    pub late: bool,
}

/// Rejected reminder request.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("reminder details must not be empty")]
    EmptyDetails,
    #[error("scheduled time {0} is not in the future")]
    NotInFuture(DateTime<Utc>),
}

/// Errors returned when creating a reminder.
#[derive(Debug, thiserror::Error)]
pub enum ReminderError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
