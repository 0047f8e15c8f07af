//! Durable storage for alerts, reminders and the platform setting.
//!
//! The store is the single shared mutable resource of the application. It is made of:
//!
//! - [`AlertStore`]: transactional access to every persisted row
//! - [`StoreLoader`]: loading and saving the store document to disk
//! - [`models`]: the persisted row types
//!
//! # Consistency
//!
//! Every mutation goes through one transaction: the state is locked, a copy is
//! modified and written to disk, and only a successful write publishes the copy.
//! Readers therefore observe either the state before or after a mutation.

mod alert_store;
mod loader;
pub mod models;

use serde::{Deserialize, Serialize};

pub use crate::store::alert_store::AlertStore;
pub use crate::store::loader::StoreLoader;
pub use crate::store::models::{
    Alert, AlertRow, Platform, Reminder, ReminderDraft, ReminderStatus, ReminderType, User,
};

/// Errors raised by the persistence layer.
///
/// All variants are recoverable: callers log them and report them to the user.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading or writing the store document failed.
    #[error("store I/O failure: {0}")]
    Io(#[from] std::io::Error),
    /// The store state could not be serialized.
    #[error("store serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),
    /// No reminder has the requested id.
    #[error("reminder {0} not found")]
    ReminderNotFound(u64),
}

/// Whole content of the store document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreState {
    pub users: Vec<User>,
    pub alerts: Vec<AlertRow>,
    pub reminders: Vec<Reminder>,
    pub next_user_id: u64,
    pub next_alert_id: u64,
    pub next_reminder_id: u64,
}
