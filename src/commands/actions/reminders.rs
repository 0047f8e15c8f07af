//! Reminder command handlers.
//!
//! The remind command takes a delay in minutes, turned into an absolute instant
//! from the application clock before being handed to the scheduler.

use chrono::Duration;
use log::debug;

use crate::{
    app::App,
    commands::text_response::{
        format_cancel, format_invalid_remind, format_reminder_created, format_reminder_error,
        format_reminder_not_found, format_reminders, format_storage_error,
    },
    store::{ReminderType, StorageError},
};

/// Schedules a reminder `minutes` from now.
pub async fn handle_remind(
    app: &App,
    reminder_type: ReminderType,
    minutes: u64,
    details: &str,
) -> String {
    debug!(
        "handling remind command - type: {}, minutes: {}",
        reminder_type, minutes
    );

    let scheduled_time = i64::try_from(minutes)
        .ok()
        .and_then(Duration::try_minutes)
        .and_then(|delay| app.now().checked_add_signed(delay));
    let Some(scheduled_time) = scheduled_time else {
        return format_invalid_remind();
    };

    match app
        .create_reminder(reminder_type, details, scheduled_time)
        .await
    {
        Ok(reminder) => format_reminder_created(&reminder),
        Err(e) => format_reminder_error(&e),
    }
}

pub async fn handle_reminders(app: &App) -> String {
    debug!("handling reminders command");

    format_reminders(&app.list_active_reminders().await)
}

pub async fn handle_cancel(app: &App, id: u64) -> String {
    debug!("handling cancel command - id: {}", id);

    match app.cancel_reminder(id).await {
        Ok(cancelled) => format_cancel(id, cancelled),
        Err(StorageError::ReminderNotFound(_)) => format_reminder_not_found(id),
        Err(e) => format_storage_error(&e),
    }
}
