//! Plain text response formatters for console commands and events.
//!
//! Every answer printed by the console goes through this module.

use chrono::{DateTime, Utc};

use crate::{
    alerts::{RefreshOutcome, SyncEvent},
    reminders::{ReminderError, ReminderFired},
    store::{Alert, Platform, Reminder, StorageError},
};

/// Formats the help message showing available commands.
///
/// # Examples
///
/// ```ignore
/// let help = format_help();
/// assert!(help.contains("Commands:"));
/// ```
pub fn format_help() -> String {
    let body = "Commands:\n\
        - `!wf alerts`: list the active alerts\n\
        - `!wf refresh`: refresh the alerts of the selected platform\n\
        - `!wf platform <name>`: select a platform (PC, PS4, PS5, XboxOne, XboxSeriesX, Switch)\n\
        - `!wf remind <type> <delay_in_minutes> <details>`: schedule a reminder (alerts, activities, foundry)\n\
        - `!wf reminders`: list the scheduled reminders\n\
        - `!wf cancel <id>`: cancel a scheduled reminder\n\
        - `!wf help`: show this help message";

    body.to_owned()
}

pub fn format_unknown_command() -> String {
    "Unknown command. Type `!wf help` for more information.".to_owned()
}

pub fn format_invalid_platform() -> String {
    "Invalid platform command. Usage: `!wf platform <PC|PS4|PS5|XboxOne|XboxSeriesX|Switch>`"
        .to_owned()
}

pub fn format_invalid_remind() -> String {
    "Invalid remind command. Usage: `!wf remind <alerts|activities|foundry> <delay_in_minutes> <details>`"
        .to_owned()
}

pub fn format_invalid_cancel() -> String {
    "Invalid cancel command. Usage: `!wf cancel <id>`".to_owned()
}

fn format_time(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// Formats the cached alert snapshot.
pub fn format_alerts(alerts: &[Alert]) -> String {
    if alerts.is_empty() {
        return "No active alerts.".to_owned();
    }

    let body = alerts
        .iter()
        .map(|alert| {
            format!(
                "- {}: {} (expires {})",
                alert.mission_type,
                alert.reward,
                format_time(&alert.expiry)
            )
        })
        .collect::<Vec<String>>()
        .join("\n");

    format!("Active alerts:\n{}", body)
}

pub fn format_reminders(reminders: &[Reminder]) -> String {
    if reminders.is_empty() {
        return "No scheduled reminders.".to_owned();
    }

    let body = reminders
        .iter()
        .map(|reminder| {
            format!(
                "- #{} [{}] {} at {}",
                reminder.id,
                reminder.reminder_type,
                reminder.details,
                format_time(&reminder.scheduled_time)
            )
        })
        .collect::<Vec<String>>()
        .join("\n");

    format!("Scheduled reminders:\n{}", body)
}

/// Formats the answer to a refresh request, `None` meaning no platform is selected.
pub fn format_refresh(outcome: Option<RefreshOutcome>) -> String {
    match outcome {
        Some(RefreshOutcome::Started) => "Refreshing alerts...".to_owned(),
        Some(RefreshOutcome::Queued) => {
            "A refresh is already running, yours will run right after it.".to_owned()
        }
        Some(RefreshOutcome::Ignored) => "Shutting down, refresh ignored.".to_owned(),
        None => "No platform selected. Use `!wf platform <name>` first.".to_owned(),
    }
}

pub fn format_platform_set(platform: Platform) -> String {
    format!("Platform set to {}. Refreshing alerts...", platform)
}

pub fn format_storage_error(error: &StorageError) -> String {
    format!("Error: unable to save your changes ({})", error)
}

pub fn format_reminder_created(reminder: &Reminder) -> String {
    format!(
        "Reminder #{} scheduled at {}.",
        reminder.id,
        format_time(&reminder.scheduled_time)
    )
}

pub fn format_reminder_error(error: &ReminderError) -> String {
    match error {
        ReminderError::Validation(e) => format!("Invalid reminder: {}.", e),
        ReminderError::Storage(e) => format_storage_error(e),
    }
}

pub fn format_reminder_not_found(id: u64) -> String {
    format!("Reminder #{} not found.", id)
}

pub fn format_cancel(id: u64, cancelled: bool) -> String {
    match cancelled {
        true => format!("Reminder #{} cancelled.", id),
        false => format!("Reminder #{} is not scheduled anymore.", id),
    }
}

/// Formats an alert refresh outcome published by the sync engine.
pub fn format_sync_event(event: &SyncEvent) -> String {
    match event {
        SyncEvent::Refreshed { platform, alerts } => format!(
            "Alerts of {} refreshed.\n{}",
            platform,
            format_alerts(alerts)
        ),
        SyncEvent::FetchFailed { platform, error } => {
            format!("Error: unable to fetch the alerts of {}: {}", platform, error)
        }
        SyncEvent::StoreFailed { platform, message } => {
            format!("Error: unable to save the alerts of {}: {}", platform, message)
        }
    }
}

pub fn format_reminder_fired(fired: &ReminderFired) -> String {
    match fired.late {
        true => format!("Reminder #{} (missed while offline): {}", fired.id, fired.details),
        false => format!("Reminder #{}: {}", fired.id, fired.details),
    }
}
