//! Command action handlers.
//!
//! Individual handler functions for each console command. Each handler runs its
//! operation against the [`App`](crate::app::App) and returns the text answer.
//!
//! # Available Handlers
//!
//! - [`handle_help`] - Display help information
//! - [`handle_alerts`] - List the cached alerts
//! - [`handle_refresh`] - Refresh the alerts of the selected platform
//! - [`handle_platform`] - Select a platform
//! - [`handle_remind`] - Schedule a reminder
//! - [`handle_reminders`] - List the scheduled reminders
//! - [`handle_cancel`] - Cancel a scheduled reminder

mod alerts;
mod help;
mod platform;
mod refresh;
mod reminders;

pub use crate::commands::actions::{
    alerts::handle_alerts,
    help::handle_help,
    platform::handle_platform,
    refresh::handle_refresh,
    reminders::{handle_cancel, handle_remind, handle_reminders},
};
