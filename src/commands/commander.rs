//! Command orchestration and execution.
//!
//! This module provides the [`Commander`] struct, the entry point for processing
//! console lines.
//!
//! # Flow
//!
//! ```text
//! Console line → parse() → Command → parse_command() → text answer
//! ```

use command_parser::Parser;

use crate::{
    app::App,
    commands::{
        CommandParseError,
        actions::{
            handle_alerts, handle_cancel, handle_help, handle_platform, handle_refresh,
            handle_remind, handle_reminders,
        },
        command::{Command, format_command_error},
        text_response::{format_reminder_fired, format_sync_event},
    },
    alerts::SyncEvent,
    reminders::ReminderFired,
};

/// Command orchestrator for parsing and executing console commands.
///
/// # Command Prefix
///
/// All commands must start with the `!wf` prefix. Other lines are silently
/// ignored (returning [`CommandParseError::NotForApp`]).
pub struct Commander {
    /// Command parser for processing user commands
    parser: Parser,
}

impl Default for Commander {
    fn default() -> Self {
        Self::new()
    }
}

impl Commander {
    /// Creates a new Commander with `!` as the command prefix and `-` as the
    /// option prefix.
    pub fn new() -> Self {
        let parser = Parser::new('!', '-');
        Commander { parser }
    }

    /// Parses a console line into a structured command.
    ///
    /// # Errors
    ///
    /// - [`CommandParseError::NotForApp`] if the line is not a `!wf` command
    /// - [`CommandParseError::InvalidCommand`] with a user-facing message if the
    ///   command syntax is invalid
    pub fn parse(&self, body: &str) -> Result<Command, CommandParseError> {
        Command::parse(&self.parser, body).map_err(|error| match format_command_error(error) {
            Some(message) => CommandParseError::InvalidCommand(message),
            None => CommandParseError::NotForApp,
        })
    }

    /// Executes a parsed command against the application and returns the answer.
    ///
    /// # Command Handlers
    ///
    /// - [`Command::Help`] → [`handle_help`]
    /// - [`Command::Alerts`] → [`handle_alerts`]
    /// - [`Command::Refresh`] → [`handle_refresh`]
    /// - [`Command::Platform`] → [`handle_platform`]
    /// - [`Command::Remind`] → [`handle_remind`]
    /// - [`Command::Reminders`] → [`handle_reminders`]
    /// - [`Command::Cancel`] → [`handle_cancel`]
    pub async fn parse_command(&self, command: &Command, app: &App) -> String {
        match command {
            Command::Help => handle_help(),
            Command::Alerts => handle_alerts(app).await,
            Command::Refresh => handle_refresh(app).await,
            Command::Platform(platform) => handle_platform(app, *platform).await,
            Command::Remind(reminder_type, minutes, details) => {
                handle_remind(app, *reminder_type, *minutes, details).await
            }
            Command::Reminders => handle_reminders(app).await,
            Command::Cancel(id) => handle_cancel(app, *id).await,
        }
    }

    pub fn get_sync_event_message(event: &SyncEvent) -> String {
        format_sync_event(event)
    }

    pub fn get_reminder_fired_message(fired: &ReminderFired) -> String {
        format_reminder_fired(fired)
    }
}
