//! Console command parsing and response formatting.
//!
//! This module provides the command processing pipeline of the console.
//!
//! # Overview
//!
//! 1. **Parsing** - Converting a console line into a structured [`command::Command`]
//! 2. **Validation** - Ensuring commands have correct syntax and valid arguments
//! 3. **Execution** - Routing commands to the handlers in [`actions`]
//! 4. **Response** - Formatting results as plain text
//!
//! # Command Structure
//!
//! All commands follow the format: `!wf <subcommand> [args...]`
//!
//! | Command | Arguments | Description |
//! |---------|-----------|-------------|
//! | `help` | None | Display help information |
//! | `alerts` | None | List the cached alerts |
//! | `refresh` | None | Refresh the alerts of the selected platform |
//! | `platform` | `<name>` | Select a platform and refresh its alerts |
//! | `remind` | `<type> <delay> <details...>` | Schedule a reminder `delay` minutes from now |
//! | `reminders` | None | List the scheduled reminders |
//! | `cancel` | `<id>` | Cancel a scheduled reminder |
//!
//! # Error Handling
//!
//! - **Silent Errors** ([`CommandParseError::NotForApp`]): lines that are not
//!   `!wf` commands. These get no answer.
//! - **User Errors** ([`CommandParseError::InvalidCommand`]): invalid command
//!   syntax or arguments, with a usage message for the user.

mod actions;
mod command;
mod commander;
mod text_response;

pub use crate::commands::commander::Commander;

/// Errors that can occur during command parsing.
#[derive(Debug)]
pub enum CommandParseError {
    /// Line is not a command for this application (silent error)
    NotForApp,
    /// Invalid command syntax with error message
    InvalidCommand(String),
}
