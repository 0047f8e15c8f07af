//! Help command handler.

use log::debug;

use crate::commands::text_response::format_help;

/// Returns the help message listing the available commands.
pub fn handle_help() -> String {
    debug!("handling help command");

    format_help()
}
