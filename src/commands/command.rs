//! Command parsing and handling.
//!
//! This module provides command parsing functionality for the console, converting
//! a typed line into a structured [`Command`] enum.

use command_parser::{Command as ParserCommand, Parser};
use log::debug;

use crate::{
    commands::text_response::{
        format_invalid_cancel, format_invalid_platform, format_invalid_remind,
        format_unknown_command,
    },
    store::{Platform, ReminderType},
};

/// Name of the command every console line must start with, after the `!` prefix.
pub const COMMAND_NAME: &str = "wf";

/// Represents a parsed console command.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    /// Display help information
    Help,
    /// List the cached alerts
    Alerts,
    /// Refresh the alerts of the selected platform
    Refresh,
    /// Select a platform and refresh its alerts
    Platform(Platform),
    /// Schedule a reminder
    ///
    /// # Fields
    ///
    /// * `ReminderType` - Category of the reminder
    /// * `u64` - Delay in minutes
    /// * `String` - Details shown when the reminder fires
    Remind(ReminderType, u64, String),
    /// List the scheduled reminders
    Reminders,
    /// Cancel a scheduled reminder
    ///
    /// # Fields
    ///
    /// * `u64` - Reminder id
    Cancel(u64),
}

/// Errors that can occur during command parsing.
#[derive(Debug)]
pub enum CommandParsingError {
    /// The line could not be parsed as a command
    UnableToParse,
    /// The command does not start with `!wf`
    NotWf,
    /// The command is not recognized
    Unknown,
    /// The platform command has a missing or unknown platform
    InvalidPlatform,
    /// The remind command has invalid syntax or arguments
    InvalidRemind,
    /// The cancel command has a missing or invalid id
    InvalidCancel,
}

impl Command {
    /// Parses a console line into a Command.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The line is not a command - [`CommandParsingError::UnableToParse`]
    /// - The command is not `!wf` - [`CommandParsingError::NotWf`]
    /// - The subcommand is not recognized - [`CommandParsingError::Unknown`]
    /// - A subcommand has invalid arguments - one of the `Invalid*` variants
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let parser = Parser::new('!', '-');
    /// let result = Command::parse(&parser, "!wf platform ps4");
    /// assert!(matches!(result, Ok(Command::Platform(Platform::Ps4))));
    /// ```
    pub fn parse(parser: &Parser, body: &str) -> Result<Self, CommandParsingError> {
        // The parser drops the last word, so we add a dummy word at the end
        let body = body.trim().to_string() + " dummy";

        // This is normal to fail if the line is not a command
        let command = match parser.parse(&body) {
            Ok(cmd) => cmd,
            Err(_) => return Err(CommandParsingError::UnableToParse),
        };

        if command.name != COMMAND_NAME {
            return Err(CommandParsingError::NotWf);
        }

        debug!("Parsing command: {:?}", command);

        // If no arguments, return help
        if command.arguments.is_empty() {
            return Ok(Command::Help);
        }

        match command.arguments[0].as_str() {
            "help" => Ok(Command::Help),
            "alerts" => Ok(Command::Alerts),
            "refresh" => Ok(Command::Refresh),
            "reminders" => Ok(Command::Reminders),
            "platform" => Ok(Command::Platform(Self::parse_platform(&command)?)),
            "remind" => {
                let (reminder_type, minutes, details) = Self::parse_remind(&command)?;
                Ok(Command::Remind(reminder_type, minutes, details))
            }
            "cancel" => Ok(Command::Cancel(Self::parse_cancel(&command)?)),
            _ => Err(CommandParsingError::Unknown),
        }
    }

    fn parse_platform(command: &ParserCommand) -> Result<Platform, CommandParsingError> {
        // 2 arguments: platform and its name
        if command.arguments.len() < 2 {
            return Err(CommandParsingError::InvalidPlatform);
        }

        command.arguments[1]
            .parse::<Platform>()
            .map_err(|_| CommandParsingError::InvalidPlatform)
    }

    fn parse_remind(
        command: &ParserCommand,
    ) -> Result<(ReminderType, u64, String), CommandParsingError> {
        debug!("Parsing remind command: {:?}", command);

        // At least 4 arguments: remind, type, delay and one word of details
        if command.arguments.len() < 4 {
            return Err(CommandParsingError::InvalidRemind);
        }

        let reminder_type = match command.arguments[1].parse::<ReminderType>() {
            Ok(reminder_type) => reminder_type,
            Err(_) => return Err(CommandParsingError::InvalidRemind),
        };
        let minutes = match command.arguments[2].parse::<u64>() {
            Ok(minutes) => minutes,
            Err(_) => return Err(CommandParsingError::InvalidRemind),
        };
        let details = command.arguments[3..].join(" ");

        debug!(
            "Parsed remind command - type: {}, minutes: {}, details: {}",
            reminder_type, minutes, details
        );

        Ok((reminder_type, minutes, details))
    }

    fn parse_cancel(command: &ParserCommand) -> Result<u64, CommandParsingError> {
        // 2 arguments: cancel and reminder id
        if command.arguments.len() < 2 {
            return Err(CommandParsingError::InvalidCancel);
        }

        command.arguments[1]
            .parse::<u64>()
            .map_err(|_| CommandParsingError::InvalidCancel)
    }
}

/// Formats a command error into a user-friendly message.
///
/// `UnableToParse` and `NotWf` return `None`: such lines get no answer.
pub fn format_command_error(error: CommandParsingError) -> Option<String> {
    match error {
        CommandParsingError::Unknown => Some(format_unknown_command()),
        CommandParsingError::InvalidPlatform => Some(format_invalid_platform()),
        CommandParsingError::InvalidRemind => Some(format_invalid_remind()),
        CommandParsingError::InvalidCancel => Some(format_invalid_cancel()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_parser() -> Parser {
        Parser::new('!', '-')
    }

    #[test]
    fn test_parse_help_command() {
        let parser = create_parser();
        let result = Command::parse(&parser, "!wf help");
        assert!(matches!(result, Ok(Command::Help)));
    }

    #[test]
    fn test_parse_help_command_no_args() {
        let parser = create_parser();
        let result = Command::parse(&parser, "!wf");
        assert!(matches!(result, Ok(Command::Help)));
    }

    #[test]
    fn test_parse_simple_commands() {
        let parser = create_parser();
        assert!(matches!(Command::parse(&parser, "!wf alerts"), Ok(Command::Alerts)));
        assert!(matches!(Command::parse(&parser, "!wf refresh"), Ok(Command::Refresh)));
        assert!(matches!(
            Command::parse(&parser, "!wf reminders"),
            Ok(Command::Reminders)
        ));
    }

    #[test]
    fn test_parse_platform_command() {
        let parser = create_parser();
        let result = Command::parse(&parser, "!wf platform ps4");
        assert!(matches!(result, Ok(Command::Platform(Platform::Ps4))));
    }

    #[test]
    fn test_parse_platform_command_unknown_platform() {
        let parser = create_parser();
        let result = Command::parse(&parser, "!wf platform dreamcast");
        assert!(matches!(result, Err(CommandParsingError::InvalidPlatform)));
    }

    #[test]
    fn test_parse_platform_command_missing_args() {
        let parser = create_parser();
        let result = Command::parse(&parser, "!wf platform");
        assert!(matches!(result, Err(CommandParsingError::InvalidPlatform)));
    }

    #[test]
    fn test_parse_remind_command() {
        let parser = create_parser();
        let result = Command::parse(&parser, "!wf remind foundry 90 Collect the Forma");
        assert!(matches!(
            result,
            Ok(Command::Remind(ReminderType::FoundryBuilds, 90, details))
            if details == "Collect the Forma"
        ));
    }

    #[test]
    fn test_parse_remind_command_invalid_type() {
        let parser = create_parser();
        let result = Command::parse(&parser, "!wf remind dojo 90 Collect");
        assert!(matches!(result, Err(CommandParsingError::InvalidRemind)));
    }

    #[test]
    fn test_parse_remind_command_invalid_delay() {
        let parser = create_parser();
        let result = Command::parse(&parser, "!wf remind alerts soon Nitain");
        assert!(matches!(result, Err(CommandParsingError::InvalidRemind)));
    }

    #[test]
    fn test_parse_remind_command_missing_details() {
        let parser = create_parser();
        let result = Command::parse(&parser, "!wf remind alerts 30");
        assert!(matches!(result, Err(CommandParsingError::InvalidRemind)));
    }

    #[test]
    fn test_parse_cancel_command() {
        let parser = create_parser();
        let result = Command::parse(&parser, "!wf cancel 12");
        assert!(matches!(result, Ok(Command::Cancel(12))));
    }

    #[test]
    fn test_parse_cancel_command_invalid_id() {
        let parser = create_parser();
        assert!(matches!(
            Command::parse(&parser, "!wf cancel twelve"),
            Err(CommandParsingError::InvalidCancel)
        ));
        assert!(matches!(
            Command::parse(&parser, "!wf cancel"),
            Err(CommandParsingError::InvalidCancel)
        ));
    }

    #[test]
    fn test_parse_unknown_command() {
        let parser = create_parser();
        let result = Command::parse(&parser, "!wf unknown");
        assert!(matches!(result, Err(CommandParsingError::Unknown)));
    }

    #[test]
    fn test_parse_not_wf_command() {
        let parser = create_parser();
        let result = Command::parse(&parser, "!other help");
        assert!(matches!(result, Err(CommandParsingError::NotWf)));
    }

    #[test]
    fn test_parse_unable_to_parse() {
        let parser = create_parser();
        let result = Command::parse(&parser, "This is not a command");
        assert!(matches!(result, Err(CommandParsingError::UnableToParse)));
    }

    #[test]
    fn test_format_command_error() {
        assert!(
            format_command_error(CommandParsingError::Unknown)
                .unwrap()
                .contains("Unknown command")
        );
        assert!(
            format_command_error(CommandParsingError::InvalidRemind)
                .unwrap()
                .contains("Invalid remind")
        );
        assert!(format_command_error(CommandParsingError::UnableToParse).is_none());
        assert!(format_command_error(CommandParsingError::NotWf).is_none());
    }
}
