//! Special commands parser for interactive chat mode
//!
//! This module parses special commands that can be entered during an
//! interactive chat session. Special commands allow users to:
//! - Switch persona
//! - Start a new conversation or load a saved one
//! - Queue and remove attachments
//! - View session status and help
//! - Exit the session
//!
//! Commands are prefixed with `/`. The command word is case-insensitive;
//! arguments (paths, ids) are kept as typed.

use crate::roles::Role;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
///
/// These commands change the session or print information rather than
/// being sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Switch persona for subsequent turns
    SwitchRole(Role),

    /// List the available personas
    ListRoles,

    /// Start an empty conversation
    NewChat,

    /// List saved conversations
    ListHistory,

    /// Load a saved conversation by id or id prefix
    LoadChat(String),

    /// Queue files for the next message
    Attach(Vec<PathBuf>),

    /// Remove a queued file by id, id prefix or 1-based position
    Detach(String),

    /// List queued files
    ListFiles,

    /// Clear the error banner
    DismissError,

    /// Display persona, conversation and attachment status
    ShowStatus,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command
    ///
    /// The input should be sent to the model as a message.
    None,
}

fn missing(command: &str, usage: &str) -> CommandError {
    CommandError::MissingArgument {
        command: command.to_string(),
        usage: usage.to_string(),
    }
}

fn no_argument(command: &str, rest: &str, value: SpecialCommand) -> Result<SpecialCommand, CommandError> {
    if rest.is_empty() {
        Ok(value)
    } else {
        Err(CommandError::UnsupportedArgument {
            command: command.to_string(),
            arg: rest.to_string(),
        })
    }
}

/// Split `/attach` arguments on whitespace, honouring single and double quotes
///
/// Returns `None` when a quote is left open.
fn split_paths(input: &str) -> Option<Vec<PathBuf>> {
    let mut paths = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for c in input.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_token = true;
            }
            None if c.is_whitespace() => {
                if in_token {
                    paths.push(PathBuf::from(std::mem::take(&mut current)));
                    in_token = false;
                }
            }
            None => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if quote.is_some() {
        return None;
    }
    if in_token {
        paths.push(PathBuf::from(current));
    }
    Some(paths)
}

/// Parse a user input string into a special command
///
/// # Errors
///
/// Returns `CommandError::UnknownCommand` if input starts with "/" but is not a valid command.
/// Returns `CommandError::UnsupportedArgument` if a command receives an invalid argument.
/// Returns `CommandError::MissingArgument` if a command requires an argument but none was provided.
///
/// # Examples
///
/// ```
/// use cemtras::commands::special_commands::{parse_special_command, SpecialCommand};
/// use cemtras::roles::Role;
///
/// let cmd = parse_special_command("/role procurement").unwrap();
/// assert_eq!(cmd, SpecialCommand::SwitchRole(Role::Procurement));
///
/// let cmd = parse_special_command("how do I cut fuel cost?").unwrap();
/// assert_eq!(cmd, SpecialCommand::None);
///
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if lower == "exit" || lower == "quit" {
        return Ok(SpecialCommand::Exit);
    }
    if !trimmed.starts_with('/') {
        return Ok(SpecialCommand::None);
    }

    let (word, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word.to_lowercase(), rest.trim()),
        None => (lower.clone(), ""),
    };

    match word.as_str() {
        "/role" => {
            if rest.is_empty() {
                return Err(missing("/role", "/role <name>  (see /roles)"));
            }
            Role::parse_str(rest)
                .map(SpecialCommand::SwitchRole)
                .map_err(|_| CommandError::UnsupportedArgument {
                    command: "/role".to_string(),
                    arg: rest.to_string(),
                })
        }
        "/roles" => no_argument("/roles", rest, SpecialCommand::ListRoles),
        "/new" | "/clear" => no_argument(&word, rest, SpecialCommand::NewChat),
        "/history" => no_argument("/history", rest, SpecialCommand::ListHistory),
        "/load" => {
            if rest.is_empty() {
                return Err(missing("/load", "/load <id>"));
            }
            Ok(SpecialCommand::LoadChat(rest.to_string()))
        }
        "/attach" => {
            if rest.is_empty() {
                return Err(missing("/attach", "/attach <path> [path...]"));
            }
            let paths = split_paths(rest).ok_or_else(|| CommandError::UnsupportedArgument {
                command: "/attach".to_string(),
                arg: rest.to_string(),
            })?;
            Ok(SpecialCommand::Attach(paths))
        }
        "/detach" => {
            if rest.is_empty() {
                return Err(missing("/detach", "/detach <file id or number>"));
            }
            Ok(SpecialCommand::Detach(rest.to_string()))
        }
        "/files" => no_argument("/files", rest, SpecialCommand::ListFiles),
        "/dismiss" => no_argument("/dismiss", rest, SpecialCommand::DismissError),
        "/status" => no_argument("/status", rest, SpecialCommand::ShowStatus),
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/exit" | "/quit" => Ok(SpecialCommand::Exit),
        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

/// Print help for special commands
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat
=====================================

PERSONA:
  /role <name>      - Switch persona (operations, pm, sales, procurement,
                      erection, engineering, general)
  /roles            - List personas

CONVERSATIONS:
  /new              - Start a new conversation
  /clear            - Same as /new
  /history          - List saved conversations
  /load <id>        - Load a saved conversation (id prefix is enough)

ATTACHMENTS:
  /attach <path>... - Attach images, PDFs, text or Word files to the next message
                      (quote paths that contain spaces: /attach "kiln photo.jpg")
  /files            - List attached files
  /detach <n|id>    - Remove an attached file

SESSION:
  /status           - Show persona, conversation and attachments
  /dismiss          - Clear the last error
  /help             - Show this help message
  /?                - Same as /help

SESSION CONTROL:
  exit              - Exit interactive mode
  quit              - Same as exit

NOTES:
  - Commands are case-insensitive
  - Regular text (not starting with /) is sent to the model
  - Only images and PDFs are sent to the model; other files stay in the transcript
"#
    );
}
