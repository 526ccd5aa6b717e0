//! Command-line interface definition for CemtrAS
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for chatting, one-shot questions, sign-in and
//! chat history management.

use crate::roles::Role;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CemtrAS AI - role-aware assistant for cement plant professionals
///
/// Chat with an expert persona, attach images or PDFs, and keep a local
/// history of conversations.
#[derive(Parser, Debug, Clone)]
#[command(name = "cemtras")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the local storage location
    #[arg(long)]
    pub storage_path: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for CemtrAS
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Persona to start with (e.g. operations, procurement, general)
        #[arg(short, long, value_parser = Role::parse_str)]
        role: Option<Role>,

        /// Resume a saved conversation by id or id prefix
        #[arg(long)]
        resume: Option<String>,
    },

    /// Ask a single question and print the answer
    Ask {
        /// Persona to answer as
        #[arg(short, long, value_parser = Role::parse_str)]
        role: Option<Role>,

        /// File to attach (repeatable)
        #[arg(short, long = "file")]
        files: Vec<PathBuf>,

        /// The question
        prompt: String,
    },

    /// Sign in with a display name
    Login {
        /// Display name (at least 2 characters)
        name: String,
    },

    /// Sign out; saved conversations are kept
    Logout,

    /// Show the signed-in user
    Whoami,

    /// List the available personas
    Roles,

    /// Manage saved conversations
    History {
        /// History management subcommand
        #[command(subcommand)]
        command: HistoryCommand,
    },
}

/// History management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum HistoryCommand {
    /// List saved conversations, most recent first
    List,

    /// Print a saved conversation
    Show {
        /// Conversation id or id prefix
        id: String,
    },

    /// Delete a saved conversation
    Delete {
        /// Conversation id or id prefix
        id: String,
    },

    /// Delete every saved conversation
    Clear,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
