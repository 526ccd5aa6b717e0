//! CemtrAS AI - role-aware chat library
//!
//! This library provides the core of the CemtrAS assistant: expert personas
//! for cement plant work, a chat session with attachments, a Gemini model
//! client, and local persistence of the signed-in user and chat history.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `session`: Conversation state and the controller that runs turns
//! - `providers`: Model client abstraction and the Gemini implementation
//! - `roles`: Personas and their system instructions
//! - `history`: Saved conversations with a size cap
//! - `auth`: Name-based sign-in
//! - `attachments`: File validation and encoding
//! - `storage`: Key/value persistence
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use cemtras::{ChatController, ChatSession, Role};
//! use cemtras::history::ChatHistoryStore;
//! use cemtras::providers::create_client;
//! use cemtras::storage::SledStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = cemtras::Config::default();
//!     let store = Arc::new(SledStore::open_default()?);
//!     let history = ChatHistoryStore::new(store, config.history.max_records);
//!     let client = create_client(&config.provider)?;
//!     let session = ChatSession::new(Role::Operations, config.chat.max_message_chars);
//!     let mut controller =
//!         ChatController::new(session, history, client, config.chat.max_attachment_bytes);
//!
//!     let outcome = controller.send("Why is kiln shell temperature rising?").await?;
//!     println!("{:?}", outcome.reply);
//!     Ok(())
//! }
//! ```

pub mod attachments;
pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod history;
pub mod providers;
pub mod roles;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use config::Config;
pub use error::{CemtrasError, Result};
pub use roles::Role;
pub use session::{ChatController, ChatSession, Message, MessageRole};

#[cfg(test)]
pub mod test_utils;
