use crate::attachments::FileAttachment;
use crate::roles::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Typed by the user
    User,
    /// Returned by the model
    Assistant,
}

/// One entry in a conversation transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier
    pub id: String,
    /// Author
    pub role: MessageRole,
    /// Text content
    pub content: String,
    /// Creation time
    pub timestamp: DateTime<Utc>,
    /// Attachments sent with a user message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileAttachment>>,
}

impl Message {
    /// Create a user message
    pub fn user(content: impl Into<String>, files: Option<Vec<FileAttachment>>) -> Self {
        Self::new(MessageRole::User, content.into(), files)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content.into(), None)
    }

    fn new(role: MessageRole, content: String, files: Option<Vec<FileAttachment>>) -> Self {
        Self {
            id: format!("msg_{}", Uuid::new_v4()),
            role,
            content,
            timestamp: Utc::now(),
            files,
        }
    }

    /// Attachments of this message, empty if none
    pub fn attachments(&self) -> &[FileAttachment] {
        self.files.as_deref().unwrap_or(&[])
    }
}

/// Whether a model call is outstanding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Ready to send
    #[default]
    Idle,
    /// Waiting for the response to the send tagged with `generation`
    AwaitingResponse {
        /// Session generation the outstanding send belongs to
        generation: u64,
    },
}

/// A send that has been accepted and is waiting for the model
///
/// Returned by `begin_send`; carries what the model call needs and the
/// generation used to match the response back to its conversation.
#[derive(Debug, Clone)]
pub struct PendingTurn {
    /// Session generation at the time of the send
    pub generation: u64,
    /// Trimmed prompt text
    pub prompt: String,
    /// Persona selected at the time of the send
    pub role: Role,
    /// Attachments captured with the user message
    pub attachments: Vec<FileAttachment>,
}

/// What happened to a model response handed back to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnCompletion {
    /// The assistant message was appended
    Answered,
    /// The call failed; the session error was set
    Failed,
    /// The conversation changed while waiting; the response was dropped
    Stale,
}
