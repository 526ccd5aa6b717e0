//! Chat session state and the controller that drives it
//!
//! [`ChatSession`] is the in-memory conversation: transcript, loading state,
//! selected persona and pending attachments. It never performs IO.
//!
//! [`ChatController`] owns a session together with the model client and the
//! history store. It runs turns against the model and persists a snapshot
//! after every change to the transcript or persona once the conversation
//! holds at least one exchange.
//!
//! Every send is tagged with the session generation. Starting a new chat or
//! loading a saved one bumps the generation, so a response that arrives for a
//! conversation that is no longer on screen is dropped instead of being
//! appended to the wrong transcript.

pub mod types;

pub use types::{Message, MessageRole, PendingTurn, SessionState, TurnCompletion};

use crate::attachments::{load_attachments, AttachmentBatch, FileAttachment};
use crate::error::{ProviderError, SessionError, ValidationError};
use crate::history::ChatHistoryStore;
use crate::providers::ModelClient;
use crate::roles::Role;
use crate::storage::ChatHistoryRecord;
use std::path::PathBuf;
use std::sync::Arc;

/// Default maximum length of a single message, in characters
pub const DEFAULT_MAX_MESSAGE_CHARS: usize = 4000;

/// The active conversation
#[derive(Debug, Clone)]
pub struct ChatSession {
    messages: Vec<Message>,
    state: SessionState,
    selected_role: Role,
    pending_files: Vec<FileAttachment>,
    current_history_id: Option<String>,
    error: Option<SessionError>,
    generation: u64,
    max_message_chars: usize,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(Role::default(), DEFAULT_MAX_MESSAGE_CHARS)
    }
}

impl ChatSession {
    /// Create an empty session
    pub fn new(role: Role, max_message_chars: usize) -> Self {
        Self {
            messages: Vec::new(),
            state: SessionState::Idle,
            selected_role: role,
            pending_files: Vec::new(),
            current_history_id: None,
            error: None,
            generation: 0,
            max_message_chars,
        }
    }

    /// Transcript in order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether a model call is outstanding
    pub fn is_loading(&self) -> bool {
        matches!(self.state, SessionState::AwaitingResponse { .. })
    }

    /// Persona used for the next send
    pub fn selected_role(&self) -> Role {
        self.selected_role
    }

    /// Attachments waiting for the next send
    pub fn pending_files(&self) -> &[FileAttachment] {
        &self.pending_files
    }

    /// History record this conversation is saved under, if any
    pub fn current_history_id(&self) -> Option<&str> {
        self.current_history_id.as_deref()
    }

    /// Error banner, if one is showing
    pub fn error(&self) -> Option<&SessionError> {
        self.error.as_ref()
    }

    /// Counter bumped each time the conversation is replaced
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the transcript holds at least one user and one assistant message
    pub fn has_exchange(&self) -> bool {
        let has_user = self.messages.iter().any(|m| m.role == MessageRole::User);
        let has_assistant = self
            .messages
            .iter()
            .any(|m| m.role == MessageRole::Assistant);
        has_user && has_assistant
    }

    /// Accept a send and move to `AwaitingResponse`
    ///
    /// Checks, in order: a credential is configured, no error banner is
    /// shown, no response is pending, the trimmed message is non-empty and
    /// within the length limit. A missing credential also sets the
    /// (persistent) error banner. On success the user message is appended
    /// with the pending attachments, which are cleared.
    pub fn begin_send(
        &mut self,
        content: &str,
        credential_configured: bool,
    ) -> Result<PendingTurn, SessionError> {
        if !credential_configured {
            let err = SessionError::missing_credential();
            self.error = Some(err.clone());
            return Err(err);
        }
        if self.error.is_some() {
            return Err(SessionError::ErrorActive);
        }
        if self.is_loading() {
            return Err(SessionError::Busy);
        }

        let prompt = content.trim();
        if prompt.is_empty() {
            return Err(ValidationError::EmptyMessage.into());
        }
        let len = prompt.chars().count();
        if len > self.max_message_chars {
            return Err(ValidationError::MessageTooLong {
                len,
                max: self.max_message_chars,
            }
            .into());
        }

        let attachments = std::mem::take(&mut self.pending_files);
        let files = if attachments.is_empty() {
            None
        } else {
            Some(attachments.clone())
        };
        self.messages.push(Message::user(prompt, files));
        self.state = SessionState::AwaitingResponse {
            generation: self.generation,
        };

        Ok(PendingTurn {
            generation: self.generation,
            prompt: prompt.to_string(),
            role: self.selected_role,
            attachments,
        })
    }

    /// Hand the model result for a send back to the session
    ///
    /// Results for an earlier generation are dropped and leave the session
    /// untouched. A failure keeps the user message and sets the error banner.
    pub fn complete_turn(
        &mut self,
        generation: u64,
        result: Result<String, ProviderError>,
    ) -> TurnCompletion {
        if generation != self.generation {
            tracing::warn!(
                turn_generation = generation,
                session_generation = self.generation,
                "Dropping response for a conversation that is no longer active"
            );
            return TurnCompletion::Stale;
        }

        self.state = SessionState::Idle;
        match result {
            Ok(text) => {
                self.messages.push(Message::assistant(text));
                TurnCompletion::Answered
            }
            Err(err) => {
                tracing::warn!(error = %err, "Model call failed");
                self.error = Some(SessionError::Provider(err));
                TurnCompletion::Failed
            }
        }
    }

    /// Start an empty conversation
    ///
    /// Clears the transcript, pending attachments and loading state, and
    /// detaches from the current history record. The persona is kept.
    pub fn new_chat(&mut self) {
        self.messages.clear();
        self.pending_files.clear();
        self.state = SessionState::Idle;
        self.current_history_id = None;
        self.generation += 1;
    }

    /// Replace the conversation with a saved snapshot
    pub fn load_chat(&mut self, record: ChatHistoryRecord) {
        self.messages = record.messages;
        self.selected_role = record.role;
        self.state = SessionState::Idle;
        self.current_history_id = Some(record.id);
        self.generation += 1;
    }

    /// Switch persona; the transcript is kept
    pub fn change_role(&mut self, role: Role) {
        self.selected_role = role;
    }

    /// Queue attachments for the next send
    pub fn add_files(&mut self, files: impl IntoIterator<Item = FileAttachment>) {
        self.pending_files.extend(files);
    }

    /// Drop a queued attachment; returns whether one was removed
    pub fn remove_file(&mut self, id: &str) -> bool {
        let before = self.pending_files.len();
        self.pending_files.retain(|f| f.id != id);
        self.pending_files.len() != before
    }

    /// Clear the error banner unless it is a configuration error
    pub fn dismiss_error(&mut self) {
        if self.error.as_ref().is_some_and(|e| !e.is_persistent()) {
            self.error = None;
        }
    }

    fn set_history_id(&mut self, id: String) {
        self.current_history_id = Some(id);
    }
}

/// Result of one completed send
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// What happened to the response
    pub completion: TurnCompletion,
    /// Assistant text when the turn was answered
    pub reply: Option<String>,
    /// Error banner set by a failed turn
    pub error: Option<SessionError>,
    /// Set when the conversation could not be saved; the turn itself stands
    pub storage_warning: Option<String>,
}

/// Drives a [`ChatSession`] against a model client and the history store
pub struct ChatController {
    session: ChatSession,
    history: ChatHistoryStore,
    client: Option<Arc<dyn ModelClient>>,
    max_attachment_bytes: u64,
    storage_warning: Option<String>,
}

impl ChatController {
    /// Create a controller
    ///
    /// `client` is `None` when no credential is configured; every send then
    /// fails with a configuration error before any network attempt.
    pub fn new(
        session: ChatSession,
        history: ChatHistoryStore,
        client: Option<Arc<dyn ModelClient>>,
        max_attachment_bytes: u64,
    ) -> Self {
        Self {
            session,
            history,
            client,
            max_attachment_bytes,
            storage_warning: None,
        }
    }

    /// The active conversation
    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    /// The history store conversations are saved to
    pub fn history(&self) -> &ChatHistoryStore {
        &self.history
    }

    /// Whether a model client is configured
    pub fn has_client(&self) -> bool {
        self.client.is_some()
    }

    /// Send a message and wait for the model's answer
    ///
    /// # Errors
    ///
    /// Returns the rejection from [`ChatSession::begin_send`]; in that case
    /// nothing is appended and nothing is saved. Model failures are not
    /// errors here: they are reported in the returned [`TurnOutcome`].
    pub async fn send(&mut self, content: &str) -> Result<TurnOutcome, SessionError> {
        let turn = self.begin_turn(content)?;
        let client = self
            .client
            .clone()
            .ok_or_else(SessionError::missing_credential)?;

        tracing::debug!(
            role = %turn.role,
            attachments = turn.attachments.len(),
            "Sending prompt to model"
        );
        let result = client
            .generate(&turn.prompt, turn.role, &turn.attachments)
            .await;

        Ok(self.finish_turn(&turn, result))
    }

    /// First half of [`send`](Self::send): accept the message and save
    pub fn begin_turn(&mut self, content: &str) -> Result<PendingTurn, SessionError> {
        let turn = self.session.begin_send(content, self.client.is_some())?;
        self.persist();
        Ok(turn)
    }

    /// Second half of [`send`](Self::send): apply the model result and save
    pub fn finish_turn(
        &mut self,
        turn: &PendingTurn,
        result: Result<String, ProviderError>,
    ) -> TurnOutcome {
        let reply = result.as_ref().ok().cloned();
        let completion = self.session.complete_turn(turn.generation, result);

        if completion == TurnCompletion::Answered {
            self.persist();
        }

        TurnOutcome {
            reply: if completion == TurnCompletion::Answered {
                reply
            } else {
                None
            },
            error: if completion == TurnCompletion::Failed {
                self.session.error().cloned()
            } else {
                None
            },
            completion,
            storage_warning: self.take_storage_warning(),
        }
    }

    /// Start an empty conversation
    pub fn new_chat(&mut self) {
        self.session.new_chat();
        tracing::debug!(generation = self.session.generation(), "Started new chat");
    }

    /// Replace the conversation with a saved snapshot
    pub fn load_chat(&mut self, record: ChatHistoryRecord) {
        tracing::debug!(id = %record.id, "Loading chat");
        self.session.load_chat(record);
        self.persist();
    }

    /// Switch persona for subsequent sends
    pub fn change_role(&mut self, role: Role) {
        self.session.change_role(role);
        self.persist();
    }

    /// Queue already-loaded attachments
    pub fn add_files(&mut self, files: Vec<FileAttachment>) {
        self.session.add_files(files);
    }

    /// Validate, read and queue files from disk
    ///
    /// The returned batch lists what was accepted and what was rejected.
    /// Accepted files are queued only once every read has finished.
    pub async fn attach_paths(&mut self, paths: &[PathBuf]) -> AttachmentBatch {
        let batch = load_attachments(paths, self.max_attachment_bytes).await;
        self.session.add_files(batch.accepted.iter().cloned());
        batch
    }

    /// Drop a queued attachment
    pub fn remove_file(&mut self, id: &str) -> bool {
        self.session.remove_file(id)
    }

    /// Clear a dismissible error banner
    pub fn dismiss_error(&mut self) {
        self.session.dismiss_error();
    }

    /// Warning left by the most recent failed save, if any
    pub fn take_storage_warning(&mut self) -> Option<String> {
        self.storage_warning.take()
    }

    fn persist(&mut self) {
        if !self.session.has_exchange() {
            return;
        }

        let result = self.history.save(
            self.session.current_history_id(),
            self.session.selected_role(),
            self.session.messages(),
        );
        match result {
            Ok(id) => self.session.set_history_id(id),
            Err(e) => {
                tracing::warn!("Failed to save chat history: {:#}", e);
                self.storage_warning = Some(format!("Conversation was not saved: {:#}", e));
            }
        }
    }
}
