//! Chat history store
//!
//! Saved conversations are kept as one JSON array under
//! [`CHAT_HISTORY_KEY`], most recently updated first. Every save rewrites the
//! whole array. Updating a record moves it to the front; when the collection
//! grows past the cap, the least recently updated records are evicted.

use crate::error::{CemtrasError, Result};
use crate::roles::Role;
use crate::session::{Message, MessageRole};
use crate::storage::{read_json, write_json, ChatHistoryRecord, KeyValueStore, CHAT_HISTORY_KEY};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Default maximum number of retained conversations
pub const DEFAULT_MAX_HISTORIES: usize = 50;

/// Number of characters of the first user message used as a title
pub const TITLE_MAX_CHARS: usize = 50;

const UNTITLED: &str = "New Chat";

/// Derive a record title from the earliest user message
///
/// # Examples
///
/// ```
/// use cemtras::history::derive_title;
/// use cemtras::session::Message;
///
/// let messages = vec![Message::user("Why is my kiln shell hot?", None)];
/// assert_eq!(derive_title(&messages), "Why is my kiln shell hot?");
/// assert_eq!(derive_title(&[]), "New Chat");
/// ```
pub fn derive_title(messages: &[Message]) -> String {
    let first = messages
        .iter()
        .find(|m| m.role == MessageRole::User)
        .map(|m| m.content.trim())
        .filter(|c| !c.is_empty());

    match first {
        Some(content) if content.chars().count() > TITLE_MAX_CHARS => {
            let truncated: String = content.chars().take(TITLE_MAX_CHARS).collect();
            format!("{}...", truncated.trim_end())
        }
        Some(content) => content.to_string(),
        None => UNTITLED.to_string(),
    }
}

/// Persistent, capped list of conversation snapshots
#[derive(Clone)]
pub struct ChatHistoryStore {
    store: Arc<dyn KeyValueStore>,
    max_records: usize,
}

impl ChatHistoryStore {
    /// Create a store keeping at most `max_records` conversations
    pub fn new(store: Arc<dyn KeyValueStore>, max_records: usize) -> Self {
        Self {
            store,
            max_records: max_records.max(1),
        }
    }

    /// Configured cap
    pub fn max_records(&self) -> usize {
        self.max_records
    }

    /// All records, most recently updated first
    pub fn list(&self) -> Result<Vec<ChatHistoryRecord>> {
        Ok(read_json(self.store.as_ref(), CHAT_HISTORY_KEY)?.unwrap_or_default())
    }

    /// Record with exactly this id
    pub fn get(&self, id: &str) -> Result<Option<ChatHistoryRecord>> {
        Ok(self.list()?.into_iter().find(|r| r.id == id))
    }

    /// Record matching a full id or an unambiguous id prefix
    ///
    /// # Errors
    ///
    /// Returns `CemtrasError::Storage` when the prefix matches more than one record
    pub fn resolve(&self, id_or_prefix: &str) -> Result<Option<ChatHistoryRecord>> {
        let records = self.list()?;
        if let Some(record) = records.iter().find(|r| r.id == id_or_prefix) {
            return Ok(Some(record.clone()));
        }

        let mut matches = records
            .into_iter()
            .filter(|r| !id_or_prefix.is_empty() && r.id.starts_with(id_or_prefix));
        let first = matches.next();
        if matches.next().is_some() {
            return Err(CemtrasError::Storage(format!(
                "Id prefix '{}' matches more than one conversation",
                id_or_prefix
            ))
            .into());
        }
        Ok(first)
    }

    /// Save a snapshot of `messages`
    ///
    /// With `current_id == None` a new record is created. With an id, the
    /// record carrying that id is overwritten in place of its old position
    /// and moved to the front; if no such record exists (for example it was
    /// evicted or deleted) a new one is created under the same id.
    ///
    /// Returns the id of the saved record.
    pub fn save(&self, current_id: Option<&str>, role: Role, messages: &[Message]) -> Result<String> {
        let mut records = self.list()?;
        let now = Utc::now();
        let title = derive_title(messages);

        let existing = current_id.and_then(|id| records.iter().position(|r| r.id == id));

        let record = match existing {
            Some(index) => {
                let mut record = records.remove(index);
                record.title = title;
                record.messages = messages.to_vec();
                record.role = role;
                record.last_updated = now;
                tracing::debug!(id = %record.id, "Updating chat history record");
                record
            }
            None => {
                let id = current_id
                    .map(str::to_string)
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                tracing::debug!(id = %id, "Creating chat history record");
                ChatHistoryRecord {
                    id,
                    title,
                    messages: messages.to_vec(),
                    role,
                    created_at: now,
                    last_updated: now,
                }
            }
        };

        let id = record.id.clone();
        records.insert(0, record);
        self.evict_over_cap(&mut records);

        write_json(self.store.as_ref(), CHAT_HISTORY_KEY, &records)?;
        Ok(id)
    }

    /// Remove a record; returns whether one was removed
    pub fn delete(&self, id: &str) -> Result<bool> {
        let mut records = self.list()?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Ok(false);
        }
        write_json(self.store.as_ref(), CHAT_HISTORY_KEY, &records)?;
        Ok(true)
    }

    /// Remove every record
    pub fn clear(&self) -> Result<()> {
        self.store.remove(CHAT_HISTORY_KEY)
    }

    fn evict_over_cap(&self, records: &mut Vec<ChatHistoryRecord>) {
        while records.len() > self.max_records {
            let oldest = records
                .iter()
                .enumerate()
                .min_by_key(|(i, r)| (r.last_updated, std::cmp::Reverse(*i)))
                .map(|(i, _)| i);
            match oldest {
                Some(index) => {
                    let evicted = records.remove(index);
                    tracing::info!(id = %evicted.id, title = %evicted.title, "Evicted oldest conversation");
                }
                None => break,
            }
        }
    }
}
