use crate::roles::Role;
use crate::session::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted conversation snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistoryRecord {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Title derived from the first user message
    pub title: String,
    /// Message list as it was at the last save
    pub messages: Vec<Message>,
    /// Persona active at the last save
    pub role: Role,
    /// When the record was first saved
    pub created_at: DateTime<Utc>,
    /// When the record was last overwritten
    pub last_updated: DateTime<Utc>,
}

impl ChatHistoryRecord {
    /// Compact listing view of this record
    pub fn summary(&self) -> HistorySummary {
        HistorySummary {
            id: self.id.clone(),
            title: self.title.clone(),
            role: self.role,
            message_count: self.messages.len(),
            last_updated: self.last_updated,
        }
    }
}

/// Metadata for listing stored conversations
#[derive(Debug, Clone)]
pub struct HistorySummary {
    /// Unique identifier for the record
    pub id: String,
    /// User-friendly title
    pub title: String,
    /// Persona of the conversation
    pub role: Role,
    /// Number of messages in the snapshot
    pub message_count: usize,
    /// When the record was last updated
    pub last_updated: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_reflects_record() {
        let now = Utc::now();
        let record = ChatHistoryRecord {
            id: "abc".to_string(),
            title: "Coal mill fire".to_string(),
            messages: vec![Message::user("Coal mill fire", None), Message::assistant("Isolate it")],
            role: Role::Operations,
            created_at: now,
            last_updated: now,
        };

        let summary = record.summary();
        assert_eq!(summary.id, "abc");
        assert_eq!(summary.title, "Coal mill fire");
        assert_eq!(summary.role, Role::Operations);
        assert_eq!(summary.message_count, 2);
        assert_eq!(summary.last_updated, now);
    }
}
