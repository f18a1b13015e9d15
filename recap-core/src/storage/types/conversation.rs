//! Conversation storage types

use serde::{Deserialize, Serialize};

use crate::storage::ids::ConversationId;

/// Display name used when a conversation has no recorded name
pub fn fallback_conversation_name(id: ConversationId) -> String {
    format!("Group {}", id)
}

/// Per-conversation record, refreshed on every accepted message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: ConversationId,
    pub name: Option<String>,
    pub last_activity: i64,
    /// Reserved for transports that report it; never populated by ingestion
    pub member_count: Option<i64>,
}

impl ConversationRecord {
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| fallback_conversation_name(self.id))
    }
}

/// Directory entry: a conversation a user has written in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub conversation_id: ConversationId,
    pub name: Option<String>,
    pub last_activity: i64,
    /// Total messages stored for the conversation, from all authors
    pub message_count: u64,
}

impl ConversationSummary {
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| fallback_conversation_name(self.conversation_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_fallback() {
        let summary = ConversationSummary {
            conversation_id: ConversationId::new(-42),
            name: None,
            last_activity: 0,
            message_count: 3,
        };
        assert_eq!(summary.display_name(), "Group -42");

        let record = ConversationRecord {
            id: ConversationId::new(1),
            name: Some("Family".to_string()),
            last_activity: 0,
            member_count: None,
        };
        assert_eq!(record.display_name(), "Family");
    }
}
