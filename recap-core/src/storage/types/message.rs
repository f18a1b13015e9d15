//! Message storage types

use serde::{Deserialize, Serialize};

use crate::storage::ids::{ConversationId, UserId};

/// Prefix that marks a text as a bot command rather than chat content
pub const COMMAND_PREFIX: char = '/';

/// Reasons a message is refused by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MessageError {
    #[error("message text is empty")]
    Empty,
    #[error("message text is a command")]
    Command,
}

/// Display name used when an author has no name
pub fn fallback_author_name(author_id: UserId) -> String {
    format!("User{}", author_id)
}

/// A message as received from the transport, before it is persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub conversation_id: ConversationId,
    pub conversation_name: Option<String>,
    pub author_id: UserId,
    pub author_name: Option<String>,
    pub text: String,
}

impl NewMessage {
    pub fn new(conversation_id: ConversationId, author_id: UserId, text: impl Into<String>) -> Self {
        Self {
            conversation_id,
            conversation_name: None,
            author_id,
            author_name: None,
            text: text.into(),
        }
    }

    pub fn with_conversation_name(mut self, name: impl Into<String>) -> Self {
        self.conversation_name = Some(name.into());
        self
    }

    pub fn with_author_name(mut self, name: impl Into<String>) -> Self {
        self.author_name = Some(name.into());
        self
    }

    /// Check that the text is non-blank and not a command
    pub fn validate(&self) -> Result<(), MessageError> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(MessageError::Empty);
        }
        if text.starts_with(COMMAND_PREFIX) {
            return Err(MessageError::Command);
        }
        Ok(())
    }

    /// Author name as it will be stored
    pub fn author_label(&self) -> String {
        match self.author_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => fallback_author_name(self.author_id),
        }
    }

    /// Conversation name as it will be stored, blank names count as absent
    pub fn conversation_label(&self) -> Option<String> {
        self.conversation_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    }
}

/// A persisted message
///
/// `created_at` is assigned by the store, in unix milliseconds. `id` grows
/// with insertion order and breaks ties between equal timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: i64,
    pub conversation_id: ConversationId,
    pub conversation_name: Option<String>,
    pub author_id: UserId,
    pub author_name: String,
    pub text: String,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(text: &str) -> NewMessage {
        NewMessage::new(ConversationId::new(-100), UserId::new(7), text)
    }

    #[test]
    fn test_validate() {
        assert_eq!(message("hello").validate(), Ok(()));
        assert_eq!(message("   ").validate(), Err(MessageError::Empty));
        assert_eq!(message("").validate(), Err(MessageError::Empty));
        assert_eq!(message("/summary").validate(), Err(MessageError::Command));
        assert_eq!(message("  /start").validate(), Err(MessageError::Command));
        assert_eq!(message("a/b").validate(), Ok(()));
    }

    #[test]
    fn test_author_label_fallback() {
        assert_eq!(message("hi").author_label(), "User7");
        assert_eq!(message("hi").with_author_name("  ").author_label(), "User7");
        assert_eq!(message("hi").with_author_name("Alice").author_label(), "Alice");
    }

    #[test]
    fn test_conversation_label() {
        assert_eq!(message("hi").conversation_label(), None);
        assert_eq!(message("hi").with_conversation_name("").conversation_label(), None);
        assert_eq!(
            message("hi").with_conversation_name("Team").conversation_label(),
            Some("Team".to_string())
        );
    }
}
