//! WindowStore trait for message retrieval

use anyhow::Result;
use async_trait::async_trait;

use crate::storage::ids::ConversationId;
use crate::storage::types::{ConversationRecord, StoredMessage};

/// Trait for the read side of message storage
#[async_trait]
pub trait WindowStore: Send + Sync {
    /// Up to `limit` newest messages, newest first
    ///
    /// When `since` is given only messages with `created_at >= since` are
    /// considered.
    async fn latest_messages(
        &self,
        conversation_id: ConversationId,
        limit: usize,
        since: Option<i64>,
    ) -> Result<Vec<StoredMessage>>;

    /// All messages with `start <= created_at < end`, oldest first
    async fn messages_between(
        &self,
        conversation_id: ConversationId,
        start: i64,
        end: i64,
    ) -> Result<Vec<StoredMessage>>;

    /// Conversation record, if any message was ever stored for it
    async fn conversation(&self, id: ConversationId) -> Result<Option<ConversationRecord>>;
}
