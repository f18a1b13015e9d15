//! DirectoryStore trait for per-user conversation lookup

use anyhow::Result;
use async_trait::async_trait;

use crate::storage::ids::UserId;
use crate::storage::types::ConversationSummary;

#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Conversations in which the user authored at least one stored message,
    /// most recently active first
    async fn conversations_for_user(&self, user_id: UserId) -> Result<Vec<ConversationSummary>>;
}
