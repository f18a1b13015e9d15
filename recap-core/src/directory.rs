//! Per-user conversation directory

use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

use crate::storage::{ConversationSummary, DirectoryStore, UserId};

/// Answers "which groups can this user summarize"
///
/// A user qualifies for a conversation once they authored a stored message
/// there. Membership is never checked against the transport.
pub struct ConversationDirectory<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for ConversationDirectory<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: DirectoryStore + ?Sized> ConversationDirectory<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Conversations for the user, most recently active first
    pub async fn conversations_for_user(&self, user_id: UserId) -> Result<Vec<ConversationSummary>> {
        let conversations = self.store.conversations_for_user(user_id).await?;
        debug!(user = %user_id, count = conversations.len(), "listed conversations");
        Ok(conversations)
    }

    /// The single most recently active conversation for the user
    pub async fn most_recent_for_user(&self, user_id: UserId) -> Result<Option<ConversationSummary>> {
        Ok(self.conversations_for_user(user_id).await?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::{ConversationId, MemoryStore, MessageStore, NewMessage};
    use chrono::{Duration, TimeZone, Utc};

    #[tokio::test]
    async fn test_most_recent_for_user() {
        let clock = Arc::new(ManualClock::at(Utc.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap()));
        let store = Arc::new(MemoryStore::new().with_clock(clock.clone()));
        let directory = ConversationDirectory::new(store.clone());
        let user = UserId::new(9);

        assert!(directory.most_recent_for_user(user).await.unwrap().is_none());

        store
            .append(NewMessage::new(ConversationId::new(-1), user, "one"))
            .await
            .unwrap();
        clock.advance(Duration::minutes(1));
        store
            .append(NewMessage::new(ConversationId::new(-2), user, "two"))
            .await
            .unwrap();
        clock.advance(Duration::minutes(1));
        // Activity by someone else still makes -1 the freshest conversation
        store
            .append(NewMessage::new(ConversationId::new(-1), UserId::new(10), "three"))
            .await
            .unwrap();

        let latest = directory.most_recent_for_user(user).await.unwrap().unwrap();
        assert_eq!(latest.conversation_id, ConversationId::new(-1));
        assert_eq!(directory.conversations_for_user(user).await.unwrap().len(), 2);
    }
}
