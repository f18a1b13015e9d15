//! In-memory storage for testing
//!
//! `MemoryStore` implements the same traits as `SqliteStore` with the same
//! ordering and upsert rules, so either can back the bot.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::clock::{Clock, SystemClock};
use crate::storage::ids::{ConversationId, UserId};
use crate::storage::traits::{DirectoryStore, MessageStore, WindowStore};
use crate::storage::types::{ConversationRecord, ConversationSummary, NewMessage, StoredMessage};

#[derive(Debug, Default)]
struct MemoryState {
    messages: Vec<StoredMessage>,
    conversations: HashMap<ConversationId, ConversationRecord>,
    next_id: i64,
}

/// In-memory message store for testing
#[derive(Debug)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Number of stored messages across all conversations
    pub fn len(&self) -> usize {
        self.state().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn newest_first(a: &StoredMessage, b: &StoredMessage) -> std::cmp::Ordering {
    (b.created_at, b.id).cmp(&(a.created_at, a.id))
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn append(&self, message: NewMessage) -> Result<StoredMessage> {
        message.validate()?;

        let mut state = self.state();
        let created_at = self.clock.now_millis();
        state.next_id += 1;

        let stored = StoredMessage {
            id: state.next_id,
            conversation_id: message.conversation_id,
            conversation_name: message.conversation_label(),
            author_id: message.author_id,
            author_name: message.author_label(),
            text: message.text,
            created_at,
        };

        let record = state
            .conversations
            .entry(stored.conversation_id)
            .or_insert_with(|| ConversationRecord {
                id: stored.conversation_id,
                name: None,
                last_activity: created_at,
                member_count: None,
            });
        if created_at >= record.last_activity {
            if stored.conversation_name.is_some() {
                record.name = stored.conversation_name.clone();
            }
            record.last_activity = created_at;
        }

        state.messages.push(stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl WindowStore for MemoryStore {
    async fn latest_messages(
        &self,
        conversation_id: ConversationId,
        limit: usize,
        since: Option<i64>,
    ) -> Result<Vec<StoredMessage>> {
        let since = since.unwrap_or(i64::MIN);
        let state = self.state();
        let mut messages: Vec<_> = state
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id && m.created_at >= since)
            .cloned()
            .collect();
        messages.sort_by(newest_first);
        messages.truncate(limit);
        Ok(messages)
    }

    async fn messages_between(
        &self,
        conversation_id: ConversationId,
        start: i64,
        end: i64,
    ) -> Result<Vec<StoredMessage>> {
        let state = self.state();
        let mut messages: Vec<_> = state
            .messages
            .iter()
            .filter(|m| {
                m.conversation_id == conversation_id && m.created_at >= start && m.created_at < end
            })
            .cloned()
            .collect();
        messages.sort_by_key(|m| (m.created_at, m.id));
        Ok(messages)
    }

    async fn conversation(&self, id: ConversationId) -> Result<Option<ConversationRecord>> {
        Ok(self.state().conversations.get(&id).cloned())
    }
}

#[async_trait]
impl DirectoryStore for MemoryStore {
    async fn conversations_for_user(&self, user_id: UserId) -> Result<Vec<ConversationSummary>> {
        let state = self.state();
        let mut counts: HashMap<ConversationId, u64> = HashMap::new();
        for message in &state.messages {
            *counts.entry(message.conversation_id).or_default() += 1;
        }

        let mut summaries: Vec<_> = state
            .conversations
            .values()
            .filter(|record| {
                state
                    .messages
                    .iter()
                    .any(|m| m.conversation_id == record.id && m.author_id == user_id)
            })
            .map(|record| ConversationSummary {
                conversation_id: record.id,
                name: record.name.clone(),
                last_activity: record.last_activity,
                message_count: counts.get(&record.id).copied().unwrap_or(0),
            })
            .collect();
        summaries.sort_by(|a, b| {
            (b.last_activity, b.conversation_id).cmp(&(a.last_activity, a.conversation_id))
        });
        Ok(summaries)
    }
}
