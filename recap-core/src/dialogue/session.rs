//! Per-user selection sessions

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::storage::{ConversationId, UserId};

/// Where a user is in the two-step selection
///
/// `Idle` is never stored: a user without an entry is idle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DialogueState {
    #[default]
    Idle,
    /// Conversation list shown, waiting for a pick
    AwaitingConversation { offered: Vec<ConversationId> },
    /// Conversation picked, waiting for a time window
    AwaitingTimeWindow { conversation_id: ConversationId },
}

/// Selection state keyed by user
///
/// Every operation is one lock acquisition, so a read-then-clear by
/// `take` cannot interleave with another event for the same user.
#[derive(Debug, Default)]
pub struct SessionTable {
    sessions: Mutex<HashMap<UserId, DialogueState>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<UserId, DialogueState>> {
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current state without changing it
    pub fn state(&self, user_id: UserId) -> DialogueState {
        self.sessions().get(&user_id).cloned().unwrap_or_default()
    }

    /// Set the state, returning the previous one
    pub fn replace(&self, user_id: UserId, state: DialogueState) -> DialogueState {
        let mut sessions = self.sessions();
        let previous = match state {
            DialogueState::Idle => sessions.remove(&user_id),
            state => sessions.insert(user_id, state),
        };
        previous.unwrap_or_default()
    }

    /// Remove and return the state, leaving the user idle
    pub fn take(&self, user_id: UserId) -> DialogueState {
        self.sessions().remove(&user_id).unwrap_or_default()
    }

    /// Number of users with a selection in progress
    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_and_take() {
        let table = SessionTable::new();
        let user = UserId::new(1);
        assert_eq!(table.state(user), DialogueState::Idle);

        let waiting = DialogueState::AwaitingTimeWindow {
            conversation_id: ConversationId::new(-1),
        };
        assert_eq!(table.replace(user, waiting.clone()), DialogueState::Idle);
        assert_eq!(table.state(user), waiting);
        assert_eq!(table.len(), 1);

        assert_eq!(table.take(user), waiting);
        assert_eq!(table.take(user), DialogueState::Idle);
        assert!(table.is_empty());
    }

    #[test]
    fn test_replace_with_idle_removes_entry() {
        let table = SessionTable::new();
        let user = UserId::new(1);
        table.replace(user, DialogueState::AwaitingConversation { offered: vec![] });
        table.replace(user, DialogueState::Idle);
        assert!(table.is_empty());
    }

    #[test]
    fn test_users_are_independent() {
        let table = SessionTable::new();
        table.replace(
            UserId::new(1),
            DialogueState::AwaitingConversation {
                offered: vec![ConversationId::new(-1)],
            },
        );
        assert_eq!(table.state(UserId::new(2)), DialogueState::Idle);
        table.take(UserId::new(2));
        assert_eq!(table.len(), 1);
    }
}
