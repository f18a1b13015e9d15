//! Windowed message retrieval
//!
//! `RetrievalEngine` turns a `TimeWindow` into the slice of a conversation
//! that gets summarized. Results are always oldest first.

use anyhow::Result;
use std::collections::HashSet;
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

use crate::clock::{local_day_bounds, Clock};
use crate::storage::{fallback_conversation_name, ConversationId, StoredMessage, WindowStore};

/// Number of messages in the "recent" window unless configured otherwise
pub const DEFAULT_RECENT_LIMIT: usize = 200;

/// Hour windows offered by the selection dialogue
pub const PRESET_HOURS: [u32; 3] = [3, 6, 12];

const MILLIS_PER_HOUR: i64 = 3_600_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("message limit must be positive")]
    InvalidLimit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized time window '{0}'")]
pub struct InvalidWindow(pub String);

/// Which slice of a conversation to summarize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeWindow {
    /// The newest N messages regardless of age
    Recent,
    /// Messages since local midnight
    Today,
    /// Messages from the last N hours
    LastHours(NonZeroU32),
}

impl TimeWindow {
    pub fn last_hours(hours: u32) -> Option<Self> {
        NonZeroU32::new(hours).map(Self::LastHours)
    }

    /// The fixed choices shown after a conversation is picked
    pub fn presets() -> Vec<Self> {
        let mut windows = vec![Self::Recent, Self::Today];
        windows.extend(PRESET_HOURS.iter().filter_map(|h| Self::last_hours(*h)));
        windows
    }

    /// Stable token used in action ids, parsed back by `FromStr`
    pub fn token(&self) -> String {
        match self {
            Self::Recent => "recent".to_string(),
            Self::Today => "today".to_string(),
            Self::LastHours(hours) => format!("{}h", hours),
        }
    }

    /// Human readable period, e.g. "last 3 hours"
    pub fn label(&self, recent_limit: usize) -> String {
        match self {
            Self::Recent => format!("last {} messages", recent_limit),
            Self::Today => "today".to_string(),
            Self::LastHours(hours) if hours.get() == 1 => "last hour".to_string(),
            Self::LastHours(hours) => format!("last {} hours", hours),
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token())
    }
}

impl FromStr for TimeWindow {
    type Err = InvalidWindow;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_ascii_lowercase();
        match token.as_str() {
            "recent" => Ok(Self::Recent),
            "today" => Ok(Self::Today),
            _ => token
                .strip_suffix('h')
                .and_then(|hours| hours.parse::<u32>().ok())
                .and_then(Self::last_hours)
                .ok_or_else(|| InvalidWindow(s.to_string())),
        }
    }
}

/// Messages selected for one summary, oldest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageWindow {
    pub conversation_id: ConversationId,
    pub conversation_name: String,
    pub period: String,
    pub messages: Vec<StoredMessage>,
}

impl MessageWindow {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn participant_count(&self) -> usize {
        self.messages
            .iter()
            .map(|m| m.author_id)
            .collect::<HashSet<_>>()
            .len()
    }
}

pub struct RetrievalEngine<S: ?Sized> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    recent_limit: usize,
}

impl<S: ?Sized> Clone for RetrievalEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            clock: self.clock.clone(),
            recent_limit: self.recent_limit,
        }
    }
}

impl<S: WindowStore + ?Sized> RetrievalEngine<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }

    pub fn with_recent_limit(mut self, limit: usize) -> Self {
        self.recent_limit = limit;
        self
    }

    pub fn recent_limit(&self) -> usize {
        self.recent_limit
    }

    /// Up to `limit` newest messages, returned oldest first
    pub async fn recent(&self, conversation_id: ConversationId, limit: usize) -> Result<Vec<StoredMessage>> {
        check_limit(limit)?;
        let mut messages = self.store.latest_messages(conversation_id, limit, None).await?;
        messages.reverse();
        Ok(messages)
    }

    /// Up to `limit` newest messages from the last `hours` hours, oldest first
    pub async fn recent_within_hours(
        &self,
        conversation_id: ConversationId,
        limit: usize,
        hours: NonZeroU32,
    ) -> Result<Vec<StoredMessage>> {
        check_limit(limit)?;
        let since = self.clock.now_millis() - i64::from(hours.get()) * MILLIS_PER_HOUR;
        let mut messages = self
            .store
            .latest_messages(conversation_id, limit, Some(since))
            .await?;
        messages.reverse();
        Ok(messages)
    }

    /// Every message since local midnight, oldest first
    pub async fn today(&self, conversation_id: ConversationId) -> Result<Vec<StoredMessage>> {
        let (start, end) = local_day_bounds(self.clock.now());
        self.store.messages_between(conversation_id, start, end).await
    }

    /// Resolve a window choice to its messages and display labels
    pub async fn window(&self, conversation_id: ConversationId, window: TimeWindow) -> Result<MessageWindow> {
        let messages = match window {
            TimeWindow::Recent => self.recent(conversation_id, self.recent_limit).await?,
            TimeWindow::Today => self.today(conversation_id).await?,
            TimeWindow::LastHours(hours) => {
                self.recent_within_hours(conversation_id, self.recent_limit, hours)
                    .await?
            }
        };
        debug!(
            conversation = %conversation_id,
            window = %window,
            count = messages.len(),
            "retrieved message window"
        );

        Ok(MessageWindow {
            conversation_id,
            conversation_name: self.conversation_name(conversation_id).await?,
            period: window.label(self.recent_limit),
            messages,
        })
    }

    /// Display name of a conversation, falling back to "Group <id>"
    pub async fn conversation_name(&self, conversation_id: ConversationId) -> Result<String> {
        Ok(self
            .store
            .conversation(conversation_id)
            .await?
            .map(|record| record.display_name())
            .unwrap_or_else(|| fallback_conversation_name(conversation_id)))
    }
}

fn check_limit(limit: usize) -> Result<(), QueryError> {
    if limit == 0 {
        return Err(QueryError::InvalidLimit);
    }
    Ok(())
}
