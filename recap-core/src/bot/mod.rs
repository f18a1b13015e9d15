//! Transport-facing router
//!
//! A transport adapter turns platform updates into `InboundEvent`s, hands
//! them to `Bot::handle`, and sends back whatever `Reply` comes out.
//! Events for different users may be handled concurrently.

mod command;
mod reply;

pub use command::{parse_command, Action, Command};
pub use reply::{Choice, Reply, HELP_TEXT, WELCOME_TEXT};

use anyhow::Result;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::dialogue::{Outcome, SelectionDialogue};
use crate::storage::{
    ConversationId, ConversationStorage, MessageError, NewMessage, StoredMessage, UserId,
    COMMAND_PREFIX,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Group,
    Private,
}

/// A text message as seen by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingText {
    pub chat_kind: ChatKind,
    pub conversation_id: ConversationId,
    pub conversation_name: Option<String>,
    pub author_id: UserId,
    pub author_name: Option<String>,
    pub text: String,
}

impl IncomingText {
    pub fn group(
        conversation_id: ConversationId,
        author_id: UserId,
        text: impl Into<String>,
    ) -> Self {
        Self {
            chat_kind: ChatKind::Group,
            conversation_id,
            conversation_name: None,
            author_id,
            author_name: None,
            text: text.into(),
        }
    }

    /// A direct message; the conversation is the private chat with the user
    pub fn private(author_id: UserId, text: impl Into<String>) -> Self {
        Self {
            chat_kind: ChatKind::Private,
            conversation_id: ConversationId::new(author_id.get()),
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
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Text(IncomingText),
    /// A button press
    Action { user_id: UserId, action_id: String },
}

/// Ingestion counters
#[derive(Debug, Default)]
pub struct IngestStats {
    accepted: AtomicU64,
    rejected: AtomicU64,
    failed: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct IngestSnapshot {
    pub accepted: u64,
    pub rejected: u64,
    pub failed: u64,
}

impl IngestStats {
    pub fn snapshot(&self) -> IngestSnapshot {
        IngestSnapshot {
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

pub struct Bot<S: ?Sized> {
    store: Arc<S>,
    dialogue: SelectionDialogue<S>,
    stats: IngestStats,
}

impl<S: ConversationStorage + ?Sized> Bot<S> {
    pub fn new(store: Arc<S>, dialogue: SelectionDialogue<S>) -> Self {
        Self {
            store,
            dialogue,
            stats: IngestStats::default(),
        }
    }

    pub fn dialogue(&self) -> &SelectionDialogue<S> {
        &self.dialogue
    }

    pub fn stats(&self) -> IngestSnapshot {
        self.stats.snapshot()
    }

    /// Route one event; `None` means the bot stays silent
    pub async fn handle(&self, event: InboundEvent) -> Option<Reply> {
        match event {
            InboundEvent::Text(message) => self.handle_text(message).await,
            InboundEvent::Action { user_id, action_id } => {
                Some(self.handle_action(user_id, &action_id).await)
            }
        }
    }

    async fn handle_text(&self, message: IncomingText) -> Option<Reply> {
        if let Some(command) = parse_command(&message.text) {
            debug!(user = %message.author_id, ?command, "command");
            return Some(self.handle_command(message.author_id, command).await);
        }
        if message.text.trim_start().starts_with(COMMAND_PREFIX) {
            debug!(user = %message.author_id, "ignoring unknown command");
            return None;
        }

        if message.chat_kind == ChatKind::Group {
            // Ingestion problems are logged and counted, never surfaced to the chat
            let _ = self.ingest(message).await;
        }
        None
    }

    async fn handle_command(&self, user_id: UserId, command: Command) -> Reply {
        let outcome = match command {
            Command::Start => return Reply::welcome(),
            Command::Help => return Reply::help(),
            Command::InvalidSummaryArgument(argument) => {
                debug!(user = %user_id, %argument, "invalid summary argument");
                return Reply::invalid_time_format();
            }
            Command::Summary => self.dialogue.start(user_id).await,
            Command::SummaryToday => self.dialogue.summarize_today(user_id).await,
            Command::SummaryLastHours(hours) => {
                self.dialogue.summarize_last_hours(user_id, hours).await
            }
        };
        Reply::from(outcome)
    }

    async fn handle_action(&self, user_id: UserId, action_id: &str) -> Reply {
        let outcome = match action_id.parse::<Action>() {
            Ok(Action::PickConversation(conversation_id)) => {
                self.dialogue.pick_conversation(user_id, conversation_id).await
            }
            Ok(Action::PickWindow(window)) => self.dialogue.pick_window(user_id, window).await,
            Err(e) => {
                debug!(user = %user_id, "{}", e);
                self.dialogue.abandon(user_id);
                Outcome::Invalid(e)
            }
        };
        Reply::from(outcome)
    }

    /// Store a group message, updating the ingestion counters
    pub async fn ingest(&self, message: IncomingText) -> Result<StoredMessage> {
        let mut new_message = NewMessage::new(message.conversation_id, message.author_id, message.text);
        new_message.conversation_name = message.conversation_name;
        new_message.author_name = message.author_name;

        match self.store.append(new_message).await {
            Ok(stored) => {
                self.stats.accepted.fetch_add(1, Ordering::Relaxed);
                debug!(
                    conversation = %stored.conversation_id,
                    author = %stored.author_id,
                    id = stored.id,
                    "stored message"
                );
                Ok(stored)
            }
            Err(e) => {
                if let Some(reason) = e.downcast_ref::<MessageError>() {
                    self.stats.rejected.fetch_add(1, Ordering::Relaxed);
                    debug!("message rejected: {}", reason);
                } else {
                    self.stats.failed.fetch_add(1, Ordering::Relaxed);
                    error!("failed to store message: {:#}", e);
                }
                Err(e)
            }
        }
    }

    /// Log the current counters
    pub fn log_stats(&self) {
        let stats = self.stats();
        info!(
            accepted = stats.accepted,
            rejected = stats.rejected,
            failed = stats.failed,
            "ingestion stats"
        );
    }
}
