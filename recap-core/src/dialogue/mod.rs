//! Two-step summary selection
//!
//! A user first picks a conversation, then a time window. The selection
//! is tracked per user in a `SessionTable`; the final step clears the
//! session before any slow work starts, so a fresh `start` during a
//! running summary is never clobbered.
//!
//! Shortcuts (`summarize_today`, `summarize_last_hours`) skip the picker
//! and use the user's most recently active conversation. They never read
//! or write sessions.

mod outcome;
mod session;

pub use outcome::{DialogueError, Outcome, WindowChoice};
pub use session::{DialogueState, SessionTable};

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use crate::clock::Clock;
use crate::directory::ConversationDirectory;
use crate::retrieval::{RetrievalEngine, TimeWindow};
use crate::storage::{fallback_conversation_name, ConversationId, DirectoryStore, UserId, WindowStore};
use crate::summarizer::{Summarizer, SummaryRequest};
use crate::transcript::format_transcript;

/// Default upper bound on a single summarizer call
pub const DEFAULT_SUMMARY_TIMEOUT: Duration = Duration::from_secs(60);

/// Called with the requesting user once a non-empty window is about to be
/// summarized, so a transport can show a progress notice
pub type ProgressHook = Arc<dyn Fn(UserId) + Send + Sync>;

pub struct SelectionDialogue<S: ?Sized> {
    directory: ConversationDirectory<S>,
    retrieval: RetrievalEngine<S>,
    summarizer: Arc<dyn Summarizer>,
    sessions: Arc<SessionTable>,
    summary_timeout: Duration,
    progress: Option<ProgressHook>,
}

impl<S: WindowStore + DirectoryStore + ?Sized> SelectionDialogue<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, summarizer: Arc<dyn Summarizer>) -> Self {
        Self {
            directory: ConversationDirectory::new(store.clone()),
            retrieval: RetrievalEngine::new(store, clock),
            summarizer,
            sessions: Arc::new(SessionTable::new()),
            summary_timeout: DEFAULT_SUMMARY_TIMEOUT,
            progress: None,
        }
    }

    pub fn with_summary_timeout(mut self, timeout: Duration) -> Self {
        self.summary_timeout = timeout;
        self
    }

    pub fn with_progress(mut self, hook: ProgressHook) -> Self {
        self.progress = Some(hook);
        self
    }

    pub fn with_recent_limit(mut self, limit: usize) -> Self {
        self.retrieval = self.retrieval.with_recent_limit(limit);
        self
    }

    /// Share a session table with another dialogue instance
    pub fn with_sessions(mut self, sessions: Arc<SessionTable>) -> Self {
        self.sessions = sessions;
        self
    }

    pub fn sessions(&self) -> &Arc<SessionTable> {
        &self.sessions
    }

    pub fn retrieval(&self) -> &RetrievalEngine<S> {
        &self.retrieval
    }

    pub fn directory(&self) -> &ConversationDirectory<S> {
        &self.directory
    }

    /// Begin a selection, discarding any selection already in progress
    #[instrument(level = "debug", skip_all, fields(user = %user_id))]
    pub async fn start(&self, user_id: UserId) -> Outcome {
        self.sessions.take(user_id);

        let conversations = match self.directory.conversations_for_user(user_id).await {
            Ok(conversations) => conversations,
            Err(e) => {
                error!(user = %user_id, "failed to list conversations: {:#}", e);
                return Outcome::Failed;
            }
        };
        if conversations.is_empty() {
            return Outcome::NoConversations;
        }

        let offered = conversations.iter().map(|c| c.conversation_id).collect();
        self.sessions
            .replace(user_id, DialogueState::AwaitingConversation { offered });
        Outcome::ChooseConversation(conversations)
    }

    /// Record the conversation pick and offer the time windows
    #[instrument(level = "debug", skip_all, fields(user = %user_id, conversation = %conversation_id))]
    pub async fn pick_conversation(&self, user_id: UserId, conversation_id: ConversationId) -> Outcome {
        match self.sessions.take(user_id) {
            DialogueState::AwaitingConversation { offered } if offered.contains(&conversation_id) => {}
            DialogueState::AwaitingConversation { .. } => {
                return Outcome::Invalid(DialogueError::UnknownConversation(conversation_id));
            }
            DialogueState::AwaitingTimeWindow { .. } => {
                return Outcome::Invalid(DialogueError::UnexpectedStep);
            }
            DialogueState::Idle => return Outcome::Invalid(DialogueError::NoActiveSelection),
        }

        self.sessions
            .replace(user_id, DialogueState::AwaitingTimeWindow { conversation_id });

        let recent_limit = self.retrieval.recent_limit();
        let windows = TimeWindow::presets()
            .into_iter()
            .map(|window| WindowChoice {
                label: window.label(recent_limit),
                window,
            })
            .collect();

        Outcome::ChooseWindow {
            conversation_id,
            conversation_name: self.conversation_name(conversation_id).await,
            windows,
        }
    }

    /// Finish the selection and produce the summary
    #[instrument(level = "debug", skip_all, fields(user = %user_id, window = %window))]
    pub async fn pick_window(&self, user_id: UserId, window: TimeWindow) -> Outcome {
        let conversation_id = match self.sessions.take(user_id) {
            DialogueState::AwaitingTimeWindow { conversation_id } => conversation_id,
            DialogueState::AwaitingConversation { .. } => {
                return Outcome::Invalid(DialogueError::UnexpectedStep);
            }
            DialogueState::Idle => return Outcome::Invalid(DialogueError::NoActiveSelection),
        };
        self.summarize(user_id, conversation_id, window).await
    }

    /// Drop any selection in progress, returning what was dropped
    pub fn abandon(&self, user_id: UserId) -> DialogueState {
        self.sessions.take(user_id)
    }

    /// Summarize today in the user's most recently active conversation
    pub async fn summarize_today(&self, user_id: UserId) -> Outcome {
        self.shortcut(user_id, TimeWindow::Today).await
    }

    /// Summarize the last `hours` hours in the user's most recently active
    /// conversation
    pub async fn summarize_last_hours(&self, user_id: UserId, hours: NonZeroU32) -> Outcome {
        self.shortcut(user_id, TimeWindow::LastHours(hours)).await
    }

    #[instrument(level = "debug", skip_all, fields(user = %user_id, window = %window))]
    async fn shortcut(&self, user_id: UserId, window: TimeWindow) -> Outcome {
        match self.directory.most_recent_for_user(user_id).await {
            Ok(Some(conversation)) => {
                self.summarize(user_id, conversation.conversation_id, window).await
            }
            Ok(None) => Outcome::NoConversations,
            Err(e) => {
                error!(user = %user_id, "failed to find recent conversation: {:#}", e);
                Outcome::Failed
            }
        }
    }

    async fn conversation_name(&self, conversation_id: ConversationId) -> String {
        self.retrieval
            .conversation_name(conversation_id)
            .await
            .unwrap_or_else(|e| {
                warn!(conversation = %conversation_id, "failed to load conversation name: {:#}", e);
                fallback_conversation_name(conversation_id)
            })
    }

    /// Retrieve, format, summarize, and lay out one window
    async fn summarize(&self, user_id: UserId, conversation_id: ConversationId, window: TimeWindow) -> Outcome {
        let messages = match self.retrieval.window(conversation_id, window).await {
            Ok(messages) => messages,
            Err(e) => {
                error!(conversation = %conversation_id, "failed to retrieve messages: {:#}", e);
                return Outcome::Failed;
            }
        };

        let transcript = format_transcript(&messages);
        if transcript.is_empty() {
            return Outcome::NothingToSummarize {
                conversation_name: transcript.conversation_name,
                period: transcript.period,
            };
        }

        if let Some(progress) = &self.progress {
            progress(user_id);
        }
        let request = SummaryRequest::from(&transcript);
        match tokio::time::timeout(self.summary_timeout, self.summarizer.summarize(&request)).await {
            Ok(Ok(summary)) if !summary.trim().is_empty() => {
                info!(
                    conversation = %conversation_id,
                    window = %window,
                    messages = transcript.message_count,
                    "summary ready"
                );
                Outcome::Summary(transcript.render_result(&summary))
            }
            Ok(Ok(_)) => {
                warn!(conversation = %conversation_id, "summarizer returned an empty summary");
                Outcome::SummaryFailed
            }
            Ok(Err(e)) => {
                error!(conversation = %conversation_id, "summarizer failed: {:#}", e);
                Outcome::SummaryFailed
            }
            Err(_) => {
                warn!(
                    conversation = %conversation_id,
                    timeout_secs = self.summary_timeout.as_secs(),
                    "summarizer timed out"
                );
                Outcome::SummaryFailed
            }
        }
    }
}
