//! Results of dialogue steps

use crate::retrieval::TimeWindow;
use crate::storage::{ConversationId, ConversationSummary};

/// Why a selection step was refused
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DialogueError {
    #[error("no selection in progress")]
    NoActiveSelection,
    #[error("conversation {0} was not offered")]
    UnknownConversation(ConversationId),
    #[error("selection does not match the current step")]
    UnexpectedStep,
    #[error("unrecognized action '{0}'")]
    MalformedAction(String),
}

/// A time window choice with its display label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowChoice {
    pub window: TimeWindow,
    pub label: String,
}

/// Every user-visible result a dialogue step can produce
///
/// Transports render these; the dialogue never builds reply text itself
/// except for the finished summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Pick one of these conversations
    ChooseConversation(Vec<ConversationSummary>),
    /// Pick a time window for the chosen conversation
    ChooseWindow {
        conversation_id: ConversationId,
        conversation_name: String,
        windows: Vec<WindowChoice>,
    },
    /// The user has not written in any conversation yet
    NoConversations,
    /// The window exists but holds no messages
    NothingToSummarize {
        conversation_name: String,
        period: String,
    },
    /// Finished summary, laid out for display
    Summary(String),
    /// The summarizer failed, timed out, or returned nothing
    SummaryFailed,
    /// Storage failed while preparing a step
    Failed,
    Invalid(DialogueError),
}

impl Outcome {
    pub fn is_summary(&self) -> bool {
        matches!(self, Self::Summary(_))
    }
}
