//! Core of a group chat digest bot
//!
//! Group messages are stored as they arrive. On request, a user picks a
//! conversation they took part in and a time window; the matching messages
//! are formatted into a transcript and handed to a summarizer.
//!
//! The pieces, bottom up:
//!
//! - `storage` - message log and per-conversation records
//! - `retrieval` - windowed reads (`recent`, `today`, `last N hours`)
//! - `directory` - which conversations a user may summarize
//! - `transcript` - plain text rendering and result layout
//! - `summarizer` - the summarizer seam and its chat-model implementation
//! - `dialogue` - per-user two-step selection
//! - `bot` - command/action routing for transport adapters

pub mod bot;
pub mod clock;
pub mod dialogue;
pub mod directory;
pub mod retrieval;
pub mod storage;
pub mod summarizer;
pub mod transcript;

pub use bot::{Bot, ChatKind, Choice, InboundEvent, IncomingText, IngestSnapshot, Reply};
pub use clock::{Clock, ManualClock, SystemClock};
pub use dialogue::{
    DialogueError, DialogueState, Outcome, ProgressHook, SelectionDialogue, SessionTable,
};
pub use directory::ConversationDirectory;
pub use retrieval::{MessageWindow, QueryError, RetrievalEngine, TimeWindow};
pub use storage::{ConversationId, MemoryStore, UserId};
#[cfg(feature = "sqlite")]
pub use storage::SqliteStore;
pub use summarizer::{LlmSummarizer, Summarizer, SummaryRequest};
pub use transcript::{format_transcript, Transcript};
