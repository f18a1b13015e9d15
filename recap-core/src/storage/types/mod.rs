//! Storage types
//!
//! Shared types used by storage traits and implementations.

pub mod conversation;
pub mod message;

// Re-exports for convenience
pub use conversation::{fallback_conversation_name, ConversationRecord, ConversationSummary};
pub use message::{
    fallback_author_name, MessageError, NewMessage, StoredMessage, COMMAND_PREFIX,
};
