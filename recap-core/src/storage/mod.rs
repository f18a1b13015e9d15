//! Storage abstractions for group chat messages
//!
//! Two implementations are available:
//!
//! - `MemoryStore` - In-memory storage (no persistence)
//! - `SqliteStore` - SQLite-backed storage (requires `sqlite` feature)
//!
//! Both implement `MessageStore`, `WindowStore` and `DirectoryStore`,
//! making them interchangeable.

pub mod ids;
pub mod implementations;
pub mod traits;
pub mod types;

pub use ids::{ConversationId, UserId};
pub use implementations::memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use implementations::sqlite::SqliteStore;
pub use traits::{ConversationStorage, DirectoryStore, MessageStore, WindowStore};
pub use types::{
    fallback_author_name, fallback_conversation_name, ConversationRecord, ConversationSummary,
    MessageError, NewMessage, StoredMessage, COMMAND_PREFIX,
};
