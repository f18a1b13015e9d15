//! Storage traits
//!
//! The store is split by access pattern: ingestion writes through
//! `MessageStore`, retrieval reads through `WindowStore`, and the
//! conversation picker reads through `DirectoryStore`.

mod directory;
mod message;
mod window;

pub use directory::DirectoryStore;
pub use message::MessageStore;
pub use window::WindowStore;

/// Everything the bot needs from a single backing store
pub trait ConversationStorage: MessageStore + WindowStore + DirectoryStore {}

impl<T: MessageStore + WindowStore + DirectoryStore + ?Sized> ConversationStorage for T {}
