//! MessageStore trait for ingestion

use anyhow::Result;
use async_trait::async_trait;

use crate::storage::types::{NewMessage, StoredMessage};

/// Trait for the write side of message storage
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a message and refresh its conversation record
    ///
    /// Both writes succeed or neither is visible. Blank texts and commands
    /// are refused with a `MessageError`.
    async fn append(&self, message: NewMessage) -> Result<StoredMessage>;
}
