//! SQLite storage backend
//!
//! Provides `SqliteStore` - a shared SQLite connection wrapper that
//! implements all storage traits.
//!
//! Trait implementations live in submodules:
//! - `message` - MessageStore + WindowStore impl
//! - `conversation` - DirectoryStore impl and the conversation upsert

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};

mod conversation;
mod message;

pub(crate) use conversation::init_schema as init_conversation_schema;
pub(crate) use message::init_schema as init_message_schema;

/// Shared SQLite connection
///
/// Create one store and share it via `Arc` between ingestion, retrieval
/// and the directory. All writes for one message happen in a single
/// transaction under the connection lock.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    clock: Arc<dyn Clock>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        debug!(path = %path.display(), "opened message database");
        Self::from_connection(conn)
    }

    /// Create an in-memory SQLite database (useful for testing)
    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            clock: Arc::new(SystemClock),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Replace the clock used to timestamp new messages
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Lock the connection, recovering it if a previous holder panicked
    pub(crate) fn lock_conn(&self) -> MutexGuard<'_, Connection> {
        match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("database mutex was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.lock_conn();
        init_conversation_schema(&conn)?;
        init_message_schema(&conn)?;
        Ok(())
    }
}
