//! Storage implementations
//!
//! ## Available Implementations
//!
//! - `sqlite/` - SQLite-based storage (requires `sqlite` feature)
//! - `memory/` - In-memory storage for testing

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub mod memory;
