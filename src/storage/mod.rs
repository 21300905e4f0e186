//! Durable key-value storage
//!
//! The collection layer only needs two fallible async operations on string
//! keys. [`SqliteStore`] survives restarts; [`MemoryStore`] is for tests and
//! throwaway sessions.

mod memory;
mod sqlite;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Errors raised by a [`KeyValueStore`]
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing storage cannot be reached
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// `SQLite` rejected the operation
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The blocking worker panicked or was cancelled
    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Persistent, asynchronous, string-keyed store
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value. `Ok(None)` means the key was never written.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Insert or replace a value
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}
