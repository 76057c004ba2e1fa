//! Storage traits and error types
//!
//! This module defines the trait interface for progress store backends and
//! associated error types.

use crate::storage::ProgressSnapshot;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Corrupt progress record {record}: {message}")]
    Corrupt { record: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable snapshot/restore of frontier state across process restarts
///
/// Only the single crawl loop touches a store, so implementations need no
/// internal locking. A `save` must be complete on disk before it returns.
pub trait ProgressStore: Send {
    /// Reconstructs the last saved progress
    ///
    /// When no pending queue was persisted (first run, or a previous crawl
    /// that drained completely) the pending queue is populated from `seeds`.
    /// Absent records are not an error; unreadable ones are.
    fn load(&self, seeds: &[String]) -> StorageResult<ProgressSnapshot>;

    /// Replaces the stored progress with `snapshot`
    fn save(&mut self, snapshot: &ProgressSnapshot) -> StorageResult<()>;

    /// Removes all stored progress
    fn clear(&mut self) -> StorageResult<()>;

    /// Human-readable location of the records, for logging
    fn location(&self) -> String;
}
