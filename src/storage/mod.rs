//! Storage module for persisting crawl progress
//!
//! Progress is two independent records: the set of visited URLs and the
//! ordered queue of pending URLs. This module handles:
//! - The `ProgressSnapshot` exchanged with the frontier
//! - A JSON file backend (one string-list file per record)
//! - A SQLite backend (one table per record)

mod json;
mod schema;
mod sqlite;
mod traits;

pub use json::{JsonProgressStore, PENDING_FILE_NAME, VISITED_FILE_NAME};
pub use sqlite::{SqliteProgressStore, DATABASE_FILE_NAME};
pub use traits::{ProgressStore, StorageError, StorageResult};

use crate::config::{ProgressConfig, StorageBackend};
use std::collections::HashSet;
use std::path::Path;

/// Full frontier state as persisted between runs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    /// URLs that were already fetched (or abandoned)
    pub visited: HashSet<String>,

    /// URLs waiting to be fetched, in dequeue order
    pub pending: Vec<String>,
}

impl ProgressSnapshot {
    pub fn new(visited: HashSet<String>, pending: Vec<String>) -> Self {
        Self { visited, pending }
    }

    /// A snapshot for a crawl that has not started yet
    pub fn from_seeds(seeds: &[String]) -> Self {
        Self {
            visited: HashSet::new(),
            pending: seeds.to_vec(),
        }
    }

    /// Combines persisted records, falling back to the seeds for an empty queue
    pub(crate) fn resume(visited: Vec<String>, pending: Vec<String>, seeds: &[String]) -> Self {
        let pending = if pending.is_empty() {
            seeds.to_vec()
        } else {
            pending
        };

        Self {
            visited: visited.into_iter().collect(),
            pending,
        }
    }

    /// Visited URLs in a stable order, for writing
    pub fn visited_sorted(&self) -> Vec<&str> {
        let mut urls: Vec<&str> = self.visited.iter().map(String::as_str).collect();
        urls.sort_unstable();
        urls
    }

    /// Returns true if nothing was visited and nothing is pending
    pub fn is_empty(&self) -> bool {
        self.visited.is_empty() && self.pending.is_empty()
    }
}

/// Opens the progress store selected by the configuration
///
/// # Arguments
///
/// * `config` - The progress configuration
///
/// # Returns
///
/// * `Ok(Box<dyn ProgressStore>)` - The opened store
/// * `Err(StorageError)` - The backend could not be opened
pub fn open_store(config: &ProgressConfig) -> StorageResult<Box<dyn ProgressStore>> {
    let directory = Path::new(&config.directory);

    match config.backend {
        StorageBackend::Json => Ok(Box::new(JsonProgressStore::new(directory))),
        StorageBackend::Sqlite => {
            std::fs::create_dir_all(directory)?;
            let store = SqliteProgressStore::open(&directory.join(DATABASE_FILE_NAME))?;
            Ok(Box::new(store))
        }
    }
}
