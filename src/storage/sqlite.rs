//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the ProgressStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{ProgressStore, StorageError, StorageResult};
use crate::storage::ProgressSnapshot;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

/// Database file created inside the progress directory
pub const DATABASE_FILE_NAME: &str = "progress.db";

/// SQLite progress store
pub struct SqliteProgressStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteProgressStore {
    /// Opens or creates the database at `path`
    ///
    /// A file that is not a SQLite database is reported as a corrupt record.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = FULL;
            PRAGMA temp_store = MEMORY;
        ",
        )
        .and_then(|_| initialize_schema(&conn))
        .map_err(|e| StorageError::Corrupt {
            record: path.display().to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn, path: None })
    }

    fn read_column(&self, sql: &str) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut urls = Vec::new();
        for url in rows {
            urls.push(url?);
        }
        Ok(urls)
    }
}

impl ProgressStore for SqliteProgressStore {
    fn load(&self, seeds: &[String]) -> StorageResult<ProgressSnapshot> {
        let visited = self.read_column("SELECT url FROM visited")?;
        let pending = self.read_column("SELECT url FROM pending ORDER BY position")?;

        tracing::debug!(
            "Loaded {} visited and {} pending URLs from {}",
            visited.len(),
            pending.len(),
            self.location()
        );

        Ok(ProgressSnapshot::resume(visited, pending, seeds))
    }

    fn save(&mut self, snapshot: &ProgressSnapshot) -> StorageResult<()> {
        let tx = self.conn.transaction()?;

        tx.execute("DELETE FROM visited", [])?;
        tx.execute("DELETE FROM pending", [])?;

        {
            let mut insert_visited = tx.prepare("INSERT OR IGNORE INTO visited (url) VALUES (?1)")?;
            for url in snapshot.visited_sorted() {
                insert_visited.execute(params![url])?;
            }

            let mut insert_pending =
                tx.prepare("INSERT INTO pending (position, url) VALUES (?1, ?2)")?;
            for (position, url) in snapshot.pending.iter().enumerate() {
                insert_pending.execute(params![position as i64, url])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn clear(&mut self) -> StorageResult<()> {
        self.conn
            .execute_batch("DELETE FROM visited; DELETE FROM pending;")?;
        Ok(())
    }

    fn location(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => ":memory:".to_string(),
        }
    }
}
