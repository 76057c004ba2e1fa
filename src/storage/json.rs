//! JSON file progress store
//!
//! Each record is a JSON array of strings in its own file under the progress
//! directory. Writes go to a temporary sibling file which is synced and then
//! renamed over the record, so a reader never observes a partial write.

use crate::storage::traits::{ProgressStore, StorageError, StorageResult};
use crate::storage::ProgressSnapshot;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// File holding the visited-URL record
pub const VISITED_FILE_NAME: &str = "propagated.history";

/// File holding the pending-queue record
pub const PENDING_FILE_NAME: &str = "queue.history";

/// Progress store writing two JSON string-list files
#[derive(Debug, Clone)]
pub struct JsonProgressStore {
    directory: PathBuf,
}

impl JsonProgressStore {
    /// Creates a store rooted at `directory`
    ///
    /// The directory is created on the first save.
    pub fn new(directory: &Path) -> Self {
        Self {
            directory: directory.to_path_buf(),
        }
    }

    pub fn visited_path(&self) -> PathBuf {
        self.directory.join(VISITED_FILE_NAME)
    }

    pub fn pending_path(&self) -> PathBuf {
        self.directory.join(PENDING_FILE_NAME)
    }
}

impl ProgressStore for JsonProgressStore {
    fn load(&self, seeds: &[String]) -> StorageResult<ProgressSnapshot> {
        let visited = read_string_list(&self.visited_path())?;
        let pending = read_string_list(&self.pending_path())?;

        tracing::debug!(
            "Loaded {} visited and {} pending URLs from {}",
            visited.len(),
            pending.len(),
            self.directory.display()
        );

        Ok(ProgressSnapshot::resume(visited, pending, seeds))
    }

    fn save(&mut self, snapshot: &ProgressSnapshot) -> StorageResult<()> {
        fs::create_dir_all(&self.directory)?;
        write_string_list(&self.visited_path(), &snapshot.visited_sorted())?;
        write_string_list(&self.pending_path(), &snapshot.pending)?;
        Ok(())
    }

    fn clear(&mut self) -> StorageResult<()> {
        for path in [self.visited_path(), self.pending_path()] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn location(&self) -> String {
        self.directory.display().to_string()
    }
}

/// Reads a record; a missing file is an empty list
fn read_string_list(path: &Path) -> StorageResult<Vec<String>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    serde_json::from_str(&content).map_err(|e| StorageError::Corrupt {
        record: path.display().to_string(),
        message: e.to_string(),
    })
}

fn write_string_list<S: AsRef<str>>(path: &Path, list: &[S]) -> StorageResult<()> {
    let items: Vec<&str> = list.iter().map(AsRef::as_ref).collect();
    let json = serde_json::to_vec(&items)?;

    let tmp = path.with_extension("tmp");
    {
        let mut file = File::create(&tmp)?;
        file.write_all(&json)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_load_without_records_uses_seeds() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonProgressStore::new(&dir.path().join("history"));

        let snapshot = store.load(&urls(&["https://x.test/list"])).unwrap();
        assert!(snapshot.visited.is_empty());
        assert_eq!(snapshot.pending, urls(&["https://x.test/list"]));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonProgressStore::new(dir.path());

        let visited: HashSet<String> = urls(&["https://x.test/a", "https://x.test/b"])
            .into_iter()
            .collect();
        let snapshot = ProgressSnapshot::new(
            visited,
            urls(&["https://x.test/d", "https://x.test/c", "https://x.test/e"]),
        );
        store.save(&snapshot).unwrap();

        let loaded = store.load(&urls(&["https://x.test/seed"])).unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_save_creates_directory_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let history = dir.path().join("nested").join("history");
        let mut store = JsonProgressStore::new(&history);

        store
            .save(&ProgressSnapshot::from_seeds(&urls(&["https://x.test/"])))
            .unwrap();

        let mut names: Vec<String> = fs::read_dir(&history)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec![PENDING_FILE_NAME, VISITED_FILE_NAME]);
    }

    #[test]
    fn test_records_are_plain_string_lists() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonProgressStore::new(dir.path());

        let snapshot = ProgressSnapshot::new(
            urls(&["https://x.test/a"]).into_iter().collect(),
            urls(&["https://x.test/b"]),
        );
        store.save(&snapshot).unwrap();

        let pending = fs::read_to_string(store.pending_path()).unwrap();
        assert_eq!(pending, r#"["https://x.test/b"]"#);
        let visited = fs::read_to_string(store.visited_path()).unwrap();
        assert_eq!(visited, r#"["https://x.test/a"]"#);
    }

    #[test]
    fn test_corrupt_record_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(VISITED_FILE_NAME), "{not json").unwrap();

        let store = JsonProgressStore::new(dir.path());
        let err = store.load(&[]).unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { .. }));
    }

    #[test]
    fn test_clear_removes_records() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonProgressStore::new(dir.path());

        store
            .save(&ProgressSnapshot::new(
                urls(&["https://x.test/a"]).into_iter().collect(),
                urls(&["https://x.test/b"]),
            ))
            .unwrap();
        store.clear().unwrap();
        // Clearing twice is fine
        store.clear().unwrap();

        let loaded = store.load(&urls(&["https://x.test/seed"])).unwrap();
        assert!(loaded.visited.is_empty());
        assert_eq!(loaded.pending, urls(&["https://x.test/seed"]));
    }
}
