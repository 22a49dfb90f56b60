//! Storage layer for tally
//!
//! All state lives in a `.tally/` directory next to the `.tally.toml` config.
//!
//! # Directory Structure
//!
//! ```text
//! .tally.toml                   # Configuration (optional)
//! .tally/
//!   user                        # Persisted user identity
//!   entries.jsonl               # Time entries, one JSON record per line
//!   tasks.json                  # Task registry
//!   comments.jsonl              # Task comments (append-only)
//!   outbox.jsonl                # Default notification destination
//!   *.lock                      # Lock files guarding the files above
//! ```

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Error, Result};
use crate::lock::{self, FileLock, DEFAULT_LOCK_TIMEOUT_MS};

/// Name of the data directory
pub const DATA_DIR: &str = ".tally";

/// Name of the configuration file at the root
pub const CONFIG_FILE: &str = ".tally.toml";

/// Storage manager for tally state
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
    lock_timeout_ms: u64,
}

impl Storage {
    /// Storage rooted at `root`; data lives in `root/.tally`.
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }

    pub fn with_lock_timeout(mut self, timeout_ms: u64) -> Self {
        self.lock_timeout_ms = timeout_ms;
        self
    }

    // =========================================================================
    // Path accessors
    // =========================================================================

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join(DATA_DIR)
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn user_file(&self) -> PathBuf {
        self.data_dir().join("user")
    }

    pub fn entries_file(&self) -> PathBuf {
        self.data_dir().join("entries.jsonl")
    }

    pub fn tasks_file(&self) -> PathBuf {
        self.data_dir().join("tasks.json")
    }

    pub fn comments_file(&self) -> PathBuf {
        self.data_dir().join("comments.jsonl")
    }

    pub fn attachments_file(&self) -> PathBuf {
        self.data_dir().join("attachments.jsonl")
    }

    /// Directory holding copied attachment files, one subdirectory per id.
    pub fn attachments_dir(&self) -> PathBuf {
        self.data_dir().join("attachments")
    }

    pub fn lock_timeout_ms(&self) -> u64 {
        self.lock_timeout_ms
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Create the data directory. Returns whether it was newly created.
    pub fn init(&self) -> Result<bool> {
        let dir = self.data_dir();
        if dir.is_dir() {
            return Ok(false);
        }
        fs::create_dir_all(&dir)?;
        Ok(true)
    }

    pub fn is_initialized(&self) -> bool {
        self.data_dir().is_dir()
    }

    pub fn ensure_initialized(&self) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(Error::NotInitialized(self.root.clone()))
        }
    }

    // =========================================================================
    // File I/O helpers
    // =========================================================================

    pub fn write_json<T: Serialize>(&self, path: &Path, data: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        lock::write_atomic(path, json.as_bytes())
    }

    pub fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        let data: T = serde_json::from_str(&content)?;
        Ok(data)
    }

    /// Read a JSON file, or the default value when it does not exist yet.
    pub fn read_json_or_default<T: DeserializeOwned + Default>(&self, path: &Path) -> Result<T> {
        if !path.exists() {
            return Ok(T::default());
        }
        self.read_json(path)
    }

    /// Append a line to a JSONL file.
    ///
    /// Not atomic on its own; callers hold the file's lock.
    pub fn append_jsonl<T: Serialize>(&self, path: &Path, record: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string(record)?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        writeln!(file, "{}", json)?;
        file.sync_all()?;
        Ok(())
    }

    pub fn read_jsonl<T: DeserializeOwned>(&self, path: &Path) -> Result<Vec<T>> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: T = serde_json::from_str(&line).map_err(|err| {
                Error::OperationFailed(format!(
                    "corrupt record at {}:{}: {err}",
                    path.display(),
                    index + 1
                ))
            })?;
            records.push(record);
        }

        Ok(records)
    }

    /// Rewrite a JSONL file atomically with `records`.
    pub fn write_jsonl<T: Serialize>(&self, path: &Path, records: &[T]) -> Result<()> {
        let mut buffer = Vec::new();
        for record in records {
            serde_json::to_writer(&mut buffer, record)?;
            buffer.push(b'\n');
        }
        lock::write_atomic(path, &buffer)
    }

    // =========================================================================
    // Locked read-modify-write
    // =========================================================================

    /// Run `f` on the decoded contents of a JSON file while holding its lock,
    /// then persist the result. Nothing is written when `f` fails.
    pub fn update_json<D, T, F>(&self, path: &Path, f: F) -> Result<T>
    where
        D: Serialize + DeserializeOwned + Default,
        F: FnOnce(&mut D) -> Result<T>,
    {
        let _lock = FileLock::acquire(lock::lock_path_for(path), self.lock_timeout_ms)?;
        let mut data: D = self.read_json_or_default(path)?;
        let result = f(&mut data)?;
        self.write_json(path, &data)?;
        Ok(result)
    }

    /// Same as [`Storage::update_json`] for JSONL record files.
    pub fn update_jsonl<R, T, F>(&self, path: &Path, f: F) -> Result<T>
    where
        R: Serialize + DeserializeOwned,
        F: FnOnce(&mut Vec<R>) -> Result<T>,
    {
        let _lock = FileLock::acquire(lock::lock_path_for(path), self.lock_timeout_ms)?;
        let mut records: Vec<R> = self.read_jsonl(path)?;
        let result = f(&mut records)?;
        self.write_jsonl(path, &records)?;
        Ok(result)
    }

    /// Append one record while holding the file's lock.
    pub fn append_jsonl_locked<T: Serialize>(&self, path: &Path, record: &T) -> Result<()> {
        let _lock = FileLock::acquire(lock::lock_path_for(path), self.lock_timeout_ms)?;
        self.append_jsonl(path, record)
    }

    /// Read a JSONL file while holding its lock, so no writer is mid-rename.
    pub fn read_jsonl_locked<T: DeserializeOwned>(&self, path: &Path) -> Result<Vec<T>> {
        let _lock = FileLock::acquire(lock::lock_path_for(path), self.lock_timeout_ms)?;
        self.read_jsonl(path)
    }

    // =========================================================================
    // User persistence
    // =========================================================================

    pub fn read_user(&self) -> Option<String> {
        fs::read_to_string(self.user_file())
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    pub fn write_user(&self, user: &str) -> Result<()> {
        self.ensure_initialized()?;
        lock::write_atomic(self.user_file(), format!("{user}\n").as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Row {
        n: u32,
    }

    #[test]
    fn paths_live_under_data_dir() {
        let storage = Storage::new(PathBuf::from("/work"));
        assert_eq!(storage.data_dir(), PathBuf::from("/work/.tally"));
        assert_eq!(storage.config_file(), PathBuf::from("/work/.tally.toml"));
        assert_eq!(
            storage.entries_file(),
            PathBuf::from("/work/.tally/entries.jsonl")
        );
    }

    #[test]
    fn init_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().to_path_buf());
        assert!(matches!(
            storage.ensure_initialized(),
            Err(Error::NotInitialized(_))
        ));
        assert!(storage.init().unwrap());
        assert!(!storage.init().unwrap());
        storage.ensure_initialized().unwrap();
    }

    #[test]
    fn jsonl_roundtrip_skips_blank_lines() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().to_path_buf());
        let path = storage.data_dir().join("rows.jsonl");

        storage.append_jsonl(&path, &Row { n: 1 }).unwrap();
        fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .unwrap()
            .write_all(b"\n")
            .unwrap();
        storage.append_jsonl(&path, &Row { n: 2 }).unwrap();

        let rows: Vec<Row> = storage.read_jsonl(&path).unwrap();
        assert_eq!(rows, vec![Row { n: 1 }, Row { n: 2 }]);
    }

    #[test]
    fn corrupt_jsonl_reports_line() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().to_path_buf());
        let path = storage.data_dir().join("rows.jsonl");
        storage.append_jsonl(&path, &Row { n: 1 }).unwrap();
        fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .unwrap()
            .write_all(b"{not json\n")
            .unwrap();

        let err = storage.read_jsonl::<Row>(&path).unwrap_err();
        assert!(err.to_string().contains("rows.jsonl:2"));
    }

    #[test]
    fn failed_update_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().to_path_buf());
        let path = storage.data_dir().join("rows.jsonl");

        storage
            .update_jsonl(&path, |rows: &mut Vec<Row>| {
                rows.push(Row { n: 1 });
                Ok(())
            })
            .unwrap();

        let result: Result<()> = storage.update_jsonl(&path, |rows: &mut Vec<Row>| {
            rows.push(Row { n: 2 });
            Err(Error::Validation("nope".to_string()))
        });
        assert!(result.is_err());

        let rows: Vec<Row> = storage.read_jsonl(&path).unwrap();
        assert_eq!(rows, vec![Row { n: 1 }]);
    }

    #[test]
    fn user_roundtrip() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().to_path_buf());
        storage.init().unwrap();
        assert_eq!(storage.read_user(), None);
        storage.write_user("alice").unwrap();
        assert_eq!(storage.read_user().as_deref(), Some("alice"));
    }
}
