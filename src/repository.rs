//! Persistence seam for time entries.
//!
//! [`EntryRepository`] is the query/mutation surface the timer works against;
//! [`EntryStore`] hands out a repository inside an atomic transaction. The
//! open-timer uniqueness check and the write that depends on it always run
//! inside one transaction.

use std::sync::Mutex;

use tracing::debug;

use crate::entry::{EntryFilter, TimeEntry};
use crate::error::{Error, Result};
use crate::storage::Storage;

/// Read and write access to a collection of time entries.
pub trait EntryRepository {
    /// The open entry for (task, user), if any.
    fn find_open_entry(&self, task_id: &str, user_id: &str) -> Result<Option<TimeEntry>>;

    /// Add a new entry. Rejects duplicate ids and a second open entry for the
    /// same (task, user).
    fn insert(&mut self, entry: TimeEntry) -> Result<()>;

    /// Replace an existing entry by id. Finalized entries cannot change.
    fn update(&mut self, entry: TimeEntry) -> Result<()>;

    fn query(&self, filter: &EntryFilter) -> Result<Vec<TimeEntry>>;
}

/// A transactional source of entry repositories.
pub trait EntryStore {
    /// Run `f` with exclusive access; changes are persisted only if `f`
    /// succeeds.
    fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut EntrySet) -> Result<T>;

    /// A point-in-time copy of all entries for reporting.
    fn load(&self) -> Result<EntrySet>;
}

/// In-memory entry collection in insertion order.
#[derive(Debug, Clone, Default)]
pub struct EntrySet {
    entries: Vec<TimeEntry>,
}

impl EntrySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(entries: Vec<TimeEntry>) -> Self {
        Self { entries }
    }

    pub fn into_vec(self) -> Vec<TimeEntry> {
        self.entries
    }

    pub fn all(&self) -> &[TimeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&TimeEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }
}

impl EntryRepository for EntrySet {
    fn find_open_entry(&self, task_id: &str, user_id: &str) -> Result<Option<TimeEntry>> {
        Ok(self
            .entries
            .iter()
            .find(|entry| entry.belongs_to(task_id, user_id) && entry.is_open())
            .cloned())
    }

    fn insert(&mut self, entry: TimeEntry) -> Result<()> {
        if self.get(&entry.id).is_some() {
            return Err(Error::Conflict(format!(
                "time entry {} already exists",
                entry.id
            )));
        }
        if entry.is_open() {
            if let Some(open) = self.find_open_entry(&entry.task_id, &entry.user_id)? {
                return Err(Error::TimerConflict {
                    task_id: entry.task_id,
                    user_id: entry.user_id,
                    entry_id: open.id,
                });
            }
        }
        self.entries.push(entry);
        Ok(())
    }

    fn update(&mut self, entry: TimeEntry) -> Result<()> {
        let slot = self
            .entries
            .iter_mut()
            .find(|existing| existing.id == entry.id)
            .ok_or_else(|| Error::NotFound(format!("time entry {}", entry.id)))?;
        if !slot.is_open() {
            return Err(Error::Conflict(format!(
                "time entry {} is already finalized",
                entry.id
            )));
        }
        *slot = entry;
        Ok(())
    }

    fn query(&self, filter: &EntryFilter) -> Result<Vec<TimeEntry>> {
        Ok(self
            .entries
            .iter()
            .filter(|entry| filter.matches(entry))
            .cloned()
            .collect())
    }
}

/// Process-local store. Transactions run on a copy and commit on success.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<EntrySet>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<TimeEntry>) -> Self {
        Self {
            inner: Mutex::new(EntrySet::from_vec(entries)),
        }
    }
}

impl EntryStore for MemoryStore {
    fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut EntrySet) -> Result<T>,
    {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| Error::OperationFailed("entry store mutex poisoned".to_string()))?;
        let mut working = guard.clone();
        let result = f(&mut working)?;
        *guard = working;
        Ok(result)
    }

    fn load(&self) -> Result<EntrySet> {
        let guard = self
            .inner
            .lock()
            .map_err(|_| Error::OperationFailed("entry store mutex poisoned".to_string()))?;
        Ok(guard.clone())
    }
}

/// Entries persisted in `.tally/entries.jsonl`, guarded by a file lock so
/// separate processes see one consistent check-then-write.
#[derive(Debug, Clone)]
pub struct FileEntryStore {
    storage: Storage,
}

impl FileEntryStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }
}

impl EntryStore for FileEntryStore {
    fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut EntrySet) -> Result<T>,
    {
        let path = self.storage.entries_file();
        self.storage
            .update_jsonl(&path, |records: &mut Vec<TimeEntry>| {
                let mut set = EntrySet::from_vec(std::mem::take(records));
                let result = f(&mut set)?;
                debug!(entries = set.len(), "committing entry transaction");
                *records = set.into_vec();
                Ok(result)
            })
    }

    fn load(&self) -> Result<EntrySet> {
        let entries = self
            .storage
            .read_jsonl_locked(&self.storage.entries_file())?;
        Ok(EntrySet::from_vec(entries))
    }
}
