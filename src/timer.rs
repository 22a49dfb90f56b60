//! Timer state machine for time entries.
//!
//! Per (task, user) pair:
//!
//! ```text
//! UNSTARTED --start--> RUNNING --stop--> STOPPED
//!     ^                                     |
//!     +-------------------------------------+   (the pair may start again)
//! ```
//!
//! Starting while RUNNING is a conflict; stopping while not RUNNING is a
//! not-found. Manual entries are created STOPPED and never take part in the
//! RUNNING uniqueness check. After stop an entry has `is_started = false`
//! and `is_stopped = true`.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::duration::{whole_seconds, Elapsed};
use crate::entry::{EntryFilter, TimeEntry, TimerState};
use crate::error::{Error, Result};
use crate::repository::{EntryRepository, EntryStore};

/// Start a timer inside an existing transaction.
pub fn start_in<R: EntryRepository>(
    repo: &mut R,
    task_id: &str,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<TimeEntry> {
    if let Some(open) = repo.find_open_entry(task_id, user_id)? {
        return Err(Error::TimerConflict {
            task_id: task_id.to_string(),
            user_id: user_id.to_string(),
            entry_id: open.id,
        });
    }
    let entry = TimeEntry::running(task_id, user_id, now);
    repo.insert(entry.clone())?;
    Ok(entry)
}

/// Stop the open timer for (task, user) inside an existing transaction.
pub fn stop_in<R: EntryRepository>(
    repo: &mut R,
    task_id: &str,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<TimeEntry> {
    let mut entry = repo
        .find_open_entry(task_id, user_id)?
        .ok_or_else(|| Error::NoOpenTimer {
            task_id: task_id.to_string(),
            user_id: user_id.to_string(),
        })?;
    let started_at = entry.started_at.ok_or_else(|| {
        Error::OperationFailed(format!("open time entry {} has no start time", entry.id))
    })?;
    let duration = Elapsed::new(now - started_at).map_err(|_| {
        Error::Validation(format!(
            "stop time {} is before start time {}",
            now.to_rfc3339(),
            started_at.to_rfc3339()
        ))
    })?;

    entry.duration = Some(duration);
    entry.is_started = false;
    entry.is_stopped = true;
    repo.update(entry.clone())?;
    Ok(entry)
}

/// Drives timer transitions against a transactional entry store.
///
/// Clock readings handed to the tracker are cut to whole seconds before they
/// are stored.
#[derive(Debug)]
pub struct TimeTracker<S> {
    store: S,
}

impl<S: EntryStore> TimeTracker<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn start_timer(&self, task_id: &str, user_id: &str, now: DateTime<Utc>) -> Result<TimeEntry> {
        let (task_id, user_id) = validate_refs(task_id, user_id)?;
        let now = whole_seconds(now);
        let entry = self
            .store
            .transaction(|repo| start_in(repo, task_id, user_id, now))?;
        info!(task_id, user_id, entry_id = %entry.id, "timer started");
        Ok(entry)
    }

    pub fn stop_timer(&self, task_id: &str, user_id: &str, now: DateTime<Utc>) -> Result<TimeEntry> {
        let (task_id, user_id) = validate_refs(task_id, user_id)?;
        let now = whole_seconds(now);
        let entry = self
            .store
            .transaction(|repo| stop_in(repo, task_id, user_id, now))?;
        info!(
            task_id,
            user_id,
            entry_id = %entry.id,
            seconds = entry.duration.map(|d| d.num_seconds()).unwrap_or_default(),
            "timer stopped"
        );
        Ok(entry)
    }

    /// Log time directly. Never conflicts with a running timer.
    pub fn create_manual(
        &self,
        task_id: &str,
        user_id: &str,
        started_at: DateTime<Utc>,
        duration_minutes: i64,
    ) -> Result<TimeEntry> {
        let (task_id, user_id) = validate_refs(task_id, user_id)?;
        let duration = Elapsed::manual_minutes(duration_minutes)?;
        let entry = TimeEntry::manual(task_id, user_id, whole_seconds(started_at), duration);
        self.store.transaction(|repo| repo.insert(entry.clone()))?;
        debug!(task_id, user_id, entry_id = %entry.id, duration_minutes, "manual entry created");
        Ok(entry)
    }

    /// Running timers of a user across all tasks.
    pub fn open_timers(&self, user_id: &str) -> Result<Vec<TimeEntry>> {
        let set = self.store.load()?;
        set.query(&EntryFilter::for_user(user_id).with_state(TimerState::Running))
    }

    pub fn entries(&self, filter: &EntryFilter) -> Result<Vec<TimeEntry>> {
        self.store.load()?.query(filter)
    }
}

fn validate_refs<'a>(task_id: &'a str, user_id: &'a str) -> Result<(&'a str, &'a str)> {
    let task_id = task_id.trim();
    let user_id = user_id.trim();
    if task_id.is_empty() {
        return Err(Error::Validation("task id is required".to_string()));
    }
    if user_id.is_empty() {
        return Err(Error::Validation("user id is required".to_string()));
    }
    Ok((task_id, user_id))
}
