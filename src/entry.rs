//! Time entries: one tracked interval (or manual duration) of a user on a task.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::duration::Elapsed;

/// Lifecycle state of a single entry.
///
/// There is no `Unstarted` variant: a (task, user) pair without an open entry
/// is unstarted by definition.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimerState {
    Running,
    Stopped,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeEntry {
    pub id: String,
    pub task_id: String,
    pub user_id: String,
    pub started_at: Option<DateTime<Utc>>,
    pub duration: Option<Elapsed>,
    pub is_started: bool,
    pub is_stopped: bool,
}

impl TimeEntry {
    /// A running timer beginning at `started_at`.
    pub fn running(
        task_id: impl Into<String>,
        user_id: impl Into<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: new_entry_id(),
            task_id: task_id.into(),
            user_id: user_id.into(),
            started_at: Some(started_at),
            duration: None,
            is_started: true,
            is_stopped: false,
        }
    }

    /// A manually logged entry. Manual entries are terminal from creation.
    pub fn manual(
        task_id: impl Into<String>,
        user_id: impl Into<String>,
        started_at: DateTime<Utc>,
        duration: Elapsed,
    ) -> Self {
        Self {
            id: new_entry_id(),
            task_id: task_id.into(),
            user_id: user_id.into(),
            started_at: Some(started_at),
            duration: Some(duration),
            is_started: true,
            is_stopped: true,
        }
    }

    /// An open timer: started, not stopped, no duration yet.
    pub fn is_open(&self) -> bool {
        self.is_started && !self.is_stopped && self.duration.is_none()
    }

    pub fn state(&self) -> TimerState {
        if self.is_open() {
            TimerState::Running
        } else {
            TimerState::Stopped
        }
    }

    pub fn belongs_to(&self, task_id: &str, user_id: &str) -> bool {
        self.task_id == task_id && self.user_id == user_id
    }
}

fn new_entry_id() -> String {
    Ulid::new().to_string().to_lowercase()
}

/// Criteria for `EntryRepository::query`. Empty fields match everything.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    pub task_id: Option<String>,
    pub user_id: Option<String>,
    pub state: Option<TimerState>,
}

impl EntryFilter {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Self::default()
        }
    }

    pub fn for_task(task_id: impl Into<String>) -> Self {
        Self {
            task_id: Some(task_id.into()),
            ..Self::default()
        }
    }

    pub fn with_state(mut self, state: TimerState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn matches(&self, entry: &TimeEntry) -> bool {
        if let Some(task_id) = &self.task_id {
            if &entry.task_id != task_id {
                return false;
            }
        }
        if let Some(user_id) = &self.user_id {
            if &entry.user_id != user_id {
                return false;
            }
        }
        if let Some(state) = self.state {
            if entry.state() != state {
                return false;
            }
        }
        true
    }
}
