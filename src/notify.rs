//! Notifications about task activity.
//!
//! Notifications are emitted as JSON lines to stdout or a configured file
//! (an outbox that a mailer or chat bridge can tail). Commands build them
//! after a successful state change and hand them to a [`Notifier`].

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::NotifyConfig;
use crate::error::{Error, Result};
use crate::task::{Comment, Task};

pub const NOTIFICATION_SCHEMA_VERSION: &str = "tally.notification.v1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyDestination {
    Stdout,
    File(PathBuf),
}

impl NotifyDestination {
    /// `-` means stdout; relative paths resolve against `base`.
    pub fn parse(raw: &str, base: &Path) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed == "-" {
            return Some(NotifyDestination::Stdout);
        }
        let path = PathBuf::from(trimmed);
        if path.is_absolute() {
            Some(NotifyDestination::File(path))
        } else {
            Some(NotifyDestination::File(base.join(path)))
        }
    }

    /// Destination from `[notify]`, or `None` when disabled.
    pub fn from_config(config: &NotifyConfig, base: &Path) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        Self::parse(&config.destination, base)
    }

    pub fn open(&self) -> Result<NotificationSink> {
        match self {
            NotifyDestination::Stdout => Ok(NotificationSink::stdout()),
            NotifyDestination::File(path) => NotificationSink::file(path),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    TaskAssigned,
    TaskReopened,
    TaskCompleted,
    TaskCommented,
    Reminder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub schema_version: String,
    pub kind: NotificationKind,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    pub recipients: Vec<String>,
    pub subject: String,
    pub message: String,
}

impl Notification {
    fn build(
        kind: NotificationKind,
        timestamp: DateTime<Utc>,
        task_id: Option<&str>,
        recipients: Vec<String>,
        subject: String,
        message: String,
    ) -> Option<Self> {
        if recipients.is_empty() {
            return None;
        }
        Some(Self {
            schema_version: NOTIFICATION_SCHEMA_VERSION.to_string(),
            kind,
            timestamp,
            task_id: task_id.map(str::to_string),
            recipients,
            subject,
            message,
        })
    }

    /// Sent to the new assignee.
    pub fn assigned(task: &Task, by: &str, timestamp: DateTime<Utc>) -> Option<Self> {
        Self::build(
            NotificationKind::TaskAssigned,
            timestamp,
            Some(&task.id),
            task.assigned_to.iter().cloned().collect(),
            format!("Task #{} assigned to you", task.id),
            format!("{by} assigned you \"{}\".", task.title),
        )
    }

    /// Sent to the assignee when a completed task is opened again.
    pub fn reopened(task: &Task, by: &str, timestamp: DateTime<Utc>) -> Option<Self> {
        Self::build(
            NotificationKind::TaskReopened,
            timestamp,
            Some(&task.id),
            task.assigned_to.iter().cloned().collect(),
            format!("Task #{} reopened", task.id),
            format!("{by} reopened \"{}\".", task.title),
        )
    }

    /// Sent to everyone who commented on the task.
    pub fn completed(
        task: &Task,
        commenters: Vec<String>,
        by: &str,
        timestamp: DateTime<Utc>,
    ) -> Option<Self> {
        Self::build(
            NotificationKind::TaskCompleted,
            timestamp,
            Some(&task.id),
            commenters,
            format!("Task #{} completed", task.id),
            format!("{by} completed \"{}\".", task.title),
        )
    }

    /// Sent to the assignee.
    pub fn commented(task: &Task, comment: &Comment) -> Option<Self> {
        Self::build(
            NotificationKind::TaskCommented,
            comment.created_at,
            Some(&task.id),
            task.assigned_to.iter().cloned().collect(),
            format!("New comment on task #{}", task.id),
            format!("{}: {}", comment.author, comment.text),
        )
    }

    /// One reminder addressed to every assignee with incomplete tasks.
    pub fn reminder(assignees: Vec<String>, timestamp: DateTime<Utc>) -> Option<Self> {
        Self::build(
            NotificationKind::Reminder,
            timestamp,
            None,
            assignees,
            "Reminder: log your time".to_string(),
            "You have incomplete tasks. Remember to log the time you spent on them.".to_string(),
        )
    }
}

/// Delivery seam for notifications.
pub trait Notifier {
    fn notify(&mut self, notification: &Notification) -> Result<()>;
}

/// Notifier that writes JSONL output to a destination.
pub struct NotificationSink {
    writer: Box<dyn Write + Send>,
}

impl NotificationSink {
    pub fn stdout() -> Self {
        Self {
            writer: Box::new(std::io::stdout()),
        }
    }

    /// Append to a file, creating it if necessary.
    pub fn file(path: &Path) -> Result<Self> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self {
            writer: Box::new(file),
        })
    }
}

impl Notifier for NotificationSink {
    fn notify(&mut self, notification: &Notification) -> Result<()> {
        let serialized = serde_json::to_vec(notification)?;
        self.writer.write_all(&serialized)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush().map_err(Error::Io)?;
        debug!(kind = ?notification.kind, recipients = notification.recipients.len(), "notification sent");
        Ok(())
    }
}

/// Collects notifications in memory.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    pub sent: Vec<Notification>,
}

impl Notifier for MemoryNotifier {
    fn notify(&mut self, notification: &Notification) -> Result<()> {
        self.sent.push(notification.clone());
        Ok(())
    }
}
