//! Files attached to tasks.
//!
//! `add` copies the source into `.tally/attachments/<id>/<file name>` and
//! appends a record to `.tally/attachments.jsonl`. Both happen under the
//! record file's lock, and a copy whose record could not be written is
//! removed again.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use ulid::Ulid;

use crate::error::{Error, Result};
use crate::lock::{self, FileLock};
use crate::storage::Storage;
use crate::task::Task;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attachment {
    pub id: String,
    pub task_id: String,
    pub user: String,
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    pub file_size: u64,
    pub created_at: DateTime<Utc>,
}

impl Attachment {
    /// Size as `12 B`, `3.4 KB`, `1.2 MB` ...
    pub fn display_size(&self) -> String {
        const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
        if self.file_size < 1024 {
            return format!("{} B", self.file_size);
        }
        let mut size = self.file_size as f64 / 1024.0;
        let mut unit = 0;
        while size >= 1024.0 && unit + 1 < UNITS.len() {
            size /= 1024.0;
            unit += 1;
        }
        format!("{size:.1} {}", UNITS[unit])
    }
}

#[derive(Debug, Clone)]
pub struct AttachmentStore {
    storage: Storage,
}

impl AttachmentStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Copy `source` into the data directory and record it against `task`.
    pub fn add(
        &self,
        task: &Task,
        user: &str,
        source: &Path,
        now: DateTime<Utc>,
    ) -> Result<Attachment> {
        let user = user.trim();
        if user.is_empty() {
            return Err(Error::Validation("user id is required".to_string()));
        }
        let metadata = fs::metadata(source).map_err(|err| {
            Error::Validation(format!("cannot read {}: {err}", source.display()))
        })?;
        if !metadata.is_file() {
            return Err(Error::Validation(format!(
                "{} is not a regular file",
                source.display()
            )));
        }
        let file_name = source
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                Error::Validation(format!("{} has no usable file name", source.display()))
            })?;

        let attachment = Attachment {
            id: Ulid::new().to_string().to_lowercase(),
            task_id: task.id.clone(),
            user: user.to_string(),
            extension: Path::new(&file_name)
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.to_lowercase()),
            file_name,
            file_size: metadata.len(),
            created_at: now,
        };

        let records = self.storage.attachments_file();
        let _lock = FileLock::acquire(
            lock::lock_path_for(&records),
            self.storage.lock_timeout_ms(),
        )?;
        let target = self.path_of(&attachment);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(source, &target)?;
        if let Err(err) = self.storage.append_jsonl(&records, &attachment) {
            if let Some(parent) = target.parent() {
                if let Err(cleanup) = fs::remove_dir_all(parent) {
                    warn!(path = %parent.display(), error = %cleanup, "attachment copy left behind");
                }
            }
            return Err(err);
        }

        info!(
            task_id = %attachment.task_id,
            attachment_id = %attachment.id,
            bytes = attachment.file_size,
            "attachment added"
        );
        Ok(attachment)
    }

    /// Attachments of a task, oldest first.
    pub fn list(&self, task_id: &str) -> Result<Vec<Attachment>> {
        let task_id = task_id.trim();
        let mut attachments: Vec<Attachment> = self
            .storage
            .read_jsonl_locked::<Attachment>(&self.storage.attachments_file())?
            .into_iter()
            .filter(|attachment| attachment.task_id == task_id)
            .collect();
        attachments.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(attachments)
    }

    /// Where the copy of `attachment` lives.
    pub fn path_of(&self, attachment: &Attachment) -> PathBuf {
        self.storage
            .attachments_dir()
            .join(&attachment.id)
            .join(&attachment.file_name)
    }
}
