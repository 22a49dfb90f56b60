//! Tasks and task comments.
//!
//! Tasks live in `.tally/tasks.json` (rewritten under lock); comments are
//! appended to `.tally/comments.jsonl`. Task ids are sequential numbers
//! rendered as strings.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use ulid::Ulid;

use crate::aggregate::compare_ids;
use crate::error::{Error, Result};
use crate::storage::Storage;

const MAX_TITLE_LEN: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct TaskRegistry {
    #[serde(default)]
    last_id: u64,
    #[serde(default)]
    tasks: Vec<Task>,
}

impl TaskRegistry {
    fn find_mut(&mut self, id: &str) -> Result<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| task_not_found(id))
    }
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub project: Option<String>,
    /// Creator; new tasks are assigned to them.
    pub creator: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub assigned_to: Option<String>,
    pub completed: Option<bool>,
    /// Case-insensitive substring of the title
    pub search: Option<String>,
    pub project: Option<String>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(user) = &self.assigned_to {
            if task.assigned_to.as_ref() != Some(user) {
                return false;
            }
        }
        if let Some(completed) = self.completed {
            if task.completed != completed {
                return false;
            }
        }
        if let Some(project) = &self.project {
            if task.project.as_ref() != Some(project) {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.trim().to_lowercase();
            if !needle.is_empty() && !task.title.to_lowercase().contains(&needle) {
                return false;
            }
        }
        true
    }
}

/// Result of a completion-status change.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub task: Task,
    pub previous: bool,
}

impl StatusChange {
    pub fn changed(&self) -> bool {
        self.previous != self.task.completed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub id: String,
    pub task_id: String,
    pub author: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TaskStore {
    storage: Storage,
}

impl TaskStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub fn create(&self, new: NewTask, now: DateTime<Utc>) -> Result<Task> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(Error::Validation("title cannot be empty".to_string()));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(Error::Validation(format!(
                "title cannot exceed {MAX_TITLE_LEN} characters"
            )));
        }

        let task = self.update(|registry| {
            registry.last_id += 1;
            let task = Task {
                id: registry.last_id.to_string(),
                title: title.to_string(),
                description: non_empty(new.description),
                project: non_empty(new.project),
                completed: false,
                assigned_to: new.creator.clone(),
                created_by: new.creator,
                created_at: now,
                updated_at: now,
            };
            registry.tasks.push(task.clone());
            Ok(task)
        })?;
        info!(task_id = %task.id, "task created");
        Ok(task)
    }

    pub fn get(&self, id: &str) -> Result<Task> {
        let id = id.trim();
        self.load()?
            .tasks
            .into_iter()
            .find(|task| task.id == id)
            .ok_or_else(|| task_not_found(id))
    }

    pub fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .load()?
            .tasks
            .into_iter()
            .filter(|task| filter.matches(task))
            .collect();
        tasks.sort_by(|left, right| compare_ids(&left.id, &right.id));
        Ok(tasks)
    }

    pub fn set_completed(&self, id: &str, completed: bool, now: DateTime<Utc>) -> Result<StatusChange> {
        let id = id.trim();
        self.update(|registry| {
            let task = registry.find_mut(id)?;
            let previous = task.completed;
            if previous != completed {
                task.completed = completed;
                task.updated_at = now;
            }
            Ok(StatusChange {
                task: task.clone(),
                previous,
            })
        })
    }

    pub fn assign(&self, id: &str, user: &str, now: DateTime<Utc>) -> Result<Task> {
        let id = id.trim();
        let user = user.trim();
        if user.is_empty() {
            return Err(Error::Validation("assignee cannot be empty".to_string()));
        }
        self.update(|registry| {
            let task = registry.find_mut(id)?;
            task.assigned_to = Some(user.to_string());
            task.updated_at = now;
            Ok(task.clone())
        })
    }

    pub fn add_comment(
        &self,
        task_id: &str,
        author: &str,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<Comment> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::Validation("comment cannot be empty".to_string()));
        }
        let task = self.get(task_id)?;
        let comment = Comment {
            id: Ulid::new().to_string().to_lowercase(),
            task_id: task.id,
            author: author.to_string(),
            text: text.to_string(),
            created_at: now,
        };
        self.storage
            .append_jsonl_locked(&self.storage.comments_file(), &comment)?;
        Ok(comment)
    }

    pub fn comments(&self, task_id: &str) -> Result<Vec<Comment>> {
        let task_id = task_id.trim();
        let comments: Vec<Comment> = self.storage.read_jsonl_locked(&self.storage.comments_file())?;
        Ok(comments
            .into_iter()
            .filter(|comment| comment.task_id == task_id)
            .collect())
    }

    /// Distinct authors who commented on a task.
    pub fn commenters(&self, task_id: &str) -> Result<Vec<String>> {
        let authors: BTreeSet<String> = self
            .comments(task_id)?
            .into_iter()
            .map(|comment| comment.author)
            .collect();
        Ok(authors.into_iter().collect())
    }

    /// Distinct assignees of incomplete tasks.
    pub fn pending_assignees(&self) -> Result<Vec<String>> {
        let assignees: BTreeSet<String> = self
            .load()?
            .tasks
            .into_iter()
            .filter(|task| !task.completed)
            .filter_map(|task| task.assigned_to)
            .collect();
        Ok(assignees.into_iter().collect())
    }

    fn load(&self) -> Result<TaskRegistry> {
        self.storage.read_json_or_default(&self.storage.tasks_file())
    }

    fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut TaskRegistry) -> Result<T>,
    {
        self.storage.update_json(&self.storage.tasks_file(), f)
    }
}

fn task_not_found(id: &str) -> Error {
    Error::NotFound(format!("task {id}"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
