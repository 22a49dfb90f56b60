//! tally task, comment and remind command implementations.

use std::collections::HashMap;

use serde::Serialize;

use super::attach::format_attachment;
use super::context::{load_context, now};
use super::timer::format_entry;
use super::Globals;
use crate::aggregate;
use crate::attachment::Attachment;
use crate::duration::Elapsed;
use crate::entry::{EntryFilter, TimeEntry};
use crate::error::Result;
use crate::notify::Notification;
use crate::output::{emit_success, HumanOutput};
use crate::task::{Comment, NewTask, Task, TaskFilter};

pub struct NewOptions {
    pub title: String,
    pub description: Option<String>,
    pub project: Option<String>,
}

pub struct ListOptions {
    pub mine: bool,
    pub completed: bool,
    pub open: bool,
    pub search: Option<String>,
    pub project: Option<String>,
}

#[derive(Serialize)]
struct TaskWithTotal {
    #[serde(flatten)]
    task: Task,
    total_duration: Elapsed,
}

#[derive(Serialize)]
struct TaskListOutput {
    total: usize,
    tasks: Vec<TaskWithTotal>,
}

#[derive(Serialize)]
struct TaskDetailsOutput {
    #[serde(flatten)]
    task: Task,
    total_duration: Elapsed,
    entries: Vec<TimeEntry>,
    comments: Vec<Comment>,
    attachments: Vec<Attachment>,
}

#[derive(Serialize)]
struct TaskStatusOutput {
    id: String,
    completed: bool,
    changed: bool,
}

#[derive(Serialize)]
struct CommentListOutput {
    task_id: String,
    total: usize,
    comments: Vec<Comment>,
}

#[derive(Serialize)]
struct RemindOutput {
    recipients: Vec<String>,
    sent: bool,
}

pub fn run_new(options: NewOptions, globals: &Globals) -> Result<()> {
    let ctx = load_context(globals)?;
    let task = ctx.tasks().create(
        NewTask {
            title: options.title,
            description: options.description,
            project: options.project,
            creator: Some(ctx.user.clone()),
        },
        now(),
    )?;

    let mut human = HumanOutput::new("Task created");
    human.field("ID", task.id.clone());
    human.field("Title", task.title.clone());
    if let Some(project) = &task.project {
        human.field("Project", project.clone());
    }
    human.field("Assigned", ctx.user.clone());
    human.suggest(format!("tally timer start {}", task.id));

    emit_success(ctx.output, "task new", &task, Some(&human))
}

pub fn run_list(options: ListOptions, globals: &Globals) -> Result<()> {
    let ctx = load_context(globals)?;
    let completed = match (options.completed, options.open) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    };
    let filter = TaskFilter {
        assigned_to: options.mine.then(|| ctx.user.clone()),
        completed,
        search: options.search,
        project: options.project,
    };
    let tasks = ctx.tasks().list(&filter)?;

    let entries = ctx.tracker().entries(&EntryFilter::default())?;
    let totals: HashMap<String, Elapsed> = aggregate::task_totals(&entries)
        .into_iter()
        .map(|total| (total.task_id, total.total_duration))
        .collect();

    let rows: Vec<TaskWithTotal> = tasks
        .into_iter()
        .map(|task| TaskWithTotal {
            total_duration: totals.get(&task.id).copied().unwrap_or_else(Elapsed::zero),
            task,
        })
        .collect();

    let mut human = HumanOutput::new("Tasks");
    human.field("Total", rows.len().to_string());
    for row in &rows {
        let mark = if row.task.completed { "x" } else { " " };
        let mut line = format!("[{mark}] {} {}", row.task.id, row.task.title);
        if let Some(assignee) = &row.task.assigned_to {
            line.push_str(&format!(" (@{assignee})"));
        }
        if let Some(project) = &row.task.project {
            line.push_str(&format!(" (project: {project})"));
        }
        line.push_str(&format!(" {}", row.total_duration));
        human.line(line);
    }

    let output = TaskListOutput {
        total: rows.len(),
        tasks: rows,
    };
    emit_success(ctx.output, "task list", &output, Some(&human))
}

pub fn run_show(id: &str, globals: &Globals) -> Result<()> {
    let ctx = load_context(globals)?;
    let store = ctx.tasks();
    let task = store.get(id)?;
    let comments = store.comments(&task.id)?;
    let attachments = ctx.attachments().list(&task.id)?;
    let all = ctx.tracker().entries(&EntryFilter::for_task(task.id.clone()))?;
    let entries = aggregate::entries_for_task(&all, &task.id);
    let total_duration = aggregate::sum_duration(&entries);

    let mut human = HumanOutput::new(format!("Task {}", task.id));
    human.field("Title", task.title.clone());
    human.field("Completed", if task.completed { "yes" } else { "no" });
    if let Some(assignee) = &task.assigned_to {
        human.field("Assigned", assignee.clone());
    }
    if let Some(project) = &task.project {
        human.field("Project", project.clone());
    }
    if let Some(description) = &task.description {
        human.field("Description", description.clone());
    }
    human.field("Total", total_duration.to_string());
    for entry in &entries {
        human.line(format_entry(entry));
    }
    for comment in &comments {
        human.line(format!("{}: {}", comment.author, comment.text));
    }
    for attachment in &attachments {
        human.line(format_attachment(attachment));
    }

    let output = TaskDetailsOutput {
        task,
        total_duration,
        entries,
        comments,
        attachments,
    };
    emit_success(ctx.output, "task show", &output, Some(&human))
}

pub fn run_set_completed(id: &str, completed: bool, globals: &Globals) -> Result<()> {
    let ctx = load_context(globals)?;
    let store = ctx.tasks();
    let timestamp = now();
    let change = store.set_completed(id, completed, timestamp)?;
    let command = if completed { "task done" } else { "task reopen" };

    let header = match (change.changed(), completed) {
        (true, true) => "Task completed",
        (true, false) => "Task reopened",
        (false, true) => "Task already completed",
        (false, false) => "Task already open",
    };
    let mut human = HumanOutput::new(header);
    human.field("ID", change.task.id.clone());
    human.field("Title", change.task.title.clone());

    if change.changed() {
        let notification = if completed {
            match store.commenters(&change.task.id) {
                Ok(commenters) => {
                    Notification::completed(&change.task, commenters, &ctx.user, timestamp)
                }
                Err(err) => {
                    human.warning(format!("notification not delivered: {err}"));
                    None
                }
            }
        } else {
            Notification::reopened(&change.task, &ctx.user, timestamp)
        };
        ctx.deliver(notification, &mut human);
    }

    let output = TaskStatusOutput {
        id: change.task.id.clone(),
        completed: change.task.completed,
        changed: change.changed(),
    };
    emit_success(ctx.notifying_output(), command, &output, Some(&human))
}

pub fn run_assign(id: &str, assignee: &str, globals: &Globals) -> Result<()> {
    let ctx = load_context(globals)?;
    let timestamp = now();
    let task = ctx.tasks().assign(id, assignee, timestamp)?;

    let mut human = HumanOutput::new("Task assigned");
    human.field("ID", task.id.clone());
    human.field("Assigned", task.assigned_to.clone().unwrap_or_default());
    ctx.deliver(Notification::assigned(&task, &ctx.user, timestamp), &mut human);

    emit_success(ctx.notifying_output(), "task assign", &task, Some(&human))
}

pub fn run_comment_add(task_id: &str, text: &str, globals: &Globals) -> Result<()> {
    let ctx = load_context(globals)?;
    let store = ctx.tasks();
    let task = store.get(task_id)?;
    let comment = store.add_comment(&task.id, &ctx.user, text, now())?;

    let mut human = HumanOutput::new("Comment added");
    human.field("Task", task.id.clone());
    human.field("Comment", comment.text.clone());
    ctx.deliver(Notification::commented(&task, &comment), &mut human);

    emit_success(ctx.notifying_output(), "comment add", &comment, Some(&human))
}

pub fn run_comment_list(task_id: &str, globals: &Globals) -> Result<()> {
    let ctx = load_context(globals)?;
    let store = ctx.tasks();
    let task = store.get(task_id)?;
    let comments = store.comments(&task.id)?;

    let mut human = HumanOutput::new(format!("Comments on task {}", task.id));
    human.field("Total", comments.len().to_string());
    for comment in &comments {
        human.line(format!(
            "{} {}: {}",
            comment.created_at.to_rfc3339(),
            comment.author,
            comment.text
        ));
    }

    let output = CommentListOutput {
        task_id: task.id,
        total: comments.len(),
        comments,
    };
    emit_success(ctx.output, "comment list", &output, Some(&human))
}

pub fn run_remind(globals: &Globals) -> Result<()> {
    let ctx = load_context(globals)?;
    let recipients = ctx.tasks().pending_assignees()?;

    let mut human = HumanOutput::new("Reminder");
    human.field("Recipients", recipients.len().to_string());
    for recipient in &recipients {
        human.line(recipient.clone());
    }
    if !ctx.config.notify.enabled {
        human.warning("notifications are disabled (notify.enabled = false)");
    }

    let sent = ctx.deliver(Notification::reminder(recipients.clone(), now()), &mut human);

    let output = RemindOutput { recipients, sent };
    emit_success(ctx.notifying_output(), "remind", &output, Some(&human))
}
