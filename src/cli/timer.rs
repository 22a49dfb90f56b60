//! tally timer and log command implementations.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::context::{load_context, now, timestamp_or_now};
use super::Globals;
use crate::duration::Elapsed;
use crate::entry::{EntryFilter, TimeEntry};
use crate::error::{Error, Result};
use crate::ops::{Operation, Outcome};
use crate::output::{emit_success, HumanOutput};

pub struct TimerOptions {
    pub task: String,
    pub at: Option<String>,
}

pub struct LogAddOptions {
    pub task: String,
    pub minutes: i64,
    pub started_at: Option<String>,
}

pub struct LogListOptions {
    pub task: Option<String>,
    pub for_user: Option<String>,
}

#[derive(Serialize)]
struct TimerStartedOutput {
    entry_id: String,
    task_id: String,
    user_id: String,
    started_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct TimerStoppedOutput {
    entry_id: String,
    task_id: String,
    user_id: String,
    duration: Elapsed,
}

#[derive(Serialize)]
struct TimerStatusOutput {
    user_id: String,
    timers: Vec<TimeEntry>,
}

#[derive(Serialize)]
struct EntryCreatedOutput {
    entry_id: String,
    task_id: String,
    user_id: String,
    started_at: DateTime<Utc>,
    duration: Elapsed,
}

#[derive(Serialize)]
struct EntryListOutput {
    total: usize,
    entries: Vec<TimeEntry>,
}

pub fn run_start(options: TimerOptions, globals: &Globals) -> Result<()> {
    let ctx = load_context(globals)?;
    let task = ctx.tasks().get(&options.task)?;
    let started_at = timestamp_or_now("at", options.at.as_deref())?;

    let outcome = ctx.tracker().execute(
        Operation::StartTimer {
            task_id: task.id.clone(),
            user_id: ctx.user.clone(),
        },
        started_at,
    )?;
    let entry_id = match outcome {
        Outcome::Started { entry_id } => entry_id,
        other => return Err(unexpected("timer start", &other)),
    };

    let mut human = HumanOutput::new("Timer started");
    human.field("Task", format!("{} {}", task.id, task.title));
    human.field("User", ctx.user.clone());
    human.field("Started", started_at.to_rfc3339());
    human.field("Entry", entry_id.clone());
    human.suggest(format!("tally timer stop {}", task.id));

    let output = TimerStartedOutput {
        entry_id,
        task_id: task.id,
        user_id: ctx.user.clone(),
        started_at,
    };
    emit_success(ctx.output, "timer start", &output, Some(&human))
}

pub fn run_stop(options: TimerOptions, globals: &Globals) -> Result<()> {
    let ctx = load_context(globals)?;
    let task = ctx.tasks().get(&options.task)?;
    let stopped_at = timestamp_or_now("at", options.at.as_deref())?;

    let outcome = ctx.tracker().execute(
        Operation::StopTimer {
            task_id: task.id.clone(),
            user_id: ctx.user.clone(),
        },
        stopped_at,
    )?;
    let (entry_id, duration) = match outcome {
        Outcome::Stopped { entry_id, duration } => (entry_id, duration),
        other => return Err(unexpected("timer stop", &other)),
    };

    let mut human = HumanOutput::new("Timer stopped");
    human.field("Task", format!("{} {}", task.id, task.title));
    human.field("User", ctx.user.clone());
    human.field("Duration", duration.to_string());
    human.field("Entry", entry_id.clone());

    let output = TimerStoppedOutput {
        entry_id,
        task_id: task.id,
        user_id: ctx.user.clone(),
        duration,
    };
    emit_success(ctx.output, "timer stop", &output, Some(&human))
}

pub fn run_status(globals: &Globals) -> Result<()> {
    let ctx = load_context(globals)?;
    let timers = ctx.tracker().open_timers(&ctx.user)?;
    let current = now();

    let mut human = HumanOutput::new("Running timers");
    human.field("User", ctx.user.clone());
    human.field("Running", timers.len().to_string());
    for entry in &timers {
        let mut line = format!("task {}", entry.task_id);
        if let Some(started_at) = entry.started_at {
            line.push_str(&format!(" since {}", started_at.to_rfc3339()));
            if let Ok(elapsed) = Elapsed::new(current - started_at) {
                line.push_str(&format!(" ({elapsed})"));
            }
        }
        human.line(line);
    }

    let output = TimerStatusOutput {
        user_id: ctx.user.clone(),
        timers,
    };
    emit_success(ctx.output, "timer status", &output, Some(&human))
}

pub fn run_log_add(options: LogAddOptions, globals: &Globals) -> Result<()> {
    let ctx = load_context(globals)?;
    let task = ctx.tasks().get(&options.task)?;
    let started_at = timestamp_or_now("started-at", options.started_at.as_deref())?;

    let outcome = ctx.tracker().execute(
        Operation::CreateEntry {
            task_id: task.id.clone(),
            user_id: ctx.user.clone(),
            started_at,
            duration_minutes: options.minutes,
        },
        now(),
    )?;
    let entry_id = match outcome {
        Outcome::Created { entry_id } => entry_id,
        other => return Err(unexpected("log add", &other)),
    };
    let duration = Elapsed::from_minutes(options.minutes)?;

    let mut human = HumanOutput::new("Time logged");
    human.field("Task", format!("{} {}", task.id, task.title));
    human.field("User", ctx.user.clone());
    human.field("Duration", duration.to_string());
    human.field("Entry", entry_id.clone());

    let output = EntryCreatedOutput {
        entry_id,
        task_id: task.id,
        user_id: ctx.user.clone(),
        started_at,
        duration,
    };
    emit_success(ctx.output, "log add", &output, Some(&human))
}

pub fn run_log_list(options: LogListOptions, globals: &Globals) -> Result<()> {
    let ctx = load_context(globals)?;
    let filter = EntryFilter {
        task_id: options.task.map(|task| task.trim().to_string()),
        user_id: options.for_user.map(|user| user.trim().to_string()),
        state: None,
    };
    let mut entries = ctx.tracker().entries(&filter)?;
    entries.sort_by(|left, right| {
        left.started_at
            .cmp(&right.started_at)
            .then_with(|| left.id.cmp(&right.id))
    });

    let mut human = HumanOutput::new("Time entries");
    human.field("Total", entries.len().to_string());
    for entry in &entries {
        human.line(format_entry(entry));
    }

    let output = EntryListOutput {
        total: entries.len(),
        entries,
    };
    emit_success(ctx.output, "log list", &output, Some(&human))
}

pub(crate) fn format_entry(entry: &TimeEntry) -> String {
    let started = entry
        .started_at
        .map(|at| at.to_rfc3339())
        .unwrap_or_else(|| "-".to_string());
    let duration = entry
        .duration
        .map(|d| d.to_string())
        .unwrap_or_else(|| "running".to_string());
    format!(
        "{} task {} user {} {} {}",
        entry.id, entry.task_id, entry.user_id, started, duration
    )
}

fn unexpected(command: &str, outcome: &Outcome) -> Error {
    Error::OperationFailed(format!("{command}: unexpected outcome {outcome:?}"))
}
