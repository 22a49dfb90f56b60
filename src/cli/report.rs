//! tally report command implementations.

use std::collections::HashMap;

use chrono::Datelike;
use serde::Serialize;

use super::context::{load_context, now};
use super::timer::format_entry;
use super::Globals;
use crate::aggregate::{self, MonthScope, MonthlyTotal};
use crate::config::MonthMatch;
use crate::duration::Elapsed;
use crate::entry::{EntryFilter, TimeEntry};
use crate::error::{Error, Result};
use crate::ops::{Operation, Outcome};
use crate::output::{emit_success, HumanOutput};
use crate::task::TaskFilter;

pub struct MonthOptions {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

#[derive(Serialize)]
struct RecentOutput {
    user_id: String,
    limit: usize,
    entries: Vec<TimeEntry>,
}

#[derive(Serialize)]
struct TaskTotalRow {
    task_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    total_duration: Elapsed,
    entries: usize,
}

#[derive(Serialize)]
struct TaskTotalsOutput {
    total_duration: Elapsed,
    tasks: Vec<TaskTotalRow>,
}

pub fn run_month(options: MonthOptions, globals: &Globals) -> Result<()> {
    let ctx = load_context(globals)?;
    let today = now();
    let month = options.month.unwrap_or_else(|| today.month());
    let scope = match (options.year, ctx.config.reports.month_match) {
        (Some(year), _) => MonthScope::year_month(year, month)?,
        (None, MonthMatch::YearMonth) => MonthScope::year_month(today.year(), month)?,
        (None, MonthMatch::MonthOfYear) => MonthScope::month_of_year(month)?,
    };

    let outcome = ctx.tracker().execute(
        Operation::MonthlyTotal {
            user_id: ctx.user.clone(),
            scope,
        },
        today,
    )?;
    let (total_duration, entries) = match outcome {
        Outcome::MonthlyTotal {
            total_duration,
            entries,
        } => (total_duration, entries),
        other => {
            return Err(Error::OperationFailed(format!(
                "report month: unexpected outcome {other:?}"
            )))
        }
    };

    let mut human = HumanOutput::new("Monthly total");
    human.field("User", ctx.user.clone());
    human.field("Month", describe_scope(&scope));
    human.field("Entries", entries.to_string());
    human.field("Total", total_duration.to_string());

    let output = MonthlyTotal {
        user_id: ctx.user.clone(),
        scope,
        total_duration,
        entries,
    };
    emit_success(ctx.output, "report month", &output, Some(&human))
}

pub fn run_recent(limit: Option<usize>, globals: &Globals) -> Result<()> {
    let ctx = load_context(globals)?;
    let limit = limit.unwrap_or(ctx.config.reports.recent_limit);
    if limit == 0 {
        return Err(Error::Validation("limit must be greater than 0".to_string()));
    }

    let entries = ctx.tracker().entries(&EntryFilter::for_user(ctx.user.clone()))?;
    let recent = aggregate::list_recent(&entries, limit);

    let mut human = HumanOutput::new("Longest entries");
    human.field("User", ctx.user.clone());
    human.field("Shown", recent.len().to_string());
    for entry in &recent {
        human.line(format_entry(entry));
    }

    let output = RecentOutput {
        user_id: ctx.user.clone(),
        limit,
        entries: recent,
    };
    emit_success(ctx.output, "report recent", &output, Some(&human))
}

pub fn run_tasks(globals: &Globals) -> Result<()> {
    let ctx = load_context(globals)?;
    let entries = ctx.tracker().entries(&EntryFilter::default())?;
    let titles: HashMap<String, String> = ctx
        .tasks()
        .list(&TaskFilter::default())?
        .into_iter()
        .map(|task| (task.id, task.title))
        .collect();

    let rows: Vec<TaskTotalRow> = aggregate::task_totals(&entries)
        .into_iter()
        .map(|total| TaskTotalRow {
            title: titles.get(&total.task_id).cloned(),
            task_id: total.task_id,
            total_duration: total.total_duration,
            entries: total.entries,
        })
        .collect();
    let total_duration: Elapsed = rows.iter().map(|row| row.total_duration).sum();

    let mut human = HumanOutput::new("Time per task");
    human.field("Tasks", rows.len().to_string());
    human.field("Total", total_duration.to_string());
    for row in &rows {
        human.line(format!(
            "{} {} {} ({} entries)",
            row.task_id,
            row.title.as_deref().unwrap_or("<unknown task>"),
            row.total_duration,
            row.entries
        ));
    }

    let output = TaskTotalsOutput {
        total_duration,
        tasks: rows,
    };
    emit_success(ctx.output, "report tasks", &output, Some(&human))
}

fn describe_scope(scope: &MonthScope) -> String {
    match scope {
        MonthScope::MonthOfYear { month } => format!("{month:02} (every year)"),
        MonthScope::YearMonth { year, month } => format!("{year}-{month:02}"),
    }
}
