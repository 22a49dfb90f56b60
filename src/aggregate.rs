//! Duration aggregation over time entries.
//!
//! Open timers carry no duration and never contribute to a total.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use crate::duration::Elapsed;
use crate::entry::TimeEntry;
use crate::error::{Error, Result};

/// Default number of entries returned by [`list_recent`].
pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// Which calendar month a monthly total covers.
///
/// `MonthOfYear` ignores the year, so June 2023 and June 2024 are summed
/// together. `YearMonth` restricts to one year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "match", rename_all = "snake_case")]
pub enum MonthScope {
    MonthOfYear { month: u32 },
    YearMonth { year: i32, month: u32 },
}

impl MonthScope {
    pub fn month_of_year(month: u32) -> Result<Self> {
        validate_month(month)?;
        Ok(MonthScope::MonthOfYear { month })
    }

    pub fn year_month(year: i32, month: u32) -> Result<Self> {
        validate_month(month)?;
        Ok(MonthScope::YearMonth { year, month })
    }

    pub fn month(&self) -> u32 {
        match self {
            MonthScope::MonthOfYear { month } | MonthScope::YearMonth { month, .. } => *month,
        }
    }

    /// Month boundaries are evaluated in UTC.
    pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
        match self {
            MonthScope::MonthOfYear { month } => timestamp.month() == *month,
            MonthScope::YearMonth { year, month } => {
                timestamp.year() == *year && timestamp.month() == *month
            }
        }
    }
}

fn validate_month(month: u32) -> Result<()> {
    if (1..=12).contains(&month) {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "month must be between 1 and 12 (got {month})"
        )))
    }
}

/// Total duration across `entries`, skipping open timers.
pub fn sum_duration<'a, I>(entries: I) -> Elapsed
where
    I: IntoIterator<Item = &'a TimeEntry>,
{
    entries.into_iter().filter_map(|entry| entry.duration).sum()
}

/// The `limit` longest finalized entries, longest first.
///
/// Open timers are excluded. Equal durations order by later `started_at`
/// first, then by id.
pub fn list_recent(entries: &[TimeEntry], limit: usize) -> Vec<TimeEntry> {
    let mut finished: Vec<&TimeEntry> = entries
        .iter()
        .filter(|entry| entry.duration.is_some())
        .collect();
    finished.sort_by(|left, right| {
        right
            .duration
            .cmp(&left.duration)
            .then_with(|| right.started_at.cmp(&left.started_at))
            .then_with(|| left.id.cmp(&right.id))
    });
    finished.into_iter().take(limit).cloned().collect()
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MonthlyTotal {
    pub user_id: String,
    pub scope: MonthScope,
    pub total_duration: Elapsed,
    pub entries: usize,
}

/// Sum a user's finalized entries whose `started_at` falls in `scope`.
pub fn monthly_total(entries: &[TimeEntry], user_id: &str, scope: MonthScope) -> MonthlyTotal {
    let matching: Vec<&TimeEntry> = entries
        .iter()
        .filter(|entry| entry.user_id == user_id)
        .filter(|entry| entry.duration.is_some())
        .filter(|entry| {
            entry
                .started_at
                .as_ref()
                .map(|started| scope.contains(started))
                .unwrap_or(false)
        })
        .collect();

    MonthlyTotal {
        user_id: user_id.to_string(),
        scope,
        total_duration: sum_duration(matching.iter().copied()),
        entries: matching.len(),
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TaskTotal {
    pub task_id: String,
    pub total_duration: Elapsed,
    pub entries: usize,
}

/// Per-task totals ordered by task id (numeric ids compare numerically).
pub fn task_totals(entries: &[TimeEntry]) -> Vec<TaskTotal> {
    let mut grouped: BTreeMap<&str, (Elapsed, usize)> = BTreeMap::new();
    for entry in entries {
        let Some(duration) = entry.duration else {
            continue;
        };
        let slot = grouped
            .entry(entry.task_id.as_str())
            .or_insert((Elapsed::zero(), 0));
        slot.0 += duration;
        slot.1 += 1;
    }

    let mut totals: Vec<TaskTotal> = grouped
        .into_iter()
        .map(|(task_id, (total_duration, entries))| TaskTotal {
            task_id: task_id.to_string(),
            total_duration,
            entries,
        })
        .collect();
    totals.sort_by(|left, right| compare_ids(&left.task_id, &right.task_id));
    totals
}

pub fn total_for_task(entries: &[TimeEntry], task_id: &str) -> Elapsed {
    sum_duration(entries.iter().filter(|entry| entry.task_id == task_id))
}

/// Entries of one task, oldest first. Entries without a start sort last.
pub fn entries_for_task(entries: &[TimeEntry], task_id: &str) -> Vec<TimeEntry> {
    let mut matching: Vec<TimeEntry> = entries
        .iter()
        .filter(|entry| entry.task_id == task_id)
        .cloned()
        .collect();
    matching.sort_by(|left, right| match (left.started_at, right.started_at) {
        (Some(l), Some(r)) => l.cmp(&r).then_with(|| left.id.cmp(&right.id)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => left.id.cmp(&right.id),
    });
    matching
}

pub(crate) fn compare_ids(left: &str, right: &str) -> Ordering {
    match (left.parse::<u64>(), right.parse::<u64>()) {
        (Ok(l), Ok(r)) => l.cmp(&r),
        _ => left.cmp(right),
    }
}
