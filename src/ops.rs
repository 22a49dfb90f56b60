//! The fixed set of time-tracking operations exposed to transports.
//!
//! Callers build an [`Operation`], hand it to [`TimeTracker::execute`] and
//! translate the [`Outcome`] (or error) into their own response format.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::aggregate::{self, MonthScope};
use crate::duration::Elapsed;
use crate::error::Result;
use crate::repository::EntryStore;
use crate::timer::TimeTracker;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    StartTimer {
        task_id: String,
        user_id: String,
    },
    StopTimer {
        task_id: String,
        user_id: String,
    },
    CreateEntry {
        task_id: String,
        user_id: String,
        started_at: DateTime<Utc>,
        duration_minutes: i64,
    },
    MonthlyTotal {
        user_id: String,
        scope: MonthScope,
    },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::StartTimer { .. } => "start_timer",
            Operation::StopTimer { .. } => "stop_timer",
            Operation::CreateEntry { .. } => "create_entry",
            Operation::MonthlyTotal { .. } => "monthly_total",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    Started {
        entry_id: String,
    },
    Stopped {
        entry_id: String,
        duration: Elapsed,
    },
    Created {
        entry_id: String,
    },
    MonthlyTotal {
        total_duration: Elapsed,
        entries: usize,
    },
}

impl<S: EntryStore> TimeTracker<S> {
    /// Execute one operation. `now` is the clock reading used by timer
    /// transitions; the other operations ignore it.
    pub fn execute(&self, operation: Operation, now: DateTime<Utc>) -> Result<Outcome> {
        tracing::debug!(operation = operation.name(), "executing");
        match operation {
            Operation::StartTimer { task_id, user_id } => {
                let entry = self.start_timer(&task_id, &user_id, now)?;
                Ok(Outcome::Started { entry_id: entry.id })
            }
            Operation::StopTimer { task_id, user_id } => {
                let entry = self.stop_timer(&task_id, &user_id, now)?;
                Ok(Outcome::Stopped {
                    entry_id: entry.id,
                    duration: entry.duration.unwrap_or_else(Elapsed::zero),
                })
            }
            Operation::CreateEntry {
                task_id,
                user_id,
                started_at,
                duration_minutes,
            } => {
                let entry = self.create_manual(&task_id, &user_id, started_at, duration_minutes)?;
                Ok(Outcome::Created { entry_id: entry.id })
            }
            Operation::MonthlyTotal { user_id, scope } => {
                let set = self.store().load()?;
                let total = aggregate::monthly_total(set.all(), user_id.trim(), scope);
                Ok(Outcome::MonthlyTotal {
                    total_duration: total.total_duration,
                    entries: total.entries,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::repository::MemoryStore;
    use chrono::{TimeDelta, TimeZone};

    #[test]
    fn operations_cover_the_timer_lifecycle() {
        let tracker = TimeTracker::new(MemoryStore::new());
        let t0 = Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap();
        let start = Operation::StartTimer {
            task_id: "5".to_string(),
            user_id: "7".to_string(),
        };

        let Outcome::Started { entry_id } = tracker.execute(start.clone(), t0).unwrap() else {
            panic!("expected Started");
        };
        assert!(matches!(
            tracker.execute(start, t0),
            Err(Error::TimerConflict { .. })
        ));

        let stopped = tracker
            .execute(
                Operation::StopTimer {
                    task_id: "5".to_string(),
                    user_id: "7".to_string(),
                },
                t0 + TimeDelta::minutes(15),
            )
            .unwrap();
        assert_eq!(
            stopped,
            Outcome::Stopped {
                entry_id,
                duration: Elapsed::from_minutes(15).unwrap()
            }
        );

        tracker
            .execute(
                Operation::CreateEntry {
                    task_id: "5".to_string(),
                    user_id: "7".to_string(),
                    started_at: t0,
                    duration_minutes: 45,
                },
                t0,
            )
            .unwrap();

        let total = tracker
            .execute(
                Operation::MonthlyTotal {
                    user_id: "7".to_string(),
                    scope: MonthScope::month_of_year(6).unwrap(),
                },
                t0,
            )
            .unwrap();
        assert_eq!(
            total,
            Outcome::MonthlyTotal {
                total_duration: Elapsed::from_minutes(60).unwrap(),
                entries: 2
            }
        );
    }

    #[test]
    fn outcome_serializes_flat() {
        let outcome = Outcome::Stopped {
            entry_id: "abc".to_string(),
            duration: Elapsed::from_minutes(1).unwrap(),
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value, serde_json::json!({"entry_id": "abc", "duration": 60}));
    }
}
