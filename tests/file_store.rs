use std::sync::{Arc, Barrier};
use std::thread;

use chrono::{TimeDelta, TimeZone, Utc};
use tally::aggregate::{self, MonthScope};
use tally::duration::Elapsed;
use tally::error::Error;
use tally::ops::{Operation, Outcome};
use tally::repository::{EntryStore, FileEntryStore};
use tally::storage::Storage;
use tally::timer::TimeTracker;

fn tracker(dir: &tempfile::TempDir) -> TimeTracker<FileEntryStore> {
    let storage = Storage::new(dir.path().to_path_buf());
    storage.init().expect("init");
    TimeTracker::new(FileEntryStore::new(storage))
}

#[test]
fn concurrent_starts_create_one_open_entry() {
    let dir = tempfile::tempdir().expect("tempdir");
    let tracker = Arc::new(tracker(&dir));
    let barrier = Arc::new(Barrier::new(8));
    let now = Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let tracker = Arc::clone(&tracker);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                tracker.start_timer("5", "7", now)
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("join"))
        .collect();
    let started = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(started, 1);
    assert!(results
        .iter()
        .filter_map(|result| result.as_ref().err())
        .all(|err| matches!(err, Error::TimerConflict { .. })));

    assert_eq!(tracker.open_timers("7").expect("open").len(), 1);
}

#[test]
fn entries_survive_reload() {
    let dir = tempfile::tempdir().expect("tempdir");
    let t0 = Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap();

    {
        let tracker = tracker(&dir);
        tracker.start_timer("5", "7", t0).expect("start");
        tracker
            .stop_timer("5", "7", t0 + TimeDelta::minutes(15))
            .expect("stop");
        tracker.create_manual("5", "7", t0, 45).expect("manual");
    }

    let reopened = tracker(&dir);
    let entries = reopened.store().load().expect("load").into_vec();
    assert_eq!(entries.len(), 2);
    assert_eq!(
        aggregate::sum_duration(&entries),
        Elapsed::from_minutes(60).expect("minutes")
    );

    let outcome = reopened
        .execute(
            Operation::MonthlyTotal {
                user_id: "7".to_string(),
                scope: MonthScope::month_of_year(6).expect("month"),
            },
            t0,
        )
        .expect("monthly total");
    assert_eq!(
        outcome,
        Outcome::MonthlyTotal {
            total_duration: Elapsed::from_minutes(60).expect("minutes"),
            entries: 2,
        }
    );
}

#[test]
fn subsecond_clock_readings_persist_exact_durations() {
    let dir = tempfile::tempdir().expect("tempdir");
    let t0 = Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap() + TimeDelta::milliseconds(700);
    let tracker = tracker(&dir);

    let started = tracker.start_timer("5", "7", t0).expect("start");
    let stopped = tracker
        .stop_timer("5", "7", t0 + TimeDelta::milliseconds(900))
        .expect("stop");

    let reloaded = tracker.store().load().expect("load").into_vec();
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded[0].started_at, started.started_at);
    assert_eq!(reloaded[0].duration, stopped.duration);
    assert_eq!(
        stopped.duration.map(|d| d.as_delta()),
        Some(TimeDelta::seconds(1))
    );
}

#[test]
fn oversized_manual_entries_are_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let t0 = Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap();
    let tracker = tracker(&dir);

    for _ in 0..2 {
        let err = tracker
            .create_manual("5", "7", t0, 153_722_867_280_912)
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
    tracker.create_manual("5", "7", t0, 30).expect("manual");

    let entries = tracker.store().load().expect("load").into_vec();
    let total = aggregate::monthly_total(
        &entries,
        "7",
        MonthScope::month_of_year(6).expect("month"),
    );
    assert_eq!(total.total_duration, Elapsed::from_minutes(30).expect("minutes"));
    assert_eq!(total.entries, 1);
}

#[test]
fn monthly_total_operation_trims_user_id() {
    let dir = tempfile::tempdir().expect("tempdir");
    let t0 = Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap();
    let tracker = tracker(&dir);
    tracker.create_manual(" 5 ", " 7", t0, 20).expect("manual");

    let outcome = tracker
        .execute(
            Operation::MonthlyTotal {
                user_id: " 7 ".to_string(),
                scope: MonthScope::month_of_year(6).expect("month"),
            },
            t0,
        )
        .expect("monthly total");
    assert_eq!(
        outcome,
        Outcome::MonthlyTotal {
            total_duration: Elapsed::from_minutes(20).expect("minutes"),
            entries: 1,
        }
    );
}
