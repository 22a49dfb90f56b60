mod support;

use predicates::str::contains;

use support::TestDir;

fn log(dir: &TestDir, user: &str, task: &str, minutes: &str, started_at: &str) {
    dir.json_as(
        user,
        &[
            "log",
            "add",
            task,
            "--minutes",
            minutes,
            "--started-at",
            started_at,
        ],
    );
}

#[test]
fn month_report_sums_same_month_across_years() {
    let dir = TestDir::init();
    let task = dir.new_task("7", "Monthly");

    log(&dir, "7", &task, "15", "2023-06-10T10:00:00Z");
    log(&dir, "7", &task, "25", "2024-06-10T10:00:00Z");
    log(&dir, "7", &task, "100", "2024-07-01T10:00:00Z");
    log(&dir, "8", &task, "100", "2024-06-10T10:00:00Z");

    let report = dir.json_as("7", &["report", "month", "--month", "6"]);
    assert_eq!(report["data"]["total_duration"].as_i64(), Some(40 * 60));
    assert_eq!(report["data"]["entries"].as_u64(), Some(2));
    assert_eq!(report["data"]["scope"]["match"], "month_of_year");
    assert_eq!(report["data"]["user_id"], "7");

    let scoped = dir.json_as("7", &["report", "month", "--month", "6", "--year", "2024"]);
    assert_eq!(scoped["data"]["total_duration"].as_i64(), Some(25 * 60));
    assert_eq!(scoped["data"]["scope"]["year"].as_i64(), Some(2024));
}

#[test]
fn month_report_ignores_running_timers() {
    let dir = TestDir::init();
    let task = dir.new_task("7", "Running");

    log(&dir, "7", &task, "10", "2024-03-02T10:00:00Z");
    dir.json_as("7", &["timer", "start", &task, "--at", "2024-03-05T10:00:00Z"]);

    let report = dir.json_as("7", &["report", "month", "--month", "3"]);
    assert_eq!(report["data"]["total_duration"].as_i64(), Some(600));
    assert_eq!(report["data"]["entries"].as_u64(), Some(1));
}

#[test]
fn month_report_empty_is_zero() {
    let dir = TestDir::init();
    let report = dir.json_as("7", &["report", "month", "--month", "1"]);
    assert_eq!(report["data"]["total_duration"].as_i64(), Some(0));
}

#[test]
fn month_report_rejects_invalid_month() {
    let dir = TestDir::init();
    dir.cmd()
        .args(["--user", "7", "report", "month", "--month", "13"])
        .assert()
        .code(2)
        .stderr(contains("month must be between 1 and 12"));
}

#[test]
fn year_month_config_restricts_to_one_year() {
    let dir = TestDir::init();
    dir.write_config("[reports]\nmonth_match = \"year_month\"\n");
    let task = dir.new_task("7", "Scoped");

    log(&dir, "7", &task, "15", "2023-06-10T10:00:00Z");
    log(&dir, "7", &task, "25", "2024-06-10T10:00:00Z");

    let report = dir.json_as("7", &["report", "month", "--month", "6", "--year", "2023"]);
    assert_eq!(report["data"]["total_duration"].as_i64(), Some(15 * 60));
    assert_eq!(report["data"]["scope"]["match"], "year_month");
}

#[test]
fn recent_lists_longest_finished_entries() {
    let dir = TestDir::init();
    let task = dir.new_task("7", "Recent");

    for minutes in ["10", "45", "30", "5"] {
        log(&dir, "7", &task, minutes, "2024-06-01T10:00:00Z");
    }
    log(&dir, "8", &task, "500", "2024-06-01T10:00:00Z");
    dir.json_as("7", &["timer", "start", &task]);

    let report = dir.json_as("7", &["report", "recent", "--limit", "3"]);
    let durations: Vec<i64> = report["data"]["entries"]
        .as_array()
        .expect("entries")
        .iter()
        .map(|entry| entry["duration"].as_i64().expect("duration"))
        .collect();
    assert_eq!(durations, vec![45 * 60, 30 * 60, 10 * 60]);

    let all = dir.json_as("7", &["report", "recent"]);
    assert_eq!(all["data"]["limit"].as_u64(), Some(5));
    assert_eq!(all["data"]["entries"].as_array().map(Vec::len), Some(4));
}

#[test]
fn tasks_report_groups_by_task() {
    let dir = TestDir::init();
    let first = dir.new_task("7", "First");
    let second = dir.new_task("7", "Second");

    log(&dir, "7", &first, "10", "2024-06-01T10:00:00Z");
    log(&dir, "8", &first, "20", "2024-06-01T10:00:00Z");
    log(&dir, "7", &second, "5", "2024-06-01T10:00:00Z");

    let report = dir.json_as("7", &["report", "tasks"]);
    let tasks = report["data"]["tasks"].as_array().expect("tasks");
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0]["task_id"], first.as_str());
    assert_eq!(tasks[0]["title"], "First");
    assert_eq!(tasks[0]["total_duration"].as_i64(), Some(30 * 60));
    assert_eq!(tasks[0]["entries"].as_u64(), Some(2));
    assert_eq!(report["data"]["total_duration"].as_i64(), Some(35 * 60));
}
