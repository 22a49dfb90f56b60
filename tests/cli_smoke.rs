mod support;

use predicates::str::contains;
use serde_json::Value;

use support::{tally_cmd, TestDir};

#[test]
fn help_lists_command_groups() {
    tally_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("timer"))
        .stdout(contains("report"))
        .stdout(contains("remind"))
        .stdout(contains("attach"));
}

#[test]
fn init_creates_data_dir_and_config() {
    let dir = TestDir::uninitialized();

    let output = dir
        .cmd()
        .args(["init", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: Value = serde_json::from_slice(&output).expect("init json");
    assert_eq!(value["schema_version"], "tally.v1");
    assert_eq!(value["data"]["created"]["config"], Value::Bool(true));
    assert_eq!(value["data"]["created"]["data_dir"], Value::Bool(true));
    assert!(dir.data_dir().is_dir());
    assert!(dir.path().join(".tally.toml").is_file());

    dir.cmd()
        .arg("init")
        .assert()
        .success()
        .stdout(contains("tally init: nothing to do"));
}

#[test]
fn commands_require_init() {
    let dir = TestDir::uninitialized();

    dir.cmd()
        .args(["timer", "status"])
        .assert()
        .code(2)
        .stderr(contains("not initialized"))
        .stderr(contains("hint: tally init"));
}

#[test]
fn dir_flag_and_env_select_root() {
    let dir = TestDir::init();

    tally_cmd()
        .args(["--user", "alice", "task", "new", "Elsewhere", "--dir"])
        .arg(dir.path())
        .assert()
        .success();

    let output = tally_cmd()
        .env("TALLY_DIR", dir.path())
        .args(["task", "list", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: Value = serde_json::from_slice(&output).expect("list json");
    assert_eq!(value["data"]["total"].as_u64(), Some(1));
}

#[test]
fn user_set_persists_identity() {
    let dir = TestDir::init();

    dir.cmd().args(["user", "set", "dana"]).assert().success();
    dir.cmd()
        .args(["user", "show"])
        .assert()
        .success()
        .stdout(contains("User  dana"));

    dir.cmd()
        .args(["--user", "erin", "user", "show"])
        .assert()
        .success()
        .stdout(contains("User  erin"));
}

#[test]
fn invalid_config_is_reported() {
    let dir = TestDir::init();
    dir.write_config("[storage]\nlock_timeout_ms = 0\n");

    dir.cmd()
        .args(["timer", "status"])
        .assert()
        .code(2)
        .stderr(contains("lock_timeout_ms must be > 0"))
        .stderr(contains("hint: fix .tally.toml then retry"));
}

#[test]
fn quiet_suppresses_human_output() {
    let dir = TestDir::init();
    dir.cmd()
        .args(["--quiet", "task", "new", "Silent"])
        .assert()
        .success()
        .stdout("");
}
