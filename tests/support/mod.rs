#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

pub fn tally_bin() -> PathBuf {
    assert_cmd::cargo::cargo_bin("tally")
}

/// `tally` with a clean environment.
pub fn tally_cmd() -> Command {
    let mut cmd = Command::new(tally_bin());
    cmd.env_remove("TALLY_USER")
        .env_remove("TALLY_DIR")
        .env_remove("RUST_LOG");
    cmd
}

pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    /// Temp directory with `tally init` already run.
    pub fn init() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let test_dir = Self { dir };
        test_dir.cmd().arg("init").assert().success();
        test_dir
    }

    pub fn uninitialized() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join(".tally")
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = tally_cmd();
        cmd.current_dir(self.path());
        cmd
    }

    /// Run `tally --user <user> <args> --json` and return the envelope.
    pub fn json_as(&self, user: &str, args: &[&str]) -> Value {
        let output = self
            .cmd()
            .args(["--user", user])
            .args(args)
            .arg("--json")
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&output).expect("json envelope")
    }

    pub fn new_task(&self, user: &str, title: &str) -> String {
        let value = self.json_as(user, &["task", "new", title]);
        value["data"]["id"].as_str().expect("task id").to_string()
    }

    pub fn write_config(&self, contents: &str) {
        fs::write(self.path().join(".tally.toml"), contents).expect("write config");
    }

    /// Notifications written to the default outbox.
    pub fn outbox(&self) -> Vec<Value> {
        let path = self.data_dir().join("outbox.jsonl");
        if !path.exists() {
            return Vec::new();
        }
        fs::read_to_string(&path)
            .expect("read outbox")
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).expect("notification json"))
            .collect()
    }
}
