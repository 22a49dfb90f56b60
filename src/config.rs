//! Configuration loading and management
//!
//! Handles parsing of `.tally.toml` configuration files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::aggregate::DEFAULT_RECENT_LIMIT;
use crate::lock::DEFAULT_LOCK_TIMEOUT_MS;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// User identity configuration
    #[serde(default)]
    pub user: UserConfig,

    /// Storage tuning
    #[serde(default)]
    pub storage: StorageConfig,

    /// Report defaults
    #[serde(default)]
    pub reports: ReportsConfig,

    /// Notification delivery
    #[serde(default)]
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    /// User id when none is given on the command line or environment
    #[serde(default = "default_user")]
    pub default: String,
}

fn default_user() -> String {
    "unknown".to_string()
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            default: default_user(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// How long to wait for a data file lock before failing
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_lock_timeout_ms() -> u64 {
    DEFAULT_LOCK_TIMEOUT_MS
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

/// How `report month` matches entries to a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthMatch {
    /// Calendar month only; the same month of every year is included.
    MonthOfYear,
    /// Calendar month within one year.
    YearMonth,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportsConfig {
    /// Entries shown by `report recent`
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,

    #[serde(default = "default_month_match")]
    pub month_match: MonthMatch,
}

fn default_recent_limit() -> usize {
    DEFAULT_RECENT_LIMIT
}

fn default_month_match() -> MonthMatch {
    MonthMatch::MonthOfYear
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            recent_limit: default_recent_limit(),
            month_match: default_month_match(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// `-` for stdout, otherwise a file path (relative paths resolve
    /// inside `.tally/`)
    #[serde(default = "default_notify_destination")]
    pub destination: String,
}

fn default_true() -> bool {
    true
}

fn default_notify_destination() -> String {
    "outbox.jsonl".to_string()
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            destination: default_notify_destination(),
        }
    }
}

impl Config {
    /// Load configuration from a `.tally.toml` file
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `.tally.toml` from `root`, or defaults when it is absent.
    ///
    /// A present but invalid file is an error.
    pub fn load_from_root(root: &Path) -> crate::error::Result<Self> {
        let config_path = root.join(crate::storage::CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &PathBuf) -> crate::error::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> crate::error::Result<()> {
        if self.user.default.trim().is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "user.default cannot be empty".to_string(),
            ));
        }
        if self.storage.lock_timeout_ms == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "storage.lock_timeout_ms must be > 0".to_string(),
            ));
        }
        if self.reports.recent_limit == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "reports.recent_limit must be > 0".to_string(),
            ));
        }
        if self.notify.enabled && self.notify.destination.trim().is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "notify.destination cannot be empty while notify.enabled = true".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_expected() {
        let cfg = Config::default();
        assert_eq!(cfg.user.default, "unknown");
        assert_eq!(cfg.storage.lock_timeout_ms, 5000);
        assert_eq!(cfg.reports.recent_limit, 5);
        assert_eq!(cfg.reports.month_match, MonthMatch::MonthOfYear);
        assert!(cfg.notify.enabled);
        assert_eq!(cfg.notify.destination, "outbox.jsonl");
    }

    #[test]
    fn load_parses_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".tally.toml");
        let content = r#"
[user]
default = "alice"

[storage]
lock_timeout_ms = 250

[reports]
recent_limit = 10
month_match = "year_month"

[notify]
enabled = false
destination = "-"
"#;
        fs::write(&path, content.trim()).expect("write config");

        let cfg = Config::load(&path).expect("load config");
        assert_eq!(cfg.user.default, "alice");
        assert_eq!(cfg.storage.lock_timeout_ms, 250);
        assert_eq!(cfg.reports.recent_limit, 10);
        assert_eq!(cfg.reports.month_match, MonthMatch::YearMonth);
        assert!(!cfg.notify.enabled);
        assert_eq!(cfg.notify.destination, "-");
    }

    #[test]
    fn unknown_month_match_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".tally.toml");
        fs::write(&path, "[reports]\nmonth_match = \"weekly\"\n").expect("write config");

        let err = Config::load(&path).expect_err("invalid config");
        assert!(matches!(err, crate::error::Error::TomlParse(_)));
    }

    #[test]
    fn zero_recent_limit_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".tally.toml");
        fs::write(&path, "[reports]\nrecent_limit = 0\n").expect("write config");

        let err = Config::load(&path).expect_err("invalid config");
        match err {
            crate::error::Error::InvalidConfig(_) => {}
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn load_from_root_defaults_when_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_from_root(dir.path()).expect("defaults");
        assert_eq!(cfg.user.default, "unknown");
    }

    #[test]
    fn save_writes_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.toml");
        Config::default().save(&path).expect("save config");

        let written = fs::read_to_string(&path).expect("read config");
        assert!(written.contains("month_match = \"month_of_year\""));
        let reloaded = Config::load(&path).expect("reload");
        assert_eq!(reloaded.reports.recent_limit, 5);
    }
}
