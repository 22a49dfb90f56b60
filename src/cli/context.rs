//! Shared command setup: root, config, storage and user resolution.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use super::Globals;
use crate::attachment::AttachmentStore;
use crate::config::Config;
use crate::duration::whole_seconds;
use crate::error::{Error, Result};
use crate::notify::{Notification, Notifier, NotifyDestination};
use crate::output::{HumanOutput, OutputOptions};
use crate::repository::FileEntryStore;
use crate::storage::Storage;
use crate::task::TaskStore;
use crate::timer::TimeTracker;
use crate::user;

pub(crate) struct Context {
    pub storage: Storage,
    pub config: Config,
    pub user: String,
    pub output: OutputOptions,
}

impl Context {
    pub fn tracker(&self) -> TimeTracker<FileEntryStore> {
        TimeTracker::new(FileEntryStore::new(self.storage.clone()))
    }

    pub fn attachments(&self) -> AttachmentStore {
        AttachmentStore::new(self.storage.clone())
    }

    pub fn tasks(&self) -> TaskStore {
        TaskStore::new(self.storage.clone())
    }

    /// Output options for commands that may notify. Notifications written to
    /// stdout take over the stream, so command output is suppressed.
    pub fn notifying_output(&self) -> OutputOptions {
        let to_stdout = matches!(
            NotifyDestination::from_config(&self.config.notify, &self.storage.data_dir()),
            Some(NotifyDestination::Stdout)
        );
        OutputOptions {
            json: self.output.json && !to_stdout,
            quiet: self.output.quiet || to_stdout,
        }
    }

    /// Deliver a notification if notifications are enabled. Returns whether
    /// it was written.
    ///
    /// Failures become warnings on the command output.
    pub fn deliver(&self, notification: Option<Notification>, human: &mut HumanOutput) -> bool {
        let Some(notification) = notification else {
            return false;
        };
        let Some(destination) =
            NotifyDestination::from_config(&self.config.notify, &self.storage.data_dir())
        else {
            return false;
        };
        let result = destination
            .open()
            .and_then(|mut sink| sink.notify(&notification));
        match result {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, "notification delivery failed");
                human.warning(format!("notification not delivered: {err}"));
                false
            }
        }
    }
}

pub(crate) fn resolve_root(globals: &Globals) -> Result<PathBuf> {
    match &globals.dir {
        Some(dir) => Ok(dir.clone()),
        None => Ok(std::env::current_dir()?),
    }
}

pub(crate) fn load_context(globals: &Globals) -> Result<Context> {
    let root = resolve_root(globals)?;
    let config = Config::load_from_root(&root)?;
    let storage = Storage::new(root).with_lock_timeout(config.storage.lock_timeout_ms);
    storage.ensure_initialized()?;
    let user = user::resolve_user(&storage, &config, globals.user.as_deref());
    tracing::debug!(root = %storage.root().display(), user = %user, "context loaded");

    Ok(Context {
        storage,
        config,
        user,
        output: OutputOptions {
            json: globals.json,
            quiet: globals.quiet,
        },
    })
}

/// Clock reading for commands, truncated to whole seconds.
pub(crate) fn now() -> DateTime<Utc> {
    whole_seconds(Utc::now())
}

/// `value` parsed as RFC3339, or the current time.
pub(crate) fn timestamp_or_now(label: &str, value: Option<&str>) -> Result<DateTime<Utc>> {
    match value {
        Some(value) => parse_timestamp(label, value),
        None => Ok(now()),
    }
}

pub(crate) fn parse_timestamp(label: &str, value: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(value.trim()).map_err(|err| {
        Error::Validation(format!("invalid {label} timestamp '{value}': {err}"))
    })?;
    Ok(whole_seconds(parsed.with_timezone(&Utc)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Timelike, TimeZone};

    #[test]
    fn now_has_no_subseconds() {
        assert_eq!(now().nanosecond(), 0);
    }

    #[test]
    fn timestamps_parse_to_utc() {
        let parsed = parse_timestamp("at", "2024-06-03T11:00:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap());
        let fractional = parse_timestamp("at", "2024-06-03T09:00:00.700Z").unwrap();
        assert_eq!(fractional, Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap());
        assert!(matches!(
            parse_timestamp("at", "yesterday"),
            Err(Error::Validation(_))
        ));
    }
}
