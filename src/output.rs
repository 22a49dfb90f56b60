//! Command output: the `tally.v1` JSON envelope and the plain-text form.
//!
//! Every command produces one envelope on stdout when `--json` is set:
//!
//! ```text
//! {"schema_version": "tally.v1", "command": "timer start", "status": "success",
//!  "data": {...}, "warnings": [...], "next_steps": [...]}
//! ```
//!
//! Failures carry an `error` object (`message`, `code`, `kind`, `details`)
//! instead of `data`.

use std::fmt;

use serde::Serialize;

use crate::error::{Error, ErrorKind, Result};

pub const SCHEMA_VERSION: &str = "tally.v1";

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

/// Plain-text rendering of a command result.
///
/// Fields print as an aligned `key  value` block under the header, followed
/// by free-form lines, warnings and suggested follow-up commands.
#[derive(Debug, Clone, Default)]
pub struct HumanOutput {
    header: String,
    fields: Vec<(String, String)>,
    lines: Vec<String>,
    warnings: Vec<String>,
    next_steps: Vec<String>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            ..Self::default()
        }
    }

    pub fn field(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.push((key.into(), value.into()));
    }

    pub fn line(&mut self, value: impl Into<String>) {
        self.lines.push(value.into());
    }

    pub fn warning(&mut self, value: impl Into<String>) {
        self.warnings.push(value.into());
    }

    pub fn suggest(&mut self, command: impl Into<String>) {
        self.next_steps.push(command.into());
    }
}

impl fmt::Display for HumanOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.header)?;

        let width = self.fields.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
        for (key, value) in &self.fields {
            let row = format!("  {key:<width$}  {value}");
            write!(f, "\n{}", row.trim_end())?;
        }
        if !self.lines.is_empty() {
            writeln!(f)?;
            for line in &self.lines {
                write!(f, "\n  {line}")?;
            }
        }
        if !self.warnings.is_empty() || !self.next_steps.is_empty() {
            writeln!(f)?;
        }
        for warning in &self.warnings {
            write!(f, "\nwarning: {warning}")?;
        }
        for step in &self.next_steps {
            write!(f, "\nnext: {step}")?;
        }
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum Status {
    Success,
    Error,
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    code: i32,
    kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    schema_version: &'static str,
    command: &'a str,
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    next_steps: Vec<String>,
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        let envelope = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: Status::Success,
            data: Some(data),
            error: None,
            warnings: human.map(|h| h.warnings.clone()).unwrap_or_default(),
            next_steps: human.map(|h| h.next_steps.clone()).unwrap_or_default(),
        };
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    } else if let Some(human) = human.filter(|_| !options.quiet) {
        println!("{human}");
    }
    Ok(())
}

pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let next_steps = error_next_steps(err);
    if !json {
        eprintln!("error: {err}");
        if let Some(hint) = next_steps.first() {
            eprintln!("hint: {hint}");
        }
        return Ok(());
    }

    let envelope: Envelope<'_, ()> = Envelope {
        schema_version: SCHEMA_VERSION,
        command,
        status: Status::Error,
        data: None,
        error: Some(ErrorBody {
            message: err.to_string(),
            code: err.exit_code(),
            kind: err.kind(),
            details: err.details(),
        }),
        warnings: Vec::new(),
        next_steps,
    };
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> impl Iterator<Item = String> {
        raw.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn human_output_aligns_fields() {
        let mut human = HumanOutput::new("Timer started");
        human.field("Task", "5");
        human.field("Entry", "01j0");
        human.field("Running", "");
        human.line("first line");
        human.warning("notification not delivered");
        human.suggest("tally timer stop 5");

        assert_eq!(
            human.to_string(),
            "Timer started\n  Task     5\n  Entry    01j0\n  Running\n\n  first line\n\nwarning: notification not delivered\nnext: tally timer stop 5"
        );
        assert_eq!(HumanOutput::new("Done").to_string(), "Done");
    }

    #[test]
    fn command_name_includes_group_subcommand() {
        assert_eq!(command_name(args(&["timer", "start", "5"])), "timer start");
        assert_eq!(
            command_name(args(&["--json", "--user", "alice", "report", "month", "6"])),
            "report month"
        );
        assert_eq!(command_name(args(&["attach", "list", "3"])), "attach list");
        assert_eq!(command_name(args(&["init"])), "init");
        assert_eq!(command_name(args(&["--dir", "/tmp/x"])), "tally");
    }

    #[test]
    fn hints_point_at_recovery_commands() {
        let conflict = Error::TimerConflict {
            task_id: "5".to_string(),
            user_id: "7".to_string(),
            entry_id: "abc".to_string(),
        };
        assert_eq!(error_next_steps(&conflict), vec!["tally timer stop 5"]);
        assert!(error_next_steps(&Error::Validation("x".to_string())).is_empty());
    }
}
