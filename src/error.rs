//! Error types for tally
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad input, unknown task, no running timer, not initialized)
//! - 3: Conflict (a timer is already running, entry already finalized)
//! - 4: Operation failed (I/O, lock contention, corrupt data)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the tally CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const CONFLICT: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Coarse classification used by callers translating errors into responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Conflict,
    NotFound,
    Validation,
    OperationFailed,
}

/// Main error type for tally operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("tally is not initialized in {0}")]
    NotInitialized(PathBuf),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("no started time log for task {task_id} and user {user_id}")]
    NoOpenTimer { task_id: String, user_id: String },

    #[error("Not found: {0}")]
    NotFound(String),

    // Conflicts (exit code 3)
    #[error("unstopped timer exists for task {task_id} and user {user_id} (entry {entry_id})")]
    TimerConflict {
        task_id: String,
        user_id: String,
        entry_id: String,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::TimerConflict { .. } | Error::Conflict(_) => ErrorKind::Conflict,
            Error::NoOpenTimer { .. } | Error::NotFound(_) => ErrorKind::NotFound,
            Error::NotInitialized(_) | Error::InvalidConfig(_) | Error::Validation(_) => {
                ErrorKind::Validation
            }
            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::LockFailed(_)
            | Error::OperationFailed(_) => ErrorKind::OperationFailed,
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::NotFound | ErrorKind::Validation => exit_codes::USER_ERROR,
            ErrorKind::Conflict => exit_codes::CONFLICT,
            ErrorKind::OperationFailed => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured fields for machine-readable error output.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::TimerConflict {
                task_id,
                user_id,
                entry_id,
            } => Some(serde_json::json!({
                "task_id": task_id,
                "user_id": user_id,
                "entry_id": entry_id,
            })),
            Error::NoOpenTimer { task_id, user_id } => Some(serde_json::json!({
                "task_id": task_id,
                "user_id": user_id,
            })),
            Error::NotInitialized(path) | Error::LockFailed(path) => Some(serde_json::json!({
                "path": path.display().to_string(),
            })),
            Error::InvalidConfig(message)
            | Error::Validation(message)
            | Error::NotFound(message)
            | Error::Conflict(message) => Some(serde_json::json!({ "message": message })),
            _ => None,
        }
    }
}

/// Result type alias for tally operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    pub kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            kind: err.kind(),
            details: err.details(),
        }
    }
}
