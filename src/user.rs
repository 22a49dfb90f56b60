//! User identity resolution.
//!
//! Resolution order:
//! 1) CLI --user (explicit)
//! 2) TALLY_USER environment variable
//! 3) Persisted value in .tally/user
//! 4) Config default (user.default)

use crate::config::Config;
use crate::error::{Error, Result};
use crate::storage::Storage;

pub const USER_ENV: &str = "TALLY_USER";

/// Resolve the current user id.
pub fn resolve_user(storage: &Storage, config: &Config, cli_user: Option<&str>) -> String {
    if let Some(user) = non_empty(cli_user) {
        return user.to_string();
    }

    if let Ok(env_user) = std::env::var(USER_ENV) {
        if let Some(user) = non_empty(Some(env_user.as_str())) {
            return user.to_string();
        }
    }

    if let Some(user) = storage.read_user() {
        return user;
    }

    config.user.default.clone()
}

/// Persist the user id in `.tally/user`.
pub fn persist_user(storage: &Storage, user: &str) -> Result<String> {
    let user = non_empty(Some(user))
        .ok_or_else(|| Error::Validation("user id cannot be empty".to_string()))?;
    storage.write_user(user)?;
    Ok(user.to_string())
}

fn non_empty(input: Option<&str>) -> Option<&str> {
    input.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}
