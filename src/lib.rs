//! tally - task time tracking library
//!
//! This library provides the core of the tally CLI: per-user timers on
//! tasks, manually logged time, and duration reports.
//!
//! # Core Concepts
//!
//! - **Time entries**: one timed interval or manual duration of a user on a task
//! - **Timers**: at most one running entry per (task, user) pair
//! - **Reports**: monthly totals, per-task totals and the longest entries
//! - **Tasks**: titled, assignable work items with comments
//! - **Notifications**: JSONL messages about task activity
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `.tally.toml`
//! - `error`: Error types and result aliases
//! - `duration`: Non-negative elapsed time
//! - `entry`: Time entry records and filters
//! - `repository`: Entry repository and transactional stores
//! - `timer`: Timer state machine
//! - `aggregate`: Duration aggregation
//! - `ops`: Operation set executed by transports
//! - `task`: Tasks and comments
//! - `notify`: Notification building and delivery
//! - `user`: User identity resolution
//! - `storage`: File storage and directory management
//! - `lock`: File locking and atomic writes for concurrency safety

pub mod aggregate;
pub mod attachment;
pub mod cli;
pub mod config;
pub mod duration;
pub mod entry;
pub mod error;
pub mod lock;
pub mod notify;
pub mod ops;
pub mod output;
pub mod repository;
pub mod storage;
pub mod task;
pub mod timer;
pub mod user;

pub use error::{Error, Result};
