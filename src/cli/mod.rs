//! Command-line interface for tally
//!
//! This module defines the CLI structure using clap derive macros.
//! Each command group is implemented in its own submodule.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::error::Result;

mod attach;
mod context;
mod init;
mod report;
mod task;
mod timer;
mod user;

/// tally - task time tracking
///
/// Start and stop timers on tasks, log time manually, and report how the
/// time was spent.
#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding `.tally/` (defaults to current directory)
    #[arg(long, global = true, env = "TALLY_DIR")]
    pub dir: Option<PathBuf>,

    /// User id to act as
    #[arg(long, global = true, env = "TALLY_USER")]
    pub user: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize tally in the current directory
    Init,

    /// Start, stop and inspect timers
    #[command(subcommand)]
    Timer(TimerCommands),

    /// Log time manually and list entries
    #[command(subcommand)]
    Log(LogCommands),

    /// Duration reports
    #[command(subcommand)]
    Report(ReportCommands),

    /// Task management
    #[command(subcommand)]
    Task(TaskCommands),

    /// Task comments
    #[command(subcommand)]
    Comment(CommentCommands),

    /// Files attached to tasks
    #[command(subcommand)]
    Attach(AttachCommands),

    /// User identity
    #[command(subcommand)]
    User(UserCommands),

    /// Send the time-logging reminder to assignees of incomplete tasks
    Remind,
}

/// Timer subcommands
#[derive(Subcommand, Debug)]
pub enum TimerCommands {
    /// Start a timer on a task
    Start {
        /// Task ID
        task: String,

        /// Start time (RFC3339) instead of now
        #[arg(long)]
        at: Option<String>,
    },

    /// Stop the running timer on a task
    Stop {
        /// Task ID
        task: String,

        /// Stop time (RFC3339) instead of now
        #[arg(long)]
        at: Option<String>,
    },

    /// Show running timers
    Status,
}

/// Log subcommands
#[derive(Subcommand, Debug)]
pub enum LogCommands {
    /// Log time spent on a task
    Add {
        /// Task ID
        task: String,

        /// Minutes spent
        #[arg(long, allow_negative_numbers = true)]
        minutes: i64,

        /// When the work started (RFC3339, defaults to now)
        #[arg(long)]
        started_at: Option<String>,
    },

    /// List time entries
    List {
        /// Only entries of this task
        #[arg(long)]
        task: Option<String>,

        /// Only entries of this user
        #[arg(long = "for")]
        for_user: Option<String>,
    },
}

/// Report subcommands
#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Total time logged in a month
    Month {
        /// Month number 1-12 (defaults to the current month)
        #[arg(long)]
        month: Option<u32>,

        /// Restrict to one year
        #[arg(long)]
        year: Option<i32>,
    },

    /// Longest finished entries
    Recent {
        /// Number of entries (defaults to reports.recent_limit)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Total time per task
    Tasks,
}

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a task assigned to you
    New {
        /// Task title
        title: String,

        /// Longer description
        #[arg(long)]
        description: Option<String>,

        /// Project name
        #[arg(long)]
        project: Option<String>,
    },

    /// List tasks
    List {
        /// Only tasks assigned to you
        #[arg(long)]
        mine: bool,

        /// Only completed tasks
        #[arg(long, conflicts_with = "open")]
        completed: bool,

        /// Only incomplete tasks
        #[arg(long)]
        open: bool,

        /// Title substring
        #[arg(long)]
        search: Option<String>,

        /// Project name
        #[arg(long)]
        project: Option<String>,
    },

    /// Show a task with its time entries
    Show {
        /// Task ID
        id: String,
    },

    /// Mark a task completed
    Done {
        /// Task ID
        id: String,
    },

    /// Mark a completed task as not completed
    Reopen {
        /// Task ID
        id: String,
    },

    /// Assign a task to a user
    Assign {
        /// Task ID
        id: String,

        /// Assignee user id
        assignee: String,
    },
}

/// Comment subcommands
#[derive(Subcommand, Debug)]
pub enum CommentCommands {
    /// Comment on a task
    Add {
        /// Task ID
        task: String,

        /// Comment text
        text: String,
    },

    /// List comments on a task
    List {
        /// Task ID
        task: String,
    },
}

/// Attachment subcommands
#[derive(Subcommand, Debug)]
pub enum AttachCommands {
    /// Copy a file into tally and attach it to a task
    Add {
        /// Task ID
        task: String,

        /// File to attach
        path: PathBuf,
    },

    /// List files attached to a task
    List {
        /// Task ID
        task: String,
    },
}

/// User subcommands
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Persist the user id for this directory
    Set {
        /// User id
        name: String,
    },

    /// Show the current user id
    Show,
}

/// Flags shared by every command.
#[derive(Debug, Clone)]
pub struct Globals {
    pub dir: Option<PathBuf>,
    pub user: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let globals = Globals {
            dir: self.dir,
            user: self.user,
            json: self.json,
            quiet: self.quiet,
        };

        match self.command {
            Commands::Init => init::run(&globals),
            Commands::Timer(cmd) => match cmd {
                TimerCommands::Start { task, at } => {
                    timer::run_start(timer::TimerOptions { task, at }, &globals)
                }
                TimerCommands::Stop { task, at } => {
                    timer::run_stop(timer::TimerOptions { task, at }, &globals)
                }
                TimerCommands::Status => timer::run_status(&globals),
            },
            Commands::Log(cmd) => match cmd {
                LogCommands::Add {
                    task,
                    minutes,
                    started_at,
                } => timer::run_log_add(
                    timer::LogAddOptions {
                        task,
                        minutes,
                        started_at,
                    },
                    &globals,
                ),
                LogCommands::List { task, for_user } => {
                    timer::run_log_list(timer::LogListOptions { task, for_user }, &globals)
                }
            },
            Commands::Report(cmd) => match cmd {
                ReportCommands::Month { month, year } => {
                    report::run_month(report::MonthOptions { month, year }, &globals)
                }
                ReportCommands::Recent { limit } => report::run_recent(limit, &globals),
                ReportCommands::Tasks => report::run_tasks(&globals),
            },
            Commands::Task(cmd) => match cmd {
                TaskCommands::New {
                    title,
                    description,
                    project,
                } => task::run_new(
                    task::NewOptions {
                        title,
                        description,
                        project,
                    },
                    &globals,
                ),
                TaskCommands::List {
                    mine,
                    completed,
                    open,
                    search,
                    project,
                } => task::run_list(
                    task::ListOptions {
                        mine,
                        completed,
                        open,
                        search,
                        project,
                    },
                    &globals,
                ),
                TaskCommands::Show { id } => task::run_show(&id, &globals),
                TaskCommands::Done { id } => task::run_set_completed(&id, true, &globals),
                TaskCommands::Reopen { id } => task::run_set_completed(&id, false, &globals),
                TaskCommands::Assign { id, assignee } => {
                    task::run_assign(&id, &assignee, &globals)
                }
            },
            Commands::Comment(cmd) => match cmd {
                CommentCommands::Add { task, text } => {
                    task::run_comment_add(&task, &text, &globals)
                }
                CommentCommands::List { task } => task::run_comment_list(&task, &globals),
            },
            Commands::Attach(cmd) => match cmd {
                AttachCommands::Add { task, path } => attach::run_add(&task, &path, &globals),
                AttachCommands::List { task } => attach::run_list(&task, &globals),
            },
            Commands::User(cmd) => match cmd {
                UserCommands::Set { name } => user::run_set(&name, &globals),
                UserCommands::Show => user::run_show(&globals),
            },
            Commands::Remind => task::run_remind(&globals),
        }
    }
}
