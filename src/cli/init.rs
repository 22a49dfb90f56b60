//! tally init command implementation
//!
//! Creates the `.tally/` data directory and a default `.tally.toml`.

use std::path::{Path, PathBuf};

use super::context::resolve_root;
use super::Globals;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::storage::{Storage, CONFIG_FILE, DATA_DIR};

#[derive(serde::Serialize)]
struct InitReport {
    root: PathBuf,
    created: InitCreated,
}

#[derive(serde::Serialize)]
struct InitCreated {
    config: bool,
    data_dir: bool,
}

pub fn run(globals: &Globals) -> Result<()> {
    let root = resolve_root(globals)?;
    if !root.is_dir() {
        return Err(Error::Validation(format!(
            "not a directory: {}",
            root.display()
        )));
    }

    let storage = Storage::new(root.clone());
    let data_path = storage.data_dir();
    if data_path.exists() && !data_path.is_dir() {
        return Err(Error::OperationFailed(format!(
            "{DATA_DIR} exists but is not a directory: {}",
            data_path.display()
        )));
    }
    let created_data_dir = storage.init()?;
    let created_config = ensure_config(&root)?;

    let report = InitReport {
        root: root.clone(),
        created: InitCreated {
            config: created_config,
            data_dir: created_data_dir,
        },
    };

    let mut created_items = Vec::new();
    if created_config {
        created_items.push(CONFIG_FILE.to_string());
    }
    if created_data_dir {
        created_items.push(format!("{DATA_DIR}/"));
    }

    let header = if created_items.is_empty() {
        "tally init: nothing to do"
    } else {
        "tally init: initialized"
    };

    let mut human = HumanOutput::new(header);
    human.field("root", root.display().to_string());
    human.field(
        "created",
        if created_items.is_empty() {
            "none".to_string()
        } else {
            created_items.join(", ")
        },
    );
    human.suggest("tally user set <name>");
    human.suggest("tally task new \"<title>\"");

    emit_success(
        OutputOptions {
            json: globals.json,
            quiet: globals.quiet,
        },
        "init",
        &report,
        Some(&human),
    )
}

fn ensure_config(root: &Path) -> Result<bool> {
    let config_path = root.join(CONFIG_FILE);
    if config_path.exists() {
        if !config_path.is_file() {
            return Err(Error::OperationFailed(format!(
                "{CONFIG_FILE} exists but is not a file: {}",
                config_path.display()
            )));
        }
        return Ok(false);
    }

    Config::default().save(&config_path)?;
    Ok(true)
}
