//! Per-run log file

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local};
use tracing_subscriber::EnvFilter;

/// `neo4j-sync_<YYYY-MM-DD_HH-MM-SS>.log`
#[must_use]
pub fn log_file_name(started: DateTime<Local>) -> String {
    format!("neo4j-sync_{}.log", started.format("%Y-%m-%d_%H-%M-%S"))
}

/// Create `directory` if needed and open this run's log file for appending
pub fn open_run_log(directory: &Path, started: DateTime<Local>) -> Result<(PathBuf, fs::File)> {
    fs::create_dir_all(directory)
        .with_context(|| format!("Failed to create log directory {}", directory.display()))?;
    let path = directory.join(log_file_name(started));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;
    Ok((path, file))
}

/// Route all tracing output of this process to a fresh run log
///
/// `RUST_LOG` takes precedence over `level`.
pub fn init_run_log(directory: &Path, level: &str) -> Result<PathBuf> {
    let (path, file) = open_run_log(directory, Local::now())?;
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).with_context(|| format!("Invalid log level {level}"))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| anyhow!("Logging already initialized: {e}"))?;
    Ok(path)
}
