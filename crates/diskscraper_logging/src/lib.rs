//! Logging setup for the diskscraper binary.
//!
//! Everything goes through `tracing`. Two layers are installed: an append-only
//! log file in the working directory (`error.log` by default, the same file a
//! scrape run later queries during category discovery) and a console layer on
//! stderr. The log file is a single file that grows across runs; it is never
//! rotated, so the scraper only has one path to keep out of its walk.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "diskscraper=info,diskscraper_logging=info";
const VERBOSE_LOG_FILTER: &str = "diskscraper=debug,diskscraper_logging=debug";

/// Default log file stem; the file on disk is `error.log`.
pub const DEFAULT_LOG_NAME: &str = "error";

/// Logging configuration for one process.
pub struct LogConfig<'a> {
    /// Stem of the log file (`<name>.log`)
    pub name: &'a str,
    /// Directory that receives the log file
    pub dir: PathBuf,
    /// Mirror debug events to stderr
    pub verbose: bool,
    /// Only warnings and errors reach stderr (used when stdout carries JSON)
    pub quiet_console: bool,
}

impl<'a> LogConfig<'a> {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            name: DEFAULT_LOG_NAME,
            dir: dir.into(),
            verbose: false,
            quiet_console: false,
        }
    }

    fn log_file(&self) -> PathBuf {
        self.dir.join(format!("{}.log", self.name))
    }
}

/// Handle to the process log, returned by [`init_logging`].
///
/// The log file is guaranteed to exist once the handle is returned.
#[derive(Debug, Clone)]
pub struct LogHandle {
    log_file: PathBuf,
}

impl LogHandle {
    pub fn log_file(&self) -> &Path {
        &self.log_file
    }
}

/// Open (creating if needed) the log file at `path` for appending.
pub fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global tracing subscriber and open the log file.
pub fn init_logging(config: LogConfig<'_>) -> Result<LogHandle> {
    let log_file = config.log_file();
    let file = open_log_file(&log_file)
        .with_context(|| format!("Failed to open log file {}", log_file.display()))?;

    let file_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let console_filter = if config.verbose {
        EnvFilter::new(VERBOSE_LOG_FILTER)
    } else if config.quiet_console {
        EnvFilter::new("warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .with_filter(console_filter),
        )
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    tracing::debug!(log_file = %log_file.display(), "Logging initialised");
    Ok(LogHandle { log_file })
}
