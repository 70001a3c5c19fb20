//! Process-wide logging for `dbx_demo`.
//!
//! Every package logs through the [`log`] facade. [`init`] bridges those
//! records into a `tracing` subscriber that writes to the console and,
//! when a filename is given, to a daily-rotating log file that keeps the
//! last [`RETAINED_LOG_FILES`] days.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{self, Rotation},
};
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt as _};

pub use log;

#[cfg(feature = "macros")]
mod macros;

/// Number of daily log files kept before the oldest is removed.
pub const RETAINED_LOG_FILES: usize = 7;

#[cfg(debug_assertions)]
const DEFAULT_LOG_LEVEL: &str = "dbx_demo=debug";
#[cfg(not(debug_assertions))]
const DEFAULT_LOG_LEVEL: &str = "dbx_demo=info";

/// Errors that can occur while installing the global logger.
#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    Filter(#[from] tracing_subscriber::filter::ParseError),
    #[error(transparent)]
    RollingFile(#[from] rolling::InitError),
    #[error(transparent)]
    SetGlobalDefault(#[from] tracing::subscriber::SetGlobalDefaultError),
    #[error(transparent)]
    SetLogger(#[from] log::SetLoggerError),
}

/// Keeps the background file writer alive. Buffered lines are flushed when
/// this is dropped, so hold it until the process is about to exit.
#[must_use = "dropping the guard stops the file writer"]
pub struct LoggingGuard {
    _file_writer: Option<WorkerGuard>,
}

/// Directory the log files go into: `DBX_DEMO_LOG_DIR`, falling back to
/// `~/.local/dbx_demo/logs`.
#[must_use]
pub fn default_log_dir() -> Option<PathBuf> {
    dbx_demo_env::var_opt("DBX_DEMO_LOG_DIR").map_or_else(
        || home::home_dir().map(|home| home.join(".local").join("dbx_demo").join("logs")),
        |dir| Some(PathBuf::from(dir)),
    )
}

fn env_filter_directives() -> String {
    dbx_demo_env::var_opt("DBX_DEMO_LOG")
        .or_else(|| dbx_demo_env::var_opt("RUST_LOG"))
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
}

fn rolling_file_appender(
    log_dir: &Path,
    filename: &str,
) -> Result<rolling::RollingFileAppender, rolling::InitError> {
    rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .filename_prefix(filename)
        .max_log_files(RETAINED_LOG_FILES)
        .build(log_dir)
}

/// Installs the global logger.
///
/// `filename` enables the rotating file output; `log_dir` overrides
/// [`default_log_dir`].
///
/// # Errors
///
/// * If the log filter directives are invalid
/// * If the log file directory cannot be created
/// * If a global logger was already installed
pub fn init(filename: Option<&str>, log_dir: Option<&Path>) -> Result<LoggingGuard, InitError> {
    let filter = EnvFilter::try_new(env_filter_directives())?;

    let console = fmt::layer().with_writer(std::io::stderr);

    let mut file_writer = None;
    let file = if let Some(filename) = filename {
        let log_dir = log_dir.map(Path::to_path_buf).or_else(default_log_dir);

        if let Some(log_dir) = log_dir {
            let appender = rolling_file_appender(&log_dir, filename)?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            file_writer = Some(guard);

            Some(fmt::layer().with_ansi(false).with_writer(writer))
        } else {
            eprintln!("Could not resolve a log directory, logging to the console only");
            None
        }
    } else {
        None
    };

    let subscriber = Registry::default().with(filter).with(console).with(file);

    tracing::subscriber::set_global_default(subscriber)?;
    tracing_log::LogTracer::init()?;

    Ok(LoggingGuard {
        _file_writer: file_writer,
    })
}
