//! Session logger
//!
//! Every record goes to stdout and to the session's log file, prefixed with the seconds elapsed
//! since the session epoch and a coloured level tag. Debug and trace records also carry their
//! target module.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use log::{info, Level, Record};
use std::fmt::Arguments;
use thiserror::Error;

// Internal imports
use crate::session::{self, Session};

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("The minimum log level must include `INFO`, found `{0}`")]
    InvalidMinLogLevel(LevelFilter),

    #[error("Could not open the session log file: {0}")]
    LogFileInitError(#[from] std::io::Error),

    #[error("A logger has already been set: {0}")]
    FernInitError(#[from] log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the global logger for this session.
///
/// `min_level` must let `INFO` records through. Only the first call in a process can succeed.
pub fn logger_init(min_level: LevelFilter, session: &Session) -> Result<(), LoggerInitError> {
    check_min_level(min_level)?;

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("{}", format_record(message, record)))
        })
        .level(min_level)
        .chain(std::io::stdout())
        .chain(fern::log_file(&session.log_file_path)?)
        .apply()?;

    info!("Logging initialised");
    if let Some(epoch) = session::get_epoch() {
        info!("    Session epoch: {}", epoch);
    }
    info!("    Log level: {:?}", min_level);
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

/// Parse a log level name as found in parameter files (e.g. `"debug"`).
pub fn parse_level(level: &str) -> Option<LevelFilter> {
    level.parse().ok()
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn check_min_level(min_level: LevelFilter) -> Result<(), LoggerInitError> {
    if min_level < Level::Info {
        Err(LoggerInitError::InvalidMinLogLevel(min_level))
    } else {
        Ok(())
    }
}

fn format_record(message: &Arguments, record: &Record) -> String {
    let prefix = format!(
        "[{:10.6} {}]",
        session::get_elapsed_seconds(),
        level_tag(record.level())
    );

    if record.level() > Level::Info {
        format!("{} {}: {}", prefix, record.target(), message)
    } else {
        format!("{} {}", prefix, message)
    }
}

fn level_tag(level: Level) -> ColoredString {
    match level {
        Level::Trace => "TRC".dimmed().italic(),
        Level::Debug => "DBG".dimmed(),
        Level::Info => "INF".normal(),
        Level::Warn => "WRN".yellow(),
        Level::Error => "ERR".red().bold(),
    }
}
