/// Structured logging for the failure-checking service
///
/// Provides context-rich logging tagged with the pipeline stage and, where
/// relevant, the assembly serial number. Events go through `tracing`;
/// console output is written to stderr so stdout stays reserved for the
/// JSON report. An optional log file receives the same events.

use serde::Deserialize;
use std::fmt;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::ingest::extract::MIN_COLUMNS;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    #[serde(alias = "warning")]
    Warn,
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline Stages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extract,
    Group,
    Rules,
    Report,
    System,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Extract => write!(f, "EXTRACT"),
            Stage::Group => write!(f, "GROUP"),
            Stage::Rules => write!(f, "RULES"),
            Stage::Report => write!(f, "REPORT"),
            Stage::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Installs the global subscriber.
///
/// `RUST_LOG` overrides `min_level` when set. With a `log_file` events are
/// appended there without ANSI colors; otherwise they go to stderr, with or
/// without timestamps. Calling this twice keeps the first subscriber.
pub fn init_logger(
    min_level: LogLevel,
    log_file: Option<&Path>,
    console_timestamps: bool,
) -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(min_level.as_filter()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    // An already installed subscriber is not an error for us.
    let _ = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
        }
        None if console_timestamps => builder.with_writer(std::io::stderr).try_init(),
        None => builder
            .without_time()
            .with_writer(std::io::stderr)
            .try_init(),
    };
    Ok(())
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Log a general informational message
pub fn info(stage: Stage, serial: Option<&str>, message: &str) {
    tracing::info!(stage = %stage, serial = serial.unwrap_or("-"), "{}", message);
}

/// Log a warning message
pub fn warn(stage: Stage, serial: Option<&str>, message: &str) {
    tracing::warn!(stage = %stage, serial = serial.unwrap_or("-"), "{}", message);
}

/// Log an error message
pub fn error(stage: Stage, serial: Option<&str>, message: &str) {
    tracing::error!(stage = %stage, serial = serial.unwrap_or("-"), "{}", message);
}

/// Log a debug message
pub fn debug(stage: Stage, serial: Option<&str>, message: &str) {
    tracing::debug!(stage = %stage, serial = serial.unwrap_or("-"), "{}", message);
}

// ---------------------------------------------------------------------------
// Run Summary Logging
// ---------------------------------------------------------------------------

/// Level a run summary should be logged at.
pub fn summary_level(units_in_error: usize, quarantined: usize) -> LogLevel {
    if quarantined > 0 {
        LogLevel::Error
    } else if units_in_error > 0 {
        LogLevel::Warn
    } else {
        LogLevel::Info
    }
}

/// Log the outcome of one analysis run.
pub fn log_run_summary(readings: usize, units_in_error: usize, quarantined: usize, recommendations: usize) {
    let message = format!(
        "Analysis complete: {} readings, {} units in error ({} quarantined), {} recommendations",
        readings, units_in_error, quarantined, recommendations
    );

    match summary_level(units_in_error, quarantined) {
        LogLevel::Error => error(Stage::Rules, None, &message),
        LogLevel::Warn => warn(Stage::Rules, None, &message),
        _ => info(Stage::Rules, None, &message),
    }
}

/// Log rows the extractor had to skip, if any.
pub fn log_skipped_rows(blank_rows: usize, short_rows: usize) {
    if short_rows > 0 {
        warn(
            Stage::Extract,
            None,
            &format!(
                "Skipped {} rows with fewer than {} columns",
                short_rows, MIN_COLUMNS
            ),
        );
    }
    if blank_rows > 0 {
        debug(Stage::Extract, None, &format!("Skipped {} blank rows", blank_rows));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn test_summary_level_escalates_with_severity() {
        assert_eq!(summary_level(0, 0), LogLevel::Info);
        assert_eq!(summary_level(3, 0), LogLevel::Warn);
        assert_eq!(summary_level(3, 1), LogLevel::Error);
    }

    #[test]
    fn test_level_filters_are_tracing_directives() {
        assert_eq!(LogLevel::Warn.as_filter(), "warn");
        assert_eq!(LogLevel::Debug.to_string(), "DEBUG");
    }

    #[test]
    fn test_logging_without_subscriber_is_harmless() {
        info(Stage::System, Some("SN-1"), "no subscriber installed");
        log_run_summary(0, 0, 0, 0);
        log_skipped_rows(1, 1);
    }
}
