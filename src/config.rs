//! Service configuration.
//!
//! All settings are optional. Defaults reproduce the fixed rule constants of
//! the failure checker (96 units, severe value 190 under a 0/1 limit pair in
//! loops 0..=3, a 10-unit fail margin), so running without a file gives the
//! standard analysis.
//!
//! The file is TOML and is located through the `HHBI_CONFIG` environment
//! variable; a `.env` file in the working directory is honored.

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::logging::LogLevel;
use crate::model::AnalysisError;
use crate::units::UNIT_COUNT;

/// Environment variable naming the TOML configuration file.
pub const CONFIG_ENV_VAR: &str = "HHBI_CONFIG";

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub analysis: AnalysisConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}

/// Rule engine parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Units are addressed as `1..=unit_count`.
    pub unit_count: u32,
    /// A severe candidate reads strictly above this value...
    pub severe_value_threshold: f64,
    /// ...under exactly this limit pair.
    pub severe_lower_limit: f64,
    pub severe_upper_limit: f64,
    /// Loops that must all contain a severe candidate for the group to count.
    pub severe_loops: Vec<u32>,
    /// Out-of-range readings within this distance of a limit are unit fails.
    pub unit_fail_margin: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            unit_count: UNIT_COUNT,
            severe_value_threshold: 190.0,
            severe_lower_limit: 0.0,
            severe_upper_limit: 1.0,
            severe_loops: vec![0, 1, 2, 3],
            unit_fail_margin: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Raw table rows rendered before the truncation notice.
    pub row_limit: usize,
    /// Distinct messages listed in a unit tooltip before the "more" line.
    pub tooltip_max_messages: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            row_limit: 1000,
            tooltip_max_messages: 7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub file: Option<PathBuf>,
    pub console_timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            file: None,
            console_timestamps: true,
        }
    }
}

impl ServiceConfig {
    /// Rejects settings the engine cannot work with.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let a = &self.analysis;
        if a.unit_count == 0 {
            return Err(AnalysisError::Config("analysis.unit_count must be at least 1".into()));
        }
        if a.severe_loops.is_empty() {
            return Err(AnalysisError::Config("analysis.severe_loops must not be empty".into()));
        }
        if a.unit_fail_margin.is_nan() || a.unit_fail_margin < 0.0 {
            return Err(AnalysisError::Config(format!(
                "analysis.unit_fail_margin must be a non-negative number, got {}",
                a.unit_fail_margin
            )));
        }
        if a.severe_value_threshold.is_nan()
            || a.severe_lower_limit.is_nan()
            || a.severe_upper_limit.is_nan()
        {
            return Err(AnalysisError::Config("severe rule values must be numbers".into()));
        }
        if self.display.tooltip_max_messages == 0 {
            return Err(AnalysisError::Config(
                "display.tooltip_max_messages must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Parses configuration from TOML text.
pub fn parse_config(text: &str) -> Result<ServiceConfig, AnalysisError> {
    let config: ServiceConfig =
        toml::from_str(text).map_err(|e| AnalysisError::Config(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

/// Loads and validates a TOML configuration file.
pub fn load_config(path: &Path) -> Result<ServiceConfig, AnalysisError> {
    let text = fs::read_to_string(path).map_err(|e| {
        AnalysisError::Config(format!("cannot read {}: {}", path.display(), e))
    })?;
    parse_config(&text)
}

/// Path named by `HHBI_CONFIG`, after loading `.env` if present.
pub fn config_path_from_env() -> Option<PathBuf> {
    dotenv::dotenv().ok();
    env::var_os(CONFIG_ENV_VAR).map(PathBuf::from)
}

/// A validated configuration and the file it came from, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub config: ServiceConfig,
    pub source: Option<PathBuf>,
}

/// Loads `path`, or the defaults when there is none.
pub fn load_from(path: Option<PathBuf>) -> Result<LoadedConfig, AnalysisError> {
    let config = match &path {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    Ok(LoadedConfig {
        config,
        source: path,
    })
}

/// Loads the configuration named by `HHBI_CONFIG`, or the defaults when the
/// variable is unset.
pub fn load_from_env() -> Result<LoadedConfig, AnalysisError> {
    load_from(config_path_from_env())
}
