//! Failure checking for the unit grid of a sensor tester.
//!
//! Pipeline: CSV text → `ingest::extract` (sorted readings) →
//! `analysis::groupings` (per-sensor histories) → `alert::priority`
//! (unit statuses and recommendations). Every run starts from scratch;
//! nothing is kept between files.

pub mod alert;
pub mod analysis;
pub mod config;
pub mod display;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod report;
pub mod units;

use crate::analysis::groupings::{entry_count, group_by_sensor};
use crate::config::AnalysisConfig;
use crate::logging::Stage;
use crate::model::{AnalysisResult, Reading, SensorGroups};

/// Everything produced by one analysis of one file.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRun {
    /// Extracted readings, sorted by serial number then loop.
    pub readings: Vec<Reading>,
    pub groups: SensorGroups,
    pub result: AnalysisResult,
    pub blank_rows: usize,
    pub short_rows: usize,
}

/// Extracts, groups and evaluates the full text of one export file.
pub fn run_analysis(text: &str, config: &AnalysisConfig) -> AnalysisRun {
    let extracted = ingest::extract::extract_readings(text);
    logging::log_skipped_rows(extracted.blank_rows, extracted.short_rows);
    logging::info(
        Stage::Extract,
        None,
        &format!("Extracted {} readings", extracted.readings.len()),
    );

    let groups = group_by_sensor(&extracted.readings);
    logging::debug(
        Stage::Group,
        None,
        &format!("Built {} sensor groups from {} entries", groups.len(), entry_count(&groups)),
    );

    let result = alert::priority::evaluate(&groups, config);
    logging::log_run_summary(
        extracted.readings.len(),
        result.units_in_error().count(),
        result.quarantined_units.len(),
        result.recommendations.len(),
    );

    AnalysisRun {
        readings: extracted.readings,
        groups,
        result,
        blank_rows: extracted.blank_rows,
        short_rows: extracted.short_rows,
    }
}
