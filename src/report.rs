//! Analysis report
//!
//! Serializable snapshot of one run: what the grid, tooltip, recommendation
//! list and raw table need, plus summary counts. The binary prints it as
//! JSON.

use chrono::Utc;
use serde::Serialize;

use crate::AnalysisRun;
use crate::config::ServiceConfig;
use crate::display::{TableView, TooltipSummary, build_table_view, tooltip_summary};
use crate::logging::{self, Stage};
use crate::model::{IssueDetail, UnitHealth};

// ============================================================================
// Report Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub timestamp: String,
    pub source: String,
    pub summary: ReportSummary,
    pub recommendations: Vec<String>,
    pub units: Vec<UnitReport>,
    pub table: TableView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub readings: usize,
    pub sensor_groups: usize,
    pub skipped_rows: usize,
    pub units_total: usize,
    pub units_in_error: usize,
    pub quarantined_units: usize,
    pub unit_issue_units: usize,
    pub recommendations: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnitReport {
    pub unit_id: u32,
    pub status: UnitHealth,
    pub details: Vec<IssueDetail>,
    pub tooltip: TooltipSummary,
}

// ============================================================================
// Building
// ============================================================================

pub fn build_report(source: &str, run: &AnalysisRun, config: &ServiceConfig) -> AnalysisReport {
    let result = &run.result;
    let units: Vec<UnitReport> = result
        .unit_statuses
        .iter()
        .map(|(unit_id, status)| UnitReport {
            unit_id: *unit_id,
            status: status.status,
            details: status.details.clone(),
            tooltip: tooltip_summary(*unit_id, status, config.display.tooltip_max_messages),
        })
        .collect();

    let summary = ReportSummary {
        readings: run.readings.len(),
        sensor_groups: run.groups.len(),
        skipped_rows: run.short_rows,
        units_total: units.len(),
        units_in_error: result.units_in_error().count(),
        quarantined_units: result.quarantined_units.len(),
        unit_issue_units: result.unit_issues.len(),
        recommendations: result.recommendations.len(),
    };

    let table = build_table_view(&run.readings, config.display.row_limit);
    if let Some(notice) = &table.truncated_notice {
        logging::debug(Stage::Report, None, notice);
    }

    AnalysisReport {
        timestamp: Utc::now().to_rfc3339(),
        source: source.to_string(),
        summary,
        recommendations: result.recommendations.messages(),
        units,
        table,
    }
}

/// Human-readable summary block for the console.
pub fn render_summary(report: &AnalysisReport) -> String {
    let s = &report.summary;
    let mut out = String::new();
    out.push_str(&format!("Analysis of {}\n", report.source));
    out.push_str(&format!(
        "Readings: {} in {} sensor groups ({} rows skipped)\n",
        s.readings, s.sensor_groups, s.skipped_rows
    ));
    out.push_str(&format!(
        "Units in error: {}/{} ({} quarantined)\n",
        s.units_in_error, s.units_total, s.quarantined_units
    ));
    if report.recommendations.is_empty() {
        out.push_str("No recommendations\n");
    } else {
        out.push_str("Recommendations:\n");
        for recommendation in &report.recommendations {
            out.push_str(&format!("  - {}\n", recommendation));
        }
    }
    out
}
