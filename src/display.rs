//! View models for the rendering layer.
//!
//! The grid, tooltip and raw data table are drawn elsewhere; this module
//! only prepares what they show. Nothing here feeds back into analysis:
//! the row cap limits the table, never the rule engine.

use serde::Serialize;

use crate::alert::thresholds::{ValueFlag, value_flag};
use crate::model::{Reading, UnitHealth, UnitStatus};

// ---------------------------------------------------------------------------
// Tooltip
// ---------------------------------------------------------------------------

/// Contents of the per-unit detail tooltip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TooltipSummary {
    pub unit_id: u32,
    pub headline: String,
    /// Distinct detail messages, first-seen order, at most the configured
    /// maximum.
    pub messages: Vec<String>,
    /// Distinct messages left out of `messages`.
    pub more_count: usize,
}

impl TooltipSummary {
    /// The closing "...and N more..." line, if anything was left out.
    pub fn more_line(&self) -> Option<String> {
        (self.more_count > 0).then(|| format!("...and {} more...", self.more_count))
    }
}

/// Builds the tooltip for one unit. Messages are deduplicated before the
/// `max_messages` cut so repeats never crowd out distinct issues.
pub fn tooltip_summary(unit_id: u32, status: &UnitStatus, max_messages: usize) -> TooltipSummary {
    if status.status == UnitHealth::Ok {
        return TooltipSummary {
            unit_id,
            headline: format!("Unit {} : Normal", unit_id),
            messages: vec!["No issues detected".to_string()],
            more_count: 0,
        };
    }

    let distinct = status.distinct_messages();
    let more_count = distinct.len().saturating_sub(max_messages);
    TooltipSummary {
        unit_id,
        headline: format!("Unit {} : Issues Found", unit_id),
        messages: distinct
            .into_iter()
            .take(max_messages)
            .map(str::to_string)
            .collect(),
        more_count,
    }
}

// ---------------------------------------------------------------------------
// Raw data table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub serial_number: String,
    /// Set on the first row of each run of equal serial numbers: how many
    /// displayed rows the serial cell spans. `None` on the rows it covers.
    pub serial_row_span: Option<usize>,
    pub loop_index: u32,
    pub label: String,
    pub upper_limit: f64,
    pub lower_limit: f64,
    pub value: f64,
    pub flag: ValueFlag,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    pub rows: Vec<TableRow>,
    pub total_readings: usize,
    pub truncated_notice: Option<String>,
}

/// Lays out the sorted readings for the raw data table, showing at most
/// `row_limit` rows.
pub fn build_table_view(readings: &[Reading], row_limit: usize) -> TableView {
    let shown = &readings[..readings.len().min(row_limit)];
    let mut rows = Vec::with_capacity(shown.len());

    for (i, reading) in shown.iter().enumerate() {
        let starts_run = i == 0 || shown[i - 1].serial_number != reading.serial_number;
        let serial_row_span = starts_run.then(|| {
            shown[i..]
                .iter()
                .take_while(|r| r.serial_number == reading.serial_number)
                .count()
        });
        rows.push(TableRow {
            serial_number: reading.serial_number.clone(),
            serial_row_span,
            loop_index: reading.loop_index,
            label: reading.raw_label.clone(),
            upper_limit: reading.upper_limit,
            lower_limit: reading.lower_limit,
            value: reading.value,
            flag: value_flag(reading.value, reading.lower_limit, reading.upper_limit),
        });
    }

    TableView {
        rows,
        total_readings: readings.len(),
        truncated_notice: (readings.len() > row_limit)
            .then(|| format!("Showing only the first {} rows", row_limit)),
    }
}
