//! Per-reading limit checks.
//!
//! Each check looks at one history entry in isolation, using the limit pair
//! recorded with that entry. Cross-entry aggregation (the severe loop rule)
//! lives in `alert::priority`.
//!
//! NaN values or limits fail every comparison, so such entries are never
//! classified as failing.

use std::fmt;

use crate::config::AnalysisConfig;
use crate::model::HistoryEntry;

/// Direction of a bounded limit breach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitBreach {
    Over,
    Under,
}

impl fmt::Display for LimitBreach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitBreach::Over => write!(f, "over"),
            LimitBreach::Under => write!(f, "under"),
        }
    }
}

/// Display flag for a raw reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueFlag {
    High,
    Low,
    Normal,
}

/// Returns `true` if the entry reads above the severe threshold under the
/// exact severe limit pair (0/1 by default).
pub fn is_severe_candidate(entry: &HistoryEntry, config: &AnalysisConfig) -> bool {
    entry.lower_limit == config.severe_lower_limit
        && entry.upper_limit == config.severe_upper_limit
        && entry.value > config.severe_value_threshold
}

/// Checks an entry against its own limits for the unit-level rule.
///
/// Only breaches within `unit_fail_margin` of the violated limit count
/// (both ends inclusive of the margin). Readings further out, in-range
/// readings and severe candidates return `None`.
pub fn check_unit_limits(entry: &HistoryEntry, config: &AnalysisConfig) -> Option<LimitBreach> {
    if is_severe_candidate(entry, config) {
        return None;
    }
    let margin = config.unit_fail_margin;
    let value = entry.value;

    if value > entry.upper_limit && value <= entry.upper_limit + margin {
        Some(LimitBreach::Over)
    } else if value < entry.lower_limit && value >= entry.lower_limit - margin {
        Some(LimitBreach::Under)
    } else {
        None
    }
}

/// Flags a raw reading for the data table: any amount above the upper limit
/// is `High`, any amount below the lower limit is `Low`.
pub fn value_flag(value: f64, lower_limit: f64, upper_limit: f64) -> ValueFlag {
    if value > upper_limit {
        ValueFlag::High
    } else if value < lower_limit {
        ValueFlag::Low
    } else {
        ValueFlag::Normal
    }
}
