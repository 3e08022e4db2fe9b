/// Reading, SensorHistory, UnitStatus, Recommendation, AnalysisError
/// core data structures and error handling
///
/// Core data types for the unit failure-checking service.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no parsing and no rule logic, only types and the small amount
/// of formatting that belongs to them (message texts).

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Reading types
// ---------------------------------------------------------------------------

/// A single measurement row extracted from the uploaded CSV export.
///
/// Limits are carried per reading: the same sensor can be tested against
/// different limit pairs from one row to the next.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub loop_index: u32,
    pub serial_number: String,
    pub raw_label: String, // column 4 as exported, kept for display
    pub unit_id: u32,
    pub channel: String,
    pub value: f64,
    pub lower_limit: f64,
    pub upper_limit: f64,
}

/// Logical sensor identity: one measurement stream of one unit within one
/// assembly.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SensorKey {
    pub serial_number: String,
    pub unit_id: u32,
    pub channel: String,
}

impl From<&Reading> for SensorKey {
    fn from(reading: &Reading) -> Self {
        SensorKey {
            serial_number: reading.serial_number.clone(),
            unit_id: reading.unit_id,
            channel: reading.channel.clone(),
        }
    }
}

/// One contributing reading inside a sensor's history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub loop_index: u32,
    pub value: f64,
    pub lower_limit: f64,
    pub upper_limit: f64,
}

impl From<&Reading> for HistoryEntry {
    fn from(reading: &Reading) -> Self {
        HistoryEntry {
            loop_index: reading.loop_index,
            value: reading.value,
            lower_limit: reading.lower_limit,
            upper_limit: reading.upper_limit,
        }
    }
}

/// All readings for one `SensorKey`, in input order.
///
/// Produced by `analysis::groupings::group_by_sensor`. Duplicate entries are
/// kept; nothing is merged away.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorHistory {
    pub key: SensorKey,
    pub history: Vec<HistoryEntry>,
}

impl SensorHistory {
    pub fn new(key: SensorKey) -> Self {
        SensorHistory {
            key,
            history: Vec::new(),
        }
    }
}

/// Grouped histories, ordered by `(serial_number, unit_id, channel)`.
pub type SensorGroups = BTreeMap<SensorKey, SensorHistory>;

// ---------------------------------------------------------------------------
// Unit status types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UnitHealth {
    #[default]
    Ok,
    Error,
}

impl fmt::Display for UnitHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitHealth::Ok => write!(f, "OK"),
            UnitHealth::Error => write!(f, "ERROR"),
        }
    }
}

/// Which rule produced an issue detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IssueKind {
    /// Every required loop of a sensor read above the severe threshold under
    /// the 0/1 limit pair: the whole assembly should be replaced.
    SevereGroupIssue,
    /// A reading fell outside its limits by no more than the fail margin:
    /// the individual unit should be replaced.
    UnitIssue,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::SevereGroupIssue => write!(f, "SevereGroupIssue"),
            IssueKind::UnitIssue => write!(f, "UnitIssue"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueDetail {
    pub kind: IssueKind,
    pub message: String,
}

impl IssueDetail {
    pub fn severe(value_threshold: f64, loop_count: usize) -> Self {
        IssueDetail {
            kind: IssueKind::SevereGroupIssue,
            message: format!(
                "[{}] Critical (value > {} in {} loops)",
                IssueKind::SevereGroupIssue,
                value_threshold,
                loop_count
            ),
        }
    }

    pub fn unit(channel: &str, loop_index: u32, value: f64) -> Self {
        IssueDetail {
            kind: IssueKind::UnitIssue,
            message: format!(
                "[{}] {} Loop {} : {}",
                IssueKind::UnitIssue,
                channel,
                loop_index,
                value
            ),
        }
    }
}

/// Per-unit outcome of one analysis run.
///
/// Starts as OK with no details and is only mutated by the rule engine.
/// `details` keeps every recorded entry, including exact repeats; display
/// code deduplicates by message.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct UnitStatus {
    pub status: UnitHealth,
    pub details: Vec<IssueDetail>,
}

impl UnitStatus {
    pub fn record(&mut self, detail: IssueDetail) {
        self.status = UnitHealth::Error;
        self.details.push(detail);
    }

    pub fn is_error(&self) -> bool {
        self.status == UnitHealth::Error
    }

    /// Distinct detail messages in first-seen order.
    pub fn distinct_messages(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.details
            .iter()
            .map(|d| d.message.as_str())
            .filter(|m| seen.insert(*m))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Recommendation types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Recommendation {
    ReplaceAssembly,
    ReplaceUnit { unit_id: u32, serial_number: String },
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::ReplaceAssembly => {
                write!(f, "[{}] Should replace assembly", IssueKind::SevereGroupIssue)
            }
            Recommendation::ReplaceUnit {
                unit_id,
                serial_number,
            } => write!(
                f,
                "[{}] Replace unit {} -> SN: {}",
                IssueKind::UnitIssue,
                unit_id,
                serial_number
            ),
        }
    }
}

/// Insertion-ordered set of recommendations, unique by rendered message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecommendationSet {
    items: Vec<Recommendation>,
    messages: HashSet<String>,
}

impl RecommendationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `recommendation` unless an identical message is already present.
    /// Returns `true` if it was added.
    pub fn insert(&mut self, recommendation: Recommendation) -> bool {
        if !self.messages.insert(recommendation.to_string()) {
            return false;
        }
        self.items.push(recommendation);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recommendation> {
        self.items.iter()
    }

    pub fn messages(&self) -> Vec<String> {
        self.items.iter().map(|r| r.to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Analysis result
// ---------------------------------------------------------------------------

/// Unit-level failure bookkeeping for one unit id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitIssueSummary {
    /// Serial number of the first group (in key order) that failed.
    pub serial_number: String,
    /// Number of qualifying history entries across all of the unit's groups.
    pub fail_count: usize,
}

/// Everything the rule engine produces for one run. Built fresh per call;
/// nothing is carried between runs.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub unit_statuses: BTreeMap<u32, UnitStatus>,
    pub recommendations: RecommendationSet,
    /// Units flagged by the severe group rule and skipped by the unit rule.
    pub quarantined_units: BTreeSet<u32>,
    pub unit_issues: BTreeMap<u32, UnitIssueSummary>,
}

impl AnalysisResult {
    pub fn units_in_error(&self) -> impl Iterator<Item = u32> + '_ {
        self.unit_statuses
            .iter()
            .filter(|(_, s)| s.is_error())
            .map(|(id, _)| *id)
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that stop a run before analysis starts. Problems inside individual
/// rows never surface here; they degrade to sentinel values instead.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("no input file selected")]
    NoInputFile,

    #[error("failed to read {}: {}", path.display(), source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),
}
