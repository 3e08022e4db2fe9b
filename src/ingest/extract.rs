//! Record extraction: CSV text → sorted `Reading` list.
//!
//! Only four composite columns matter. Each sub-field is located by a
//! pattern search anywhere in its column (first match wins); a missing
//! match falls back to a sentinel instead of dropping the row.
//!
//! | column | pattern                  | field          | default     |
//! |--------|--------------------------|----------------|-------------|
//! | 2      | `Loop<ws><digits>`       | loop index     | `0`         |
//! | 3      | `SN=<text>`              | serial number  | `Unknown`   |
//! | 4      | `Alvin<digits>`          | unit id        | `0`         |
//! | 4      | `CH<digits>`             | channel        | `-`         |
//! | 5      | `value='<text>'`         | value          | `0`         |
//! | 5      | `lower_limit='<text>'`   | lower limit    | `0`         |
//! | 5      | `upper_limit='<text>'`   | upper limit    | `0`         |

use regex::Regex;
use std::sync::LazyLock;

use super::csv_row::split_row;
use crate::model::Reading;

/// Rows with fewer columns than this are skipped entirely.
pub const MIN_COLUMNS: usize = 6;

pub const DEFAULT_SERIAL: &str = "Unknown";
pub const DEFAULT_CHANNEL: &str = "-";

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("valid pattern")
}

static LOOP_RE: LazyLock<Regex> = LazyLock::new(|| pattern(r"Loop\s+([0-9]+)"));
static SERIAL_RE: LazyLock<Regex> = LazyLock::new(|| pattern(r#"SN=([^,"]+)"#));
static UNIT_RE: LazyLock<Regex> = LazyLock::new(|| pattern(r"Alvin([0-9]+)"));
static CHANNEL_RE: LazyLock<Regex> = LazyLock::new(|| pattern(r"(CH[0-9]+)"));
static VALUE_RE: LazyLock<Regex> = LazyLock::new(|| pattern(r"value='([^']+)'"));
static LOWER_RE: LazyLock<Regex> = LazyLock::new(|| pattern(r"lower_limit='([^']+)'"));
static UPPER_RE: LazyLock<Regex> = LazyLock::new(|| pattern(r"upper_limit='([^']+)'"));
static LEADING_FLOAT_RE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?"));

/// Sorted readings plus bookkeeping about what was skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractOutcome {
    pub readings: Vec<Reading>,
    pub blank_rows: usize,
    pub short_rows: usize,
}

fn first_capture<'a>(re: &Regex, text: &'a str) -> Option<&'a str> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Digits → `u32`; absent or overflowing digits become the `0` sentinel.
/// This holds for unit ids too, so an overflowing unit id shares unit 0
/// with labels that carry no unit token.
fn capture_id(re: &Regex, text: &str) -> u32 {
    first_capture(re, text)
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(0)
}

fn capture_number(re: &Regex, text: &str) -> f64 {
    first_capture(re, text).map_or(0.0, parse_leading_float)
}

/// Parses the longest decimal literal at the start of `text` (after
/// leading whitespace). Text with no numeric prefix yields NaN.
///
/// `"12.5abc"` → 12.5, `" -3e2"` → -300, `"n/a"` → NaN
pub fn parse_leading_float(text: &str) -> f64 {
    LEADING_FLOAT_RE
        .find(text.trim_start())
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(f64::NAN)
}

/// Builds a `Reading` from an already split row.
///
/// Returns `None` when the row has fewer than `MIN_COLUMNS` columns.
pub fn extract_reading(columns: &[String]) -> Option<Reading> {
    if columns.len() < MIN_COLUMNS {
        return None;
    }
    let label = &columns[4];
    let limits = &columns[5];

    Some(Reading {
        loop_index: capture_id(&LOOP_RE, &columns[2]),
        serial_number: first_capture(&SERIAL_RE, &columns[3])
            .unwrap_or(DEFAULT_SERIAL)
            .to_string(),
        raw_label: label.clone(),
        unit_id: capture_id(&UNIT_RE, label),
        channel: first_capture(&CHANNEL_RE, label)
            .unwrap_or(DEFAULT_CHANNEL)
            .to_string(),
        value: capture_number(&VALUE_RE, limits),
        lower_limit: capture_number(&LOWER_RE, limits),
        upper_limit: capture_number(&UPPER_RE, limits),
    })
}

/// Extracts every data row of `text`.
///
/// The first line is a header and is always skipped, as are blank lines and
/// rows that split into fewer than `MIN_COLUMNS` columns. The result is
/// sorted by serial number, then numerically by loop; the sort is stable so
/// rows that tie keep their file order.
pub fn extract_readings(text: &str) -> ExtractOutcome {
    let mut outcome = ExtractOutcome::default();

    for line in text.lines().skip(1) {
        if line.trim().is_empty() {
            outcome.blank_rows += 1;
            continue;
        }
        match extract_reading(&split_row(line)) {
            Some(reading) => outcome.readings.push(reading),
            None => outcome.short_rows += 1,
        }
    }

    outcome.readings.sort_by(|a, b| {
        a.serial_number
            .cmp(&b.serial_number)
            .then(a.loop_index.cmp(&b.loop_index))
    });
    outcome
}
