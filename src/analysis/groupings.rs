//! Grouping of readings by logical sensor identity.
//!
//! A sensor is one `(serial_number, unit_id, channel)` triple. Its history
//! keeps every contributing reading, limits included, because the limit
//! pair can change from row to row for the same sensor.

use crate::model::{HistoryEntry, Reading, SensorGroups, SensorHistory, SensorKey};

/// Groups `readings` into per-sensor histories.
///
/// Every reading lands in exactly one history, appended in input order.
/// Identical entries are kept as separate history rows.
pub fn group_by_sensor(readings: &[Reading]) -> SensorGroups {
    let mut groups = SensorGroups::new();
    for reading in readings {
        let key = SensorKey::from(reading);
        groups
            .entry(key.clone())
            .or_insert_with(|| SensorHistory::new(key))
            .history
            .push(HistoryEntry::from(reading));
    }
    groups
}

/// Total number of history entries across all groups.
pub fn entry_count(groups: &SensorGroups) -> usize {
    groups.values().map(|g| g.history.len()).sum()
}
