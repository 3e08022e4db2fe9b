/// Unit registry for the failure-checking service.
///
/// The tester addresses a fixed grid of individually replaceable units,
/// numbered from 1. This module is the single source of truth for which
/// unit ids exist; the status map of every run is built from it.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use crate::model::UnitStatus;

/// Number of addressable units in the grid.
pub const UNIT_COUNT: u32 = 96;

/// All addressable unit ids, `1..=unit_count`.
pub fn all_unit_ids(unit_count: u32) -> RangeInclusive<u32> {
    1..=unit_count
}

/// Whether `unit_id` names a unit in the grid. The extractor's `0`
/// sentinel is never addressable.
pub fn is_addressable(unit_id: u32, unit_count: u32) -> bool {
    all_unit_ids(unit_count).contains(&unit_id)
}

/// A status map with every unit OK and no details.
pub fn fresh_status_map(unit_count: u32) -> BTreeMap<u32, UnitStatus> {
    all_unit_ids(unit_count)
        .map(|id| (id, UnitStatus::default()))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_map_covers_every_unit() {
        let map = fresh_status_map(UNIT_COUNT);
        assert_eq!(map.len(), 96);
        assert_eq!(map.keys().next(), Some(&1));
        assert_eq!(map.keys().last(), Some(&96));
        assert!(map.values().all(|s| !s.is_error() && s.details.is_empty()));
    }

    #[test]
    fn test_sentinel_and_out_of_grid_ids_are_not_addressable() {
        assert!(!is_addressable(0, UNIT_COUNT));
        assert!(is_addressable(1, UNIT_COUNT));
        assert!(is_addressable(96, UNIT_COUNT));
        assert!(!is_addressable(97, UNIT_COUNT));
    }

    #[test]
    fn test_smaller_grid_is_respected() {
        assert_eq!(all_unit_ids(4).count(), 4);
        assert!(!is_addressable(5, 4));
    }
}
