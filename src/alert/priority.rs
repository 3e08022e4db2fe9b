//! Two-tier failure rules with precedence.
//!
//! Phase 1 finds sensors whose severe candidates cover every required loop.
//! Their unit ids are quarantined: the assembly should be replaced, and the
//! unit-level rule must not also report them.
//!
//! Phase 2 applies the bounded unit-level rule to every group whose unit id
//! is not quarantined.
//!
//! Units touched by neither phase stay OK. The result is a pure function of
//! the grouped histories and the configuration; groups are visited in key
//! order, so repeated runs over the same input produce identical output.

use std::collections::{BTreeMap, BTreeSet};

use crate::alert::thresholds::{check_unit_limits, is_severe_candidate};
use crate::config::AnalysisConfig;
use crate::logging::{self, Stage};
use crate::model::{
    AnalysisResult, IssueDetail, Recommendation, RecommendationSet, SensorGroups, SensorHistory,
    UnitIssueSummary, UnitStatus,
};
use crate::units::{fresh_status_map, is_addressable};

type StatusMap = BTreeMap<u32, UnitStatus>;

/// Attaches `detail` to the unit's status. Ids outside the grid have no
/// status entry; the issue is logged and otherwise dropped.
fn record_issue(
    statuses: &mut StatusMap,
    config: &AnalysisConfig,
    unit_id: u32,
    serial: &str,
    detail: IssueDetail,
) {
    if !is_addressable(unit_id, config.unit_count) {
        logging::warn(
            Stage::Rules,
            Some(serial),
            &format!("unit id {} is outside the grid: {}", unit_id, detail.message),
        );
        return;
    }
    statuses.entry(unit_id).or_default().record(detail);
}

/// Distinct loops in which this group has at least one severe candidate.
pub fn severe_loops(group: &SensorHistory, config: &AnalysisConfig) -> BTreeSet<u32> {
    group
        .history
        .iter()
        .filter(|entry| is_severe_candidate(entry, config))
        .map(|entry| entry.loop_index)
        .collect()
}

/// Phase 1. Records a severe group issue for every qualifying group and
/// returns the quarantined unit ids.
pub fn detect_severe_group_issues(
    groups: &SensorGroups,
    config: &AnalysisConfig,
    statuses: &mut StatusMap,
) -> BTreeSet<u32> {
    let required: BTreeSet<u32> = config.severe_loops.iter().copied().collect();
    let mut quarantined = BTreeSet::new();

    for group in groups.values() {
        if !severe_loops(group, config).is_superset(&required) {
            continue;
        }
        let key = &group.key;
        quarantined.insert(key.unit_id);
        logging::warn(
            Stage::Rules,
            Some(&key.serial_number),
            &format!(
                "unit {} {} exceeds {} in all {} loops",
                key.unit_id,
                key.channel,
                config.severe_value_threshold,
                required.len()
            ),
        );
        record_issue(
            statuses,
            config,
            key.unit_id,
            &key.serial_number,
            IssueDetail::severe(config.severe_value_threshold, required.len()),
        );
    }
    quarantined
}

/// Phase 2. Records a unit issue for every bounded breach in a
/// non-quarantined group and returns the per-unit summaries.
///
/// The first group (in key order) that fails for a unit fixes the serial
/// number reported for it.
pub fn detect_unit_issues(
    groups: &SensorGroups,
    config: &AnalysisConfig,
    quarantined: &BTreeSet<u32>,
    statuses: &mut StatusMap,
) -> BTreeMap<u32, UnitIssueSummary> {
    let mut summaries: BTreeMap<u32, UnitIssueSummary> = BTreeMap::new();

    for group in groups.values() {
        let key = &group.key;
        if quarantined.contains(&key.unit_id) {
            continue;
        }
        for entry in &group.history {
            let Some(breach) = check_unit_limits(entry, config) else {
                continue;
            };
            logging::debug(
                Stage::Rules,
                Some(&key.serial_number),
                &format!(
                    "unit {} {} loop {} reads {} {} limits [{}, {}]",
                    key.unit_id,
                    key.channel,
                    entry.loop_index,
                    entry.value,
                    breach,
                    entry.lower_limit,
                    entry.upper_limit
                ),
            );
            record_issue(
                statuses,
                config,
                key.unit_id,
                &key.serial_number,
                IssueDetail::unit(&key.channel, entry.loop_index, entry.value),
            );
            summaries
                .entry(key.unit_id)
                .or_insert_with(|| UnitIssueSummary {
                    serial_number: key.serial_number.clone(),
                    fail_count: 0,
                })
                .fail_count += 1;
        }
    }
    summaries
}

/// Runs both phases over `groups` and builds the recommendation set.
///
/// Recommendations: one assembly replacement if anything was quarantined,
/// then one unit replacement per failing unit in ascending unit id.
pub fn evaluate(groups: &SensorGroups, config: &AnalysisConfig) -> AnalysisResult {
    let mut unit_statuses = fresh_status_map(config.unit_count);
    let mut recommendations = RecommendationSet::new();

    let quarantined_units = detect_severe_group_issues(groups, config, &mut unit_statuses);
    if !quarantined_units.is_empty() {
        recommendations.insert(Recommendation::ReplaceAssembly);
    }

    let unit_issues = detect_unit_issues(groups, config, &quarantined_units, &mut unit_statuses);
    for (unit_id, summary) in &unit_issues {
        logging::debug(
            Stage::Rules,
            Some(&summary.serial_number),
            &format!("unit {} failed {} readings", unit_id, summary.fail_count),
        );
        recommendations.insert(Recommendation::ReplaceUnit {
            unit_id: *unit_id,
            serial_number: summary.serial_number.clone(),
        });
    }

    AnalysisResult {
        unit_statuses,
        recommendations,
        quarantined_units,
        unit_issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::groupings::group_by_sensor;
    use crate::model::{IssueKind, Reading, UnitHealth};

    fn reading(sn: &str, unit_id: u32, channel: &str, loop_index: u32, value: f64, lower: f64, upper: f64) -> Reading {
        Reading {
            loop_index,
            serial_number: sn.to_string(),
            raw_label: format!("Alvin{unit_id}_{channel}"),
            unit_id,
            channel: channel.to_string(),
            value,
            lower_limit: lower,
            upper_limit: upper,
        }
    }

    /// 195 under 0/1 limits in each of the given loops.
    fn severe_readings(sn: &str, unit_id: u32, channel: &str, loops: &[u32]) -> Vec<Reading> {
        loops
            .iter()
            .map(|l| reading(sn, unit_id, channel, *l, 195.0, 0.0, 1.0))
            .collect()
    }

    fn run(readings: &[Reading]) -> AnalysisResult {
        evaluate(&group_by_sensor(readings), &AnalysisConfig::default())
    }

    // --- Phase 1 ------------------------------------------------------------

    #[test]
    fn test_all_four_loops_quarantine_the_unit() {
        let result = run(&severe_readings("SN-A", 7, "CH1", &[0, 1, 2, 3]));
        let status = &result.unit_statuses[&7];
        assert_eq!(status.status, UnitHealth::Error);
        assert_eq!(status.details.len(), 1);
        assert_eq!(status.details[0].kind, IssueKind::SevereGroupIssue);
        assert!(result.quarantined_units.contains(&7));
        assert_eq!(
            result.recommendations.messages(),
            vec!["[SevereGroupIssue] Should replace assembly".to_string()]
        );
    }

    #[test]
    fn test_quarantined_unit_is_excluded_from_unit_rule() {
        let mut readings = severe_readings("SN-A", 7, "CH1", &[0, 1, 2, 3]);
        // Would be a unit fail on its own: 105 against 90..100.
        readings.push(reading("SN-A", 7, "CH2", 0, 105.0, 90.0, 100.0));
        let result = run(&readings);

        let details = &result.unit_statuses[&7].details;
        assert!(details.iter().all(|d| d.kind == IssueKind::SevereGroupIssue));
        assert!(result.unit_issues.is_empty());
        assert_eq!(result.recommendations.len(), 1);
    }

    #[test]
    fn test_three_loops_are_not_severe_and_unit_rule_still_runs() {
        let mut readings = severe_readings("SN-A", 7, "CH1", &[0, 1, 2]);
        readings.push(reading("SN-A", 7, "CH1", 3, 105.0, 90.0, 100.0));
        let result = run(&readings);

        assert!(result.quarantined_units.is_empty());
        let details = &result.unit_statuses[&7].details;
        assert_eq!(details.len(), 1, "only the bounded breach is recorded");
        assert_eq!(details[0].kind, IssueKind::UnitIssue);
        assert_eq!(details[0].message, "[UnitIssue] CH1 Loop 3 : 105");
        assert_eq!(
            result.recommendations.messages(),
            vec!["[UnitIssue] Replace unit 7 -> SN: SN-A".to_string()]
        );
    }

    #[test]
    fn test_loops_must_come_from_the_same_group() {
        // Loops 0..=3 spread over two channels: neither group qualifies.
        let mut readings = severe_readings("SN-A", 7, "CH1", &[0, 1]);
        readings.extend(severe_readings("SN-A", 7, "CH2", &[2, 3]));
        assert!(run(&readings).quarantined_units.is_empty());
    }

    #[test]
    fn test_extra_loops_do_not_prevent_quarantine() {
        let readings = severe_readings("SN-A", 3, "CH1", &[0, 1, 2, 3, 4, 3]);
        assert!(run(&readings).quarantined_units.contains(&3));
    }

    #[test]
    fn test_one_assembly_recommendation_for_many_severe_units() {
        let mut readings = Vec::new();
        for unit in [1, 2, 50] {
            readings.extend(severe_readings("SN-A", unit, "CH1", &[0, 1, 2, 3]));
        }
        readings.extend(severe_readings("SN-B", 2, "CH4", &[0, 1, 2, 3]));
        let result = run(&readings);

        assert_eq!(result.quarantined_units.len(), 3);
        assert_eq!(result.recommendations.len(), 1);
        // Unit 2 qualified in two groups, so it carries two identical details.
        let unit2 = &result.unit_statuses[&2];
        assert_eq!(unit2.details.len(), 2);
        assert_eq!(unit2.distinct_messages().len(), 1);
    }

    #[test]
    fn test_quarantine_applies_across_serial_numbers() {
        let mut readings = severe_readings("SN-A", 9, "CH1", &[0, 1, 2, 3]);
        readings.push(reading("SN-B", 9, "CH1", 0, 105.0, 90.0, 100.0));
        let result = run(&readings);
        assert!(result.unit_issues.is_empty());
    }

    // --- Phase 2 ------------------------------------------------------------

    #[test]
    fn test_breach_beyond_margin_is_not_recorded() {
        let result = run(&[reading("SN-A", 4, "CH1", 0, 115.0, 90.0, 100.0)]);
        assert_eq!(result.unit_statuses[&4].status, UnitHealth::Ok);
        assert!(result.recommendations.is_empty());
    }

    #[test]
    fn test_one_unit_recommendation_regardless_of_fail_count() {
        let readings = vec![
            reading("SN-A", 4, "CH1", 0, 105.0, 90.0, 100.0),
            reading("SN-A", 4, "CH1", 1, 106.0, 90.0, 100.0),
            reading("SN-A", 4, "CH2", 0, 85.0, 90.0, 100.0),
        ];
        let result = run(&readings);
        assert_eq!(result.recommendations.len(), 1);
        assert_eq!(result.unit_issues[&4].fail_count, 3);
        assert_eq!(result.unit_statuses[&4].details.len(), 3);
    }

    #[test]
    fn test_first_serial_in_key_order_wins() {
        let readings = vec![
            reading("SN-B", 4, "CH1", 0, 105.0, 90.0, 100.0),
            reading("SN-A", 4, "CH1", 0, 105.0, 90.0, 100.0),
        ];
        let result = run(&readings);
        assert_eq!(result.unit_issues[&4].serial_number, "SN-A");
        assert_eq!(
            result.recommendations.messages(),
            vec!["[UnitIssue] Replace unit 4 -> SN: SN-A".to_string()]
        );
    }

    #[test]
    fn test_nan_values_are_treated_as_passing() {
        let result = run(&[reading("SN-A", 4, "CH1", 0, f64::NAN, 90.0, 100.0)]);
        assert!(result.units_in_error().next().is_none());
    }

    // --- Combined -----------------------------------------------------------

    #[test]
    fn test_recommendation_order_is_severe_then_ascending_units() {
        let mut readings = vec![
            reading("SN-A", 30, "CH1", 0, 105.0, 90.0, 100.0),
            reading("SN-A", 5, "CH1", 0, 85.0, 90.0, 100.0),
        ];
        readings.extend(severe_readings("SN-C", 60, "CH1", &[0, 1, 2, 3]));
        let result = run(&readings);
        assert_eq!(
            result.recommendations.messages(),
            vec![
                "[SevereGroupIssue] Should replace assembly".to_string(),
                "[UnitIssue] Replace unit 5 -> SN: SN-A".to_string(),
                "[UnitIssue] Replace unit 30 -> SN: SN-A".to_string(),
            ]
        );
    }

    #[test]
    fn test_out_of_grid_unit_still_recommended_but_not_in_status_map() {
        let result = run(&[reading("SN-A", 0, "-", 0, 105.0, 90.0, 100.0)]);
        assert_eq!(result.unit_statuses.len(), 96);
        assert!(!result.unit_statuses.contains_key(&0));
        assert_eq!(
            result.recommendations.messages(),
            vec!["[UnitIssue] Replace unit 0 -> SN: SN-A".to_string()]
        );
    }

    #[test]
    fn test_group_without_unit_token_quarantines_sentinel_unit() {
        // Labels with no unit token extract as unit 0.
        let mut readings = severe_readings("SN-A", 0, "-", &[0, 1, 2, 3]);
        // Within the margin, but unit 0 is quarantined.
        readings.push(reading("SN-A", 0, "CH2", 0, 105.0, 90.0, 100.0));
        let result = run(&readings);

        assert!(result.quarantined_units.contains(&0));
        assert!(result.unit_issues.is_empty(), "unit 0 breach must be suppressed");
        assert_eq!(
            result.recommendations.messages(),
            vec!["[SevereGroupIssue] Should replace assembly".to_string()]
        );
        assert!(result.units_in_error().next().is_none(), "unit 0 has no grid cell");
    }

    #[test]
    fn test_smaller_grid_drops_details_for_units_beyond_it() {
        let config = AnalysisConfig {
            unit_count: 4,
            ..AnalysisConfig::default()
        };
        let readings = vec![
            reading("SN-A", 3, "CH1", 0, 105.0, 90.0, 100.0),
            reading("SN-A", 5, "CH1", 0, 105.0, 90.0, 100.0),
        ];
        let result = evaluate(&group_by_sensor(&readings), &config);

        assert_eq!(result.unit_statuses.len(), 4);
        assert!(!result.unit_statuses.contains_key(&5));
        assert_eq!(result.units_in_error().collect::<Vec<_>>(), vec![3]);
        assert_eq!(result.recommendations.len(), 2, "unit 5 is still recommended");
    }

    #[test]
    fn test_untouched_units_stay_ok() {
        let result = run(&[reading("SN-A", 4, "CH1", 0, 105.0, 90.0, 100.0)]);
        let errors: Vec<u32> = result.units_in_error().collect();
        assert_eq!(errors, vec![4]);
        assert!(result
            .unit_statuses
            .iter()
            .filter(|(id, _)| **id != 4)
            .all(|(_, s)| s.status == UnitHealth::Ok && s.details.is_empty()));
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let mut readings = severe_readings("SN-A", 7, "CH1", &[0, 1, 2, 3]);
        readings.push(reading("SN-B", 8, "CH2", 1, 101.0, 90.0, 100.0));
        let groups = group_by_sensor(&readings);
        let config = AnalysisConfig::default();
        assert_eq!(evaluate(&groups, &config), evaluate(&groups, &config));
    }

    #[test]
    fn test_empty_input_yields_all_ok_and_no_recommendations() {
        let result = run(&[]);
        assert_eq!(result.unit_statuses.len(), 96);
        assert!(result.recommendations.is_empty());
        assert!(result.quarantined_units.is_empty());
    }
}
