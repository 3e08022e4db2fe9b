/// Failure classification and maintenance recommendations.
///
/// Submodules:
/// - `thresholds`: per-reading limit tests shared by both rules and the
///   raw table flags.
/// - `priority`: the two-tier rule engine (severe group issue first, unit
///   issue second) producing the per-unit status map and recommendations.

pub mod priority;
pub mod thresholds;
