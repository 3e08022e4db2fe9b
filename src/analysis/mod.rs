/// Data organization for the failure-checking service.
///
/// This module turns the flat extractor output into per-sensor structures
/// the rule engine evaluates. Rule logic itself lives in `alert`.
///
/// Submodules:
/// - `groupings`: organizes flat readings into per-sensor histories.

pub mod groupings;
