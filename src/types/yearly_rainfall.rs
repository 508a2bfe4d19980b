//! The per-station, per-year rainfall total derived from daily observations.

use serde::{Deserialize, Serialize};

/// Fraction of a 365-day year that must be observed for a yearly total to be trusted.
pub const COMPLETENESS_RATIO: f64 = 0.95;

/// Minimum number of observed days for a complete year: `ceil(365 * 0.95)`.
pub const MIN_COMPLETE_DAYS: u32 = 347;

/// Total rainfall of one station over one calendar year.
///
/// Years below the completeness threshold are kept and flagged with
/// `is_complete == false`, never replaced by a sentinel value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyRainfall {
    pub station_id: String,
    pub year: i32,
    pub total_rainfall_mm: f64,
    pub observed_days: u32,
    pub is_complete: bool,
}

impl YearlyRainfall {
    /// Builds a yearly total, deriving `is_complete` from `observed_days`.
    pub fn new(
        station_id: impl Into<String>,
        year: i32,
        total_rainfall_mm: f64,
        observed_days: u32,
    ) -> Self {
        Self {
            station_id: station_id.into(),
            year,
            total_rainfall_mm,
            observed_days,
            is_complete: is_complete_year(observed_days),
        }
    }
}

/// Whether `observed_days` reaches the completeness threshold.
pub fn is_complete_year(observed_days: u32) -> bool {
    observed_days >= MIN_COMPLETE_DAYS
}
