//! Turns daily rainfall observations into yearly totals per station, and computes the
//! summary statistics shown for a station.
//!
//! A year counts as complete when at least
//! [`MIN_COMPLETE_DAYS`](crate::types::yearly_rainfall::MIN_COMPLETE_DAYS) days were observed.
//! Incomplete years stay in the output with `is_complete == false`; statistics
//! functions decide whether to use them through their `include_incomplete` flag.
//!
//! Several observations for the same station and day are collapsed into one: the last
//! one in input order wins. Records coming from several files (historical and recent
//! exports) must therefore be concatenated *before* calling [`aggregate`].

use crate::rainfall::error::RainfallError;
use crate::types::observation::ObservationRecord;
use crate::types::yearly_rainfall::{is_complete_year, YearlyRainfall};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Yearly totals keyed by `(station_id, year)`, in key order.
pub type YearlyRainfallMap = BTreeMap<(String, i32), YearlyRainfall>;

/// Groups `records` by station and calendar year.
///
/// The result does not depend on the order of the records, except for which value is
/// kept when a (station, date) pair appears more than once.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use rainmap::{aggregate, ObservationRecord};
///
/// let first = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
/// let records: Vec<ObservationRecord> = first
///     .iter_days()
///     .take(365)
///     .map(|date| ObservationRecord::new("X", date, 1.0))
///     .collect();
///
/// let yearly = aggregate(&records);
/// let x_2020 = &yearly[&("X".to_string(), 2020)];
/// assert_eq!(x_2020.total_rainfall_mm, 365.0);
/// assert_eq!(x_2020.observed_days, 365);
/// assert!(x_2020.is_complete);
/// ```
pub fn aggregate<'a, I>(records: I) -> YearlyRainfallMap
where
    I: IntoIterator<Item = &'a ObservationRecord>,
{
    let mut daily: BTreeMap<(&'a str, NaiveDate), &'a ObservationRecord> = BTreeMap::new();
    for record in records {
        daily.insert((record.station_id.as_str(), record.date), record);
    }

    let mut yearly = YearlyRainfallMap::new();
    for record in daily.into_values() {
        let entry = yearly
            .entry((record.station_id.clone(), record.year()))
            .or_insert_with(|| {
                YearlyRainfall::new(record.station_id.as_str(), record.year(), 0.0, 0)
            });
        entry.total_rainfall_mm += record.rainfall_mm;
        entry.observed_days += 1;
    }
    for entry in yearly.values_mut() {
        entry.is_complete = is_complete_year(entry.observed_days);
    }
    yearly
}

/// Combines two aggregations of disjoint observation sets.
///
/// Totals and day counts are added and completeness is re-evaluated on the sum. This
/// is *not* a substitute for concatenating records that may overlap: a day present in
/// both inputs would be counted twice.
pub fn merge(mut left: YearlyRainfallMap, right: YearlyRainfallMap) -> YearlyRainfallMap {
    for (key, partial) in right {
        left.entry(key)
            .and_modify(|existing| {
                existing.total_rainfall_mm += partial.total_rainfall_mm;
                existing.observed_days += partial.observed_days;
                existing.is_complete = is_complete_year(existing.observed_days);
            })
            .or_insert(partial);
    }
    left
}

/// The year-ordered series of one station.
pub fn series_for_station(yearly: &YearlyRainfallMap, station_id: &str) -> Vec<YearlyRainfall> {
    yearly
        .range((station_id.to_string(), i32::MIN)..=(station_id.to_string(), i32::MAX))
        .map(|(_, year)| year.clone())
        .collect()
}

fn qualifying(
    series: &[YearlyRainfall],
    include_incomplete: bool,
) -> impl Iterator<Item = &YearlyRainfall> {
    series
        .iter()
        .filter(move |year| include_incomplete || year.is_complete)
}

/// Lowest and highest yearly totals.
///
/// # Errors
///
/// [`RainfallError::EmptyStatistics`] when no year qualifies.
pub fn min_max(
    series: &[YearlyRainfall],
    include_incomplete: bool,
) -> Result<(f64, f64), RainfallError> {
    qualifying(series, include_incomplete)
        .map(|year| year.total_rainfall_mm)
        .fold(None, |acc: Option<(f64, f64)>, total| match acc {
            None => Some((total, total)),
            Some((min, max)) => Some((min.min(total), max.max(total))),
        })
        .ok_or(RainfallError::EmptyStatistics { include_incomplete })
}

/// Mean of the yearly totals.
///
/// # Errors
///
/// [`RainfallError::EmptyStatistics`] when no year qualifies.
pub fn average(series: &[YearlyRainfall], include_incomplete: bool) -> Result<f64, RainfallError> {
    let (sum, count) = qualifying(series, include_incomplete)
        .fold((0.0, 0usize), |(sum, count), year| {
            (sum + year.total_rainfall_mm, count + 1)
        });
    if count == 0 {
        return Err(RainfallError::EmptyStatistics { include_incomplete });
    }
    Ok(sum / count as f64)
}

/// Summary of a station's yearly rainfall, as displayed next to the map.
#[derive(Debug, Clone, PartialEq)]
pub struct RainfallStatistics {
    pub min_mm: f64,
    pub max_mm: f64,
    pub average_mm: f64,
    /// Number of years the figures were computed over.
    pub years: usize,
    pub first_year: i32,
    pub last_year: i32,
}

/// Min, max and mean over the qualifying years.
pub fn statistics(
    series: &[YearlyRainfall],
    include_incomplete: bool,
) -> Result<RainfallStatistics, RainfallError> {
    let (min_mm, max_mm) = min_max(series, include_incomplete)?;
    let average_mm = average(series, include_incomplete)?;
    let years: Vec<i32> = qualifying(series, include_incomplete)
        .map(|year| year.year)
        .collect();
    Ok(RainfallStatistics {
        min_mm,
        max_mm,
        average_mm,
        years: years.len(),
        first_year: years.iter().copied().min().unwrap_or_default(),
        last_year: years.iter().copied().max().unwrap_or_default(),
    })
}
