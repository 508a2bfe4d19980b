use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// One day of rainfall measured at a station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub station_id: String,
    pub date: NaiveDate,
    /// Daily rainfall (`RR`) in millimeters.
    pub rainfall_mm: f64,
}

impl ObservationRecord {
    pub fn new(station_id: impl Into<String>, date: NaiveDate, rainfall_mm: f64) -> Self {
        Self {
            station_id: station_id.into(),
            date,
            rainfall_mm,
        }
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }
}
