use crate::stations::station_index::StationIndex;
use std::collections::{BTreeMap, BTreeSet};

/// An immutable view of everything imported so far.
///
/// Imports never touch a published snapshot; they build the next one and swap it in,
/// so a reader holding an `Arc<WeatherSnapshot>` always sees complete data.
#[derive(Debug, Clone, Default)]
pub struct WeatherSnapshot {
    /// Incremented by every successful import. The snapshot restored from the station
    /// cache at start-up is version 0.
    pub version: u64,
    pub index: StationIndex,
    /// Zero-padded codes of the departments whose observations are cached.
    pub departments: BTreeSet<String>,
    /// Department each station was imported with. Station ids do not always start
    /// with their department code (`971`, `2A`).
    pub station_departments: BTreeMap<String, String>,
}

impl WeatherSnapshot {
    pub fn has_department(&self, code: &str) -> bool {
        self.departments.contains(code)
    }

    /// The department whose observation cache holds `station_id`.
    pub fn department_of(&self, station_id: &str) -> Option<&str> {
        self.station_departments.get(station_id).map(String::as_str)
    }
}
