use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum StationIndexError {
    #[error("No stations are loaded")]
    EmptyIndex,

    #[error("No station within {max_distance_km} km")]
    NoStationWithinRadius { max_distance_km: f64 },
}
