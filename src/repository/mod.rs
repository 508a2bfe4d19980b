//! Storage boundary: where stations and daily observations come from.

pub mod data_loader;
pub mod datagouv;
pub mod error;
pub mod file_repository;
pub mod snapshot;
pub mod station_cache;

use crate::repository::error::RepositoryError;
use crate::types::geo_point::GeoPoint;
use crate::types::observation::ObservationRecord;
use crate::types::station::{normalize_station_id, Station};

/// Result of importing one department.
#[derive(Debug, Clone)]
pub struct DepartmentImport {
    /// Zero-padded department code.
    pub department: String,
    pub stations: Vec<Station>,
    /// Every observation read, historical files first.
    pub records: Vec<ObservationRecord>,
    /// Version of the snapshot the import published.
    pub version: u64,
}

/// Supplies stations and rainfall observations to the map.
///
/// Implementations publish every change as a whole: a call made while an import is
/// running answers from the data as it was before the import, never from a mix.
#[allow(async_fn_in_trait)]
pub trait WeatherRepository {
    /// Every known station, ordered by id.
    async fn all_stations(&self) -> Result<Vec<Station>, RepositoryError>;

    /// One station by id, `None` when it was never imported.
    async fn station(&self, station_id: &str) -> Result<Option<Station>, RepositoryError> {
        let station_id = normalize_station_id(station_id);
        Ok(self
            .all_stations()
            .await?
            .into_iter()
            .find(|s| s.id == station_id))
    }

    /// Daily observations of one station, ordered by date.
    async fn observations_for_station(
        &self,
        station_id: &str,
    ) -> Result<Vec<ObservationRecord>, RepositoryError>;

    /// The station closest to `point`.
    async fn closest_station(&self, point: GeoPoint) -> Result<Station, RepositoryError>;

    /// Loads (or reloads) a department's dataset and publishes it.
    async fn import_department(&self, code: &str) -> Result<DepartmentImport, RepositoryError>;

    /// Zero-padded codes of the departments imported so far.
    async fn imported_departments(&self) -> Result<Vec<String>, RepositoryError>;
}
