//! [`WeatherRepository`] over Météo-France department files in a local data directory.
//!
//! An import reads the department's CSV/Parquet files, rewrites its observations into
//! a compact parquet cache, persists the station list with bincode and finally publishes
//! a new [`WeatherSnapshot`]. Station lookups are answered from the snapshot, daily
//! observations from the parquet cache.

use crate::repository::data_loader::{
    cache_file, read_department, scan_records_cache, station_records, write_records_cache,
};
use crate::repository::error::RepositoryError;
use crate::repository::snapshot::WeatherSnapshot;
use crate::repository::station_cache::StationCache;
use crate::repository::{DepartmentImport, WeatherRepository};
use crate::stations::station_index::StationIndex;
use crate::types::geo_point::GeoPoint;
use crate::types::observation::ObservationRecord;
use crate::types::station::{normalize_department, normalize_station_id, Station};
use crate::utils::ensure_cache_dir_exists;
use log::{info, warn};
use polars::prelude::LazyFrame;
use std::collections::{hash_map::Entry, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

pub struct FileWeatherRepository {
    data_dir: PathBuf,
    cache_dir: PathBuf,
    search_radius_km: f64,
    snapshot: RwLock<Arc<WeatherSnapshot>>,
    /// Lazily scanned parquet caches, keyed by department.
    frames: Mutex<HashMap<String, LazyFrame>>,
    /// Imports run one at a time so versions are handed out in order.
    import_lock: Mutex<()>,
}

impl FileWeatherRepository {
    /// Opens a repository reading department files from `data_dir` and keeping its
    /// caches in `cache_dir` (created if needed). Stations cached by an earlier run are
    /// available right away.
    ///
    /// `closest_station` searches without a distance limit until
    /// [`FileWeatherRepository::with_search_radius_km`] sets one.
    pub async fn new(
        data_dir: impl Into<PathBuf>,
        cache_dir: impl Into<PathBuf>,
    ) -> Result<Self, RepositoryError> {
        let data_dir = data_dir.into();
        let cache_dir = cache_dir.into();
        ensure_cache_dir_exists(&cache_dir)
            .await
            .map_err(|e| RepositoryError::CacheDirCreation(cache_dir.clone(), e))?;

        let cached = {
            let cache_dir = cache_dir.clone();
            tokio::task::spawn_blocking(move || StationCache::load(&cache_dir)).await??
        };
        let snapshot = match cached {
            Some(cache) => WeatherSnapshot {
                version: 0,
                index: StationIndex::new(cache.stations),
                departments: cache.departments,
                station_departments: cache.station_departments,
            },
            None => WeatherSnapshot::default(),
        };

        Ok(Self {
            data_dir,
            cache_dir,
            search_radius_km: f64::INFINITY,
            snapshot: RwLock::new(Arc::new(snapshot)),
            frames: Mutex::new(HashMap::new()),
            import_lock: Mutex::new(()),
        })
    }

    /// Limits `closest_station` to stations within `km` kilometres (great-circle).
    /// A non-finite value removes the limit.
    pub fn with_search_radius_km(mut self, km: f64) -> Self {
        self.search_radius_km = km;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// The currently published snapshot.
    pub async fn snapshot(&self) -> Arc<WeatherSnapshot> {
        self.snapshot.read().await.clone()
    }

    async fn cached_frame(&self, department: &str) -> Result<LazyFrame, RepositoryError> {
        let path = cache_file(&self.cache_dir, department);
        if !path.exists() {
            warn!(
                "Observation cache {} missing, re-import department {}",
                path.display(),
                department
            );
            self.frames.lock().await.remove(department);
            return Err(RepositoryError::MissingObservationCache {
                department: department.to_string(),
                path,
            });
        }

        {
            let frames = self.frames.lock().await;
            if let Some(frame) = frames.get(department) {
                return Ok(frame.clone());
            }
        }

        let frame = scan_records_cache(&path)?;

        let mut frames = self.frames.lock().await;
        match frames.entry(department.to_string()) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                entry.insert(frame.clone());
                Ok(frame)
            }
        }
    }
}

impl WeatherRepository for FileWeatherRepository {
    async fn all_stations(&self) -> Result<Vec<Station>, RepositoryError> {
        Ok(self.snapshot().await.index.all_stations().cloned().collect())
    }

    async fn station(&self, station_id: &str) -> Result<Option<Station>, RepositoryError> {
        let station_id = normalize_station_id(station_id);
        Ok(self.snapshot().await.index.get(&station_id).cloned())
    }

    async fn observations_for_station(
        &self,
        station_id: &str,
    ) -> Result<Vec<ObservationRecord>, RepositoryError> {
        let station_id = normalize_station_id(station_id);
        let snapshot = self.snapshot().await;
        let station = snapshot
            .index
            .get(&station_id)
            .ok_or_else(|| RepositoryError::UnknownStation(station_id.clone()))?;
        let department = snapshot
            .department_of(&station_id)
            .unwrap_or_else(|| station.department())
            .to_string();

        let frame = self.cached_frame(&department).await?;
        let path = cache_file(&self.cache_dir, &department);
        tokio::task::spawn_blocking(move || station_records(frame, &station_id, &path)).await?
    }

    async fn closest_station(&self, point: GeoPoint) -> Result<Station, RepositoryError> {
        let snapshot = self.snapshot().await;
        let station = if self.search_radius_km.is_finite() {
            snapshot
                .index
                .nearest_within_km(point, self.search_radius_km)?
                .0
        } else {
            snapshot.index.nearest(point)?
        };
        Ok(station.clone())
    }

    async fn import_department(&self, code: &str) -> Result<DepartmentImport, RepositoryError> {
        let department = normalize_department(code);
        let _guard = self.import_lock.lock().await;
        info!("Importing department {}", department);

        let data = {
            let data_dir = self.data_dir.clone();
            let department = department.clone();
            tokio::task::spawn_blocking(move || read_department(&data_dir, &department)).await??
        };

        let records = {
            let path = cache_file(&self.cache_dir, &department);
            let records = data.records;
            tokio::task::spawn_blocking(move || {
                write_records_cache(&records, &path).map(|_| records)
            })
            .await??
        };

        let current = self.snapshot().await;
        let mut index = current.index.clone();
        index.load(data.stations.iter().cloned());
        let mut departments = current.departments.clone();
        departments.insert(department.clone());
        let mut station_departments = current.station_departments.clone();
        for station in &data.stations {
            station_departments.insert(station.id.clone(), department.clone());
        }

        let cache = StationCache {
            stations: index.all_stations().cloned().collect(),
            departments: departments.clone(),
            station_departments: station_departments.clone(),
        };
        {
            let cache_dir = self.cache_dir.clone();
            tokio::task::spawn_blocking(move || cache.save(&cache_dir)).await??;
        }

        let next = WeatherSnapshot {
            version: current.version + 1,
            index,
            departments,
            station_departments,
        };
        let version = next.version;
        *self.snapshot.write().await = Arc::new(next);
        self.frames.lock().await.remove(&department);

        info!(
            "Published snapshot {} with department {} ({} stations, {} observations)",
            version,
            department,
            data.stations.len(),
            records.len()
        );
        Ok(DepartmentImport {
            department,
            stations: data.stations,
            records,
            version,
        })
    }

    async fn imported_departments(&self) -> Result<Vec<String>, RepositoryError> {
        Ok(self.snapshot().await.departments.iter().cloned().collect())
    }
}
