use crate::repository::error::RepositoryError;
use crate::types::station::Station;
use bincode::config::{Configuration, Fixint, LittleEndian};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

const BINCODE_CACHE_FILE_NAME: &str = "stations.bin";
const BINCODE_CONFIG: Configuration<LittleEndian, Fixint> =
    bincode::config::standard().with_fixed_int_encoding();

/// What survives a restart: every imported station and the departments they came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StationCache {
    pub stations: Vec<Station>,
    pub departments: BTreeSet<String>,
    /// Station id to the department it was imported with.
    pub station_departments: BTreeMap<String, String>,
}

impl StationCache {
    pub fn path(cache_dir: &Path) -> PathBuf {
        cache_dir.join(BINCODE_CACHE_FILE_NAME)
    }

    /// Reads the cache in `cache_dir`, `None` when nothing was cached yet.
    pub fn load(cache_dir: &Path) -> Result<Option<Self>, RepositoryError> {
        let cache_path = Self::path(cache_dir);
        if !cache_path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&cache_path)
            .map_err(|e| RepositoryError::CacheRead(cache_path.clone(), e))?;
        let (cache, _) = bincode::serde::decode_from_slice::<Self, _>(&bytes, BINCODE_CONFIG)
            .map_err(|e| RepositoryError::CacheDecode(cache_path.clone(), Box::new(e)))?;
        info!(
            "Loaded {} cached stations ({} departments) from {}",
            cache.stations.len(),
            cache.departments.len(),
            cache_path.display()
        );
        Ok(Some(cache))
    }

    pub fn save(&self, cache_dir: &Path) -> Result<(), RepositoryError> {
        let cache_path = Self::path(cache_dir);
        let bytes = bincode::serde::encode_to_vec(self, BINCODE_CONFIG)
            .map_err(|e| RepositoryError::CacheEncode(Box::new(e)))?;
        std::fs::write(&cache_path, &bytes)
            .map_err(|e| RepositoryError::CacheWrite(cache_path.clone(), e))?;
        info!(
            "Wrote station cache ({} bytes) to {}",
            bytes.len(),
            cache_path.display()
        );
        Ok(())
    }
}
