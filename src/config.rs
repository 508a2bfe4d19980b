use crate::geo::projection::Viewport;
use crate::repository::error::RepositoryError;
use crate::utils::get_cache_dir;
use bon::Builder;
use std::path::PathBuf;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_OUTLINE_PATH: &str = "data/geo/metropole-version-simplifiee.geojson";
pub const DEFAULT_VIEWPORT: Viewport = Viewport {
    width_px: 600.0,
    height_px: 600.0,
};
pub const DEFAULT_CLOSEST_STATION_RADIUS_KM: f64 = 10.0;

/// Where a [`RainMap`](crate::RainMap) finds its files, and how it answers lookups.
///
/// ```
/// use rainmap::RainMapConfig;
///
/// let config = RainMapConfig::builder()
///     .data_dir("/srv/meteo")
///     .closest_station_radius_km(25.0)
///     .build();
/// assert_eq!(config.data_dir.to_str(), Some("/srv/meteo"));
/// assert_eq!(config.viewport.width_px, 600.0);
/// assert!(!config.include_incomplete_years);
/// ```
#[derive(Debug, Clone, Builder)]
pub struct RainMapConfig {
    /// Directory holding the `Q_{dpt}_*_RR-T-Vent` department files.
    #[builder(into, default = PathBuf::from(DEFAULT_DATA_DIR))]
    pub data_dir: PathBuf,

    /// Cache directory; the platform cache directory when unset.
    #[builder(into)]
    pub cache_dir: Option<PathBuf>,

    /// GeoJSON outline of the territory drawn on the map.
    #[builder(into, default = PathBuf::from(DEFAULT_OUTLINE_PATH))]
    pub outline_path: PathBuf,

    #[builder(default = DEFAULT_VIEWPORT)]
    pub viewport: Viewport,

    /// Pointer lookups further than this from every station find nothing.
    /// `f64::INFINITY` disables the limit.
    #[builder(default = DEFAULT_CLOSEST_STATION_RADIUS_KM)]
    pub closest_station_radius_km: f64,

    /// Whether statistics also count years with less than 95% of their days observed.
    #[builder(default)]
    pub include_incomplete_years: bool,
}

impl Default for RainMapConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl RainMapConfig {
    pub fn resolved_cache_dir(&self) -> Result<PathBuf, RepositoryError> {
        self.cache_dir
            .clone()
            .or_else(get_cache_dir)
            .ok_or(RepositoryError::CacheDirResolution)
    }
}
