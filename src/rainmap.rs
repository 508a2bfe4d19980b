//! The map as a whole: an outline, a camera session over it and a weather repository.
//!
//! `RainMap` is built from its collaborators; nothing is looked up from global state.
//! It glues the pure pieces together in the order the UI needs them: pointer position
//! → geographic point → closest station → yearly rainfall series → statistics.

use crate::config::{RainMapConfig, DEFAULT_VIEWPORT};
use crate::error::RainMapError;
use crate::geo::error::GeoError;
use crate::geo::outline::{GeoJsonOutline, Rings};
use crate::geo::projection::Viewport;
use crate::geo::view::ViewSession;
use crate::rainfall::aggregator::{aggregate, series_for_station, statistics, RainfallStatistics};
use crate::repository::datagouv::DataGouvClient;
use crate::repository::error::RepositoryError;
use crate::repository::file_repository::FileWeatherRepository;
use crate::repository::{DepartmentImport, WeatherRepository};
use crate::types::geo_point::ScreenPoint;
use crate::types::station::{normalize_station_id, Station};
use crate::types::yearly_rainfall::YearlyRainfall;
use bon::bon;
use log::info;

/// What the station panel shows: the station, its yearly totals and, when at least
/// one year qualifies, their min/max/average.
#[derive(Debug, Clone, PartialEq)]
pub struct StationSummary {
    pub station: Station,
    pub series: Vec<YearlyRainfall>,
    pub statistics: Option<RainfallStatistics>,
}

pub struct RainMap<R: WeatherRepository> {
    repository: R,
    outline: Rings,
    view: ViewSession,
    include_incomplete_years: bool,
}

#[bon]
impl<R: WeatherRepository> RainMap<R> {
    /// # Errors
    ///
    /// [`GeoError`] when the outline is empty or flat along one axis.
    #[builder]
    pub fn new(
        repository: R,
        outline: Rings,
        #[builder(default = DEFAULT_VIEWPORT)] viewport: Viewport,
        #[builder(default)] include_incomplete_years: bool,
    ) -> Result<Self, RainMapError> {
        let view = ViewSession::from_outline(&outline, viewport)?;
        Ok(Self {
            repository,
            outline,
            view,
            include_incomplete_years,
        })
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn outline(&self) -> &Rings {
        &self.outline
    }

    pub fn view(&self) -> &ViewSession {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewSession {
        &mut self.view
    }

    /// The outline in screen coordinates under the current camera.
    pub fn project_outline(&self) -> Result<Vec<Vec<ScreenPoint>>, GeoError> {
        self.view.project_rings(&self.outline)
    }

    /// Markers of the stations currently visible in the viewport.
    pub async fn station_markers(&self) -> Result<Vec<(Station, ScreenPoint)>, RainMapError> {
        let stations = self.repository.all_stations().await?;
        let markers = self
            .view
            .project_stations(&stations)?
            .into_iter()
            .map(|(station, point)| (station.clone(), point))
            .collect();
        Ok(markers)
    }

    /// The station under the pointer, `None` when no station is close enough.
    pub async fn station_at(&self, pointer: ScreenPoint) -> Result<Option<Station>, RainMapError> {
        let point = self.view.to_geo(pointer)?;
        match self.repository.closest_station(point).await {
            Ok(station) => Ok(Some(station)),
            Err(RepositoryError::StationIndex(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Yearly totals of one station, oldest year first.
    pub async fn yearly_rainfall(
        &self,
        station_id: &str,
    ) -> Result<Vec<YearlyRainfall>, RainMapError> {
        let station_id = normalize_station_id(station_id);
        let records = self.repository.observations_for_station(&station_id).await?;
        let yearly = aggregate(&records);
        Ok(series_for_station(&yearly, &station_id))
    }

    pub async fn station_summary(&self, station_id: &str) -> Result<StationSummary, RainMapError> {
        let station = self
            .repository
            .station(station_id)
            .await?
            .ok_or_else(|| RepositoryError::UnknownStation(normalize_station_id(station_id)))?;
        let series = self.yearly_rainfall(&station.id).await?;
        let statistics = statistics(&series, self.include_incomplete_years).ok();
        Ok(StationSummary {
            station,
            series,
            statistics,
        })
    }

    /// Summary of the station under the pointer, if any.
    pub async fn summary_at(
        &self,
        pointer: ScreenPoint,
    ) -> Result<Option<StationSummary>, RainMapError> {
        match self.station_at(pointer).await? {
            Some(station) => Ok(Some(self.station_summary(&station.id).await?)),
            None => Ok(None),
        }
    }

    pub async fn import_department(&self, code: &str) -> Result<DepartmentImport, RainMapError> {
        Ok(self.repository.import_department(code).await?)
    }
}

impl RainMap<FileWeatherRepository> {
    /// Opens the map described by `config`: the file repository over its data and cache
    /// directories and the GeoJSON outline.
    pub async fn open(config: RainMapConfig) -> Result<Self, RainMapError> {
        let cache_dir = config.resolved_cache_dir()?;
        let repository = FileWeatherRepository::new(&config.data_dir, cache_dir)
            .await?
            .with_search_radius_km(config.closest_station_radius_km);
        let outline = GeoJsonOutline::new(&config.outline_path).load_async().await?;
        Self::builder()
            .repository(repository)
            .outline(outline)
            .viewport(config.viewport)
            .include_incomplete_years(config.include_incomplete_years)
            .build()
    }

    /// Downloads a department from data.gouv.fr into the data directory, then imports it.
    pub async fn download_department(
        &self,
        code: &str,
        client: &DataGouvClient,
    ) -> Result<DepartmentImport, RainMapError> {
        let files = client
            .download_department(code, self.repository.data_dir())
            .await?;
        info!("Downloaded {} files for department {}", files.len(), code);
        self.import_department(code).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stations::station_index::StationIndex;
    use crate::types::geo_point::GeoPoint;
    use crate::types::observation::ObservationRecord;
    use chrono::NaiveDate;

    struct MemoryRepository {
        index: StationIndex,
        records: Vec<ObservationRecord>,
    }

    impl WeatherRepository for MemoryRepository {
        async fn all_stations(&self) -> Result<Vec<Station>, RepositoryError> {
            Ok(self.index.all_stations().cloned().collect())
        }

        async fn observations_for_station(
            &self,
            station_id: &str,
        ) -> Result<Vec<ObservationRecord>, RepositoryError> {
            Ok(self
                .records
                .iter()
                .filter(|r| r.station_id == station_id)
                .cloned()
                .collect())
        }

        async fn closest_station(&self, point: GeoPoint) -> Result<Station, RepositoryError> {
            Ok(self.index.nearest(point)?.clone())
        }

        async fn import_department(&self, code: &str) -> Result<DepartmentImport, RepositoryError> {
            Err(RepositoryError::NoDatasetResource(code.to_string()))
        }

        async fn imported_departments(&self) -> Result<Vec<String>, RepositoryError> {
            Ok(Vec::new())
        }
    }

    fn square() -> Rings {
        vec![vec![
            GeoPoint::new(-5.0, 41.0),
            GeoPoint::new(10.0, 41.0),
            GeoPoint::new(10.0, 51.0),
            GeoPoint::new(-5.0, 51.0),
            GeoPoint::new(-5.0, 41.0),
        ]]
    }

    fn days(id: &str, year: i32, count: usize, rr: f64) -> Vec<ObservationRecord> {
        NaiveDate::from_ymd_opt(year, 1, 1)
            .unwrap()
            .iter_days()
            .take(count)
            .map(|d| ObservationRecord::new(id, d, rr))
            .collect()
    }

    fn map(stations: Vec<Station>) -> RainMap<MemoryRepository> {
        let mut records = days("75114001", 2020, 366, 1.0);
        records.extend(days("75114001", 2021, 100, 2.0));
        RainMap::builder()
            .repository(MemoryRepository {
                index: StationIndex::new(stations),
                records,
            })
            .outline(square())
            .build()
            .unwrap()
    }

    fn paris() -> Station {
        Station::new("75114001", "PARIS-MONTSOURIS", GeoPoint::new(2.35, 48.85), 75.0)
    }

    #[test]
    fn test_empty_outline_rejected() {
        let result = RainMap::builder()
            .repository(MemoryRepository {
                index: StationIndex::default(),
                records: Vec::new(),
            })
            .outline(Vec::new())
            .build();
        assert!(matches!(result, Err(RainMapError::Geo(GeoError::EmptyInput))));
    }

    #[tokio::test]
    async fn test_pointer_to_station() {
        let map = map(vec![paris()]);
        // (2.35 + 5) * 600 / 15, 600 - (48.85 - 41) * 600 / 10
        let pointer = ScreenPoint::new(294.0, 129.0);
        assert_eq!(map.station_at(pointer).await.unwrap(), Some(paris()));

        let markers = map.station_markers().await.unwrap();
        assert_eq!(markers.len(), 1);
        assert!((markers[0].1.x - 294.0).abs() < 1e-9);
        assert!((markers[0].1.y - 129.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_no_station_loaded_is_none() {
        let map = map(Vec::new());
        assert_eq!(map.station_at(ScreenPoint::new(300.0, 300.0)).await.unwrap(), None);
        assert!(map.summary_at(ScreenPoint::new(300.0, 300.0)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_summary_excludes_incomplete_years() {
        let map = map(vec![paris()]);
        let summary = map.summary_at(ScreenPoint::new(294.0, 129.0)).await.unwrap().unwrap();
        assert_eq!(summary.station, paris());
        assert_eq!(summary.series.len(), 2);
        assert!(summary.series[0].is_complete);
        assert!(!summary.series[1].is_complete);

        let stats = summary.statistics.unwrap();
        assert_eq!(stats.years, 1);
        assert_eq!(stats.min_mm, 366.0);
        assert_eq!(stats.max_mm, 366.0);
        assert_eq!(stats.average_mm, 366.0);
    }

    #[tokio::test]
    async fn test_unknown_station_summary() {
        let map = map(vec![paris()]);
        assert!(matches!(
            map.station_summary("13054001").await,
            Err(RainMapError::Repository(RepositoryError::UnknownStation(_)))
        ));
    }

    #[tokio::test]
    async fn test_open_from_config() {
        let root = tempfile::tempdir().unwrap();
        let outline_path = root.path().join("outline.geojson");
        std::fs::write(
            &outline_path,
            r#"{"type":"Feature","geometry":{"type":"Polygon","coordinates":[[[-5,41],[10,41],[10,51],[-5,51],[-5,41]]]}}"#,
        )
        .unwrap();
        let data_dir = root.path().join("data");
        std::fs::create_dir(&data_dir).unwrap();
        let mut csv = String::from("NUM_POSTE;NOM_USUEL;LAT;LON;ALTI;AAAAMMJJ;RR\n");
        for day in NaiveDate::from_ymd_opt(2019, 1, 1).unwrap().iter_days().take(365) {
            csv.push_str(&format!(
                "75114001;PARIS-MONTSOURIS;48.85;2.35;75;{};0.5\n",
                day.format("%Y%m%d")
            ));
        }
        std::fs::write(data_dir.join("Q_75_previous-1950-2024_RR-T-Vent.csv"), csv).unwrap();

        let config = RainMapConfig::builder()
            .data_dir(&data_dir)
            .cache_dir(root.path().join("cache"))
            .outline_path(&outline_path)
            .build();
        let map = RainMap::open(config).await.unwrap();
        assert_eq!(map.view().bounds().min_long, -5.0);

        let import = map.import_department("75").await.unwrap();
        assert_eq!(import.records.len(), 365);

        let summary = map.summary_at(ScreenPoint::new(294.0, 129.0)).await.unwrap().unwrap();
        assert_eq!(summary.station.id, "75114001");
        assert_eq!(summary.series.len(), 1);
        assert_eq!(summary.series[0].total_rainfall_mm, 182.5);

        // Far from Paris, outside the 10 km default radius.
        assert!(map.station_at(ScreenPoint::new(10.0, 590.0)).await.unwrap().is_none());
    }
}
