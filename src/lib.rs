mod config;
mod error;
mod geo;
mod rainfall;
mod rainmap;
mod repository;
mod stations;
mod types;
mod utils;

pub use config::*;
pub use error::RainMapError;
pub use rainmap::*;

pub use geo::bounds::{compute_bounds, Bounds};
pub use geo::outline::{GeoJsonOutline, GeoOutlineSource, Rings, StaticOutline};
pub use geo::projection::{project, unproject, Camera, Viewport};
pub use geo::view::ViewSession;

pub use stations::station_index::StationIndex;

pub use rainfall::aggregator::{
    aggregate, average, merge, min_max, series_for_station, statistics, RainfallStatistics,
    YearlyRainfallMap,
};

pub use repository::datagouv::{department_resources, DataGouvClient, DatasetResource};
pub use repository::file_repository::FileWeatherRepository;
pub use repository::snapshot::WeatherSnapshot;
pub use repository::{DepartmentImport, WeatherRepository};

pub use types::geo_point::{GeoPoint, ScreenPoint};
pub use types::observation::ObservationRecord;
pub use types::station::*;
pub use types::yearly_rainfall::*;

pub use geo::error::GeoError;
pub use rainfall::error::RainfallError;
pub use repository::error::RepositoryError;
pub use stations::error::StationIndexError;
