use crate::geo::error::GeoError;
use crate::rainfall::error::RainfallError;
use crate::repository::error::RepositoryError;
use crate::stations::error::StationIndexError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RainMapError {
    #[error(transparent)]
    Geo(#[from] GeoError),

    #[error(transparent)]
    StationIndex(#[from] StationIndexError),

    #[error(transparent)]
    Rainfall(#[from] RainfallError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
