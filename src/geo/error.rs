use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("Cannot compute bounds of an empty set of points")]
    EmptyInput,

    #[error("Bounds have a zero-span axis (longitude {min_long}..{max_long}, latitude {min_lat}..{max_lat})")]
    DegenerateBounds {
        min_long: f64,
        max_long: f64,
        min_lat: f64,
        max_lat: f64,
    },

    #[error("Bounds are not ordered: min must not exceed max (longitude {min_long}..{max_long}, latitude {min_lat}..{max_lat})")]
    InvalidBounds {
        min_long: f64,
        max_long: f64,
        min_lat: f64,
        max_lat: f64,
    },

    #[error("Camera zoom must be a positive finite number, got {0}")]
    InvalidCamera(f64),

    #[error("Viewport must have a positive size, got {width_px}x{height_px}")]
    InvalidViewport { width_px: f64, height_px: f64 },

    #[error("Failed to read outline file '{0}'")]
    OutlineRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse GeoJSON outline '{0}'")]
    OutlineParse(PathBuf, #[source] serde_json::Error),

    #[error("Unsupported outline geometry type '{0}', expected Polygon or MultiPolygon")]
    UnsupportedGeometry(String),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
