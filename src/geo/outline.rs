//! Loading the national outline that the map is drawn from.

use crate::geo::error::GeoError;
use crate::types::geo_point::GeoPoint;
use log::info;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// An outline made of closed rings of points.
pub type Rings = Vec<Vec<GeoPoint>>;

/// Something that can provide the rings of the outline to draw.
pub trait GeoOutlineSource {
    fn load(&self) -> Result<Rings, GeoError>;
}

/// An outline already held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticOutline(pub Rings);

impl GeoOutlineSource for StaticOutline {
    fn load(&self) -> Result<Rings, GeoError> {
        Ok(self.0.clone())
    }
}

/// Reads a GeoJSON file holding a `Polygon` or `MultiPolygon`, either bare, wrapped in a
/// `Feature`, or as features of a `FeatureCollection`.
#[derive(Debug, Clone)]
pub struct GeoJsonOutline {
    path: PathBuf,
}

#[derive(Deserialize)]
struct Document {
    #[serde(rename = "type")]
    kind: String,
    geometry: Option<RawGeometry>,
    features: Option<Vec<FeatureOnly>>,
    coordinates: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct FeatureOnly {
    geometry: RawGeometry,
}

#[derive(Deserialize)]
struct RawGeometry {
    #[serde(rename = "type")]
    kind: String,
    coordinates: serde_json::Value,
}

type Position = Vec<f64>;

impl GeoJsonOutline {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parses an in-memory GeoJSON document.
    pub fn parse(&self, bytes: &[u8]) -> Result<Rings, GeoError> {
        let document: Document = serde_json::from_slice(bytes)
            .map_err(|e| GeoError::OutlineParse(self.path.clone(), e))?;
        let geometries = match (document.kind.as_str(), document.geometry, document.features) {
            ("Feature", Some(geometry), _) => vec![geometry],
            ("FeatureCollection", _, Some(features)) => {
                features.into_iter().map(|f| f.geometry).collect()
            }
            (kind, _, _) => vec![RawGeometry {
                kind: kind.to_string(),
                coordinates: document.coordinates.unwrap_or(serde_json::Value::Null),
            }],
        };

        let mut rings = Vec::new();
        for geometry in geometries {
            rings.extend(self.geometry_rings(geometry)?);
        }
        Ok(rings)
    }

    /// Reads the file on a blocking thread.
    pub async fn load_async(&self) -> Result<Rings, GeoError> {
        let source = self.clone();
        tokio::task::spawn_blocking(move || source.load()).await?
    }

    fn geometry_rings(&self, geometry: RawGeometry) -> Result<Rings, GeoError> {
        let to_ring = |ring: Vec<Position>| -> Vec<GeoPoint> {
            ring.into_iter()
                .filter(|pos| pos.len() >= 2)
                .map(|pos| GeoPoint::new(pos[0], pos[1]))
                .collect()
        };
        match geometry.kind.as_str() {
            "Polygon" => {
                let polygon: Vec<Vec<Position>> = serde_json::from_value(geometry.coordinates)
                    .map_err(|e| GeoError::OutlineParse(self.path.clone(), e))?;
                Ok(polygon.into_iter().map(to_ring).collect())
            }
            "MultiPolygon" => {
                let polygons: Vec<Vec<Vec<Position>>> =
                    serde_json::from_value(geometry.coordinates)
                        .map_err(|e| GeoError::OutlineParse(self.path.clone(), e))?;
                Ok(polygons.into_iter().flatten().map(to_ring).collect())
            }
            other => Err(GeoError::UnsupportedGeometry(other.to_string())),
        }
    }
}

impl GeoOutlineSource for GeoJsonOutline {
    fn load(&self) -> Result<Rings, GeoError> {
        let bytes =
            std::fs::read(&self.path).map_err(|e| GeoError::OutlineRead(self.path.clone(), e))?;
        let rings = self.parse(&bytes)?;
        info!(
            "Loaded outline {:?}: {} rings, {} points",
            self.path,
            rings.len(),
            rings.iter().map(Vec::len).sum::<usize>()
        );
        Ok(rings)
    }
}
