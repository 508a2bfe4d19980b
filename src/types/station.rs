//! Defines the Météo-France weather station record, along with the implementations
//! needed to store stations in an `rstar` R-tree.

use crate::types::geo_point::GeoPoint;
use rstar::{PointDistance, RTreeObject, AABB};
use serde::{Deserialize, Serialize};

/// Length of a Météo-France station number (`NUM_POSTE`): 2 digits of department
/// followed by 6 digits.
pub const STATION_ID_LEN: usize = 8;

/// A weather-observation post.
///
/// Stations are immutable once built. Two imports of the same `id` are expected to
/// carry the same attributes; when they don't, the most recently loaded one wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// The station number, e.g. `"75114001"`.
    pub id: String,
    /// The usual name of the post (`NOM_USUEL`), e.g. `"PARIS-MONTSOURIS"`.
    pub common_name: String,
    /// Position of the post.
    pub location: GeoPoint,
    /// Altitude in meters.
    pub altitude: f64,
}

impl Station {
    pub fn new(
        id: impl Into<String>,
        common_name: impl Into<String>,
        location: GeoPoint,
        altitude: f64,
    ) -> Self {
        Self {
            id: id.into(),
            common_name: common_name.into(),
            location,
            altitude,
        }
    }

    /// Department code the station belongs to (the first two digits of its id).
    pub fn department(&self) -> &str {
        self.id.get(..2).unwrap_or(&self.id)
    }
}

/// Restores the leading zero that numeric columns drop from ids of departments 01-09.
///
/// ```
/// use rainmap::normalize_station_id;
///
/// assert_eq!(normalize_station_id("1014002"), "01014002");
/// assert_eq!(normalize_station_id(" 75114001 "), "75114001");
/// ```
pub fn normalize_station_id(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.len() < STATION_ID_LEN && trimmed.chars().all(|c| c.is_ascii_digit()) {
        format!("{:0>width$}", trimmed, width = STATION_ID_LEN)
    } else {
        trimmed.to_string()
    }
}

/// Zero-pads a department code to two characters (`"1"` → `"01"`).
pub fn normalize_department(code: &str) -> String {
    let trimmed = code.trim();
    if trimmed.len() == 1 {
        format!("0{}", trimmed)
    } else {
        trimmed.to_string()
    }
}

// --- R-Tree Implementations ---

/// Stations are points in (longitude, latitude) space.
impl RTreeObject for Station {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.location.as_rtree_point())
    }
}

impl PointDistance for Station {
    /// Squared planar distance to `[longitude, latitude]`.
    ///
    /// Treats degrees as Cartesian coordinates, which is good enough at the scale of
    /// metropolitan France.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.location.longitude - point[0];
        let dy = self.location.latitude - point[1];
        dx * dx + dy * dy
    }
}
