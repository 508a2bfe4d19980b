//! Geographic and screen-space coordinate value types.

use serde::{Deserialize, Serialize};

/// A geographic coordinate in decimal degrees.
///
/// No range is enforced; callers are expected to hand in valid WGS84 longitude/latitude
/// pairs (the outline and station datasets always do).
///
/// # Examples
///
/// ```
/// use rainmap::GeoPoint;
///
/// let paris = GeoPoint::new(2.3522, 48.8566);
/// assert_eq!(paris.longitude, 2.3522);
/// assert_eq!(paris.latitude, 48.8566);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Longitude in decimal degrees (positive for East).
    pub longitude: f64,
    /// Latitude in decimal degrees (positive for North).
    pub latitude: f64,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Squared planar distance in (longitude, latitude) degrees.
    pub fn planar_distance_2(&self, other: &GeoPoint) -> f64 {
        let dx = self.longitude - other.longitude;
        let dy = self.latitude - other.latitude;
        dx * dx + dy * dy
    }

    /// Great-circle distance in kilometers.
    pub fn haversine_km(&self, other: &GeoPoint) -> f64 {
        haversine::distance(
            haversine::Location {
                latitude: self.latitude,
                longitude: self.longitude,
            },
            haversine::Location {
                latitude: other.latitude,
                longitude: other.longitude,
            },
            haversine::Units::Kilometers,
        )
    }

    pub(crate) fn as_rtree_point(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

/// A position in screen pixels, origin at the top-left corner of the viewport.
///
/// Coordinates are kept as real numbers so that [`crate::unproject`] stays an exact inverse;
/// use [`ScreenPoint::rounded`] when a pixel grid is needed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Snaps to the nearest pixel, for drawing.
    pub fn rounded(&self) -> (i64, i64) {
        (self.x.round() as i64, self.y.round() as i64)
    }
}
