//! Axis-aligned bounding box of a geographic outline.

use crate::geo::error::GeoError;
use crate::types::geo_point::GeoPoint;

/// The smallest longitude/latitude box enclosing an outline.
///
/// Computed once per loaded outline via [`compute_bounds`] and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_long: f64,
    pub max_long: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl Bounds {
    /// Builds bounds from explicit limits, rejecting `min > max` on either axis.
    pub fn new(min_long: f64, max_long: f64, min_lat: f64, max_lat: f64) -> Result<Self, GeoError> {
        if !(min_long <= max_long && min_lat <= max_lat) {
            return Err(GeoError::InvalidBounds {
                min_long,
                max_long,
                min_lat,
                max_lat,
            });
        }
        Ok(Self {
            min_long,
            max_long,
            min_lat,
            max_lat,
        })
    }

    pub fn long_span(&self) -> f64 {
        self.max_long - self.min_long
    }

    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// True when either axis has zero width, which leaves the projection scale undefined.
    pub fn is_degenerate(&self) -> bool {
        self.long_span() == 0.0 || self.lat_span() == 0.0
    }

    pub fn contains_point(&self, point: &GeoPoint) -> bool {
        self.min_long <= point.longitude
            && point.longitude <= self.max_long
            && self.min_lat <= point.latitude
            && point.latitude <= self.max_lat
    }

    /// True when `other` lies entirely within `self` (edges included).
    pub fn contains(&self, other: &Bounds) -> bool {
        self.min_long <= other.min_long
            && other.max_long <= self.max_long
            && self.min_lat <= other.min_lat
            && other.max_lat <= self.max_lat
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.min_long + self.max_long) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }

    fn extend(&mut self, point: &GeoPoint) {
        self.min_long = self.min_long.min(point.longitude);
        self.max_long = self.max_long.max(point.longitude);
        self.min_lat = self.min_lat.min(point.latitude);
        self.max_lat = self.max_lat.max(point.latitude);
    }
}

/// Computes the bounding box of every point yielded by `points`.
///
/// Nested rings and polygons should be flattened by the caller, e.g. with
/// `rings.iter().flatten()`.
///
/// # Errors
///
/// Returns [`GeoError::EmptyInput`] when `points` yields nothing.
///
/// # Examples
///
/// ```
/// use rainmap::{compute_bounds, GeoPoint};
///
/// let outline = vec![
///     vec![GeoPoint::new(-5.0, 48.0), GeoPoint::new(2.0, 51.0)],
///     vec![GeoPoint::new(10.0, 41.0)],
/// ];
/// let bounds = compute_bounds(outline.iter().flatten()).unwrap();
/// assert_eq!(bounds.min_long, -5.0);
/// assert_eq!(bounds.max_lat, 51.0);
/// ```
pub fn compute_bounds<'a, I>(points: I) -> Result<Bounds, GeoError>
where
    I: IntoIterator<Item = &'a GeoPoint>,
{
    let mut iter = points.into_iter();
    let first = iter.next().ok_or(GeoError::EmptyInput)?;
    let mut bounds = Bounds {
        min_long: first.longitude,
        max_long: first.longitude,
        min_lat: first.latitude,
        max_lat: first.latitude,
    };
    for point in iter {
        bounds.extend(point);
    }
    Ok(bounds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(f64, f64)]) -> Vec<GeoPoint> {
        coords.iter().map(|&(lon, lat)| GeoPoint::new(lon, lat)).collect()
    }

    #[test]
    fn test_empty_input_fails() {
        let empty: Vec<GeoPoint> = vec![];
        assert!(matches!(compute_bounds(&empty), Err(GeoError::EmptyInput)));
    }

    #[test]
    fn test_exact_span() {
        let points = pts(&[(2.0, 48.0), (-5.0, 51.0), (10.0, 41.0), (3.0, 45.0)]);
        let b = compute_bounds(&points).unwrap();
        assert_eq!(
            b,
            Bounds {
                min_long: -5.0,
                max_long: 10.0,
                min_lat: 41.0,
                max_lat: 51.0
            }
        );
    }

    #[test]
    fn test_single_point_is_degenerate() {
        let points = pts(&[(2.0, 48.0)]);
        let b = compute_bounds(&points).unwrap();
        assert!(b.is_degenerate());
    }

    // The first point being the extreme on one axis must not hide the other axis' extreme.
    #[test]
    fn test_monotonic_first_point_extremes() {
        let points = pts(&[(10.0, 51.0), (-5.0, 41.0)]);
        let b = compute_bounds(&points).unwrap();
        assert_eq!((b.min_long, b.max_long, b.min_lat, b.max_lat), (-5.0, 10.0, 41.0, 51.0));
    }

    #[test]
    fn test_superset_never_shrinks() {
        let small = pts(&[(1.0, 46.0), (2.5, 47.0), (0.3, 45.2)]);
        let mut large = small.clone();
        large.extend(pts(&[(1.5, 46.5), (-1.0, 49.0), (7.0, 43.0)]));
        let b_small = compute_bounds(&small).unwrap();
        let b_large = compute_bounds(&large).unwrap();
        assert!(b_large.contains(&b_small));

        // Adding points already inside keeps the box identical.
        let mut same = small.clone();
        same.push(GeoPoint::new(1.0, 46.0));
        assert_eq!(compute_bounds(&same).unwrap(), b_small);
    }

    #[test]
    fn test_nested_rings_flatten() {
        let rings = vec![pts(&[(0.0, 0.0), (1.0, 1.0)]), pts(&[(-3.0, 2.0)])];
        let b = compute_bounds(rings.iter().flatten()).unwrap();
        assert_eq!(b.min_long, -3.0);
        assert_eq!(b.max_lat, 2.0);
    }

    #[test]
    fn test_new_rejects_unordered() {
        assert!(matches!(
            Bounds::new(10.0, -5.0, 41.0, 51.0),
            Err(GeoError::InvalidBounds { .. })
        ));
        let b = Bounds::new(-5.0, 10.0, 41.0, 51.0).unwrap();
        assert!(b.contains_point(&b.center()));
        assert!(!b.contains_point(&GeoPoint::new(11.0, 45.0)));
    }
}
