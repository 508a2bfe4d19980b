//! A single map session: fixed outline bounds and viewport plus the mutable camera.

use crate::geo::bounds::{compute_bounds, Bounds};
use crate::geo::error::GeoError;
use crate::geo::outline::Rings;
use crate::geo::projection::{project, unproject, Camera, Viewport};
use crate::stations::station_index::StationIndex;
use crate::types::geo_point::{GeoPoint, ScreenPoint};
use crate::types::station::Station;

/// Owns everything needed to go between the map on screen and geographic coordinates.
///
/// Bounds and viewport are fixed for the lifetime of the session. The camera is only
/// mutated through `&mut self`, so a single pointer handler drives it.
#[derive(Debug, Clone)]
pub struct ViewSession {
    bounds: Bounds,
    viewport: Viewport,
    camera: Camera,
}

impl ViewSession {
    /// Starts a session with an identity camera.
    ///
    /// # Errors
    ///
    /// [`GeoError::DegenerateBounds`] when `bounds` has a zero-span axis, so that later
    /// projections cannot fail.
    pub fn new(bounds: Bounds, viewport: Viewport) -> Result<Self, GeoError> {
        if bounds.is_degenerate() {
            return Err(GeoError::DegenerateBounds {
                min_long: bounds.min_long,
                max_long: bounds.max_long,
                min_lat: bounds.min_lat,
                max_lat: bounds.max_lat,
            });
        }
        Ok(Self {
            bounds,
            viewport,
            camera: Camera::default(),
        })
    }

    /// Starts a session framing the given outline.
    pub fn from_outline(rings: &Rings, viewport: Viewport) -> Result<Self, GeoError> {
        let bounds = compute_bounds(rings.iter().flatten())?;
        Self::new(bounds, viewport)
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn drag(&mut self, dx: f64, dy: f64) {
        self.camera.drag(dx, dy);
    }

    pub fn zoom_at(&mut self, factor: f64, anchor: ScreenPoint) -> Result<(), GeoError> {
        self.camera.zoom_at(factor, anchor)
    }

    pub fn to_screen(&self, point: GeoPoint) -> Result<ScreenPoint, GeoError> {
        project(point, &self.viewport, &self.bounds, &self.camera)
    }

    pub fn to_geo(&self, point: ScreenPoint) -> Result<GeoPoint, GeoError> {
        unproject(point, &self.viewport, &self.bounds, &self.camera)
    }

    /// Projects every ring of an outline, keeping the ring structure for line drawing.
    pub fn project_rings(&self, rings: &Rings) -> Result<Vec<Vec<ScreenPoint>>, GeoError> {
        rings
            .iter()
            .map(|ring| ring.iter().map(|p| self.to_screen(*p)).collect())
            .collect()
    }

    /// Projects station markers that land inside the viewport, paired with their station.
    pub fn project_stations<'a>(
        &self,
        stations: impl IntoIterator<Item = &'a Station>,
    ) -> Result<Vec<(&'a Station, ScreenPoint)>, GeoError> {
        let mut markers = Vec::new();
        for station in stations {
            let point = self.to_screen(station.location)?;
            if self.viewport.contains(&point) {
                markers.push((station, point));
            }
        }
        Ok(markers)
    }

    /// The station closest to a pointer position, or `None` when nothing is loaded yet.
    pub fn station_at<'a>(
        &self,
        pointer: ScreenPoint,
        index: &'a StationIndex,
    ) -> Option<&'a Station> {
        let geo = self.to_geo(pointer).ok()?;
        index.nearest(geo).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> ViewSession {
        ViewSession::new(
            Bounds::new(-5.0, 10.0, 41.0, 51.0).unwrap(),
            Viewport::new(600.0, 600.0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_degenerate_outline_rejected() {
        let rings = vec![vec![GeoPoint::new(2.0, 45.0), GeoPoint::new(2.0, 46.0)]];
        let viewport = Viewport::new(100.0, 100.0).unwrap();
        assert!(matches!(
            ViewSession::from_outline(&rings, viewport),
            Err(GeoError::DegenerateBounds { .. })
        ));
        assert!(matches!(
            ViewSession::from_outline(&vec![], viewport),
            Err(GeoError::EmptyInput)
        ));
    }

    #[test]
    fn test_project_rings_keeps_structure() {
        let rings = vec![
            vec![GeoPoint::new(-5.0, 51.0), GeoPoint::new(10.0, 41.0)],
            vec![GeoPoint::new(2.5, 46.0)],
        ];
        let projected = session().project_rings(&rings).unwrap();
        assert_eq!(projected.len(), 2);
        assert_eq!(projected[0][1], ScreenPoint::new(600.0, 600.0));
        assert_eq!(projected[1][0], ScreenPoint::new(300.0, 300.0));
    }

    #[test]
    fn test_station_markers_clipped_to_viewport() {
        let inside = Station::new("75114001", "PARIS", GeoPoint::new(2.33, 48.82), 75.0);
        let outside = Station::new("97101001", "POINTE-A-PITRE", GeoPoint::new(-61.5, 16.2), 10.0);
        let stations = vec![inside.clone(), outside];
        let markers = session().project_stations(&stations).unwrap();
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].0, &inside);
    }

    #[test]
    fn test_station_at_pointer() {
        let mut index = StationIndex::default();
        let mut view = session();
        assert!(view.station_at(ScreenPoint::new(10.0, 10.0), &index).is_none());

        index.load(vec![
            Station::new("A", "Brest", GeoPoint::new(-4.49, 48.39), 94.0),
            Station::new("B", "Nice", GeoPoint::new(7.21, 43.65), 2.0),
        ]);
        let nice_on_screen = view.to_screen(GeoPoint::new(7.2, 43.6)).unwrap();
        assert_eq!(view.station_at(nice_on_screen, &index).unwrap().id, "B");

        // After panning, the same pixel points somewhere else.
        view.drag(-400.0, 0.0);
        let brest_on_screen = view.to_screen(GeoPoint::new(-4.5, 48.4)).unwrap();
        assert_eq!(view.station_at(brest_on_screen, &index).unwrap().id, "A");
    }
}
