//! Conversion between geographic coordinates and screen pixels.
//!
//! The base projection is a plain equirectangular stretch of the outline [`Bounds`] onto
//! the [`Viewport`], with the Y axis flipped so that north is up. A [`Camera`] is then
//! applied on top:
//!
//! ```text
//! screen_x = (raw_x - offset_x) * zoom
//! screen_y = (raw_y + offset_y) * zoom
//! ```
//!
//! The X offset is subtracted and the Y offset added. Drag handling in
//! [`Camera::drag`] is written against that convention.

use crate::geo::bounds::Bounds;
use crate::geo::error::GeoError;
use crate::types::geo_point::{GeoPoint, ScreenPoint};

/// Size of the drawing surface in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width_px: f64,
    pub height_px: f64,
}

impl Viewport {
    pub fn new(width_px: f64, height_px: f64) -> Result<Self, GeoError> {
        if !(width_px > 0.0 && height_px > 0.0 && width_px.is_finite() && height_px.is_finite()) {
            return Err(GeoError::InvalidViewport {
                width_px,
                height_px,
            });
        }
        Ok(Self {
            width_px,
            height_px,
        })
    }

    /// True when `point` lies inside the drawing surface (edges included).
    pub fn contains(&self, point: &ScreenPoint) -> bool {
        (0.0..=self.width_px).contains(&point.x) && (0.0..=self.height_px).contains(&point.y)
    }
}

/// Pan and zoom applied on top of the base projection.
///
/// The zoom factor is always strictly positive; every constructor and mutator checks it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    offset_x: f64,
    offset_y: f64,
    zoom: f64,
}

impl Default for Camera {
    /// No pan, zoom 1.
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            zoom: 1.0,
        }
    }
}

impl Camera {
    pub fn new(offset_x: f64, offset_y: f64, zoom: f64) -> Result<Self, GeoError> {
        check_zoom(zoom)?;
        Ok(Self {
            offset_x,
            offset_y,
            zoom,
        })
    }

    pub fn offset_x(&self) -> f64 {
        self.offset_x
    }

    pub fn offset_y(&self) -> f64 {
        self.offset_y
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Adds raw offsets (pre-zoom units) to the current pan.
    pub fn pan(&mut self, delta_x: f64, delta_y: f64) {
        self.offset_x += delta_x;
        self.offset_y += delta_y;
    }

    /// Applies a pointer drag of `(dx, dy)` screen pixels so the map follows the pointer.
    ///
    /// Deltas accumulate across gestures.
    pub fn drag(&mut self, dx: f64, dy: f64) {
        self.offset_x -= dx / self.zoom;
        self.offset_y += dy / self.zoom;
    }

    pub fn set_zoom(&mut self, zoom: f64) -> Result<(), GeoError> {
        check_zoom(zoom)?;
        self.zoom = zoom;
        Ok(())
    }

    /// Multiplies the zoom by `factor`, keeping the map point under `anchor` in place.
    pub fn zoom_at(&mut self, factor: f64, anchor: ScreenPoint) -> Result<(), GeoError> {
        let new_zoom = self.zoom * factor;
        check_zoom(new_zoom)?;
        let raw_x = anchor.x / self.zoom + self.offset_x;
        let raw_y = anchor.y / self.zoom - self.offset_y;
        self.offset_x = raw_x - anchor.x / new_zoom;
        self.offset_y = anchor.y / new_zoom - raw_y;
        self.zoom = new_zoom;
        Ok(())
    }

    /// Back to no pan and zoom 1.
    pub fn reset(&mut self) {
        *self = Camera::default();
    }
}

fn check_zoom(zoom: f64) -> Result<(), GeoError> {
    if zoom > 0.0 && zoom.is_finite() {
        Ok(())
    } else {
        Err(GeoError::InvalidCamera(zoom))
    }
}

fn scales(viewport: &Viewport, bounds: &Bounds) -> Result<(f64, f64), GeoError> {
    if bounds.is_degenerate() {
        return Err(GeoError::DegenerateBounds {
            min_long: bounds.min_long,
            max_long: bounds.max_long,
            min_lat: bounds.min_lat,
            max_lat: bounds.max_lat,
        });
    }
    Ok((
        viewport.width_px / bounds.long_span(),
        viewport.height_px / bounds.lat_span(),
    ))
}

/// Maps a geographic point to screen pixels.
///
/// # Errors
///
/// Returns [`GeoError::DegenerateBounds`] when either axis of `bounds` has zero span.
///
/// # Examples
///
/// ```
/// use rainmap::{project, Bounds, Camera, GeoPoint, Viewport};
///
/// let bounds = Bounds::new(-5.0, 10.0, 41.0, 51.0).unwrap();
/// let viewport = Viewport::new(600.0, 600.0).unwrap();
/// let camera = Camera::default();
/// let top_left = project(GeoPoint::new(-5.0, 51.0), &viewport, &bounds, &camera).unwrap();
/// assert_eq!((top_left.x, top_left.y), (0.0, 0.0));
/// ```
pub fn project(
    point: GeoPoint,
    viewport: &Viewport,
    bounds: &Bounds,
    camera: &Camera,
) -> Result<ScreenPoint, GeoError> {
    let (scale_x, scale_y) = scales(viewport, bounds)?;
    let raw_x = (point.longitude - bounds.min_long) * scale_x;
    let raw_y = viewport.height_px - (point.latitude - bounds.min_lat) * scale_y;
    Ok(ScreenPoint {
        x: (raw_x - camera.offset_x) * camera.zoom,
        y: (raw_y + camera.offset_y) * camera.zoom,
    })
}

/// Maps screen pixels back to a geographic point; the exact inverse of [`project`].
///
/// # Errors
///
/// Returns [`GeoError::DegenerateBounds`] when either axis of `bounds` has zero span.
pub fn unproject(
    point: ScreenPoint,
    viewport: &Viewport,
    bounds: &Bounds,
    camera: &Camera,
) -> Result<GeoPoint, GeoError> {
    let (scale_x, scale_y) = scales(viewport, bounds)?;
    let raw_x = point.x / camera.zoom + camera.offset_x;
    let raw_y = point.y / camera.zoom - camera.offset_y;
    Ok(GeoPoint {
        longitude: bounds.min_long + raw_x / scale_x,
        latitude: bounds.min_lat + (viewport.height_px - raw_y) / scale_y,
    })
}
