//! Loads the France outline and shows how the camera moves projected points.
//!
//! `cargo run --example project_outline -- data/geo/metropole-version-simplifiee.geojson`

use rainmap::{
    GeoJsonOutline, GeoPoint, RainMapError, ScreenPoint, ViewSession, DEFAULT_OUTLINE_PATH,
    DEFAULT_VIEWPORT,
};
use std::env;

#[tokio::main]
async fn main() -> Result<(), RainMapError> {
    let path = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_OUTLINE_PATH.to_string());
    let rings = GeoJsonOutline::new(&path).load_async().await?;
    let mut view = ViewSession::from_outline(&rings, DEFAULT_VIEWPORT)?;

    let bounds = *view.bounds();
    println!(
        "{} rings, longitude {:.3}..{:.3}, latitude {:.3}..{:.3}",
        rings.len(),
        bounds.min_long,
        bounds.max_long,
        bounds.min_lat,
        bounds.max_lat
    );
    for corner in [
        GeoPoint::new(bounds.min_long, bounds.max_lat),
        GeoPoint::new(bounds.max_long, bounds.min_lat),
    ] {
        println!("{:?} -> {:?}", corner, view.to_screen(corner)?.rounded());
    }

    let paris = GeoPoint::new(2.3522, 48.8566);
    println!("Paris at {:?}", view.to_screen(paris)?.rounded());

    view.drag(40.0, -25.0);
    view.zoom_at(2.0, ScreenPoint::new(300.0, 300.0))?;
    let moved = view.to_screen(paris)?;
    let back = view.to_geo(moved)?;
    println!(
        "After drag and zoom x{}: Paris at {:?}, unprojected to ({:.6}, {:.6})",
        view.camera().zoom(),
        moved.rounded(),
        back.longitude,
        back.latitude
    );
    Ok(())
}
