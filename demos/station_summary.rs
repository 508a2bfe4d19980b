//! Imports a department from `./data` and prints the yearly rainfall of the station
//! closest to a point.
//!
//! `cargo run --example station_summary -- 35 -1.68 48.11`

use rainmap::{GeoPoint, RainMap, RainMapConfig, RainMapError, WeatherRepository};
use std::env;

#[tokio::main]
async fn main() -> Result<(), RainMapError> {
    let args: Vec<String> = env::args().skip(1).collect();
    let department = args.first().map(String::as_str).unwrap_or("35");
    let lon = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(-1.734);
    let lat = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(48.0688);

    let map = RainMap::open(RainMapConfig::default()).await?;
    let import = map.import_department(department).await?;
    println!(
        "Department {}: {} stations, {} daily observations (snapshot {})",
        import.department,
        import.stations.len(),
        import.records.len(),
        import.version
    );

    let station = map.repository().closest_station(GeoPoint::new(lon, lat)).await?;
    let summary = map.station_summary(&station.id).await?;
    println!(
        "{} ({}), {} m",
        summary.station.common_name, summary.station.id, summary.station.altitude
    );
    for year in &summary.series {
        let flag = if year.is_complete { "" } else { " (incomplete)" };
        println!(
            "  {}: {:>7.1} mm over {} days{}",
            year.year, year.total_rainfall_mm, year.observed_days, flag
        );
    }
    match summary.statistics {
        Some(stats) => println!(
            "Moyenne {:.1} mm, min {:.1} mm, max {:.1} mm ({} complete years, {}-{})",
            stats.average_mm,
            stats.min_mm,
            stats.max_mm,
            stats.years,
            stats.first_year,
            stats.last_year
        ),
        None => println!("No complete year"),
    }
    Ok(())
}
