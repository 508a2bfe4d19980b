use crate::stations::error::StationIndexError;
use crate::types::geo_point::GeoPoint;
use crate::types::station::{normalize_department, Station};
use ordered_float::OrderedFloat;
use rstar::RTree;
use std::collections::BTreeMap;

/// Rough length of one degree of latitude.
const KM_PER_DEGREE: f64 = 111.0;

/// The set of known stations, answering closest-station queries.
///
/// Stations are keyed by id: loading a station whose id is already present replaces
/// the previous entry. Distances for [`StationIndex::nearest`] are planar in
/// (longitude, latitude) degrees, which is fine at the scale of a country.
#[derive(Debug, Clone)]
pub struct StationIndex {
    by_id: BTreeMap<String, Station>,
    rtree: RTree<Station>,
}

impl Default for StationIndex {
    fn default() -> Self {
        Self {
            by_id: BTreeMap::new(),
            rtree: RTree::new(),
        }
    }
}

impl StationIndex {
    pub fn new(stations: impl IntoIterator<Item = Station>) -> Self {
        let mut index = Self::default();
        index.load(stations);
        index
    }

    /// Merges `stations` into the index; the last station seen for an id wins.
    pub fn load(&mut self, stations: impl IntoIterator<Item = Station>) {
        for station in stations {
            self.by_id.insert(station.id.clone(), station);
        }
        self.rtree = RTree::bulk_load(self.by_id.values().cloned().collect());
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Station> {
        self.by_id.get(id)
    }

    /// All stations, ordered by id.
    pub fn all_stations(&self) -> impl Iterator<Item = &Station> {
        self.by_id.values()
    }

    /// Stations of one department (`"1"` and `"01"` are the same department).
    pub fn for_department(&self, code: &str) -> Vec<&Station> {
        let prefix = normalize_department(code);
        self.by_id
            .range(prefix.clone()..)
            .take_while(|(id, _)| id.starts_with(&prefix))
            .map(|(_, station)| station)
            .collect()
    }

    /// The station closest to `point`.
    ///
    /// Equidistant stations are resolved in favour of the smallest id.
    ///
    /// # Errors
    ///
    /// [`StationIndexError::EmptyIndex`] when no station is loaded.
    ///
    /// # Examples
    ///
    /// ```
    /// use rainmap::{GeoPoint, Station, StationIndex};
    ///
    /// let index = StationIndex::new(vec![
    ///     Station::new("A", "A", GeoPoint::new(2.0, 48.0), 0.0),
    ///     Station::new("B", "B", GeoPoint::new(2.1, 48.1), 0.0),
    /// ]);
    /// assert_eq!(index.nearest(GeoPoint::new(2.01, 48.01)).unwrap().id, "A");
    /// ```
    pub fn nearest(&self, point: GeoPoint) -> Result<&Station, StationIndexError> {
        let query = point.as_rtree_point();
        let mut candidates = self.rtree.nearest_neighbor_iter_with_distance_2(&query);
        let (first, best_distance) = candidates.next().ok_or(StationIndexError::EmptyIndex)?;
        let tied_best = candidates
            .take_while(|(_, distance)| *distance == best_distance)
            .map(|(station, _)| station)
            .fold(first, |best, station| {
                if station.id < best.id {
                    station
                } else {
                    best
                }
            });
        Ok(tied_best)
    }

    /// The station with the smallest great-circle distance to `point`, provided it lies
    /// within `max_distance_km`. Returns the station together with that distance.
    pub fn nearest_within_km(
        &self,
        point: GeoPoint,
        max_distance_km: f64,
    ) -> Result<(&Station, f64), StationIndexError> {
        if self.is_empty() {
            return Err(StationIndexError::EmptyIndex);
        }
        let radius_deg = search_radius_degrees(point.latitude, max_distance_km);
        self.rtree
            .locate_within_distance(point.as_rtree_point(), radius_deg * radius_deg)
            .map(|station| (station, point.haversine_km(&station.location)))
            .filter(|(_, km)| *km <= max_distance_km)
            .min_by_key(|(station, km)| (OrderedFloat(*km), station.id.clone()))
            .ok_or(StationIndexError::NoStationWithinRadius { max_distance_km })
    }
}

/// Planar radius, in degrees, that encloses every point within `km` of a point at
/// `latitude`. A degree of longitude shrinks with the cosine of the latitude, so the
/// widest parallel the circle reaches sets the bound.
fn search_radius_degrees(latitude: f64, km: f64) -> f64 {
    let lat_reach = km / KM_PER_DEGREE;
    let widest = (latitude.abs() + lat_reach).min(89.0).to_radians().cos();
    // 10% margin for the spherical vs. planar mismatch.
    1.1 * km / (KM_PER_DEGREE * widest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(id: &str, lon: f64, lat: f64) -> Station {
        Station::new(id, format!("Station {}", id), GeoPoint::new(lon, lat), 100.0)
    }

    fn brute_force<'a>(stations: &'a [Station], point: GeoPoint) -> &'a Station {
        stations
            .iter()
            .min_by_key(|s| {
                (
                    OrderedFloat(s.location.planar_distance_2(&point)),
                    s.id.clone(),
                )
            })
            .unwrap()
    }

    #[test]
    fn test_empty_index() {
        let index = StationIndex::default();
        assert_eq!(
            index.nearest(GeoPoint::new(2.0, 48.0)),
            Err(StationIndexError::EmptyIndex)
        );
        assert_eq!(
            index.nearest_within_km(GeoPoint::new(2.0, 48.0), 10.0),
            Err(StationIndexError::EmptyIndex)
        );
    }

    #[test]
    fn test_nearest_scenario() {
        let index = StationIndex::new(vec![station("A", 2.0, 48.0), station("B", 2.1, 48.1)]);
        assert_eq!(index.nearest(GeoPoint::new(2.01, 48.01)).unwrap().id, "A");
        assert_eq!(index.nearest(GeoPoint::new(2.09, 48.2)).unwrap().id, "B");
    }

    #[test]
    fn test_each_station_is_its_own_nearest() {
        let stations: Vec<Station> = (0..200)
            .map(|i| {
                let lon = -4.5 + (i % 20) as f64 * 0.7 + (i as f64 * 0.013);
                let lat = 42.5 + (i / 20) as f64 * 0.8 + (i as f64 * 0.007);
                station(&format!("{:08}", i), lon, lat)
            })
            .collect();
        let index = StationIndex::new(stations.clone());
        for s in &stations {
            assert_eq!(index.nearest(s.location).unwrap(), s);
        }
    }

    #[test]
    fn test_matches_linear_scan() {
        let stations: Vec<Station> = (0..150)
            .map(|i| {
                let lon = (i * 37 % 150) as f64 / 10.0 - 5.0;
                let lat = 41.0 + (i * 53 % 100) as f64 / 10.0;
                station(&format!("S{:03}", i), lon, lat)
            })
            .collect();
        let index = StationIndex::new(stations.clone());
        for q in 0..60 {
            let point = GeoPoint::new(
                -5.0 + q as f64 * 0.25,
                41.0 + (q * 7 % 100) as f64 / 10.0,
            );
            assert_eq!(index.nearest(point).unwrap(), brute_force(&stations, point));
        }
    }

    #[test]
    fn test_tie_break_smallest_id() {
        let index = StationIndex::new(vec![
            station("Z", 3.0, 45.0),
            station("M", 1.0, 45.0),
            station("Q", 2.0, 46.0),
        ]);
        // All three at distance 1 from (2, 45).
        assert_eq!(index.nearest(GeoPoint::new(2.0, 45.0)).unwrap().id, "M");
    }

    #[test]
    fn test_same_point_tie_break() {
        let index = StationIndex::new(vec![station("B", 2.0, 48.0), station("A", 2.0, 48.0)]);
        assert_eq!(index.nearest(GeoPoint::new(2.0, 48.0)).unwrap().id, "A");
    }

    #[test]
    fn test_load_last_wins_and_idempotent() {
        let mut index = StationIndex::new(vec![station("A", 2.0, 48.0), station("B", 5.0, 45.0)]);
        let before: Vec<Station> = index.all_stations().cloned().collect();
        let nearest_before = index.nearest(GeoPoint::new(4.0, 45.0)).unwrap().clone();

        index.load(vec![station("A", 2.0, 48.0)]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.all_stations().cloned().collect::<Vec<_>>(), before);
        assert_eq!(index.nearest(GeoPoint::new(4.0, 45.0)).unwrap(), &nearest_before);

        // Re-importing with new attributes replaces, never duplicates.
        index.load(vec![station("A", 4.0, 45.0)]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.get("A").unwrap().location, GeoPoint::new(4.0, 45.0));
        assert_eq!(index.nearest(GeoPoint::new(4.0, 45.0)).unwrap().id, "A");
    }

    #[test]
    fn test_for_department() {
        let index = StationIndex::new(vec![
            station("01014002", 5.0, 46.0),
            station("01089001", 5.3, 46.2),
            station("10030001", 4.0, 48.3),
            station("75114001", 2.3, 48.8),
        ]);
        let ain: Vec<&str> = index
            .for_department("1")
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ain, vec!["01014002", "01089001"]);
        assert_eq!(index.for_department("75").len(), 1);
        assert!(index.for_department("13").is_empty());
    }

    #[test]
    fn test_nearest_within_km() {
        let index = StationIndex::new(vec![
            station("PARIS", 2.3376, 48.8217),
            station("ORLY", 2.3841, 48.7167),
        ]);
        let (s, km) = index.nearest_within_km(GeoPoint::new(2.35, 48.85), 10.0).unwrap();
        assert_eq!(s.id, "PARIS");
        assert!(km < 4.0, "{}", km);

        assert_eq!(
            index.nearest_within_km(GeoPoint::new(5.37, 43.30), 10.0),
            Err(StationIndexError::NoStationWithinRadius {
                max_distance_km: 10.0
            })
        );
    }

    #[test]
    fn test_nearest_within_km_prefers_true_distance() {
        // At 48°N a degree of longitude is ~74 km, a degree of latitude ~111 km.
        // EAST is planar-farther but closer on the ground.
        let index = StationIndex::new(vec![
            station("EAST", 2.13, 48.0),
            station("NORTH", 2.0, 48.11),
        ]);
        let origin = GeoPoint::new(2.0, 48.0);
        assert_eq!(index.nearest(origin).unwrap().id, "NORTH");
        assert_eq!(index.nearest_within_km(origin, 50.0).unwrap().0.id, "EAST");
    }
}
