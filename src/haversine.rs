//! Great-circle geometry and an offline routing backend built on it.
//!
//! The clusterer and the fallback ordering both measure distance with
//! [`haversine_km`]. [`HaversineBackend`] turns the same primitive into
//! distance/duration tables when no road router is available. It ignores
//! roads, but it never fails.

use crate::error::{Error, Result};
use crate::matrix::DistanceMatrix;
use crate::traits::{Located, RoutingBackend};

/// Average driving speed assumption for time estimation.
const DEFAULT_SPEED_KMH: f64 = 40.0;

/// Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two (lat, lng) points in kilometers.
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lng1) = from;
    let (lat2, lng2) = to;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// [`haversine_km`] between two located things.
pub fn distance_between<A: Located + ?Sized, B: Located + ?Sized>(a: &A, b: &B) -> f64 {
    haversine_km(a.location(), b.location())
}

/// Haversine-based routing backend.
///
/// Estimates travel time using straight-line distance and an assumed speed.
#[derive(Debug, Clone)]
pub struct HaversineBackend {
    /// Assumed average driving speed in km/h.
    pub speed_kmh: f64,
}

impl Default for HaversineBackend {
    fn default() -> Self {
        Self {
            speed_kmh: DEFAULT_SPEED_KMH,
        }
    }
}

impl HaversineBackend {
    pub fn new(speed_kmh: f64) -> Self {
        Self { speed_kmh }
    }

    /// Convert distance in km to travel time in seconds.
    fn km_to_seconds(&self, km: f64) -> f64 {
        km / self.speed_kmh * 3600.0
    }
}

impl RoutingBackend for HaversineBackend {
    fn table(&self, locations: &[(f64, f64)]) -> Result<DistanceMatrix> {
        if locations.is_empty() {
            return Err(Error::invalid_input("no coordinates to route"));
        }

        let n = locations.len();
        let mut distances = vec![vec![0.0; n]; n];
        let mut durations = vec![vec![0.0; n]; n];

        for (i, from) in locations.iter().enumerate() {
            for (j, to) in locations.iter().enumerate() {
                if i != j {
                    let km = haversine_km(*from, *to);
                    distances[i][j] = km * 1000.0;
                    durations[i][j] = self.km_to_seconds(km);
                }
            }
        }

        DistanceMatrix::new(distances, durations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_same_point() {
        let dist = haversine_km((36.1, -115.1), (36.1, -115.1));
        assert!(dist < 0.001, "Same point should have ~0 distance");
    }

    #[test]
    fn test_haversine_known_distance() {
        // Las Vegas (36.17, -115.14) to Los Angeles (34.05, -118.24)
        // Actual distance ~370 km
        let dist = haversine_km((36.17, -115.14), (34.05, -118.24));
        assert!(dist > 350.0 && dist < 400.0, "LV to LA should be ~370km, got {}", dist);
    }

    #[test]
    fn test_one_degree_on_equator() {
        let dist = haversine_km((0.0, 0.0), (0.0, 1.0));
        assert!((dist - 111.195).abs() < 0.01, "got {}", dist);
    }

    #[test]
    fn test_table_diagonal_is_zero() {
        let backend = HaversineBackend::default();
        let locations = vec![(36.1, -115.1), (36.2, -115.2), (36.3, -115.3)];
        let matrix = backend.table(&locations).unwrap();

        for i in 0..locations.len() {
            assert_eq!(matrix.distance(i, i), 0.0, "Diagonal should be zero");
            assert_eq!(matrix.duration(i, i), 0.0, "Diagonal should be zero");
        }
    }

    #[test]
    fn test_table_symmetric() {
        let backend = HaversineBackend::default();
        let matrix = backend.table(&[(36.1, -115.1), (36.2, -115.2)]).unwrap();

        assert_eq!(matrix.distance(0, 1), matrix.distance(1, 0));
        assert_eq!(matrix.duration(0, 1), matrix.duration(1, 0));
    }

    #[test]
    fn test_reasonable_travel_time() {
        let backend = HaversineBackend::new(40.0);
        // 10 km at 40 km/h = 0.25 hours = 900 seconds
        assert!((backend.km_to_seconds(10.0) - 900.0).abs() < 1e-9);
    }

    #[test]
    fn test_table_rejects_empty_input() {
        let err = HaversineBackend::default().table(&[]).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
