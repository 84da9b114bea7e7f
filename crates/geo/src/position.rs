use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters, the sphere used for all distance math.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A single position fix from a location provider.
///
/// Ephemeral: the core never persists these, only external collaborators do.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy radius in meters, as reported by the provider.
    pub accuracy: f64,
    pub timestamp: DateTime<Utc>,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64, accuracy: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            accuracy,
            timestamp,
        }
    }

    /// Position at the given coordinates, stamped now. Accuracy unknown (0).
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self::new(latitude, longitude, 0.0, Utc::now())
    }

    /// Great-circle distance to another position, in meters.
    pub fn distance_m(&self, other: &Position) -> f64 {
        haversine_distance_m(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }
}

/// Haversine great-circle distance on a 6371 km sphere, in meters.
///
/// Accurate to well under a meter at geofence scales, which is more than
/// enough next to consumer GPS accuracy.
pub fn haversine_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_distance() {
        assert_eq!(haversine_distance_m(48.8566, 2.3522, 48.8566, 2.3522), 0.0);
    }

    #[test]
    fn test_one_degree_latitude() {
        // One degree of latitude is ~111.2 km on the reference sphere.
        let d = haversine_distance_m(10.0, 20.0, 11.0, 20.0);
        assert!((d - 111_195.0).abs() < 10.0, "got {d}");
    }

    #[test]
    fn test_known_city_pair() {
        // Paris -> London, ~344 km.
        let d = haversine_distance_m(48.8566, 2.3522, 51.5074, -0.1278);
        assert!((d - 344_000.0).abs() < 2_000.0, "got {d}");
    }

    #[test]
    fn test_symmetric() {
        let ab = haversine_distance_m(20.5937, 78.9629, 28.6139, 77.2090);
        let ba = haversine_distance_m(28.6139, 77.2090, 20.5937, 78.9629);
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn test_position_distance_helper() {
        let a = Position::at(10.0, 20.0);
        let b = Position::at(10.0, 20.001);
        // ~110 m per 0.001 degree of longitude at 10 degrees latitude.
        let d = a.distance_m(&b);
        assert!(d > 100.0 && d < 120.0, "got {d}");
    }
}
