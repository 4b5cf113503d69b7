//! Geodesic math
//!
//! Great-circle distance and bearing on a spherical Earth. Everything
//! here is pure; non-finite inputs propagate into the result instead of
//! panicking.

use serde::{Deserialize, Serialize};

use crate::constants::EARTH_RADIUS_M;

/// A latitude/longitude pair in decimal degrees
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Both coordinates are finite numbers
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// Haversine distance to another point, in meters
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        distance_meters(self.lat, self.lng, other.lat, other.lng)
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.4}, {:.4})", self.lat, self.lng)
    }
}

/// Haversine distance in meters between two coordinates
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_M * c
}

/// Initial bearing from one point toward another, in degrees from north
pub fn bearing_degrees(from: &GeoPoint, to: &GeoPoint) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let delta_lon = (to.lng - from.lng).to_radians();

    let y = delta_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();

    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_zero_for_same_point() {
        let d = distance_meters(19.0760, 72.8777, 19.0760, 72.8777);
        assert!(d.abs() < 1e-9);
    }

    #[test]
    fn test_distance_one_degree_longitude_at_equator() {
        // One degree of arc on a 6371 km sphere is about 111.195 km
        let d = distance_meters(0.0, 0.0, 0.0, 1.0);
        assert!((d - 111_194.9).abs() < 10.0, "got {d}");
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = distance_meters(19.0178, 72.8478, 19.0596, 72.8295);
        let b = distance_meters(19.0596, 72.8295, 19.0178, 72.8478);
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn test_distance_propagates_nan() {
        let d = distance_meters(f64::NAN, 72.8777, 19.0760, 72.8777);
        assert!(d.is_nan());
    }

    #[test]
    fn test_bearing_due_east_at_equator() {
        let from = GeoPoint::new(0.0, 0.0);
        let to = GeoPoint::new(0.0, 1.0);
        let b = bearing_degrees(&from, &to);
        assert!((b - 90.0).abs() < 1e-6, "got {b}");
    }

    #[test]
    fn test_point_finiteness() {
        assert!(GeoPoint::new(19.0, 72.0).is_finite());
        assert!(!GeoPoint::new(f64::NAN, 72.0).is_finite());
        assert!(!GeoPoint::new(19.0, f64::INFINITY).is_finite());
    }
}
