//! Coordinates and great-circle geometry.

use serde::{Deserialize, Serialize};

/// A point on the sphere, both components in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude:  f64,
}

impl GeoPoint {
    /// Build a point from degree coordinates. This is the only place
    /// degrees become radians.
    pub fn from_degrees(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude: longitude.to_radians(),
            latitude:  latitude.to_radians(),
        }
    }
}

/// Haversine central angle between two points, in radians.
///
/// Not scaled by the Earth's radius. Multiply by 6371 for kilometres.
pub fn haversine_distance(current: &GeoPoint, neighbour: &GeoPoint) -> f64 {
    let dlon = neighbour.longitude - current.longitude;
    let dlat = neighbour.latitude - current.latitude;

    let a = (dlat / 2.0).sin().powi(2);
    let b = current.latitude.cos() * neighbour.latitude.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push a + b a hair past 1 for antipodal points.
    2.0 * (a + b).sqrt().min(1.0).asin()
}
