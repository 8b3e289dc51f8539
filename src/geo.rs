//! Geographic utilities
//!
//! Great-circle distance on a spherical Earth.

use geo::{Distance, HaversineMeasure, Point};

use crate::types::Coordinates;

/// Mean Earth radius in meters (IUGG)
pub const EARTH_RADIUS_M: f64 = 6_371_009.0;

fn to_point(c: &Coordinates) -> Point<f64> {
    Point::new(c.longitude, c.latitude)
}

/// Great-circle surface distance between two points, in meters.
///
/// Haversine on a sphere of radius [`EARTH_RADIUS_M`].
pub fn great_circle_distance(a: &Coordinates, b: &Coordinates) -> f64 {
    HaversineMeasure::new(EARTH_RADIUS_M).distance(to_point(a), to_point(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn test_distance_same_point() {
        let p = Coordinates::new(-23.5505, -46.6333);
        assert_eq!(great_circle_distance(&p, &p), 0.0);
    }

    #[test]
    fn test_distance_known_value() {
        // London to Paris is approximately 344 km
        let london = Coordinates::new(51.5074, -0.1278);
        let paris = Coordinates::new(48.8566, 2.3522);
        let dist = great_circle_distance(&london, &paris);
        assert!(approx_eq(dist, 343_560.0, 5000.0));
    }

    #[test]
    fn test_distance_small_offset() {
        // 0.0001 degrees on both axes at the equator is about 15.7 m
        let a = Coordinates::new(0.0, 0.0);
        let b = Coordinates::new(0.0001, 0.0001);
        let dist = great_circle_distance(&a, &b);
        assert!(approx_eq(dist, 15.72, 0.1), "got {}", dist);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = Coordinates::new(10.0, 20.0);
        let b = Coordinates::new(-5.0, 100.0);
        assert!(approx_eq(
            great_circle_distance(&a, &b),
            great_circle_distance(&b, &a),
            1e-6
        ));
    }

    #[test]
    fn test_one_degree_of_longitude_at_equator() {
        let a = Coordinates::new(0.0, 0.0);
        let b = Coordinates::new(0.0, 1.0);
        let expected = EARTH_RADIUS_M * 1.0_f64.to_radians();
        assert!(approx_eq(great_circle_distance(&a, &b), expected, 1e-6));
    }
}
