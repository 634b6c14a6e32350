use serde::{Deserialize, Serialize};

/// Approximate earth radius used by the agency distance calculation, in km.
pub const EARTH_RADIUS_KM: f64 = 6373.0;

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Great-circle distance between two coordinates in kilometres (haversine).
///
/// The sign of every latitude and longitude is dropped before conversion to
/// radians, so the result is only meaningful when both points share a
/// hemisphere quadrant. Routes crossing the equator or the prime meridian
/// get wrong distances.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.abs().to_radians();
    let lat2 = b.latitude.abs().to_radians();
    let lon1 = a.longitude.abs().to_radians();
    let lon2 = b.longitude.abs().to_radians();

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const DOWNTOWN_CROSSING: Coordinate = Coordinate {
        latitude: 42.355518,
        longitude: -71.060225,
    };
    const FOREST_HILLS: Coordinate = Coordinate {
        latitude: 42.300523,
        longitude: -71.113686,
    };

    #[test]
    fn same_point_is_zero() {
        assert_eq!(distance_km(DOWNTOWN_CROSSING, DOWNTOWN_CROSSING), 0.0);
        assert_eq!(distance_km(FOREST_HILLS, FOREST_HILLS), 0.0);
    }

    #[test]
    fn symmetric() {
        assert_eq!(
            distance_km(DOWNTOWN_CROSSING, FOREST_HILLS),
            distance_km(FOREST_HILLS, DOWNTOWN_CROSSING)
        );
    }

    #[test]
    fn known_distance() {
        // Roughly 7.5 km along the Orange Line corridor.
        let d = distance_km(DOWNTOWN_CROSSING, FOREST_HILLS);
        assert_relative_eq!(d, 7.53, epsilon = 0.05);
    }

    #[test]
    fn one_degree_of_latitude() {
        let d = distance_km(Coordinate::new(10.0, 20.0), Coordinate::new(11.0, 20.0));
        assert_relative_eq!(d, EARTH_RADIUS_KM.to_radians() * 1.0, epsilon = 1e-9);
    }

    #[test]
    fn sign_is_ignored() {
        // Mirrored across the equator these points collapse onto each other.
        let north = Coordinate::new(1.0, 30.0);
        let south = Coordinate::new(-1.0, 30.0);
        assert_eq!(distance_km(north, south), 0.0);

        let west = Coordinate::new(42.0, -71.0);
        let east = Coordinate::new(42.0, 71.0);
        assert_eq!(distance_km(west, east), 0.0);
    }
}
