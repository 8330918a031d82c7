//! Spherical distance between two coordinates.

/// Radius of the sphere distances are measured on, in meters
pub const EARTH_RADIUS_METERS: f64 = 6_378_100.0;

/// Meters per degree of latitude on that sphere
pub const METERS_PER_DEGREE: f64 = EARTH_RADIUS_METERS * std::f64::consts::PI / 180.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub longitude: f64,
    pub latitude: f64,
}

impl Point {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        (-180.0..=180.0).contains(&self.longitude) && (-90.0..=90.0).contains(&self.latitude)
    }

    /// Great-circle distance to ``other`` in meters (haversine)
    pub fn distance_to(&self, other: &Point) -> f64 {
        let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let d_lat = lat2 - lat1;
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_METERS * a.sqrt().min(1.0).asin()
    }

    /// The latitude band ``(min, max)`` that contains every point within
    /// ``meters`` of this one. Used to narrow down candidates before the
    /// exact distance is computed.
    pub fn latitude_band(&self, meters: f64) -> (f64, f64) {
        let span = meters / METERS_PER_DEGREE;
        (
            (self.latitude - span).max(-90.0),
            (self.latitude + span).min(90.0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_to_self_is_zero() {
        let p = Point::new(-98.5795, 39.8283);
        assert_eq!(p.distance_to(&p), 0.0);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let a = Point::new(13.4, 52.0);
        let b = Point::new(13.4, 53.0);
        assert!((a.distance_to(&b) - METERS_PER_DEGREE).abs() < 0.01);
    }

    #[test]
    fn test_distance_is_symmetric_across_the_antimeridian() {
        let a = Point::new(179.99, 0.0);
        let b = Point::new(-179.99, 0.0);
        let d = a.distance_to(&b);
        assert!((d - b.distance_to(&a)).abs() < 1e-6);
        // 0.02 degrees along the equator, not 359.98
        assert!((d - 0.02 * METERS_PER_DEGREE).abs() < 0.01);
    }

    #[test]
    fn test_latitude_band_is_clamped() {
        let (min, max) = Point::new(0.0, 89.99).latitude_band(10_000.0);
        assert!(min < 89.99);
        assert_eq!(max, 90.0);
    }

    #[test]
    fn test_validity() {
        assert!(Point::new(-180.0, 90.0).is_valid());
        assert!(!Point::new(39.8, -98.5).is_valid());
        assert!(!Point::new(f64::NAN, 0.0).is_valid());
    }
}
