//! Great-circle distance on a spherical Earth.
//!
//! # Invariants
//! - `distance_m(a, b) == distance_m(b, a)`.
//! - Equal points are exactly `0.0` apart.
//! - The inner haversine term is clamped to `[0, 1]` so near-antipodal inputs
//!   never feed `asin` an out-of-domain value.

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Returns the haversine distance in meters between two WGS84 points given in
/// degrees.
pub fn distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let half_chord = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let h = half_chord.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::{distance_m, EARTH_RADIUS_M};

    #[test]
    fn identical_points_are_zero_apart() {
        for (lat, lon) in [(0.0, 0.0), (37.5665, 126.978), (-89.9, 179.9), (90.0, -180.0)] {
            assert_eq!(distance_m(lat, lon, lat, lon), 0.0);
        }
    }

    #[test]
    fn is_symmetric() {
        let forward = distance_m(37.5665, 126.978, 35.1796, 129.0756);
        let backward = distance_m(35.1796, 129.0756, 37.5665, 126.978);
        assert_eq!(forward, backward);
    }

    #[test]
    fn one_thousandth_degree_north_is_about_111_meters() {
        let d = distance_m(37.5665, 126.978, 37.5675, 126.978);
        assert!((d - 111.0).abs() <= 2.0, "got {d}");
    }

    #[test]
    fn antipodal_points_stay_finite_at_half_circumference() {
        let d = distance_m(0.0, 0.0, 0.0, 180.0);
        assert!(d.is_finite());
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_M).abs() < 1.0);
    }

    #[test]
    fn grows_with_separation() {
        let near = distance_m(37.5, 127.0, 37.5005, 127.0);
        let mid = distance_m(37.5, 127.0, 37.501, 127.0);
        let far = distance_m(37.5, 127.0, 37.6, 127.0);
        assert!(near < mid && mid < far);
    }
}
