//! Geodesy helpers: haversine distance, meters-degrees conversion, segment projection.
//!
//! Hand-rolled rather than pulled from a geometry crate: these few functions are the entire
//! surface this engine needs, and keeping them in degree space avoids an extra dependency.

/// Mean Earth radius, meters (WGS-84 sphere approximation).
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Flat degrees-per-meter approximation used to convert GPS accuracy into Kalman measurement
/// noise.
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Great-circle distance between two (lat, lon) points in degrees, in meters.
pub fn haversine_m(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lat1, lon1) = a;
    let (lat2, lon2) = b;
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let lat1r = lat1.to_radians();
    let lat2r = lat2.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1r.cos() * lat2r.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().clamp(0.0, 1.0).asin();
    EARTH_RADIUS_M * c
}

/// Converts a meter distance into an approximate degree delta (flat-Earth).
pub fn meters_to_degrees(m: f64) -> f64 {
    m / METERS_PER_DEGREE
}

/// Projects point `p` onto segment `(a, b)` in degree space, clamped to the segment.
///
/// Returns the projected point. Degenerate segments (`a == b`) project to `a`.
pub fn project_point_onto_segment(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return a;
    }
    let t = ((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len_sq;
    let t = t.clamp(0.0, 1.0);
    (a.0 + t * dx, a.1 + t * dy)
}

/// Normalises a heading in degrees into `[0, 360)`.
pub fn normalize_heading_deg(h: f64) -> f64 {
    let h = h % 360.0;
    if h < 0.0 {
        h + 360.0
    } else {
        h
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn haversine_zero_at_same_point() {
        let p = (37.0, -122.0);
        assert_relative_eq!(haversine_m(p, p), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn haversine_symmetric() {
        let a = (37.0, -122.0);
        let b = (37.001, -122.001);
        assert_relative_eq!(haversine_m(a, b), haversine_m(b, a), epsilon = 1e-9);
    }

    #[test]
    fn haversine_triangle_inequality() {
        let a = (37.0, -122.0);
        let b = (37.01, -122.01);
        let c = (37.02, -121.98);
        assert!(haversine_m(a, c) <= haversine_m(a, b) + haversine_m(b, c) + 1e-6);
    }

    #[test]
    fn haversine_known_distance() {
        // One degree of latitude is ~111,000 m.
        let d = haversine_m((0.0, 0.0), (1.0, 0.0));
        assert!((d - 111_195.0).abs() < 500.0);
    }

    #[test]
    fn projection_clamps_to_segment_endpoints() {
        let a = (0.0, 0.0);
        let b = (0.0, 1.0);
        let before = project_point_onto_segment((-1.0, -1.0), a, b);
        assert_eq!(before, a);
        let after = project_point_onto_segment((1.0, 2.0), a, b);
        assert_eq!(after, b);
    }

    #[test]
    fn projection_degenerate_segment() {
        let a = (1.0, 1.0);
        let q = project_point_onto_segment((5.0, 5.0), a, a);
        assert_eq!(q, a);
    }

    #[test]
    fn projection_midpoint() {
        let a = (0.0, 0.0);
        let b = (0.0, 2.0);
        let q = project_point_onto_segment((1.0, 1.0), a, b);
        assert_relative_eq!(q.0, 0.0, epsilon = 1e-9);
        assert_relative_eq!(q.1, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn heading_normalization() {
        assert_relative_eq!(normalize_heading_deg(370.0), 10.0, epsilon = 1e-9);
        assert_relative_eq!(normalize_heading_deg(-10.0), 350.0, epsilon = 1e-9);
        assert_relative_eq!(normalize_heading_deg(0.0), 0.0, epsilon = 1e-9);
    }
}
