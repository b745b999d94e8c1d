//! 2-D constant-velocity Kalman filter over `(lat_deg, lon_deg, dlat_deg_per_s, dlon_deg_per_s)`.
//!
//! Fixed-size `nalgebra` types, named per-filter the way a small linear-algebra surface usually
//! is, rather than hand-rolled arrays.

use nalgebra::{Matrix2, Matrix2x4, Matrix4, Matrix4x2, Vector2, Vector4};

use crate::geo::meters_to_degrees;

pub type StateVec4 = Vector4<f64>;
pub type StateMat4 = Matrix4<f64>;
pub type ObsVec2 = Vector2<f64>;
pub type ObsNoise2 = Matrix2<f64>;
pub type JacobianH2x4 = Matrix2x4<f64>;
pub type KalmanGain4x2 = Matrix4x2<f64>;

/// Process noise diagonal: position drift negligible, velocity drift larger.
const Q_DIAG: [f64; 4] = [1e-6, 1e-6, 1e-3, 1e-3];

pub struct Kalman2D {
    x: StateVec4,
    p: StateMat4,
    initialized: bool,
}

impl Kalman2D {
    pub fn new() -> Self {
        Self {
            x: StateVec4::zeros(),
            p: StateMat4::identity(),
            initialized: false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Seeds the filter on the first fix of a session. A no-op if already initialized — the
    /// filter is initialised at most once per session.
    pub fn initialize(&mut self, lat: f64, lon: f64, acc_m: f64) {
        if self.initialized {
            return;
        }
        let acc_deg = meters_to_degrees(acc_m);
        self.x = StateVec4::new(lat, lon, 0.0, 0.0);
        self.p = StateMat4::from_diagonal(&Vector4::new(
            acc_deg * acc_deg,
            acc_deg * acc_deg,
            1.0,
            1.0,
        ));
        self.initialized = true;
    }

    /// Propagates the state forward by `dt` seconds. A no-op (returns the current position
    /// unchanged) when `dt <= 0`.
    pub fn predict(&mut self, dt: f64) -> (f64, f64) {
        if dt <= 0.0 {
            return (self.x[0], self.x[1]);
        }
        let f = transition_matrix(dt);
        self.x = f * self.x;
        let q = StateMat4::from_diagonal(&Vector4::from_row_slice(&Q_DIAG));
        self.p = f * self.p * f.transpose() + q;
        (self.x[0], self.x[1])
    }

    /// Updates the state with a `(lat, lon)` measurement whose accuracy is `acc_m` meters.
    /// Skips the update (keeping the predicted state) if the innovation covariance is singular.
    pub fn update(&mut self, lat: f64, lon: f64, acc_m: f64) -> (f64, f64) {
        let acc_deg = meters_to_degrees(acc_m);
        let r = ObsNoise2::from_diagonal(&Vector2::new(acc_deg * acc_deg, acc_deg * acc_deg));
        let h = observation_matrix();

        let z = ObsVec2::new(lat, lon);
        let y = z - h * self.x;
        let s = h * self.p * h.transpose() + r;

        if let Some(s_inv) = invert_2x2(&s) {
            let k: KalmanGain4x2 = self.p * h.transpose() * s_inv;
            self.x += k * y;
            let i = StateMat4::identity();
            self.p = (i - k * h) * self.p;
        }
        // Singular S: keep the predicted state rather than divide by a near-zero determinant.

        (self.x[0], self.x[1])
    }

    pub fn position(&self) -> (f64, f64) {
        (self.x[0], self.x[1])
    }

    /// Trace of the position block of `P`, useful for diagnostics / tests of PSD-ness.
    pub fn covariance(&self) -> &StateMat4 {
        &self.p
    }
}

impl Default for Kalman2D {
    fn default() -> Self {
        Self::new()
    }
}

fn transition_matrix(dt: f64) -> StateMat4 {
    #[rustfmt::skip]
    let f = StateMat4::new(
        1.0, 0.0, dt,  0.0,
        0.0, 1.0, 0.0, dt,
        0.0, 0.0, 1.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
    );
    f
}

fn observation_matrix() -> JacobianH2x4 {
    #[rustfmt::skip]
    let h = JacobianH2x4::new(
        1.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
    );
    h
}

/// Closed-form 2x2 inverse; `None` when the determinant is (numerically) zero.
fn invert_2x2(m: &Matrix2<f64>) -> Option<Matrix2<f64>> {
    let det = m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)];
    if det == 0.0 {
        return None;
    }
    let inv_det = 1.0 / det;
    Some(Matrix2::new(
        m[(1, 1)] * inv_det,
        -m[(0, 1)] * inv_det,
        -m[(1, 0)] * inv_det,
        m[(0, 0)] * inv_det,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn initialize_seeds_state_and_is_idempotent() {
        let mut k = Kalman2D::new();
        k.initialize(37.0, -122.0, 10.0);
        assert!(k.is_initialized());
        assert_eq!(k.position(), (37.0, -122.0));
        k.initialize(1.0, 1.0, 1.0); // must not re-seed
        assert_eq!(k.position(), (37.0, -122.0));
    }

    #[test]
    fn predict_with_nonpositive_dt_is_noop() {
        let mut k = Kalman2D::new();
        k.initialize(37.0, -122.0, 10.0);
        let before = k.position();
        let after = k.predict(0.0);
        assert_eq!(before, after);
        let after = k.predict(-1.0);
        assert_eq!(before, after);
    }

    #[test]
    fn update_pulls_state_toward_measurement() {
        let mut k = Kalman2D::new();
        k.initialize(37.0, -122.0, 10.0);
        k.predict(1.0);
        let (lat, lon) = k.update(37.001, -122.001, 5.0);
        assert!(lat > 37.0 && lat < 37.001);
        assert!(lon < -122.0 && lon > -122.001);
    }

    #[test]
    fn update_is_noop_on_singular_innovation_covariance() {
        // Cannot naturally reach det(S) == 0 through the public API (R is always positive for
        // acc_m > 0), so this directly exercises the closed-form guard.
        let singular = Matrix2::new(1.0, 2.0, 2.0, 4.0); // det == 0
        assert!(invert_2x2(&singular).is_none());
        let non_singular = Matrix2::new(1.0, 0.0, 0.0, 1.0);
        assert!(invert_2x2(&non_singular).is_some());
    }

    #[test]
    fn covariance_stays_symmetric_positive_semidefinite() {
        let mut k = Kalman2D::new();
        k.initialize(37.0, -122.0, 10.0);
        for i in 0..20 {
            k.predict(1.0);
            k.update(37.0 + i as f64 * 1e-5, -122.0 - i as f64 * 1e-5, 8.0);
            let p = k.covariance();
            for r in 0..4 {
                for c in 0..4 {
                    assert_relative_eq!(p[(r, c)], p[(c, r)], epsilon = 1e-9);
                }
            }
            // 2x2 leading principal minors and full determinant sign-check for PSD-ness.
            assert!(p[(0, 0)] >= -1e-9);
            let m2 = p[(0, 0)] * p[(1, 1)] - p[(0, 1)] * p[(1, 0)];
            assert!(m2 >= -1e-9);
        }
    }
}
