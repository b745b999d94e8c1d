//! Inertial-only dead-reckoning integrator.
//!
//! Integrates heading from gyro-z and forward speed from the horizontal accelerometer
//! magnitude, propagating position on the WGS-84 sphere between fixes.

use crate::geo::{normalize_heading_deg, EARTH_RADIUS_M};
use crate::types::InertialSample;

const IMU_DT_MAX_S: f64 = 2.0;
const ACCEL_NOISE_GATE: f64 = 0.15;

/// Single-pole low-pass filter. Damps raw accelerometer noise ahead of the magnitude gate;
/// does not change the integration formula, only what `ax`/`ay` mean once filtered.
struct LowPassFilter2D {
    alpha: f64,
    last: (f64, f64),
    initialized: bool,
}

impl LowPassFilter2D {
    fn new(cutoff_hz: f64, sample_rate_hz: f64) -> Self {
        let dt = 1.0 / sample_rate_hz;
        let rc = 1.0 / (2.0 * std::f64::consts::PI * cutoff_hz);
        let alpha = dt / (rc + dt);
        Self {
            alpha,
            last: (0.0, 0.0),
            initialized: false,
        }
    }

    fn update(&mut self, input: (f64, f64)) -> (f64, f64) {
        if !self.initialized {
            self.last = input;
            self.initialized = true;
            return input;
        }
        self.last = (
            self.last.0 * (1.0 - self.alpha) + input.0 * self.alpha,
            self.last.1 * (1.0 - self.alpha) + input.1 * self.alpha,
        );
        self.last
    }
}

pub struct DeadReckoningIntegrator {
    pub lat: f64,
    pub lon: f64,
    pub speed_mps: f64,
    pub heading_deg: f64,
    last_t_ms: Option<u64>,
    initialized: bool,
    lpf: LowPassFilter2D,
}

impl DeadReckoningIntegrator {
    pub fn new() -> Self {
        Self {
            lat: 0.0,
            lon: 0.0,
            speed_mps: 0.0,
            heading_deg: 0.0,
            last_t_ms: None,
            initialized: false,
            lpf: LowPassFilter2D::new(4.0, 50.0),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Resets the integrator's position/speed to a known-good fix, keeping the heading unless
    /// told otherwise by [`Self::blend_heading_on_fix`].
    pub fn seed(&mut self, lat: f64, lon: f64, speed_mps: f64, heading_deg: f64, t_ms: u64) {
        self.lat = lat;
        self.lon = lon;
        self.speed_mps = speed_mps.max(0.0);
        self.heading_deg = normalize_heading_deg(heading_deg);
        self.last_t_ms = Some(t_ms);
        self.initialized = true;
    }

    /// Blends the current DR heading with a freshly measured bearing using unit-vector
    /// averaging so wrap-around never corrupts the result.
    pub fn blend_heading_on_fix(&mut self, measured_bearing_deg: f64, gps_trust: f64) {
        let h_base = self.heading_deg.to_radians();
        let h_meas = measured_bearing_deg.to_radians();
        let w = gps_trust;
        let x = (1.0 - w) * h_base.cos() + w * h_meas.cos();
        let y = (1.0 - w) * h_base.sin() + w * h_meas.sin();
        self.heading_deg = normalize_heading_deg(y.atan2(x).to_degrees());
    }

    /// Clears internal state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Advances the DR state by one inertial sample. Returns `None` if the step was dropped
    /// (non-positive or too-large `dt`).
    pub fn step(&mut self, sample: &InertialSample) -> Option<(f64, f64)> {
        let last_t = match self.last_t_ms {
            Some(t) => t,
            None => {
                self.last_t_ms = Some(sample.t_ms);
                self.initialized = true;
                return None;
            }
        };

        let dt = (sample.t_ms as i128 - last_t as i128) as f64 / 1000.0;
        self.last_t_ms = Some(sample.t_ms);
        if dt <= 0.0 || dt > IMU_DT_MAX_S {
            return None;
        }

        self.heading_deg =
            normalize_heading_deg(self.heading_deg + sample.gz * dt * 180.0 / std::f64::consts::PI);

        let (ax, ay) = self.lpf.update((sample.ax, sample.ay));
        let mut a = (ax * ax + ay * ay).sqrt();
        if a.abs() < ACCEL_NOISE_GATE {
            a = 0.0;
        }

        self.speed_mps = (self.speed_mps + a * dt).max(0.0);

        let h_rad = self.heading_deg.to_radians();
        let dx = self.speed_mps * dt * h_rad.cos();
        let dy = self.speed_mps * dt * h_rad.sin();

        let d_lat = dy / EARTH_RADIUS_M * 180.0 / std::f64::consts::PI;
        let d_lon =
            dx / (EARTH_RADIUS_M * (self.lat * std::f64::consts::PI / 180.0).cos()) * 180.0
                / std::f64::consts::PI;

        self.lat += d_lat;
        self.lon += d_lon;

        Some((self.lat, self.lon))
    }
}

impl Default for DeadReckoningIntegrator {
    fn default() -> Self {
        Self::new()
    }
}
