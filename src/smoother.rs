//! Accuracy-weighted observation smoother.
//!
//! A bounded `VecDeque` window with a push-then-recompute `apply`: inverse-accuracy weighting
//! of the window's fixes, plus a weighted-RMS uncertainty estimate (`hmm_acc`) derived from the
//! same window.

use std::collections::VecDeque;

use crate::geo::haversine_m;
use crate::types::Fix;

const EPSILON: f64 = 1e-9;
const DEFAULT_WINDOW: usize = 10;

/// Smoothed position plus its estimated uncertainty, in meters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SmoothedObservation {
    pub lat: f64,
    pub lon: f64,
    /// Weighted RMS spread of the window around the weighted mean, meters. Zero when the
    /// window holds fewer than two fixes.
    pub hmm_acc: f64,
}

pub struct ObservationSmoother {
    window: VecDeque<Fix>,
    capacity: usize,
}

impl ObservationSmoother {
    pub fn new(capacity: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }

    /// Pushes a fix into the window (evicting the oldest if full) and returns the smoothed
    /// estimate and its uncertainty.
    pub fn apply(&mut self, fix: Fix) -> SmoothedObservation {
        self.window.push_back(fix);
        while self.window.len() > self.capacity {
            self.window.pop_front();
        }

        let weights: Vec<f64> = self
            .window
            .iter()
            .map(|f| 1.0 / f.acc_m.max(EPSILON))
            .collect();
        let weight_sum: f64 = weights.iter().sum();

        let mu_lat = self
            .window
            .iter()
            .zip(&weights)
            .map(|(f, w)| f.lat * w)
            .sum::<f64>()
            / weight_sum;
        let mu_lon = self
            .window
            .iter()
            .zip(&weights)
            .map(|(f, w)| f.lon * w)
            .sum::<f64>()
            / weight_sum;

        let hmm_acc = if self.window.len() < 2 {
            0.0
        } else {
            let weighted_sq_sum: f64 = self
                .window
                .iter()
                .zip(&weights)
                .map(|(f, w)| {
                    let d = haversine_m((mu_lat, mu_lon), (f.lat, f.lon));
                    w * d * d
                })
                .sum();
            (weighted_sq_sum / weight_sum).sqrt()
        };

        SmoothedObservation {
            lat: mu_lat,
            lon: mu_lon,
            hmm_acc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn fix(lat: f64, lon: f64, acc: f64, t_ms: u64) -> Fix {
        Fix {
            t_ms,
            lat,
            lon,
            acc_m: acc,
            speed_mps: 0.0,
            bearing_deg: 0.0,
        }
    }

    #[test]
    fn single_fix_has_zero_uncertainty() {
        let mut s = ObservationSmoother::new(DEFAULT_WINDOW);
        let out = s.apply(fix(37.0, -122.0, 8.0, 1000));
        assert_relative_eq!(out.lat, 37.0, epsilon = 1e-12);
        assert_relative_eq!(out.lon, -122.0, epsilon = 1e-12);
        assert_eq!(out.hmm_acc, 0.0);
    }

    #[test]
    fn constant_input_gives_zero_sigma() {
        let mut s = ObservationSmoother::new(DEFAULT_WINDOW);
        for t in 0..5 {
            s.apply(fix(37.0, -122.0, 8.0, t * 1000));
        }
        let out = s.apply(fix(37.0, -122.0, 8.0, 5000));
        assert!(out.hmm_acc < 1e-6);
    }

    #[test]
    fn lower_accuracy_value_dominates_weighting() {
        let mut s = ObservationSmoother::new(DEFAULT_WINDOW);
        s.apply(fix(37.0, -122.0, 1.0, 1000)); // tight fix, high weight
        let out = s.apply(fix(37.001, -122.001, 100.0, 2000)); // noisy fix, low weight
        // Mean should sit much closer to the accurate fix than a plain average would.
        assert!((out.lat - 37.0).abs() < (37.0005 - 37.0).abs());
    }

    #[test]
    fn window_evicts_oldest_beyond_capacity() {
        let mut s = ObservationSmoother::new(3);
        for i in 0..5 {
            s.apply(fix(37.0 + i as f64 * 0.01, -122.0, 5.0, i * 1000));
        }
        assert_eq!(s.len(), 3);
    }
}
