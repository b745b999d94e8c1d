//! The fusion engine: composes gating, smoothing, Kalman filtering, dead reckoning, and map
//! matching into a single emission pipeline.
//!
//! One struct owns every filter plus a config struct and an event list returned alongside each
//! update, so a host drives the whole stack through two entry points (`on_fix`/`on_inertial`)
//! without reaching into individual filters.

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::dead_reckoning::DeadReckoningIntegrator;
use crate::error::EngineResult;
use crate::gate::{FixGate, FixGateConfig, PriorityController, PriorityControllerConfig};
use crate::geo::{haversine_m, normalize_heading_deg};
use crate::kalman::Kalman2D;
use crate::map_match::MapMatcher;
use crate::smoother::ObservationSmoother;
use crate::types::{Fix, InertialSample, Priority, RoadSegmentInput, UnifiedPositionRecord};

const SMOOTHER_WINDOW: usize = 10;
const GPS_HEADING_TRUST: f64 = 0.7;

/// Every engine tunable, with its documented default.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub high_accuracy: bool,
    pub gps_interval_ms: u64,
    pub imu_hz: u32,
    pub target_accuracy_m: f64,
    pub discard_accuracy_above_m: f64,
    pub settle_samples: u32,
    pub deadband_meters: f64,
    pub good_hold_timeout_ms: u64,
    pub promote_high_above_m: f64,
    pub demote_balanced_below_m: f64,
    pub min_switch_interval_ms: u64,
    pub enable_snap_to_roads: bool,
    pub snap_confidence_threshold: f64,
    pub max_snap_distance: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            gps_interval_ms: 1000,
            imu_hz: 50,
            target_accuracy_m: 10.0,
            discard_accuracy_above_m: 30.0,
            settle_samples: 3,
            deadband_meters: 1.5,
            good_hold_timeout_ms: 10_000,
            promote_high_above_m: 15.0,
            demote_balanced_below_m: 12.0,
            min_switch_interval_ms: 5_000,
            enable_snap_to_roads: false,
            snap_confidence_threshold: 0.3,
            max_snap_distance: 50.0,
        }
    }
}

/// Engine-internal occurrences surfaced to the host alongside each emission.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    PriorityChanged {
        from: Priority,
        to: Priority,
        acc_m: f64,
        t_ms: u64,
    },
    FixDropped {
        reason: &'static str,
    },
    SnapRejected {
        distance_m: f64,
        confidence: f64,
    },
    KalmanSingular,
    HoldingLastGood {
        age_ms: u64,
    },
}

pub struct FusionEngine {
    config: EngineConfig,
    gate: FixGate,
    priority: PriorityController,
    smoother: ObservationSmoother,
    kalman: Kalman2D,
    dr: DeadReckoningIntegrator,
    matcher: MapMatcher,
    last_emitted: Option<(f64, f64)>,
    last_fix_t_ms: Option<u64>,
    last_hmm_acc: f64,
}

impl FusionEngine {
    pub fn new(config: EngineConfig) -> Self {
        let initial_priority = if config.high_accuracy {
            Priority::High
        } else {
            Priority::Balanced
        };
        let gate = FixGate::new(FixGateConfig {
            discard_accuracy_above_m: config.discard_accuracy_above_m,
            target_accuracy_m: config.target_accuracy_m,
            settle_samples: config.settle_samples,
            good_hold_timeout_ms: config.good_hold_timeout_ms,
        });
        let priority = PriorityController::new(
            PriorityControllerConfig {
                promote_high_above_m: config.promote_high_above_m,
                demote_balanced_below_m: config.demote_balanced_below_m,
                min_switch_interval_ms: config.min_switch_interval_ms,
            },
            initial_priority,
        );
        let matcher = MapMatcher::new(config.snap_confidence_threshold, config.max_snap_distance);
        Self {
            config,
            gate,
            priority,
            smoother: ObservationSmoother::new(SMOOTHER_WINDOW),
            kalman: Kalman2D::new(),
            dr: DeadReckoningIntegrator::new(),
            matcher,
            last_emitted: None,
            last_fix_t_ms: None,
            last_hmm_acc: 0.0,
        }
    }

    pub fn load_road_segments(&mut self, roads: &[RoadSegmentInput]) -> EngineResult<usize> {
        self.matcher.load_segments(roads)
    }

    pub fn clear_all_roads(&mut self) {
        self.matcher.clear_all_roads();
    }

    /// Weighted-RMS spread of the observation smoother's window, in meters, as of the last
    /// fix applied.
    pub fn get_hmm_accuracy(&self) -> f64 {
        self.last_hmm_acc
    }

    /// Stub acknowledgement for the host-platform permission dialog command; the engine itself
    /// never touches platform permissions.
    pub fn request_permissions(&self) -> bool {
        true
    }

    /// Tears down all filter/window state. Road data is retained.
    pub fn dispose(&mut self) {
        self.smoother.clear();
        self.kalman = Kalman2D::new();
        self.dr.reset();
        self.gate.reset();
        self.last_emitted = None;
        self.last_fix_t_ms = None;
        self.last_hmm_acc = 0.0;
    }

    /// Runs the fix pipeline for one satellite-positioning fix.
    pub fn on_fix(&mut self, fix: Fix) -> (Option<UnifiedPositionRecord>, Vec<EngineEvent>) {
        let mut events = Vec::new();

        if !fix.lat.is_finite() || !fix.lon.is_finite() {
            trace!("on_fix: dropped fix with non-finite position lat={} lon={}", fix.lat, fix.lon);
            events.push(EngineEvent::FixDropped {
                reason: "non_finite_position",
            });
            return (None, events);
        }

        if self.gate.evaluate(fix.acc_m) == crate::gate::GateDecision::Drop {
            trace!("on_fix: dropped fix acc_m={}", fix.acc_m);
            events.push(EngineEvent::FixDropped {
                reason: "accuracy_out_of_range",
            });
            return (None, events);
        }

        let is_good = self.gate.update_settle(fix.acc_m);

        if let Some((from, to)) = self.priority.evaluate(fix.acc_m, fix.t_ms) {
            events.push(EngineEvent::PriorityChanged {
                from,
                to,
                acc_m: fix.acc_m,
                t_ms: fix.t_ms,
            });
        }

        let nearest = self.matcher.find_nearest_road((fix.lat, fix.lon));
        let snap = if self.config.enable_snap_to_roads {
            match self.matcher.snap_with_rejection((fix.lat, fix.lon)) {
                Ok(result) => Some(result),
                Err(Some(rejected)) => {
                    events.push(EngineEvent::SnapRejected {
                        distance_m: rejected.distance_m,
                        confidence: rejected.confidence,
                    });
                    None
                }
                Err(None) => None,
            }
        } else {
            None
        };

        let smoothed = self.smoother.apply(fix);
        self.last_hmm_acc = smoothed.hmm_acc;

        let (kalman_lat, kalman_lon) = if !self.kalman.is_initialized() {
            self.kalman.initialize(fix.lat, fix.lon, fix.acc_m);
            self.kalman.position()
        } else {
            if let Some(last_t) = self.last_fix_t_ms {
                let dt = (fix.t_ms as i128 - last_t as i128) as f64 / 1000.0;
                self.kalman.predict(dt);
            }
            self.kalman.update(fix.lat, fix.lon, fix.acc_m)
        };
        self.last_fix_t_ms = Some(fix.t_ms);

        let good_coords = snap
            .as_ref()
            .map(|s| s.snapped)
            .unwrap_or((kalman_lat, kalman_lon));
        if is_good {
            self.gate
                .record_good(good_coords.0, good_coords.1, fix.t_ms, fix.acc_m);
        }

        let using_last_good = !is_good && self.gate.hold_if_valid(fix.t_ms).is_some();
        let base = if using_last_good {
            let lg = self.gate.hold_if_valid(fix.t_ms).unwrap();
            events.push(EngineEvent::HoldingLastGood {
                age_ms: fix.t_ms.saturating_sub(lg.t_ms),
            });
            (lg.lat, lg.lon)
        } else {
            (kalman_lat, kalman_lon)
        };

        let final_pos = self.apply_deadband(base);

        if !self.dr.is_initialized() {
            // Cold start: no prior DR heading to blend against, so trust the fix outright.
            self.dr
                .seed(final_pos.0, final_pos.1, fix.speed_mps, fix.bearing_deg, fix.t_ms);
        } else {
            self.dr
                .seed(final_pos.0, final_pos.1, fix.speed_mps, self.dr.heading_deg, fix.t_ms);
            self.dr
                .blend_heading_on_fix(fix.bearing_deg, GPS_HEADING_TRUST);
        }

        debug!(
            "on_fix: t_ms={} is_good={is_good} using_last_good={using_last_good} final=({:.6},{:.6})",
            fix.t_ms, final_pos.0, final_pos.1
        );

        let record = UnifiedPositionRecord {
            ts: fix.t_ms,
            lat: fix.lat,
            lon: fix.lon,
            acc: fix.acc_m,
            spd: fix.speed_mps,
            hdg: normalize_heading_deg(fix.bearing_deg),
            is_good,
            priority: self.priority.current().as_str().to_string(),

            hmm_lat: smoothed.lat,
            hmm_lon: smoothed.lon,
            hmm_acc: smoothed.hmm_acc,

            kalman_lat,
            kalman_lon,

            final_lat: final_pos.0,
            final_lon: final_pos.1,

            snap_enabled: self.config.enable_snap_to_roads,
            snap_lat: snap.as_ref().map(|s| s.snapped.0).unwrap_or(0.0),
            snap_lon: snap.as_ref().map(|s| s.snapped.1).unwrap_or(0.0),
            snap_confidence: snap.as_ref().map(|s| s.confidence).unwrap_or(0.0),
            snap_distance: snap.as_ref().map(|s| s.distance_m).unwrap_or(0.0),
            snap_road_id: snap.as_ref().map(|s| s.road_id).unwrap_or(-1),
            snap_road_type: snap.as_ref().map(|s| s.road_type.clone()).unwrap_or_default(),
            snap_applied: snap.is_some(),

            nearest_road_id: nearest.as_ref().map(|r| r.road_id).unwrap_or(-1),
            nearest_road_name: nearest
                .as_ref()
                .and_then(|r| r.name.clone())
                .unwrap_or_default(),
            nearest_road_type: nearest.as_ref().map(|r| r.road_type.clone()).unwrap_or_default(),
            nearest_road_distance: nearest.as_ref().map(|r| r.distance_m).unwrap_or(0.0),
            nearest_road_full_address: nearest
                .as_ref()
                .and_then(|r| r.full_address.clone())
                .unwrap_or_default(),

            using_last_good,
            dr: false,
        };

        (Some(record), events)
    }

    /// Runs the dead-reckoning pipeline for one inertial sample.
    pub fn on_inertial(
        &mut self,
        sample: InertialSample,
    ) -> (Option<UnifiedPositionRecord>, Vec<EngineEvent>) {
        if !self.dr.is_initialized() {
            // No fix has seeded a starting position yet; nothing to propagate from.
            return (None, Vec::new());
        }

        let stepped = self.dr.step(&sample);
        let (lat, lon) = match stepped {
            Some(pos) => pos,
            None => return (None, Vec::new()),
        };

        let record = UnifiedPositionRecord {
            ts: sample.t_ms,
            lat,
            lon,
            acc: 0.0,
            spd: self.dr.speed_mps,
            hdg: self.dr.heading_deg,
            is_good: false,
            priority: self.priority.current().as_str().to_string(),

            hmm_lat: lat,
            hmm_lon: lon,
            hmm_acc: 0.0,

            kalman_lat: lat,
            kalman_lon: lon,

            final_lat: lat,
            final_lon: lon,

            snap_enabled: self.config.enable_snap_to_roads,
            snap_lat: 0.0,
            snap_lon: 0.0,
            snap_confidence: 0.0,
            snap_distance: 0.0,
            snap_road_id: -1,
            snap_road_type: String::new(),
            snap_applied: false,

            nearest_road_id: -1,
            nearest_road_name: String::new(),
            nearest_road_type: String::new(),
            nearest_road_distance: 0.0,
            nearest_road_full_address: String::new(),

            using_last_good: false,
            dr: true,
        };

        (Some(record), Vec::new())
    }

    /// Deadband filter: suppresses sub-threshold motion by repeating
    /// the last emitted position.
    fn apply_deadband(&mut self, base: (f64, f64)) -> (f64, f64) {
        let emit = match self.last_emitted {
            Some(last) if haversine_m(last, base) < self.config.deadband_meters => last,
            _ => base,
        };
        self.last_emitted = Some(emit);
        emit
    }
}
