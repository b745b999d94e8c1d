//! Fix gating and priority hysteresis.
//!
//! `FixGate` decides accept/drop/hold for each raw fix; `PriorityController` promotes/demotes
//! the requested positioning accuracy class with a lock-out interval, the same cooldown-timer
//! shape (a last-switch timestamp plus a minimum interval) used anywhere a state machine needs
//! to resist rapid flapping.

use log::{debug, trace};

use crate::types::Priority;

/// Outcome of gating a single raw fix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GateDecision {
    Accept,
    Drop,
}

pub struct FixGateConfig {
    pub discard_accuracy_above_m: f64,
    pub target_accuracy_m: f64,
    pub settle_samples: u32,
    pub good_hold_timeout_ms: u64,
}

impl Default for FixGateConfig {
    fn default() -> Self {
        Self {
            discard_accuracy_above_m: 30.0,
            target_accuracy_m: 10.0,
            settle_samples: 3,
            good_hold_timeout_ms: 10_000,
        }
    }
}

/// Last-good holdover: the most recent position judged `is_good`, used to paper over a run of
/// noisy fixes within `good_hold_timeout_ms`.
#[derive(Clone, Copy, Debug)]
pub struct LastGood {
    pub lat: f64,
    pub lon: f64,
    pub t_ms: u64,
    pub acc_m: f64,
}

pub struct FixGate {
    config: FixGateConfig,
    good_fix_count: u32,
    last_good: Option<LastGood>,
}

impl FixGate {
    pub fn new(config: FixGateConfig) -> Self {
        Self {
            config,
            good_fix_count: 0,
            last_good: None,
        }
    }

    /// Drops non-finite, non-positive, or too-noisy
    /// accuracy values before any filter sees them.
    pub fn evaluate(&self, acc_m: f64) -> GateDecision {
        if !acc_m.is_finite() || acc_m <= 0.0 || acc_m > self.config.discard_accuracy_above_m {
            trace!("gate: dropping fix with acc_m={acc_m}");
            return GateDecision::Drop;
        }
        GateDecision::Accept
    }

    /// Updates the settle counter and returns whether the fix counts as "good" this step
    /// (rule 2).
    pub fn update_settle(&mut self, acc_m: f64) -> bool {
        if acc_m <= self.config.target_accuracy_m {
            self.good_fix_count += 1;
        } else {
            self.good_fix_count = 0;
        }
        self.good_fix_count >= self.config.settle_samples
    }

    /// Records a good fix's (possibly snapped) coordinates as the new last-good holdover
    /// (rule 3).
    pub fn record_good(&mut self, lat: f64, lon: f64, t_ms: u64, acc_m: f64) {
        self.last_good = Some(LastGood {
            lat,
            lon,
            t_ms,
            acc_m,
        });
    }

    /// Returns the last-good holdover if it is still within `good_hold_timeout_ms` of `t_ms`
    /// (rule 4), else `None`.
    pub fn hold_if_valid(&self, t_ms: u64) -> Option<LastGood> {
        let lg = self.last_good?;
        if t_ms.saturating_sub(lg.t_ms) <= self.config.good_hold_timeout_ms {
            Some(lg)
        } else {
            debug!("gate: last-good holdover expired at t_ms={t_ms}");
            None
        }
    }

    pub fn last_good(&self) -> Option<LastGood> {
        self.last_good
    }

    pub fn reset(&mut self) {
        self.good_fix_count = 0;
        self.last_good = None;
    }
}

pub struct PriorityControllerConfig {
    pub promote_high_above_m: f64,
    pub demote_balanced_below_m: f64,
    pub min_switch_interval_ms: u64,
}

impl Default for PriorityControllerConfig {
    fn default() -> Self {
        Self {
            promote_high_above_m: 15.0,
            demote_balanced_below_m: 12.0,
            min_switch_interval_ms: 5_000,
        }
    }
}

/// Hysteresis-based priority switcher. The gap between
/// `promote_high_above_m` and `demote_balanced_below_m` is what prevents oscillation; the
/// lock-out interval is a second, independent guard against rapid switching.
pub struct PriorityController {
    config: PriorityControllerConfig,
    current: Priority,
    last_switch_ms: Option<u64>,
}

impl PriorityController {
    pub fn new(config: PriorityControllerConfig, initial: Priority) -> Self {
        Self {
            config,
            current: initial,
            last_switch_ms: None,
        }
    }

    pub fn current(&self) -> Priority {
        self.current
    }

    /// Evaluates a switch for the given accuracy reading at `t_ms`. Returns `Some((from, to))`
    /// if a switch occurred.
    pub fn evaluate(&mut self, acc_m: f64, t_ms: u64) -> Option<(Priority, Priority)> {
        if let Some(last) = self.last_switch_ms {
            if t_ms.saturating_sub(last) < self.config.min_switch_interval_ms {
                return None;
            }
        }

        let target = if acc_m > self.config.promote_high_above_m && self.current != Priority::High
        {
            Some(Priority::High)
        } else if acc_m <= self.config.demote_balanced_below_m
            && self.current != Priority::Balanced
        {
            Some(Priority::Balanced)
        } else {
            None
        };

        target.map(|to| {
            let from = self.current;
            self.current = to;
            self.last_switch_ms = Some(t_ms);
            debug!(
                "priority: {} -> {} at acc_m={acc_m} t_ms={t_ms}",
                from.as_str(),
                to.as_str()
            );
            (from, to)
        })
    }
}
