//! GPS + IMU sensor-fusion navigation engine.
//!
//! Fuses a noisy satellite-positioning stream with an inertial stream into a smoothed,
//! road-constrained position suitable for turn-by-turn navigation. See [`engine::FusionEngine`]
//! for the single entry point a host drives.

pub mod dead_reckoning;
pub mod engine;
pub mod error;
pub mod gate;
pub mod geo;
pub mod kalman;
pub mod map_match;
pub mod smoother;
pub mod types;

pub use engine::{EngineConfig, EngineEvent, FusionEngine};
pub use error::{EngineError, EngineResult};
pub use types::{Fix, InertialSample, LatLon, Priority, RoadSegmentInput, UnifiedPositionRecord};
