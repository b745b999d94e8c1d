//! Caller-facing errors.
//!
//! Only the explicit API calls that mutate engine-owned state return errors: loading road
//! geometry and parsing the `initialize` config. Numerical anomalies inside the
//! emission loop (a singular Kalman innovation covariance, an empty smoother window, no roads
//! loaded) are never errors — they degrade the output record in place and are logged, not
//! raised (see `engine.rs`).

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("road {id} has fewer than 2 coordinates")]
    InvalidRoadGeometry { id: i64 },

    #[error("road {id} contains a non-finite coordinate")]
    NonFiniteRoadGeometry { id: i64 },

    #[error("config field `{field}` is invalid: {reason}")]
    ConfigInvalid { field: String, reason: String },
}

pub type EngineResult<T> = Result<T, EngineError>;
