//! Wire and domain types shared by the engine, the map matcher, and the CLI harness.

use serde::{Deserialize, Serialize};

/// A single satellite-positioning measurement.
///
/// Mirrors the host's raw fix record (`ts`, `lat`, `lon`, `acc`, `spd`, `hdg`); `acc_m` must be
/// finite and positive before reaching [`crate::gate::FixGate`] — invalid fixes are dropped at
/// the boundary, never inside the filters.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fix {
    pub t_ms: u64,
    pub lat: f64,
    pub lon: f64,
    pub acc_m: f64,
    pub speed_mps: f64,
    pub bearing_deg: f64,
}

/// A single inertial sample, device frame, m/s² and rad/s.
///
/// The accelerometer may be raw (gravity included) or linear-acceleration (gravity removed)
/// depending on platform; this engine does not distinguish the two and performs no on-device
/// gravity removal.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InertialSample {
    pub t_ms: u64,
    pub ax: f64,
    pub ay: f64,
    pub az: f64,
    pub gx: f64,
    pub gy: f64,
    pub gz: f64,
}

/// One point of a road polyline, as received from the host.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatLon {
    pub latitude: f64,
    pub longitude: f64,
}

/// A road, as passed to `load_road_segments`.
///
/// Roads are owned exclusively by the map matcher once loaded; everywhere else they are
/// referenced by `id`.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadSegmentInput {
    pub id: i64,
    pub coordinates: Vec<LatLon>,
    #[serde(default)]
    pub road_type: String,
    #[serde(default)]
    pub max_speed: f64,
    #[serde(default)]
    pub is_one_way: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "ref", default)]
    pub road_ref: Option<String>,
    #[serde(default)]
    pub street_number: Option<String>,
    #[serde(default)]
    pub locality: Option<String>,
    #[serde(default)]
    pub admin_area: Option<String>,
}

/// The on-device positioning priority class requested from the platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    High,
    Balanced,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "HIGH",
            Priority::Balanced => "BALANCED",
        }
    }
}

/// Result of snapping a point onto the road network.
#[derive(Clone, Debug)]
pub struct SnapResult {
    pub original: (f64, f64),
    pub snapped: (f64, f64),
    pub road_id: i64,
    pub road_type: String,
    pub confidence: f64,
    pub distance_m: f64,
}

/// Result of an always-on nearest-road lookup, independent of whether snapping is enabled.
#[derive(Clone, Debug)]
pub struct NearestRoad {
    pub road_id: i64,
    pub name: Option<String>,
    pub road_type: String,
    pub distance_m: f64,
    pub full_address: Option<String>,
}

/// The single unified output record emitted for every input event (fix or inertial sample).
///
/// Carries raw, smoothed, Kalman, snapped, and final views of the position in one frame so a
/// consumer can pick whichever it needs.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedPositionRecord {
    pub ts: u64,
    pub lat: f64,
    pub lon: f64,
    pub acc: f64,
    pub spd: f64,
    pub hdg: f64,
    pub is_good: bool,
    pub priority: String,

    pub hmm_lat: f64,
    pub hmm_lon: f64,
    pub hmm_acc: f64,

    pub kalman_lat: f64,
    pub kalman_lon: f64,

    pub final_lat: f64,
    pub final_lon: f64,

    pub snap_enabled: bool,
    pub snap_lat: f64,
    pub snap_lon: f64,
    pub snap_confidence: f64,
    pub snap_distance: f64,
    pub snap_road_id: i64,
    pub snap_road_type: String,
    pub snap_applied: bool,

    pub nearest_road_id: i64,
    pub nearest_road_name: String,
    pub nearest_road_type: String,
    pub nearest_road_distance: f64,
    pub nearest_road_full_address: String,

    pub using_last_good: bool,
    pub dr: bool,
}
