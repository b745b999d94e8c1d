//! Map matcher: nearest-road lookup (always) and snap-to-road (when enabled).
//!
//! One struct owns the spatial index and exposes a single scoring entry point; a segment-
//! distance scan over polyline segments backs both the nearest-road lookup and the
//! Gaussian-confidence snap.

use std::collections::HashMap;

use crate::error::EngineResult;
use crate::geo::{haversine_m, project_point_onto_segment};
use crate::map_match::grid::RoadGrid;
use crate::map_match::road::{from_input, RoadSegment};
use crate::types::{NearestRoad, RoadSegmentInput, SnapResult};

const SEARCH_RADIUS_M: f64 = 50.0;
const GPS_SIGMA_M: f64 = 10.0;

pub struct MapMatcher {
    roads: HashMap<i64, RoadSegment>,
    grid: RoadGrid,
    snap_confidence_threshold: f64,
    max_snap_distance_m: f64,
}

impl MapMatcher {
    pub fn new(snap_confidence_threshold: f64, max_snap_distance_m: f64) -> Self {
        Self {
            roads: HashMap::new(),
            grid: RoadGrid::new(),
            snap_confidence_threshold,
            max_snap_distance_m,
        }
    }

    pub fn road_count(&self) -> usize {
        self.roads.len()
    }

    /// Loads a batch of roads, additive to whatever is already loaded. Must not be called while
    /// the emission loop is active.
    pub fn load_segments(&mut self, inputs: &[RoadSegmentInput]) -> EngineResult<usize> {
        let mut loaded = 0;
        for input in inputs {
            let segment = from_input(input)?;
            self.grid.insert(&segment);
            self.roads.insert(segment.id, segment);
            loaded += 1;
        }
        Ok(loaded)
    }

    pub fn clear_all_roads(&mut self) {
        self.roads.clear();
        self.grid.clear();
    }

    /// Distance (meters) from `point` to the nearest point on `road`'s polyline, plus that
    /// projected point.
    fn distance_to_road(point: (f64, f64), road: &RoadSegment) -> ((f64, f64), f64) {
        let mut best_point = road.points[0];
        let mut best_dist = f64::INFINITY;
        for (a, b) in road.segments() {
            let q = project_point_onto_segment(point, a, b);
            let d = haversine_m(point, q);
            if d < best_dist {
                best_dist = d;
                best_point = q;
            }
        }
        (best_point, best_dist)
    }

    /// Full scan of every loaded road, not only spatial-index candidates — guarantees a result
    /// regardless of grid coverage.
    pub fn find_nearest_road(&self, point: (f64, f64)) -> Option<NearestRoad> {
        self.roads
            .values()
            .map(|road| {
                let (_, dist) = Self::distance_to_road(point, road);
                (road, dist)
            })
            .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .map(|(road, dist)| NearestRoad {
                road_id: road.id,
                name: road.name.clone(),
                road_type: road.road_type.clone(),
                distance_m: dist,
                full_address: Some(road.full_address()),
            })
    }

    /// Best-scoring road within the search radius, before the acceptance threshold is applied.
    /// `None` only when no road lies within `SEARCH_RADIUS_M`. Exposed separately from
    /// [`Self::snap_to_road`] so a caller can log why a snap was rejected.
    fn best_candidate(&self, point: (f64, f64)) -> Option<SnapResult> {
        let candidate_ids = self.grid.candidates(point, SEARCH_RADIUS_M);

        let mut best: Option<SnapResult> = None;
        for id in candidate_ids {
            let road = match self.roads.get(&id) {
                Some(r) => r,
                None => continue,
            };
            let (snapped, dist) = Self::distance_to_road(point, road);
            let confidence = (-0.5 * (dist / GPS_SIGMA_M).powi(2)).exp();

            let better = match &best {
                None => true,
                Some(b) => confidence > b.confidence,
            };
            if better {
                best = Some(SnapResult {
                    original: point,
                    snapped,
                    road_id: road.id,
                    road_type: road.road_type.clone(),
                    confidence,
                    distance_m: dist,
                });
            }
        }
        best
    }

    /// Snaps `point` onto the nearest sufficiently-confident road within the search radius.
    /// Rejects the best candidate if its confidence falls below `snap_confidence_threshold` or
    /// its distance exceeds `max_snap_distance_m`.
    pub fn snap_to_road(&self, point: (f64, f64)) -> Option<SnapResult> {
        self.best_candidate(point).filter(|r| {
            r.confidence >= self.snap_confidence_threshold && r.distance_m <= self.max_snap_distance_m
        })
    }

    /// Same acceptance policy as [`Self::snap_to_road`], but also returns the rejected
    /// candidate (if any) so a caller can surface why the snap failed.
    pub fn snap_with_rejection(&self, point: (f64, f64)) -> Result<SnapResult, Option<SnapResult>> {
        match self.best_candidate(point) {
            Some(r)
                if r.confidence >= self.snap_confidence_threshold
                    && r.distance_m <= self.max_snap_distance_m =>
            {
                Ok(r)
            }
            other => Err(other),
        }
    }
}
