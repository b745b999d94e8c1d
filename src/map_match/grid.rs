//! Uniform-grid spatial index over road polylines.
//!
//! A road is registered in every cell it touches plus the 8 neighbours of each vertex cell, so
//! a radius query never misses a road whose vertex lies just outside the query cell. The module
//! owns the backing collection and exposes `insert`/bulk `clear`/a radius query.

use std::collections::{HashMap, HashSet};

use crate::map_match::road::RoadSegment;

/// Grid cell size in degrees.
pub const GRID_SIZE_DEG: f64 = 0.01;

type CellKey = (i64, i64);

fn cell_of(lat: f64, lon: f64) -> CellKey {
    (
        (lat / GRID_SIZE_DEG).floor() as i64,
        (lon / GRID_SIZE_DEG).floor() as i64,
    )
}

#[derive(Default)]
pub struct RoadGrid {
    cells: HashMap<CellKey, Vec<i64>>,
}

impl RoadGrid {
    pub fn new() -> Self {
        Self {
            cells: HashMap::new(),
        }
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Registers `road` in every cell its vertices touch, plus the 3x3 neighbourhood of each
    /// vertex cell.
    pub fn insert(&mut self, road: &RoadSegment) {
        for &(lat, lon) in &road.points {
            let (cx, cy) = cell_of(lat, lon);
            for dx in -1..=1 {
                for dy in -1..=1 {
                    self.cells
                        .entry((cx + dx, cy + dy))
                        .or_default()
                        .push(road.id);
                }
            }
        }
    }

    /// Returns the deduplicated set of road ids registered in cells within radius `r_m` of
    /// `point`.
    pub fn candidates(&self, point: (f64, f64), r_m: f64) -> Vec<i64> {
        let r_deg = r_m / 111_000.0;
        let half_extent = (r_deg / GRID_SIZE_DEG).ceil() as i64 + 2;
        let (cx, cy) = cell_of(point.0, point.1);

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for dx in -half_extent..=half_extent {
            for dy in -half_extent..=half_extent {
                if let Some(ids) = self.cells.get(&(cx + dx, cy + dy)) {
                    for &id in ids {
                        if seen.insert(id) {
                            out.push(id);
                        }
                    }
                }
            }
        }
        out
    }
}
