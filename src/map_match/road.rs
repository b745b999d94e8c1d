//! Internal road representation.
//!
//! Plain `(lat, lon)` pairs rather than a geometry crate's linestring type, so the projection
//! formulas in `geo.rs` apply directly without a conversion step.

use crate::error::{EngineError, EngineResult};
use crate::types::RoadSegmentInput;

#[derive(Clone, Debug)]
pub struct RoadSegment {
    pub id: i64,
    /// Ordered polyline points, `(lat, lon)` in degrees. Invariant: at least 2 points.
    pub points: Vec<(f64, f64)>,
    pub road_type: String,
    pub max_speed: f64,
    pub one_way: bool,
    pub name: Option<String>,
    pub road_ref: Option<String>,
    pub locality: Option<String>,
    pub admin_area: Option<String>,
    pub street_number: Option<String>,
}

impl RoadSegment {
    pub fn segments(&self) -> impl Iterator<Item = ((f64, f64), (f64, f64))> + '_ {
        self.points.windows(2).map(|w| (w[0], w[1]))
    }

    /// A best-effort postal-style address string (street number + name, then locality and
    /// admin area), used only for display.
    pub fn full_address(&self) -> String {
        let mut parts = Vec::new();
        if let (Some(num), Some(name)) = (&self.street_number, &self.name) {
            parts.push(format!("{} {}", num, name));
        } else if let Some(name) = &self.name {
            parts.push(name.clone());
        }
        if let Some(locality) = &self.locality {
            parts.push(locality.clone());
        }
        if let Some(admin) = &self.admin_area {
            parts.push(admin.clone());
        }
        parts.join(", ")
    }
}

pub fn from_input(input: &RoadSegmentInput) -> EngineResult<RoadSegment> {
    if input.coordinates.len() < 2 {
        return Err(EngineError::InvalidRoadGeometry { id: input.id });
    }
    let points: Vec<(f64, f64)> = input
        .coordinates
        .iter()
        .map(|c| (c.latitude, c.longitude))
        .collect();
    if points
        .iter()
        .any(|(lat, lon)| !lat.is_finite() || !lon.is_finite())
    {
        return Err(EngineError::NonFiniteRoadGeometry { id: input.id });
    }
    Ok(RoadSegment {
        id: input.id,
        points,
        road_type: input.road_type.clone(),
        max_speed: input.max_speed,
        one_way: input.is_one_way,
        name: input.name.clone(),
        road_ref: input.road_ref.clone(),
        locality: input.locality.clone(),
        admin_area: input.admin_area.clone(),
        street_number: input.street_number.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LatLon;

    fn input(id: i64, coords: Vec<(f64, f64)>) -> RoadSegmentInput {
        RoadSegmentInput {
            id,
            coordinates: coords
                .into_iter()
                .map(|(lat, lon)| LatLon {
                    latitude: lat,
                    longitude: lon,
                })
                .collect(),
            road_type: "residential".to_string(),
            max_speed: 50.0,
            is_one_way: false,
            name: Some("Test St".to_string()),
            road_ref: None,
            street_number: None,
            locality: None,
            admin_area: None,
        }
    }

    #[test]
    fn rejects_single_point_road() {
        let err = from_input(&input(1, vec![(37.0, -122.0)])).unwrap_err();
        assert_eq!(err, EngineError::InvalidRoadGeometry { id: 1 });
    }

    #[test]
    fn rejects_non_finite_coordinate() {
        let err = from_input(&input(1, vec![(37.0, -122.0), (f64::NAN, -122.1)])).unwrap_err();
        assert_eq!(err, EngineError::NonFiniteRoadGeometry { id: 1 });
    }

    #[test]
    fn accepts_valid_road() {
        let seg = from_input(&input(1, vec![(37.0, -122.0), (37.0, -122.1)])).unwrap();
        assert_eq!(seg.points.len(), 2);
        assert_eq!(seg.segments().count(), 1);
    }

    #[test]
    fn full_address_assembles_parts() {
        let mut seg = from_input(&input(1, vec![(37.0, -122.0), (37.0, -122.1)])).unwrap();
        seg.street_number = Some("42".to_string());
        seg.locality = Some("Springfield".to_string());
        assert_eq!(seg.full_address(), "42 Test St, Springfield");
    }
}
