//! End-to-end scenarios from the design's testable-properties list: each test drives
//! `FusionEngine` through a short recorded sequence and checks the documented output contract.

use fusion_engine::{EngineConfig, Fix, FusionEngine, InertialSample, LatLon, RoadSegmentInput};

fn fix(t_ms: u64, lat: f64, lon: f64, acc_m: f64, speed_mps: f64, bearing_deg: f64) -> Fix {
    Fix {
        t_ms,
        lat,
        lon,
        acc_m,
        speed_mps,
        bearing_deg,
    }
}

#[test]
fn discard_high_error_fix() {
    let mut engine = FusionEngine::new(EngineConfig::default());
    let (record, _) = engine.on_fix(fix(0, 37.0, -122.0, 50.0, 0.0, 0.0));
    assert!(record.is_none());
}

#[test]
fn settle_then_good() {
    let mut engine = FusionEngine::new(EngineConfig::default());
    engine.on_fix(fix(1000, 37.0, -122.0, 8.0, 0.0, 0.0));
    engine.on_fix(fix(2000, 37.0, -122.0, 8.0, 0.0, 0.0));
    let (record, _) = engine.on_fix(fix(3000, 37.0, -122.0, 8.0, 0.0, 0.0));
    let record = record.unwrap();
    assert!(record.is_good);
    assert!((record.final_lat - 37.0).abs() < 1e-3);
    assert!((record.final_lon - -122.0).abs() < 1e-3);
}

#[test]
fn deadband_suppression() {
    let mut engine = FusionEngine::new(EngineConfig::default());
    let (first, _) = engine.on_fix(fix(1000, 37.0, -122.0, 8.0, 0.0, 0.0));
    let first = first.unwrap();
    let (second, _) = engine.on_fix(fix(2000, 37.000001, -122.000001, 8.0, 0.0, 0.0));
    let second = second.unwrap();
    assert_eq!(first.final_lat, second.final_lat);
    assert_eq!(first.final_lon, second.final_lon);
}

#[test]
fn priority_promote_then_lock() {
    let mut config = EngineConfig::default();
    config.high_accuracy = false;
    let mut engine = FusionEngine::new(config);

    let (record, events) = engine.on_fix(fix(0, 37.0, -122.0, 20.0, 0.0, 0.0));
    assert_eq!(record.unwrap().priority, "HIGH");
    assert!(events.iter().any(|e| format!("{e:?}").contains("PriorityChanged")));

    // 1s later with acc=10 (which would otherwise demote) must stay HIGH within the 5s lock.
    let (record, _) = engine.on_fix(fix(1000, 37.0, -122.0, 10.0, 0.0, 0.0));
    assert_eq!(record.unwrap().priority, "HIGH");
}

#[test]
fn snap_accept() {
    let mut config = EngineConfig::default();
    config.enable_snap_to_roads = true;
    let mut engine = FusionEngine::new(config);

    let roads = vec![RoadSegmentInput {
        id: 1,
        coordinates: vec![
            LatLon {
                latitude: 37.0000,
                longitude: -122.0000,
            },
            LatLon {
                latitude: 37.0000,
                longitude: -122.0010,
            },
        ],
        road_type: "residential".into(),
        max_speed: 50.0,
        is_one_way: false,
        name: Some("Main St".into()),
        road_ref: None,
        street_number: None,
        locality: None,
        admin_area: None,
    }];
    engine.load_road_segments(&roads).unwrap();

    let (record, _) = engine.on_fix(fix(0, 37.00005, -122.00005, 5.0, 0.0, 0.0));
    let record = record.unwrap();
    assert!(record.snap_applied);
    assert!(record.snap_distance > 3.0 && record.snap_distance < 8.0);
    assert!((record.snap_confidence - 0.86).abs() < 0.05);
    assert!((record.snap_lat - 37.0).abs() < 1e-4);
}

#[test]
fn dead_reckoning_propagation_between_fixes() {
    let mut engine = FusionEngine::new(EngineConfig::default());
    // Seed via a fix: speed 10 m/s, heading 0 deg — east-aligned, since displacement uses
    // cos(heading) for longitude (0 deg is not a compass bearing here).
    engine.on_fix(fix(0, 37.0, -122.0, 5.0, 10.0, 0.0));

    let mut last_lon = -122.0;
    for i in 1..=10u64 {
        let sample = InertialSample {
            t_ms: i * 100,
            ax: 0.0,
            ay: 0.0,
            az: 0.0,
            gx: 0.0,
            gy: 0.0,
            gz: 0.0,
        };
        let (record, _) = engine.on_inertial(sample);
        let record = record.unwrap();
        assert!(record.dr);
        assert!(!record.snap_applied);
        assert!(record.lon > last_lon || i == 1);
        last_lon = record.lon;
    }
}
