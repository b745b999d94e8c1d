//! Replay CLI: drives [`fusion_engine::FusionEngine`] from a recorded JSON-lines session and
//! prints one Unified Position Record per input event.
//!
//! A `clap::Parser` args struct, a `BufReader` over a file, `serde_json` line-by-line
//! deserialization, a plain `for` loop. No async runtime — this is a synchronous offline replay
//! tool, not a live service.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use serde::Deserialize;

use fusion_engine::{EngineConfig, EngineEvent, Fix, FusionEngine, InertialSample, RoadSegmentInput};

/// Replays a recorded GPS/IMU session through the fusion engine.
#[derive(Parser, Debug)]
struct Args {
    /// Path to a newline-delimited JSON recording; each line is `{"fix": {...}}` or
    /// `{"inertial": {...}}`.
    #[arg(long)]
    input: PathBuf,

    /// Optional path to a JSON array of road segments to load before replay.
    #[arg(long)]
    roads: Option<PathBuf>,

    /// Optional path to a JSON `EngineConfig` overriding the documented defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enables snap-to-roads even if not set in `--config`.
    #[arg(long)]
    enable_snap: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InputEvent {
    fix: Option<Fix>,
    inertial: Option<InertialSample>,
}

fn load_config(path: &Option<PathBuf>) -> Result<EngineConfig> {
    match path {
        Some(p) => {
            let file = File::open(p).with_context(|| format!("opening config {}", p.display()))?;
            let config: EngineConfig = serde_json::from_reader(BufReader::new(file))?;
            Ok(config)
        }
        None => Ok(EngineConfig::default()),
    }
}

fn load_roads(path: &PathBuf) -> Result<Vec<RoadSegmentInput>> {
    let file = File::open(path).with_context(|| format!("opening roads {}", path.display()))?;
    let roads: Vec<RoadSegmentInput> = serde_json::from_reader(BufReader::new(file))?;
    Ok(roads)
}

fn log_events(events: &[EngineEvent]) {
    for event in events {
        info!("event: {event:?}");
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    if args.enable_snap {
        config.enable_snap_to_roads = true;
    }
    let mut engine = FusionEngine::new(config);

    if let Some(roads_path) = &args.roads {
        let roads = load_roads(roads_path)?;
        let loaded = engine.load_road_segments(&roads)?;
        info!("loaded {loaded} road segments from {}", roads_path.display());
    }

    let input = File::open(&args.input)
        .with_context(|| format!("opening input {}", args.input.display()))?;
    let reader = BufReader::new(input);

    let mut emitted = 0usize;
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event: InputEvent = serde_json::from_str(&line)
            .with_context(|| format!("parsing input line: {line}"))?;

        let (record, events) = if let Some(fix) = event.fix {
            engine.on_fix(fix)
        } else if let Some(sample) = event.inertial {
            engine.on_inertial(sample)
        } else {
            continue;
        };

        log_events(&events);
        if let Some(record) = record {
            println!("{}", serde_json::to_string(&record)?);
            emitted += 1;
        }
    }

    info!("replay complete: {emitted} records emitted");
    Ok(())
}
