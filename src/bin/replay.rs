//! Compact replay: summarizes a recorded session instead of printing every record — load a log,
//! run it through the filter, print one `serde_json::json!` summary of aggregate stats.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use serde_json::json;

use fusion_engine::geo::haversine_m;
use fusion_engine::{EngineConfig, Fix, FusionEngine, InertialSample};

#[derive(Parser, Debug)]
struct Args {
    /// Path to a newline-delimited JSON recording.
    #[arg(long)]
    log: PathBuf,

    /// Enables snap-to-roads for this run.
    #[arg(long)]
    enable_snap: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InputEvent {
    fix: Option<Fix>,
    inertial: Option<InertialSample>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = EngineConfig::default();
    config.enable_snap_to_roads = args.enable_snap;
    let mut engine = FusionEngine::new(config);

    let file = File::open(&args.log).with_context(|| format!("opening {}", args.log.display()))?;
    let reader = BufReader::new(file);

    let mut fix_count = 0usize;
    let mut good_count = 0usize;
    let mut snap_count = 0usize;
    let mut dr_count = 0usize;
    let mut raw_vs_final_m = Vec::new();
    let mut max_speed = 0.0f64;

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event: InputEvent = serde_json::from_str(&line)?;

        if let Some(fix) = event.fix {
            fix_count += 1;
            let (record, _) = engine.on_fix(fix);
            if let Some(record) = record {
                if record.is_good {
                    good_count += 1;
                }
                if record.snap_applied {
                    snap_count += 1;
                }
                raw_vs_final_m.push(haversine_m(
                    (record.lat, record.lon),
                    (record.final_lat, record.final_lon),
                ));
                max_speed = max_speed.max(record.spd);
            }
        } else if let Some(sample) = event.inertial {
            let (record, _) = engine.on_inertial(sample);
            if let Some(record) = record {
                dr_count += 1;
                max_speed = max_speed.max(record.spd);
            }
        }
    }

    let mean_correction_m = if raw_vs_final_m.is_empty() {
        0.0
    } else {
        raw_vs_final_m.iter().sum::<f64>() / raw_vs_final_m.len() as f64
    };

    let out = json!({
        "log": args.log.display().to_string(),
        "fixes": fix_count,
        "good_fixes": good_count,
        "snaps_applied": snap_count,
        "dead_reckoned_samples": dr_count,
        "mean_correction_m": mean_correction_m,
        "max_speed_mps": max_speed,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);

    Ok(())
}
