//! Miami Racer headless runner
//!
//! Drives the simulation at a fixed frame rate with a small lane-dodging
//! autopilot and reports progress. Useful for soak testing balance changes.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use serde::Serialize;

use miami_racer::sim::{Diagnostics, RunState, Simulation, TickInput, tick};
use miami_racer::{FrameOutcome, Tuning};

/// Look-ahead for threats in the current lane
const THREAT_RANGE: f32 = 28.0;
/// Closer than this with no ammo: change lanes
const DODGE_RANGE: f32 = 16.0;
/// Lane must be clear this far ahead before boosting
const BOOST_CLEAR_RANGE: f32 = 60.0;

#[derive(Parser, Debug)]
#[command(name = "miami-racer", about = "Run the racer simulation headless")]
struct Args {
    /// Simulated seconds to run
    #[arg(long, default_value_t = 60.0)]
    seconds: f32,

    /// Ticks per simulated second
    #[arg(long, default_value_t = 60)]
    fps: u32,

    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// JSON file overriding tuning values
    #[arg(long)]
    tuning: Option<PathBuf>,

    /// Print JSON lines instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct Summary {
    seed: u64,
    frames: u64,
    runs: u32,
    best_score: u64,
    last: FrameOutcome,
    diagnostics: Diagnostics,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.fps == 0 {
        return Err(anyhow!("fps must be > 0"));
    }
    if !(args.seconds > 0.0) {
        return Err(anyhow!("seconds must be > 0"));
    }

    let tuning = match &args.tuning {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read tuning file {}", path.display()))?;
            Tuning::from_json(&text)
                .with_context(|| format!("failed to parse tuning file {}", path.display()))?
        }
        None => Tuning::default(),
    };

    let summary = run(tuning, &args)?;
    if args.json {
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        println!(
            "seed {} | {} frames | {} runs | best score {} | destroyed {} | dropped spawns {}",
            summary.seed,
            summary.frames,
            summary.runs,
            summary.best_score,
            summary.diagnostics.obstacles_destroyed,
            dropped(&summary.diagnostics),
        );
    }
    Ok(())
}

fn run(tuning: Tuning, args: &Args) -> Result<Summary> {
    let dt = 1.0 / args.fps as f32;
    let frames = (args.seconds * args.fps as f32).ceil() as u64;
    let report_every = args.fps as u64;

    let mut sim = Simulation::new(tuning, args.seed);
    sim.set_paused(false);
    log::info!("Running {} frames at {} fps", frames, args.fps);

    let mut runs = 1;
    let mut best_score = 0;
    let mut last = tick(&mut sim, &TickInput::default(), 0.0);

    for frame in 1..=frames {
        if last.run_state == RunState::Crashed {
            best_score = best_score.max(last.score);
            sim.restart_run();
            runs += 1;
        }

        let input = autopilot(&sim, &last);
        last = tick(&mut sim, &input, dt);

        if frame % report_every == 0 {
            report(frame, &last, args.json)?;
        }
    }
    best_score = best_score.max(last.score);

    Ok(Summary {
        seed: args.seed,
        frames,
        runs,
        best_score,
        last,
        diagnostics: sim.diagnostics(),
    })
}

fn report(frame: u64, outcome: &FrameOutcome, json: bool) -> Result<()> {
    if json {
        #[derive(Serialize)]
        struct Line<'a> {
            frame: u64,
            #[serde(flatten)]
            outcome: &'a FrameOutcome,
        }
        println!("{}", serde_json::to_string(&Line { frame, outcome })?);
    } else {
        println!(
            "[{frame:>6}] {:?} score {:>6} speed {:>6.1} ammo {}/{} boost {:.2}{}",
            outcome.run_state,
            outcome.score,
            outcome.speed,
            outcome.ordnance,
            outcome.ordnance_max,
            outcome.boost_charge,
            if outcome.boost_active { " (burning)" } else { "" },
        );
    }
    Ok(())
}

fn dropped(diag: &Diagnostics) -> u32 {
    diag.obstacles_dropped
        + diag.decorations_dropped
        + diag.projectiles_dropped
        + diag.explosions_dropped
        + diag.fire_puffs_dropped
}

/// Distance to the nearest obstacle ahead in `lane`, if any within `range`
fn threat_in_lane(sim: &Simulation, lane: u8, range: f32) -> Option<f32> {
    let z = sim.vehicle.z;
    sim.world
        .obstacles
        .iter()
        .filter(|(_, o)| o.lane == lane)
        .map(|(_, o)| o.pos.z - z)
        .filter(|d| *d > -1.0 && *d < range)
        .fold(None, |nearest: Option<f32>, d| Some(nearest.map_or(d, |n| n.min(d))))
}

/// Shoot what is ahead, dodge when out of ammo, boost on clear road
fn autopilot(sim: &Simulation, last: &FrameOutcome) -> TickInput {
    let lane = sim.vehicle.target_lane;
    let mut input = TickInput {
        throttle_up: true,
        ..Default::default()
    };

    if let Some(distance) = threat_in_lane(sim, lane, THREAT_RANGE) {
        if last.ordnance > 0 {
            input.fire = true;
        }
        if last.ordnance == 0 || distance < DODGE_RANGE {
            let safest = (0..sim.tuning.num_lanes)
                .filter(|l| l.abs_diff(lane) == 1)
                .min_by(|a, b| {
                    let da = threat_in_lane(sim, *a, THREAT_RANGE).unwrap_or(f32::MAX);
                    let db = threat_in_lane(sim, *b, THREAT_RANGE).unwrap_or(f32::MAX);
                    db.total_cmp(&da)
                });
            if let Some(target) = safest {
                input.lane_left = target < lane;
                input.lane_right = target > lane;
            }
        }
    } else if last.boost_ready && threat_in_lane(sim, lane, BOOST_CLEAR_RANGE).is_none() {
        input.toggle_boost = true;
    }

    input
}
