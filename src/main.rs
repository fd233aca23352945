//! Lane Rush headless runner
//!
//! Plays one session with the autopilot at the controls and reports how it
//! went. Render frames of `--frame-ms` are fed through the same fixed-step
//! accumulator a windowed front end would use.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use serde::Serialize;

use lane_rush::Tuning;
use lane_rush::consts::{MAX_SUBSTEPS, SIM_DT};
use lane_rush::sim::{GameEvent, GameState, PerKind, TickInput, VisualTable, tick};

#[derive(Parser)]
#[command(name = "lane-rush")]
#[command(about = "Run a headless Lane Rush session driven by the autopilot")]
struct Args {
    /// Run seed
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Seconds of game time to simulate at most
    #[arg(long, default_value_t = 120.0)]
    seconds: f32,
    /// Length of one simulated render frame in milliseconds
    #[arg(long, default_value_t = 1000.0 / 60.0)]
    frame_ms: f32,
    /// JSON tuning table (defaults are used when omitted)
    #[arg(long)]
    tuning: Option<PathBuf>,
    /// Print the effective tuning as JSON and exit
    #[arg(long)]
    dump_tuning: bool,
    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

/// Fixed-timestep accumulator
struct FrameClock {
    accumulator: f32,
}

impl FrameClock {
    fn new() -> Self {
        Self { accumulator: 0.0 }
    }

    /// Feed one render frame; returns how many ticks to run
    fn advance(&mut self, frame_dt: f32) -> u32 {
        self.accumulator += frame_dt.min(0.1);
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        substeps
    }
}

#[derive(Debug, Serialize)]
struct RunSummary {
    seed: u64,
    ticks: u64,
    score: u64,
    distance: f32,
    tier_level: u32,
    tier_name: String,
    final_gear: u32,
    spawned: PerKind<u32>,
    recycled: u32,
    gear_changes: u32,
    /// Obstacle kind that ended the run, if any
    crashed_into: Option<String>,
}

fn load_tuning(path: Option<&PathBuf>) -> Result<Tuning> {
    match path {
        Some(path) => Tuning::from_file(path)
            .with_context(|| format!("failed loading tuning from {}", path.display())),
        None => Ok(Tuning::default()),
    }
}

fn run(args: &Args, tuning: Tuning) -> Result<RunSummary> {
    if args.seconds <= 0.0 {
        return Err(anyhow!("--seconds must be > 0"));
    }
    if args.frame_ms <= 0.0 {
        return Err(anyhow!("--frame-ms must be > 0"));
    }

    let visuals = VisualTable::with_variants(&tuning.pool.variants);
    let mut state = GameState::with_config(args.seed, tuning, Box::new(visuals));
    let input = TickInput {
        idle_mode: true,
        ..Default::default()
    };

    let frame_dt = args.frame_ms / 1000.0;
    let frames = (args.seconds / frame_dt).ceil() as u64;
    let mut clock = FrameClock::new();
    let mut summary = RunSummary {
        seed: args.seed,
        ticks: 0,
        score: 0,
        distance: 0.0,
        tier_level: 1,
        tier_name: String::new(),
        final_gear: 1,
        spawned: PerKind::default(),
        recycled: 0,
        gear_changes: 0,
        crashed_into: None,
    };

    'frames: for _ in 0..frames {
        for _ in 0..clock.advance(frame_dt) {
            tick(&mut state, &input, SIM_DT);
            for event in state.drain_events() {
                match event {
                    GameEvent::ObstacleSpawned { kind, .. } => *summary.spawned.get_mut(kind) += 1,
                    GameEvent::ObstacleRecycled { .. } => summary.recycled += 1,
                    GameEvent::GearChanged { .. } => summary.gear_changes += 1,
                    GameEvent::TierChanged { level, name } => {
                        log::debug!("Reached level {} ({})", level, name);
                    }
                    GameEvent::Collision { kind } => {
                        summary.crashed_into = Some(kind.as_str().to_string());
                    }
                }
            }
            if state.is_over() {
                break 'frames;
            }
        }
    }

    let hud = state.hud();
    summary.ticks = state.time_ticks;
    summary.score = hud.score;
    summary.distance = hud.distance;
    summary.tier_level = hud.tier_level;
    summary.tier_name = hud.tier_name;
    summary.final_gear = hud.gear;
    Ok(summary)
}

fn print_summary(summary: &RunSummary) {
    println!("=== RUN SUMMARY ===");
    println!("  Seed:       {}", summary.seed);
    println!(
        "  Time:       {:.1}s ({} ticks)",
        summary.ticks as f32 * SIM_DT,
        summary.ticks
    );
    println!("  Score:      {}", summary.score);
    println!("  Distance:   {:.1}", summary.distance);
    println!("  Level:      {} ({})", summary.tier_level, summary.tier_name);
    println!("  Gear:       {}", summary.final_gear);
    println!(
        "  Spawned:    {} static, {} same-direction, {} oncoming",
        summary.spawned.stationary, summary.spawned.same_direction, summary.spawned.oncoming
    );
    println!("  Recycled:   {}", summary.recycled);
    match &summary.crashed_into {
        Some(kind) => println!("  Ended:      crashed into {kind} obstacle"),
        None => println!("  Ended:      time limit"),
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let tuning = load_tuning(args.tuning.as_ref())?;

    if args.dump_tuning {
        println!("{}", tuning.to_json()?);
        return Ok(());
    }

    log::info!("Lane Rush (headless) starting, seed {}", args.seed);
    let summary = run(&args, tuning)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}
