//! EPH Swarm - headless runner
//!
//! Builds a scenario, runs it for a fixed number of steps and prints a
//! summary. `--output` writes the summary plus the final world snapshot as
//! JSON for external viewers.

use clap::Parser;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;

use eph_swarm::core::config::{ControllerKind, DepositMode, SimulationConfig};
use eph_swarm::core::error::Result;
use eph_swarm::scenario::ScenarioKind;
use eph_swarm::simulation::{RunStats, Simulator, WorldSnapshot};

/// Multi-agent navigation with haze-modulated egocentric perception
#[derive(Parser, Debug)]
#[command(name = "eph-swarm")]
#[command(about = "Run a headless EPH swarm scenario")]
struct Args {
    /// TOML config file (missing keys keep their defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// swarm, scramble-crossing or narrow-corridor
    #[arg(long, default_value = "swarm")]
    scenario: ScenarioKind,

    /// Agent count (defaults to the scenario's own)
    #[arg(long)]
    agents: Option<usize>,

    #[arg(long, default_value_t = 500)]
    steps: u64,

    /// Overrides the config seed
    #[arg(long)]
    seed: Option<u64>,

    /// sampling or gradient (overrides the config)
    #[arg(long)]
    controller: Option<ControllerKind>,

    /// deferred or immediate (overrides the config)
    #[arg(long)]
    deposit_mode: Option<DepositMode>,

    /// Write a JSON summary and final snapshot here
    #[arg(long)]
    output: Option<PathBuf>,

    /// Include SPM, precision and the haze grid in the snapshot
    #[arg(long)]
    include_spm: bool,
}

#[derive(Serialize)]
struct RunOutput<'a> {
    scenario: String,
    controller: ControllerKind,
    deposit_mode: DepositMode,
    seed: u64,
    elapsed_secs: f64,
    stats: &'a RunStats,
    final_state: &'a WorldSnapshot,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eph_swarm=info".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(controller) = args.controller {
        config.agent.controller = controller;
    }
    if let Some(mode) = args.deposit_mode {
        config.world.deposit_mode = mode;
    }

    let agent_count = args
        .agents
        .unwrap_or_else(|| args.scenario.default_agent_count());
    tracing::info!(
        "Starting {} with {} agents ({:?} controller, {:?} deposits, seed {})",
        args.scenario,
        agent_count,
        config.agent.controller,
        config.world.deposit_mode,
        config.seed
    );

    let mut sim = Simulator::from_scenario(args.scenario, config, agent_count)?;

    let start = Instant::now();
    let stats = sim.run(args.steps);
    let elapsed = start.elapsed();

    let snapshot = sim.snapshot(args.include_spm);

    println!("\n=== EPH SWARM: {} ===", args.scenario);
    println!("Steps:             {}", stats.steps);
    println!("Simulated time:    {:.1}s", snapshot.time);
    println!("Wall time:         {:?}", elapsed);
    println!("Agent collisions:  {}", stats.agent_collisions);
    println!("Obstacle contacts: {}", stats.obstacle_contacts);
    println!("Goals reached:     {}", stats.goals_reached);
    println!("Stuck events:      {}", stats.stuck_events);
    println!("Mean final speed:  {:.2}", snapshot.mean_speed());
    println!("Max haze:          {:.3}", snapshot.haze_max);

    if let Some(path) = &args.output {
        let config = sim.config();
        let output = RunOutput {
            scenario: args.scenario.to_string(),
            controller: config.agent.controller,
            deposit_mode: config.world.deposit_mode,
            seed: config.seed,
            elapsed_secs: elapsed.as_secs_f64(),
            stats: &stats,
            final_state: &snapshot,
        };
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &output)?;
        tracing::info!("Wrote run output to {:?}", path);
    }

    Ok(())
}
