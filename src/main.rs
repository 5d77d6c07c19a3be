//! # Dungeon Sim Entry Point
//!
//! Headless runner: builds an engine, lets the autopilot play a number of
//! rounds, and reports what happened.

use clap::Parser;
use dungeon_sim::{Autopilot, Direction, DungeonResult, Engine, EngineConfig};
use log::{debug, info, warn};
use std::path::PathBuf;

/// Command line arguments for the simulation runner.
#[derive(Parser, Debug)]
#[command(name = "dungeon-sim")]
#[command(about = "Turn-based tile-grid dungeon simulation")]
#[command(version)]
struct Args {
    /// Random seed for reproducible generation
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of rounds to simulate
    #[arg(long, default_value_t = 200)]
    steps: u32,

    /// JSON engine configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print the full map after the run
    #[arg(long)]
    show_map: bool,

    /// Reveal the map and make the player nearly unkillable
    #[arg(long)]
    god_mode: bool,
}

fn main() -> DungeonResult<()> {
    let args = Args::parse();

    initialize_logging(&args.log_level);

    info!("Starting Dungeon Sim v{}", dungeon_sim::VERSION);

    let config = load_config(&args)?;
    let mut engine = Engine::new(config)?;
    if args.god_mode {
        engine.enable_god_mode();
    }

    run(&mut engine, args.steps)?;
    report(&engine, args.show_map);
    Ok(())
}

/// Initializes env_logger; `RUST_LOG` takes precedence over the flag.
fn initialize_logging(log_level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_target(false)
        .init();
}

fn load_config(args: &Args) -> DungeonResult<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            EngineConfig::from_json_file(path)?
        }
        None => EngineConfig::default(),
    };

    if let Some(seed) = args.seed {
        config.seed = seed;
        config.fixed_seed = true;
    }
    Ok(config)
}

/// Plays up to `steps` rounds, stopping early if the player dies.
fn run(engine: &mut Engine, steps: u32) -> DungeonResult<()> {
    let autopilot = Autopilot::new();
    let mut explored = 0;

    for turn in 0..steps {
        if engine.is_player_dead() {
            warn!("Player died on depth {} after {} rounds", engine.depth(), turn);
            break;
        }

        let direction = autopilot.next_direction(engine).unwrap_or_else(|| {
            // Cut off from the exit; wander until a path opens up.
            Direction::all()[turn as usize % 4]
        });

        let outcome = engine.step(direction)?;
        explored += engine.mark_newly_explored();
        debug!("Round {}: {:?} -> {:?}", turn, direction, outcome.action);

        if outcome.took_exit() {
            info!("Reached depth {} on round {}", engine.depth(), turn);
        }
    }

    info!("Explored {} floor cells", explored);
    Ok(())
}

fn report(engine: &Engine, show_map: bool) {
    let stats = engine.statistics();
    println!("{}", engine.render_text(show_map));
    println!(
        "Rounds: {}  Depth: {}  Kills: {}  Potions: {}  Damage dealt/taken: {}/{}",
        stats.turns_taken,
        engine.depth(),
        stats.enemies_defeated,
        stats.potions_taken,
        stats.damage_dealt,
        stats.damage_taken
    );
}
