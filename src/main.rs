//! # Undercrawl Main Entry Point
//!
//! Headless driver: builds a run, plays a key script and/or the autopilot, then
//! prints the final frame, the message log and the run statistics.

use clap::Parser;
use std::path::PathBuf;
use undercrawl::{
    inventory_lines, message_lines, parse_inputs, status_line, AutoexploreState, GameState,
    GenerationConfig, InputHandler, InputOutcome, RenderView, UndercrawlResult,
};

/// Command line arguments for Undercrawl.
#[derive(Parser, Debug)]
#[command(name = "undercrawl")]
#[command(about = "A turn-based descent into the lost city under the mountain")]
#[command(version)]
struct Args {
    /// Random seed for dungeon generation
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of autopilot turns to play after the script
    #[arg(short, long, default_value_t = 0)]
    turns: u32,

    /// Key script to play, e.g. "3l2j.g>"
    #[arg(long)]
    script: Option<String>,

    /// JSON file with generation settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Resume from a saved game instead of starting a new run
    #[arg(long)]
    load: Option<PathBuf>,

    /// Write the final state to this file
    #[arg(long)]
    save: Option<PathBuf>,

    /// Draw unexplored tiles too
    #[arg(long)]
    show_map: bool,

    /// Number of log messages to print
    #[arg(long, default_value_t = 10)]
    messages: usize,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() {
    let args = Args::parse();
    initialize_logging(&args.log_level);

    #[cfg(feature = "dev-tools")]
    let _span = tracing::info_span!("run", seed = ?args.seed).entered();

    if let Err(e) = run(&args) {
        log::error!("Run aborted: {}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

/// Initializes logging with the requested level.
fn initialize_logging(log_level: &str) {
    #[cfg(feature = "dev-tools")]
    {
        let filter = tracing_subscriber::EnvFilter::try_new(log_level)
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }

    #[cfg(not(feature = "dev-tools"))]
    {
        env_logger::Builder::new()
            .parse_filters(log_level)
            .parse_default_env()
            .format_timestamp(None)
            .init();
    }
}

fn run(args: &Args) -> UndercrawlResult<()> {
    let mut state = start(args)?;
    let handler = InputHandler::new();
    let mut autoexplore = AutoexploreState::new();

    if let Some(script) = &args.script {
        for input in parse_inputs(script, &handler)? {
            if !state.is_running() {
                break;
            }
            match handler.handle(input, &mut state) {
                InputOutcome::Quit => break,
                InputOutcome::Help => println!("{}", HELP),
                InputOutcome::ToggleAutoexplore => {
                    autoexplore.toggle();
                }
                InputOutcome::TaskQueued => while state.advance_player_task() {},
                InputOutcome::TurnTaken | InputOutcome::NoTurn => {}
            }
        }
    }

    for _ in 0..args.turns {
        let Some(action) = autoexplore.next_action(&state) else {
            break;
        };
        state.handle_action(action);
    }

    print_report(&state, args);

    if let Some(path) = &args.save {
        state.save_to_file(path)?;
    }
    Ok(())
}

fn start(args: &Args) -> UndercrawlResult<GameState> {
    if let Some(path) = &args.load {
        return GameState::load_from_file(path);
    }
    let mut config = match &args.config {
        Some(path) => GenerationConfig::load_from_file(path)?,
        None => GenerationConfig::default(),
    };
    config.seed = args.seed.unwrap_or_else(rand::random);
    config.check()?;
    log::info!("Starting Undercrawl v{} with seed {}", undercrawl::VERSION, config.seed);
    GameState::with_config(config)
}

fn print_report(state: &GameState, args: &Args) {
    let view = RenderView::from_world(&state.world);
    print!("{}", view.to_ascii(args.show_map));
    println!("{}", status_line(state));
    println!();
    for line in message_lines(&state.message_log, args.messages) {
        println!("{}", line);
    }
    let inventory = inventory_lines(state);
    if !inventory.is_empty() {
        println!();
        for line in inventory {
            println!("{}", line);
        }
    }
    println!();
    match serde_json::to_string_pretty(&state.statistics) {
        Ok(json) => println!("{}", json),
        Err(e) => log::warn!("Could not serialize statistics: {}", e),
    }
}

const HELP: &str = "\
Movement: hjkl yubn (or wasd)
  .  wait        g  pick up
  >  stairs      x  toggle autopilot
  q  quit        ?  this help";
