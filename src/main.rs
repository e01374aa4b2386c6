// Command-line launcher for the market-making simulator

use clap::{Parser, ValueEnum};
use market_maker_sim::simulation::BinaryLogger;
use market_maker_sim::{
    strategy_from_name, RiskConfig, SimulationConfig, SimulationMode, SimulationSession,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Simulate,
    Replay,
}

#[derive(Parser)]
#[command(name = "mm-sim")]
#[command(version)]
#[command(about = "Deterministic market-making simulator", long_about = None)]
struct Cli {
    /// Run mode
    #[arg(long, value_enum, default_value = "simulate")]
    mode: ModeArg,

    /// Quoting strategy: heuristic | avellaneda-stoikov
    #[arg(long, default_value = "heuristic")]
    strategy: String,

    /// RNG seed
    #[arg(long)]
    seed: Option<u32>,

    /// Number of events to process
    #[arg(long)]
    iterations: Option<usize>,

    /// Per-event latency in milliseconds
    #[arg(long)]
    latency_ms: Option<u64>,

    /// Write generated events to this log file
    #[arg(long, value_name = "PATH")]
    event_log: Option<PathBuf>,

    /// Replay events from this log file (implies --mode replay)
    #[arg(long, value_name = "PATH")]
    replay: Option<PathBuf>,

    /// Write events in compact binary format
    #[arg(long, value_name = "PATH")]
    binary_log: Option<PathBuf>,

    /// Load base configuration from a TOML file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Suppress per-event output
    #[arg(long)]
    quiet: bool,
}

fn build_config(cli: &Cli) -> Result<SimulationConfig, String> {
    let mut config = match &cli.config {
        Some(path) => SimulationConfig::from_file(path).map_err(|e| e.to_string())?,
        None => SimulationConfig::default(),
    };

    config.mode = match cli.mode {
        ModeArg::Simulate => SimulationMode::Simulate,
        ModeArg::Replay => SimulationMode::Replay,
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(iterations) = cli.iterations {
        config.iterations = iterations;
    }
    if let Some(latency_ms) = cli.latency_ms {
        config.latency_ms = latency_ms;
    }
    if let Some(path) = &cli.event_log {
        config.event_log_path = Some(path.clone());
    }
    if let Some(path) = &cli.replay {
        config.replay_log_path = Some(path.clone());
        config.mode = SimulationMode::Replay;
    }
    if cli.quiet {
        config.quiet = true;
    }

    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.quiet { Level::WARN } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Argument error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let Some(strategy) = strategy_from_name(&cli.strategy) else {
        eprintln!(
            "Invalid --strategy value: {} (expected heuristic|avellaneda-stoikov)",
            cli.strategy
        );
        return ExitCode::FAILURE;
    };

    let mut session = match SimulationSession::new(config.clone(), RiskConfig::default(), strategy)
    {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Simulation failed to start: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(path) = &cli.binary_log {
        match BinaryLogger::create(path) {
            Ok(logger) => session.set_binary_log(logger),
            Err(e) => {
                eprintln!("Failed to open binary log {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        }
    }

    let summary = session.run();

    println!(
        "SUMMARY mode={} seed={} iterations={} processed={} last_sequence={} \
         avg_bid={:.6} avg_ask={:.6} trade_volume={} checksum={}",
        config.mode.as_str(),
        config.seed,
        config.iterations,
        summary.processed,
        summary.last_sequence,
        summary.avg_bid,
        summary.avg_ask,
        summary.trade_volume,
        summary.checksum,
    );

    session.maker_mut().report();
    session.performance().report();

    if summary.processed == 0 {
        eprintln!("No events processed.");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
