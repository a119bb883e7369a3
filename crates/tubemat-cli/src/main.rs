//! Tubemat CLI - runs four-microphone impedance tube measurements.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tubemat")]
#[command(author, version, about = "Four-microphone impedance tube analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default measurement configuration
    InitConfig(commands::init_config::InitConfigArgs),

    /// Write the multitone stimulus to a WAV file
    Generate(commands::generate::GenerateArgs),

    /// Synthesize a four-channel recording of an analytic sample
    Simulate(commands::simulate::SimulateArgs),

    /// Build a calibration record from a through measurement
    Calibrate(commands::calibrate::CalibrateArgs),

    /// Process a sample measurement into acoustic properties
    Process(commands::process::ProcessArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::InitConfig(args) => commands::init_config::run(args),
        Commands::Generate(args) => commands::generate::run(args),
        Commands::Simulate(args) => commands::simulate::run(args),
        Commands::Calibrate(args) => commands::calibrate::run(args),
        Commands::Process(args) => commands::process::run(args),
    }
}
