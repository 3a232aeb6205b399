//! xtask - Development task runner for rotating-set
//!
//! Usage:
//!   cargo run -p xtask -- stress --scenario <yaml> [options]

mod stress;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Development task runner for rotating-set")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive a multi-threaded workload against a shared RotatingSet
    Stress(stress::StressArgs),
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Stress(args) => stress::run(args),
    }
}
