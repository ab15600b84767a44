//! CLI interface for candle-sandbox
//!
//! Provides subcommands for:
//! - `run`: Replay a series through an agent and report the result
//! - `resample`: Print a series aggregated to a coarser timeframe
//! - `config`: Show the effective configuration

mod resample;
mod run;

pub use resample::{write_resampled, ResampleArgs};
pub use run::{OutputFormat, RunArgs};

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "candle-sandbox")]
#[command(about = "Candle-by-candle market replay sandbox for trading agents")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a series through an agent
    Run(RunArgs),
    /// Aggregate a series and print it as CSV
    Resample(ResampleArgs),
    /// Show configuration
    Config,
}
