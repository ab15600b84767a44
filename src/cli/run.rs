//! Run command implementation

use crate::agent::build_agent;
use crate::candle::Timeframe;
use crate::config::Config;
use crate::data::{load_csv, DateBounds, ParquetWriter};
use crate::ledger::Ledger;
use crate::playback::{ImmediateScheduler, IntervalScheduler, PlaybackCursor, Scheduler, SpeedControl};
use crate::sim::{PlaybackLoop, Simulation, StepReport, StopReason};
use anyhow::Context;
use clap::{Args, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Summary output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// CSV file of one-minute bars (overrides data.path)
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Aggregation timeframe, e.g. 15m, 1h, 4h (overrides playback.timeframe)
    #[arg(long)]
    pub timeframe: Option<Timeframe>,

    /// Aggregated candles kept in the window (overrides playback.window_size)
    #[arg(long)]
    pub window: Option<usize>,

    /// Milliseconds between steps (overrides playback.interval_ms)
    #[arg(long)]
    pub interval: Option<u64>,

    /// Step without pausing and without printing frames
    #[arg(long)]
    pub fast: bool,

    /// Stop after this many steps
    #[arg(long)]
    pub max_steps: Option<usize>,

    /// Directory for Parquet equity curve and audit trail
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Summary format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

impl RunArgs {
    /// Apply command-line overrides on top of the loaded configuration
    pub fn effective_config(&self, config: &Config) -> anyhow::Result<Config> {
        let mut config = config.clone();
        if let Some(path) = &self.data {
            config.data.path = path.clone();
        }
        if let Some(timeframe) = self.timeframe {
            config.playback.timeframe = timeframe;
        }
        if let Some(window) = self.window {
            config.playback.window_size = window;
        }
        if let Some(interval) = self.interval {
            config.playback.interval_ms = interval;
        }
        config.validate()?;
        Ok(config)
    }

    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let config = self.effective_config(config)?;

        let bounds = DateBounds::new(config.data.start_date, config.data.end_date);
        let series = load_csv(&config.data.path, bounds)
            .with_context(|| format!("Failed to load {}", config.data.path.display()))?;
        let cursor = PlaybackCursor::new(
            Arc::new(series),
            config.playback.timeframe,
            config.playback.window_size,
        )?;
        let agent = build_agent(&config.agent)?;
        let ledger = Ledger::new(config.ledger.initial_cash)?;
        let mut sim = Simulation::new(cursor, agent, ledger);

        let reason = if self.fast {
            drive(PlaybackLoop::new(ImmediateScheduler), &mut sim, self.max_steps).await?
        } else {
            let speed = SpeedControl::new(config.playback.interval_ms);
            let (tx, rx) = mpsc::channel(64);
            let printer = tokio::spawn(print_frames(rx));
            let reason = drive(
                PlaybackLoop::new(IntervalScheduler::new(speed)).with_frames(tx),
                &mut sim,
                self.max_steps,
            )
            .await?;
            printer.await?;
            reason
        };

        if reason == StopReason::Cancelled {
            tracing::warn!(run_id = %sim.run_id(), "Run interrupted; reporting committed steps");
        }

        if let Some(dir) = &self.output {
            let files = ParquetWriter::new(dir).write_run(
                &sim.run_id().to_string(),
                sim.equity_curve(),
                sim.ledger().audit_trail(),
            )?;
            tracing::info!(
                equity = ?files.equity_path,
                audit = ?files.audit_path,
                "Wrote run results"
            );
        }

        let summary = sim.summary();
        match self.format {
            OutputFormat::Table => println!("{}", summary.format_table()),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        }
        Ok(())
    }
}

/// Run `host` until exhaustion, the optional step limit or Ctrl-C
async fn drive<S: Scheduler>(
    mut host: PlaybackLoop<S>,
    sim: &mut Simulation,
    max_steps: Option<usize>,
) -> anyhow::Result<StopReason> {
    if let Some(max) = max_steps {
        host = host.with_max_steps(max);
    }
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Ctrl-C handler unavailable");
            std::future::pending::<()>().await;
        }
    };
    Ok(host.run(sim, shutdown).await?)
}

/// Minimal terminal rendering: one line per renderable frame
async fn print_frames(mut rx: mpsc::Receiver<StepReport>) {
    while let Some(report) = rx.recv().await {
        let Some(candle) = report.frame.latest() else {
            continue;
        };
        println!(
            "{} | O {} H {} L {} C {} | {} -> {} | equity {:.2}",
            candle.timestamp.format("%Y-%m-%d %H:%M"),
            candle.open,
            candle.high,
            candle.low,
            candle.close,
            report.record.requested,
            report.record.applied,
            report.equity.equity,
        );
    }
}
