//! Configuration types for candle-sandbox

use crate::candle::Timeframe;
use crate::telemetry::LogFormat;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Input data configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataConfig {
    /// CSV file of one-minute bars
    #[serde(default = "default_data_path")]
    pub path: PathBuf,
    /// First day to keep (inclusive, UTC)
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Last day to keep (inclusive, UTC)
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

fn default_data_path() -> PathBuf {
    PathBuf::from("market_data/BTCUSDT_1m.csv")
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
            start_date: None,
            end_date: None,
        }
    }
}

/// Playback configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackConfig {
    /// Timeframe the raw bars are aggregated into
    #[serde(default = "default_timeframe")]
    pub timeframe: Timeframe,
    /// Number of aggregated candles in the display window
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    /// Milliseconds between steps in paced playback
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

fn default_timeframe() -> Timeframe {
    Timeframe::from_minutes(60).unwrap_or_default()
}
fn default_window_size() -> usize {
    48
}
fn default_interval_ms() -> u64 {
    200
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            timeframe: default_timeframe(),
            window_size: default_window_size(),
            interval_ms: default_interval_ms(),
        }
    }
}

/// Ledger configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LedgerConfig {
    /// Starting cash balance
    #[serde(default = "default_initial_cash")]
    pub initial_cash: Decimal,
}

fn default_initial_cash() -> Decimal {
    Decimal::new(1000, 0)
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            initial_cash: default_initial_cash(),
        }
    }
}

/// Built-in agent selection
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Hold,
    #[default]
    Momentum,
    Linear,
}

/// Agent configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub kind: AgentKind,
    /// Linear policy rows, one per action, five columns each
    #[serde(default)]
    pub weights: Vec<Vec<f64>>,
    /// Linear policy bias, one per row (empty = zero)
    #[serde(default)]
    pub bias: Vec<f64>,
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Serve Prometheus metrics on this port when set
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            metrics_port: None,
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("playback.window_size must be greater than zero")]
    ZeroWindow,
    #[error("playback.interval_ms must be greater than zero")]
    ZeroInterval,
    #[error("ledger.initial_cash must not be negative, got {0}")]
    NegativeCash(Decimal),
    #[error("data.start_date {start} is after data.end_date {end}")]
    InvertedDates { start: NaiveDate, end: NaiveDate },
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.playback.window_size == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        if self.playback.interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.ledger.initial_cash < Decimal::ZERO {
            return Err(ConfigError::NegativeCash(self.ledger.initial_cash));
        }
        if let (Some(start), Some(end)) = (self.data.start_date, self.data.end_date) {
            if start > end {
                return Err(ConfigError::InvertedDates { start, end });
            }
        }
        Ok(())
    }
}
