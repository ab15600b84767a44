//! candle-sandbox: candle-by-candle market replay for trading agents
//!
//! This library provides the core components for:
//! - Loading one-minute OHLCV bars from CSV
//! - Incremental resampling into coarser timeframes
//! - Playback with a bounded trailing window
//! - A cash/position ledger with an audit trail
//! - Pluggable decision agents
//! - An async host loop with adjustable pacing
//! - Parquet export of run results
//! - Logging and Prometheus metrics

pub mod agent;
pub mod aggregate;
pub mod candle;
pub mod cli;
pub mod config;
pub mod data;
pub mod ledger;
pub mod playback;
pub mod sim;
pub mod telemetry;
