//! Data module
//!
//! Loads one-minute bars from CSV and exports run results to Parquet

mod csv;
mod parquet;

pub use self::csv::{load_csv, parse_decimal, parse_timestamp, read_bars, DateBounds, LoadError};
pub use self::parquet::{audit_schema, equity_schema, read_equity_curve, ParquetWriter, RunFiles};
