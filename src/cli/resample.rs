//! Resample command implementation

use crate::aggregate::{aggregate, split_partial};
use crate::candle::{Bar, Timeframe};
use crate::config::Config;
use crate::data::{load_csv, DateBounds};
use anyhow::Context;
use chrono::{NaiveDate, SecondsFormat};
use clap::Args;
use std::io::Write;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub struct ResampleArgs {
    /// CSV file of one-minute bars (overrides data.path)
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Target timeframe (overrides playback.timeframe)
    #[arg(long)]
    pub timeframe: Option<Timeframe>,

    /// First day to include, YYYY-MM-DD (overrides data.start_date)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last day to include, YYYY-MM-DD (overrides data.end_date)
    #[arg(long)]
    pub end: Option<NaiveDate>,
}

impl ResampleArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let path = self.data.as_ref().unwrap_or(&config.data.path);
        let timeframe = self.timeframe.unwrap_or(config.playback.timeframe);
        let bounds = DateBounds::new(
            self.start.or(config.data.start_date),
            self.end.or(config.data.end_date),
        );

        let series = load_csv(path, bounds)
            .with_context(|| format!("Failed to load {}", path.display()))?;
        let stdout = std::io::stdout();
        let count = write_resampled(series.bars(), timeframe, stdout.lock())?;
        tracing::info!(%timeframe, raw = series.len(), buckets = count, "Resampled series");
        Ok(())
    }
}

/// Aggregate `bars` and write them as CSV with a trailing `partial` flag
pub fn write_resampled<W: Write>(bars: &[Bar], timeframe: Timeframe, out: W) -> anyhow::Result<usize> {
    let aggregated = aggregate(bars, timeframe);
    let (completed, partial) = split_partial(&aggregated, bars, timeframe);

    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(["timestamp", "open", "high", "low", "close", "volume", "partial"])?;

    let rows = completed
        .iter()
        .map(|bar| (bar, false))
        .chain(partial.map(|bar| (bar, true)));
    for (bar, is_partial) in rows {
        writer.write_record([
            bar.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
            is_partial.to_string(),
        ])?;
    }
    writer.flush()?;

    Ok(aggregated.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn bars(minutes: i64) -> Vec<Bar> {
        (0..minutes)
            .map(|m| {
                let ts = Utc.timestamp_opt(1_749_340_800 + m * 60, 0).unwrap();
                let c = Decimal::from(10 + m);
                Bar::new(ts, c, c + dec!(1), c - dec!(1), c, dec!(1))
            })
            .collect()
    }

    #[test]
    fn test_write_resampled_marks_trailing_partial() {
        let mut out = Vec::new();
        let count = write_resampled(&bars(5), "3m".parse().unwrap(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(count, 2);
        assert_eq!(lines[0], "timestamp,open,high,low,close,volume,partial");
        assert_eq!(lines[1], "2025-06-08T00:00:00Z,10,13,9,12,3,false");
        assert_eq!(lines[2], "2025-06-08T00:03:00Z,13,15,12,14,2,true");
    }

    #[test]
    fn test_empty_input_writes_header_only() {
        let mut out = Vec::new();
        let count = write_resampled(&[], Timeframe::ONE_MINUTE, &mut out).unwrap();
        assert_eq!(count, 0);
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }
}
