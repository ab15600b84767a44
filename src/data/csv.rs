//! CSV loader for one-minute bars

use crate::candle::{Bar, CandleSeries, SeriesError};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use csv::StringRecord;
use rust_decimal::Decimal;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Accepted header names for the timestamp column
const TIMESTAMP_COLUMNS: [&str; 4] = ["timestamp", "time", "datetime", "date"];
/// Epoch values at or above this magnitude are milliseconds
const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Loading errors
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Missing column {0:?}")]
    MissingColumn(String),
    #[error("Row {row}: invalid timestamp {value:?}")]
    InvalidTimestamp { row: usize, value: String },
    #[error("Row {row}: invalid {column} value {value:?}")]
    InvalidNumber {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error(transparent)]
    Series(#[from] SeriesError),
}

/// Inclusive calendar-day bounds applied while loading
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateBounds {
    /// First day kept, from 00:00 UTC
    pub start: Option<NaiveDate>,
    /// Last day kept, through 23:59 UTC
    pub end: Option<NaiveDate>,
}

impl DateBounds {
    /// Bounds from optional start and end days
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// Whether `timestamp` falls on a kept day
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        let day = timestamp.date_naive();
        self.start.map_or(true, |s| day >= s) && self.end.map_or(true, |e| day <= e)
    }
}

#[derive(Debug, Clone, Copy)]
struct Columns {
    timestamp: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self, LoadError> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
        };
        let require = |name: &'static str| {
            find(&[name]).ok_or_else(|| LoadError::MissingColumn(name.to_string()))
        };

        Ok(Self {
            timestamp: find(&TIMESTAMP_COLUMNS)
                .ok_or_else(|| LoadError::MissingColumn("timestamp".to_string()))?,
            open: require("open")?,
            high: require("high")?,
            low: require("low")?,
            close: require("close")?,
            volume: require("volume")?,
        })
    }
}

/// Load a validated series from a CSV file
pub fn load_csv(path: impl AsRef<Path>, bounds: DateBounds) -> Result<CandleSeries, LoadError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let series = CandleSeries::new(read_bars(file, bounds)?)?;
    tracing::info!(
        path = %path.display(),
        bars = series.len(),
        start = ?series.start(),
        end = ?series.end(),
        "Loaded candle series"
    );
    Ok(series)
}

/// Parse bars from CSV with a header row, keeping rows inside `bounds`
///
/// Rows are returned in file order; ordering is checked by `CandleSeries`.
pub fn read_bars<R: Read>(reader: R, bounds: DateBounds) -> Result<Vec<Bar>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let columns = Columns::resolve(rdr.headers()?)?;

    let mut bars = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = i + 1;

        let raw_ts = record.get(columns.timestamp).unwrap_or_default();
        let timestamp = parse_timestamp(raw_ts).ok_or_else(|| LoadError::InvalidTimestamp {
            row,
            value: raw_ts.to_string(),
        })?;
        if !bounds.contains(timestamp) {
            continue;
        }

        let number = |column: &'static str, idx: usize| {
            let value = record.get(idx).unwrap_or_default();
            parse_decimal(value).ok_or_else(|| LoadError::InvalidNumber {
                row,
                column,
                value: value.to_string(),
            })
        };

        bars.push(Bar::new(
            timestamp,
            number("open", columns.open)?,
            number("high", columns.high)?,
            number("low", columns.low)?,
            number("close", columns.close)?,
            number("volume", columns.volume)?,
        ));
    }

    tracing::debug!(rows = bars.len(), "Parsed CSV bars");
    Ok(bars)
}

/// Parse RFC 3339, `YYYY-MM-DD HH:MM:SS[.f][offset]` (naive = UTC), or epoch
/// seconds/milliseconds
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(epoch) = value.parse::<i64>() {
        return if epoch.abs() >= EPOCH_MILLIS_THRESHOLD {
            Utc.timestamp_millis_opt(epoch).single()
        } else {
            Utc.timestamp_opt(epoch, 0).single()
        };
    }

    let normalized = value.replacen(' ', "T", 1);
    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = normalized.trim_end_matches('Z');
    NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M"))
        .ok()
        .map(|dt| dt.and_utc())
}

/// Parse plain or scientific decimal notation
pub fn parse_decimal(value: &str) -> Option<Decimal> {
    let value = value.trim();
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "\
timestamp,open,high,low,close,volume
2025-06-08 00:00:00,105000.5,105010,104990,105005,1.25
2025-06-08 00:01:00,105005,105020,105000,105015,0.75
2025-06-09 00:00:00,105100,105110,105090,105100,2e-3
";

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = utc(2025, 6, 8, 12, 30);
        for value in [
            "2025-06-08 12:30:00",
            "2025-06-08T12:30:00",
            "2025-06-08T12:30:00Z",
            "2025-06-08T12:30:00.000",
            "2025-06-08 12:30:00+00:00",
            "2025-06-08T14:30:00+02:00",
            "2025-06-08T12:30",
            "1749385800",
            "1749385800000",
        ] {
            assert_eq!(parse_timestamp(value), Some(expected), "{}", value);
        }
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("105000.5"), Some(dec!(105000.5)));
        assert_eq!(parse_decimal("2e-3"), Some(dec!(0.002)));
        assert_eq!(parse_decimal("abc"), None);
    }

    #[test]
    fn test_read_bars() {
        let bars = read_bars(SAMPLE.as_bytes(), DateBounds::default()).unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].timestamp, utc(2025, 6, 8, 0, 0));
        assert_eq!(bars[0].open, dec!(105000.5));
        assert_eq!(bars[2].volume, dec!(0.002));
    }

    #[test]
    fn test_bounds_are_inclusive_days() {
        let day = NaiveDate::from_ymd_opt(2025, 6, 8);
        let bars = read_bars(SAMPLE.as_bytes(), DateBounds::new(day, day)).unwrap();
        assert_eq!(bars.len(), 2);

        let next = NaiveDate::from_ymd_opt(2025, 6, 9);
        let bars = read_bars(SAMPLE.as_bytes(), DateBounds::new(next, None)).unwrap();
        assert_eq!(bars.len(), 1);
    }

    #[test]
    fn test_column_aliases_and_order() {
        let csv = "Date,Volume,Close,Low,High,Open,Extra\n2025-06-08 00:00:00,1,10,9,11,10,x\n";
        let bars = read_bars(csv.as_bytes(), DateBounds::default()).unwrap();
        assert_eq!(bars[0].close, dec!(10));
        assert_eq!(bars[0].high, dec!(11));
    }

    #[test]
    fn test_missing_column() {
        let csv = "timestamp,open,high,low,close\n";
        let err = read_bars(csv.as_bytes(), DateBounds::default()).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn(c) if c == "volume"));
    }

    #[test]
    fn test_bad_number_reports_row() {
        let csv = "timestamp,open,high,low,close,volume\n\
                   2025-06-08 00:00:00,1,1,1,1,1\n\
                   2025-06-08 00:01:00,1,oops,1,1,1\n";
        let err = read_bars(csv.as_bytes(), DateBounds::default()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::InvalidNumber { row: 2, column: "high", .. }
        ));
    }

    #[test]
    fn test_load_csv_rejects_unsorted_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "timestamp,open,high,low,close,volume\n\
             2025-06-08 00:01:00,1,1,1,1,1\n\
             2025-06-08 00:00:00,1,1,1,1,1\n"
        )
        .unwrap();

        let err = load_csv(file.path(), DateBounds::default()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Series(SeriesError::NotIncreasing { index: 1, .. })
        ));
    }

    #[test]
    fn test_load_csv_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let series = load_csv(file.path(), DateBounds::default()).unwrap();
        assert_eq!(series.len(), 3);
    }
}
