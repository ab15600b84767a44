//! Candle value types

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One OHLCV data point for a fixed time span
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    /// Start of the span (minute-aligned for raw bars, bucket start for aggregated bars)
    pub timestamp: DateTime<Utc>,
    /// Open price
    pub open: Decimal,
    /// High price
    pub high: Decimal,
    /// Low price
    pub low: Decimal,
    /// Close price
    pub close: Decimal,
    /// Traded volume
    pub volume: Decimal,
}

impl Bar {
    /// Create a new bar
    pub fn new(
        timestamp: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Minutes since the Unix epoch, floored
    pub fn epoch_minutes(&self) -> i64 {
        self.timestamp.timestamp().div_euclid(60)
    }
}

/// Timeframe parsing errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeframeError {
    /// Zero-length period
    #[error("Timeframe must be at least one minute")]
    Zero,
    /// Label could not be parsed
    #[error("Invalid timeframe label: {0:?}")]
    InvalidLabel(String),
}

/// Aggregation period in whole minutes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timeframe(u32);

impl Timeframe {
    /// One minute, the raw bar period
    pub const ONE_MINUTE: Timeframe = Timeframe(1);

    /// Create a timeframe from a number of minutes
    pub fn from_minutes(minutes: u32) -> Result<Self, TimeframeError> {
        if minutes == 0 {
            return Err(TimeframeError::Zero);
        }
        Ok(Self(minutes))
    }

    /// Period length in minutes
    pub fn minutes(&self) -> u32 {
        self.0
    }

    /// Whether this is the raw one-minute period (aggregation is a pass-through)
    pub fn is_raw(&self) -> bool {
        self.0 == 1
    }

    /// Index of the bucket containing `timestamp`
    pub fn bucket_index(&self, timestamp: DateTime<Utc>) -> i64 {
        timestamp
            .timestamp()
            .div_euclid(60)
            .div_euclid(i64::from(self.0))
    }

    /// Start instant of a bucket
    pub fn bucket_start(&self, bucket: i64) -> DateTime<Utc> {
        let secs = bucket * i64::from(self.0) * 60;
        Utc.timestamp_opt(secs, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

impl Default for Timeframe {
    fn default() -> Self {
        Self::ONE_MINUTE
    }
}

impl FromStr for Timeframe {
    type Err = TimeframeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_ascii_lowercase();
        let invalid = || TimeframeError::InvalidLabel(s.to_string());

        let (digits, multiplier) = if let Some(n) = label.strip_suffix("min") {
            (n, 1)
        } else if let Some(n) = label.strip_suffix('m') {
            (n, 1)
        } else if let Some(n) = label.strip_suffix('h') {
            (n, 60)
        } else if let Some(n) = label.strip_suffix('d') {
            (n, 1440)
        } else {
            (label.as_str(), 1)
        };

        let count: u32 = digits.parse().map_err(|_| invalid())?;
        let minutes = count.checked_mul(multiplier).ok_or_else(invalid)?;
        Self::from_minutes(minutes)
    }
}

impl TryFrom<String> for Timeframe {
    type Error = TimeframeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Timeframe> for String {
    fn from(tf: Timeframe) -> Self {
        tf.to_string()
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            m if m % 1440 == 0 => write!(f, "{}d", m / 1440),
            m if m % 60 == 0 => write!(f, "{}h", m / 60),
            m => write!(f, "{}m", m),
        }
    }
}
