//! Immutable one-minute candle store

use super::Bar;
use chrono::{DateTime, Timelike, Utc};
use rust_decimal::Decimal;
use std::ops::Deref;
use thiserror::Error;

/// Reasons a raw series is refused at construction
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeriesError {
    /// Timestamp is not strictly after its predecessor
    #[error("Bar {index} at {timestamp} is not after the previous bar at {previous}")]
    NotIncreasing {
        index: usize,
        timestamp: DateTime<Utc>,
        previous: DateTime<Utc>,
    },
    /// Raw bar does not start on a whole minute
    #[error("Bar {index} at {timestamp} is not minute-aligned")]
    Misaligned {
        index: usize,
        timestamp: DateTime<Utc>,
    },
    /// Open/high/low/close must be positive
    #[error("Bar {index} has a non-positive price")]
    NonPositivePrice { index: usize },
    /// Volume must not be negative
    #[error("Bar {index} has negative volume {volume}")]
    NegativeVolume { index: usize, volume: Decimal },
}

/// Time-ordered, validated sequence of one-minute bars
///
/// Built once per run and never mutated afterwards. Wrap it in an `Arc` to
/// share one series between several simulation runs.
#[derive(Debug, Clone, Default)]
pub struct CandleSeries {
    bars: Vec<Bar>,
}

impl CandleSeries {
    /// Validate and wrap raw bars
    pub fn new(bars: Vec<Bar>) -> Result<Self, SeriesError> {
        for (index, bar) in bars.iter().enumerate() {
            if bar.timestamp.second() != 0 || bar.timestamp.nanosecond() != 0 {
                return Err(SeriesError::Misaligned {
                    index,
                    timestamp: bar.timestamp,
                });
            }
            if [bar.open, bar.high, bar.low, bar.close]
                .iter()
                .any(|p| *p <= Decimal::ZERO)
            {
                return Err(SeriesError::NonPositivePrice { index });
            }
            if bar.volume < Decimal::ZERO {
                return Err(SeriesError::NegativeVolume {
                    index,
                    volume: bar.volume,
                });
            }
        }

        if let Some((index, pair)) = bars
            .windows(2)
            .enumerate()
            .find(|(_, pair)| pair[1].timestamp <= pair[0].timestamp)
        {
            return Err(SeriesError::NotIncreasing {
                index: index + 1,
                timestamp: pair[1].timestamp,
                previous: pair[0].timestamp,
            });
        }

        Ok(Self { bars })
    }

    /// All bars in time order
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// Bars `[0, len)`
    pub fn prefix(&self, len: usize) -> &[Bar] {
        &self.bars[..len.min(self.bars.len())]
    }

    /// First bar timestamp
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.bars.first().map(|b| b.timestamp)
    }

    /// Last bar timestamp
    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.bars.last().map(|b| b.timestamp)
    }
}

impl Deref for CandleSeries {
    type Target = [Bar];

    fn deref(&self) -> &Self::Target {
        &self.bars
    }
}
