//! Running bucket aggregation
//!
//! Completed buckets live in an append-only arena; the newest bucket is a
//! single mutable accumulator. Pushing a bar costs O(1), so replaying a
//! series of N bars costs O(N) instead of re-aggregating every prefix.

use super::{merge_into, open_bucket};
use crate::candle::{Bar, Timeframe};
use chrono::{DateTime, Timelike, Utc};
use thiserror::Error;

/// Incremental aggregation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregateError {
    /// Bar is not after the last bar pushed
    #[error("Bar at {timestamp} is not after the last pushed bar at {last}")]
    OutOfOrder {
        timestamp: DateTime<Utc>,
        last: DateTime<Utc>,
    },
    /// Raw bar does not start on a whole minute
    #[error("Bar at {timestamp} is not minute-aligned")]
    Misaligned { timestamp: DateTime<Utc> },
}

#[derive(Debug, Clone)]
struct Accumulator {
    bucket: i64,
    bar: Bar,
}

/// Keeps `aggregate(pushed_bars, timeframe)` up to date one raw bar at a time
///
/// Raw bars must be minute-aligned and strictly increasing; `push` rejects
/// anything else.
#[derive(Debug, Clone)]
pub struct BucketAggregator {
    timeframe: Timeframe,
    completed: Vec<Bar>,
    current: Option<Accumulator>,
    last_raw: Option<DateTime<Utc>>,
    pushed: usize,
}

impl BucketAggregator {
    /// Create an empty aggregator
    pub fn new(timeframe: Timeframe) -> Self {
        Self {
            timeframe,
            completed: Vec::new(),
            current: None,
            last_raw: None,
            pushed: 0,
        }
    }

    /// Aggregator pre-filled with `bars`
    pub fn from_bars(timeframe: Timeframe, bars: &[Bar]) -> Result<Self, AggregateError> {
        let mut agg = Self::new(timeframe);
        for bar in bars {
            agg.push(bar)?;
        }
        Ok(agg)
    }

    /// Fold the next raw bar in
    ///
    /// Returns `true` when the bar sealed the previous bucket and opened a new one.
    pub fn push(&mut self, bar: &Bar) -> Result<bool, AggregateError> {
        if bar.timestamp.second() != 0 || bar.timestamp.nanosecond() != 0 {
            return Err(AggregateError::Misaligned {
                timestamp: bar.timestamp,
            });
        }
        if let Some(last) = self.last_raw {
            if bar.timestamp <= last {
                return Err(AggregateError::OutOfOrder {
                    timestamp: bar.timestamp,
                    last,
                });
            }
        }
        Ok(self.fold(bar))
    }

    /// `push` without the alignment and ordering checks, for bars from a validated `CandleSeries`
    pub(crate) fn fold(&mut self, bar: &Bar) -> bool {
        self.last_raw = Some(bar.timestamp);
        self.pushed += 1;

        let bucket = self.timeframe.bucket_index(bar.timestamp);
        if let Some(acc) = self.current.as_mut().filter(|acc| acc.bucket == bucket) {
            merge_into(&mut acc.bar, bar);
            return false;
        }

        let opened = Accumulator {
            bucket,
            bar: open_bucket(bar, self.timeframe, bucket),
        };
        match self.current.replace(opened) {
            Some(previous) => {
                self.completed.push(previous.bar);
                true
            }
            None => false,
        }
    }

    /// Buckets that can no longer change
    pub fn completed(&self) -> &[Bar] {
        &self.completed
    }

    /// The still-forming bucket, if any bar has been pushed
    pub fn partial(&self) -> Option<&Bar> {
        self.current.as_ref().map(|acc| &acc.bar)
    }

    /// Completed buckets followed by the partial one
    pub fn bars(&self) -> impl Iterator<Item = &Bar> + '_ {
        self.completed.iter().chain(self.partial())
    }

    /// Number of aggregated bars, partial included
    pub fn len(&self) -> usize {
        self.completed.len() + usize::from(self.current.is_some())
    }

    /// True before the first push
    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    /// The trailing `n` aggregated bars, oldest first
    pub fn tail(&self, n: usize) -> Vec<Bar> {
        let skip = self.len().saturating_sub(n);
        self.bars().skip(skip).cloned().collect()
    }

    /// Full aggregation as an owned vector
    pub fn to_vec(&self) -> Vec<Bar> {
        self.bars().cloned().collect()
    }

    /// Number of raw bars folded in
    pub fn raw_count(&self) -> usize {
        self.pushed
    }

    /// Target timeframe
    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn minute_bar(m: i64, close: Decimal) -> Bar {
        let ts = Utc.timestamp_opt(1_749_340_800 + m * 60, 0).unwrap();
        Bar::new(ts, close, close + dec!(1), close - dec!(1), close, dec!(2))
    }

    fn tf(minutes: u32) -> Timeframe {
        Timeframe::from_minutes(minutes).unwrap()
    }

    #[test]
    fn test_new_aggregator_is_empty() {
        let agg = BucketAggregator::new(tf(5));
        assert!(agg.is_empty());
        assert_eq!(agg.len(), 0);
        assert!(agg.partial().is_none());
        assert!(agg.tail(3).is_empty());
    }

    #[test]
    fn test_push_reports_sealed_buckets() {
        let mut agg = BucketAggregator::new(tf(3));
        let sealed: Vec<bool> = (0..7)
            .map(|m| agg.push(&minute_bar(m, Decimal::from(10 + m))).unwrap())
            .collect();
        assert_eq!(sealed, vec![false, false, false, true, false, false, true]);
        assert_eq!(agg.completed().len(), 2);
        assert_eq!(agg.partial().map(|b| b.close), Some(dec!(16)));
        assert_eq!(agg.raw_count(), 7);
    }

    #[test]
    fn test_matches_from_scratch_at_every_prefix() {
        let bars: Vec<Bar> = [0, 1, 2, 5, 6, 9, 14, 15, 16, 30]
            .iter()
            .enumerate()
            .map(|(i, m)| minute_bar(*m, Decimal::from(100 + i as i64)))
            .collect();

        for minutes in [1, 2, 3, 5, 15] {
            let mut agg = BucketAggregator::new(tf(minutes));
            for p in 0..bars.len() {
                agg.push(&bars[p]).unwrap();
                assert_eq!(agg.to_vec(), aggregate(&bars[..=p], tf(minutes)));
            }
        }
    }

    #[test]
    fn test_rejects_out_of_order_bar() {
        let mut agg = BucketAggregator::new(tf(3));
        agg.push(&minute_bar(5, dec!(10))).unwrap();
        let err = agg.push(&minute_bar(4, dec!(10))).unwrap_err();
        assert!(matches!(err, AggregateError::OutOfOrder { .. }));
        // State untouched by the rejected bar
        assert_eq!(agg.raw_count(), 1);
        assert_eq!(agg.len(), 1);
    }

    #[test]
    fn test_rejects_misaligned_bar() {
        let mut agg = BucketAggregator::new(Timeframe::ONE_MINUTE);
        let mut first = minute_bar(0, dec!(10));
        first.timestamp = first.timestamp + chrono::Duration::seconds(10);
        let err = agg.push(&first).unwrap_err();
        assert!(matches!(err, AggregateError::Misaligned { .. }));
        assert!(agg.is_empty());

        agg.push(&minute_bar(0, dec!(10))).unwrap();
        let mut second = minute_bar(0, dec!(11));
        second.timestamp = second.timestamp + chrono::Duration::seconds(40);
        assert!(agg.push(&second).is_err());
        assert_eq!(agg.raw_count(), 1);
        assert_eq!(agg.to_vec(), aggregate(&[minute_bar(0, dec!(10))], Timeframe::ONE_MINUTE));
    }

    #[test]
    fn test_tail_is_suffix() {
        let bars: Vec<Bar> = (0..10).map(|m| minute_bar(m, dec!(50))).collect();
        let agg = BucketAggregator::from_bars(tf(2), &bars).unwrap();
        let all = agg.to_vec();
        assert_eq!(all.len(), 5);
        assert_eq!(agg.tail(3), all[2..].to_vec());
        assert_eq!(agg.tail(10), all);
    }
}
