//! Timeframe aggregation
//!
//! Folds one-minute bars into calendar-aligned buckets of a coarser
//! timeframe. `aggregate` recomputes from a prefix; `BucketAggregator` keeps
//! the same result up to date one bar at a time.

mod incremental;

pub use incremental::{AggregateError, BucketAggregator};

use crate::candle::{Bar, Timeframe};

/// Aggregate a time-ordered prefix of raw bars into `timeframe` buckets
///
/// Every bucket but the last is complete. The last bucket is always emitted,
/// even with a single raw bar, so the still-forming candle is visible.
/// A one-minute timeframe returns the prefix unchanged.
pub fn aggregate(prefix: &[Bar], timeframe: Timeframe) -> Vec<Bar> {
    if timeframe.is_raw() {
        return prefix.to_vec();
    }

    let mut out: Vec<Bar> = Vec::new();
    let mut current_bucket: Option<i64> = None;

    for bar in prefix {
        let bucket = timeframe.bucket_index(bar.timestamp);
        if current_bucket == Some(bucket) {
            if let Some(acc) = out.last_mut() {
                merge_into(acc, bar);
                continue;
            }
        }
        out.push(open_bucket(bar, timeframe, bucket));
        current_bucket = Some(bucket);
    }

    out
}

/// Split an aggregation of `prefix` into completed buckets and the trailing
/// partial one
///
/// The trailing bar is partial when its bucket is the bucket of the last raw
/// bar in `prefix`, which is always the case for a non-empty prefix.
pub fn split_partial<'a>(
    aggregated: &'a [Bar],
    prefix: &[Bar],
    timeframe: Timeframe,
) -> (&'a [Bar], Option<&'a Bar>) {
    let (Some(last_raw), Some((last, completed))) = (prefix.last(), aggregated.split_last())
    else {
        return (aggregated, None);
    };

    let raw_bucket = timeframe.bucket_index(last_raw.timestamp);
    if timeframe.bucket_index(last.timestamp) == raw_bucket {
        (completed, Some(last))
    } else {
        (aggregated, None)
    }
}

/// Start a bucket from its first raw bar
pub(crate) fn open_bucket(bar: &Bar, timeframe: Timeframe, bucket: i64) -> Bar {
    Bar {
        timestamp: timeframe.bucket_start(bucket),
        ..bar.clone()
    }
}

/// Fold a later raw bar of the same bucket into its accumulator
pub(crate) fn merge_into(acc: &mut Bar, bar: &Bar) {
    acc.high = acc.high.max(bar.high);
    acc.low = acc.low.min(bar.low);
    acc.close = bar.close;
    acc.volume += bar.volume;
}
