//! Candle-by-candle reveal over a shared series

use super::PlaybackError;
use crate::aggregate::BucketAggregator;
use crate::candle::{Bar, CandleSeries, Timeframe};
use std::sync::Arc;

/// What one playback step revealed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Index of the revealed raw bar
    pub index: usize,
    /// The revealed raw bar
    pub tick: Bar,
    /// Trailing aggregated bars, oldest first; the last one may be partial
    pub window: Vec<Bar>,
    /// Total aggregated bars over the revealed prefix
    pub bucket_count: usize,
}

impl Frame {
    /// Charting needs at least two candles; hosts skip rendering until then
    pub fn is_renderable(&self) -> bool {
        self.window.len() >= 2
    }

    /// The newest (possibly still forming) aggregated bar
    pub fn latest(&self) -> Option<&Bar> {
        self.window.last()
    }
}

/// Result of advancing the cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// A raw bar was revealed
    Frame(Frame),
    /// Series exhausted; further calls keep returning `Done`
    Done,
}

impl Step {
    /// The frame, if any
    pub fn into_frame(self) -> Option<Frame> {
        match self {
            Step::Frame(frame) => Some(frame),
            Step::Done => None,
        }
    }

    /// True for the terminal result
    pub fn is_done(&self) -> bool {
        matches!(self, Step::Done)
    }
}

/// Raw bars revealed before the first step so the opening window already
/// holds history: half a window of buckets, at least one
pub fn warmup_offset(window_size: usize, timeframe: Timeframe) -> usize {
    (window_size / 2)
        .max(1)
        .saturating_mul(timeframe.minutes() as usize)
}

/// Reveals one raw bar per step and keeps the aggregated view current
#[derive(Debug, Clone)]
pub struct PlaybackCursor {
    series: Arc<CandleSeries>,
    aggregator: BucketAggregator,
    window_size: usize,
    index: usize,
}

impl PlaybackCursor {
    /// Cursor positioned after the warm-up offset
    pub fn new(
        series: Arc<CandleSeries>,
        timeframe: Timeframe,
        window_size: usize,
    ) -> Result<Self, PlaybackError> {
        let start = warmup_offset(window_size, timeframe).min(series.len());
        Self::with_start(series, timeframe, window_size, start)
    }

    /// Cursor whose first step reveals `series[start]`
    pub fn with_start(
        series: Arc<CandleSeries>,
        timeframe: Timeframe,
        window_size: usize,
        start: usize,
    ) -> Result<Self, PlaybackError> {
        if window_size == 0 {
            return Err(PlaybackError::ZeroWindow);
        }
        if start > series.len() {
            return Err(PlaybackError::StartOutOfRange {
                start,
                len: series.len(),
            });
        }

        let mut aggregator = BucketAggregator::new(timeframe);
        for bar in series.prefix(start) {
            aggregator.fold(bar);
        }

        tracing::debug!(
            %timeframe,
            window_size,
            start,
            len = series.len(),
            "Playback cursor ready"
        );

        Ok(Self {
            series,
            aggregator,
            window_size,
            index: start,
        })
    }

    /// Reveal the next raw bar
    pub fn step(&mut self) -> Step {
        let Some(tick) = self.series.get(self.index).cloned() else {
            return Step::Done;
        };

        self.aggregator.fold(&tick);
        let frame = Frame {
            index: self.index,
            tick,
            window: self.aggregator.tail(self.window_size),
            bucket_count: self.aggregator.len(),
        };
        self.index += 1;

        tracing::trace!(
            index = frame.index,
            buckets = frame.bucket_count,
            window = frame.window.len(),
            "Playback step"
        );

        Step::Frame(frame)
    }

    /// The bar the next `step` would reveal
    pub fn peek_tick(&self) -> Option<&Bar> {
        self.series.get(self.index)
    }

    /// Index of the next bar to reveal
    pub fn position(&self) -> usize {
        self.index
    }

    /// Bars left to reveal
    pub fn remaining(&self) -> usize {
        self.series.len().saturating_sub(self.index)
    }

    /// True once every bar has been revealed
    pub fn is_done(&self) -> bool {
        self.index >= self.series.len()
    }

    /// Length of the underlying series
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// True for an empty series
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Aggregation over everything revealed so far
    pub fn aggregated(&self) -> Vec<Bar> {
        self.aggregator.to_vec()
    }

    /// Configured window size
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Target timeframe
    pub fn timeframe(&self) -> Timeframe {
        self.aggregator.timeframe()
    }

    /// Shared series handle
    pub fn series(&self) -> &Arc<CandleSeries> {
        &self.series
    }
}
