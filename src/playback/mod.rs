//! Playback module
//!
//! Reveals a candle series one raw bar at a time, keeping the aggregated
//! display window in step, and paces host loops without the core ever
//! touching a clock.

mod cursor;
mod scheduler;

pub use cursor::{warmup_offset, Frame, PlaybackCursor, Step};
pub use scheduler::{
    ImmediateScheduler, IntervalScheduler, Scheduler, SpeedControl, MAX_INTERVAL_MS,
    MIN_INTERVAL_MS, SPEED_STEP_MS,
};

use thiserror::Error;

/// Cursor construction errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Display window must hold at least one bar
    #[error("Window size must be greater than zero")]
    ZeroWindow,
    /// Explicit start index past the end of the series
    #[error("Start index {start} is past the end of a {len}-bar series")]
    StartOutOfRange { start: usize, len: usize },
}
