//! Candle data module
//!
//! Raw one-minute bars, the immutable series they live in, and timeframes

mod series;
mod types;

pub use series::{CandleSeries, SeriesError};
pub use types::{Bar, Timeframe, TimeframeError};
