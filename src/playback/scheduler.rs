//! Step cadence for host loops
//!
//! The playback core has no notion of time. Hosts inject a `Scheduler` and
//! may retune its speed from anywhere through a cloned `SpeedControl`.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Fastest allowed playback, ms per step
pub const MIN_INTERVAL_MS: u64 = 10;
/// Slowest allowed playback, ms per step
pub const MAX_INTERVAL_MS: u64 = 2000;
/// Interval change per `faster`/`slower` call
pub const SPEED_STEP_MS: u64 = 50;

/// Shared, adjustable step interval
#[derive(Debug, Clone)]
pub struct SpeedControl {
    interval_ms: Arc<AtomicU64>,
}

impl SpeedControl {
    /// Create a control with the given interval (clamped)
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms: Arc::new(AtomicU64::new(clamp_interval(interval_ms))),
        }
    }

    /// Current interval in ms
    pub fn interval_ms(&self) -> u64 {
        self.interval_ms.load(Ordering::Relaxed)
    }

    /// Current interval
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms())
    }

    /// Set the interval (clamped), returning the value applied
    pub fn set_interval_ms(&self, interval_ms: u64) -> u64 {
        let applied = clamp_interval(interval_ms);
        self.interval_ms.store(applied, Ordering::Relaxed);
        tracing::info!(interval_ms = applied, "Playback speed changed");
        applied
    }

    /// Shorten the interval by one step
    pub fn faster(&self) -> u64 {
        self.set_interval_ms(self.interval_ms().saturating_sub(SPEED_STEP_MS))
    }

    /// Lengthen the interval by one step
    pub fn slower(&self) -> u64 {
        self.set_interval_ms(self.interval_ms().saturating_add(SPEED_STEP_MS))
    }
}

impl Default for SpeedControl {
    fn default() -> Self {
        Self::new(200)
    }
}

fn clamp_interval(interval_ms: u64) -> u64 {
    interval_ms.clamp(MIN_INTERVAL_MS, MAX_INTERVAL_MS)
}

/// Paces a host loop between playback steps
#[async_trait]
pub trait Scheduler: Send {
    /// Wait until the next step is due
    async fn wait(&mut self);
}

/// Sleeps for the current `SpeedControl` interval between steps
pub struct IntervalScheduler {
    speed: SpeedControl,
}

impl IntervalScheduler {
    /// Create a scheduler driven by `speed`
    pub fn new(speed: SpeedControl) -> Self {
        Self { speed }
    }

    /// Handle for retuning the pace
    pub fn speed(&self) -> SpeedControl {
        self.speed.clone()
    }
}

#[async_trait]
impl Scheduler for IntervalScheduler {
    async fn wait(&mut self) {
        tokio::time::sleep(self.speed.interval()).await;
    }
}

/// Runs steps back to back
#[derive(Debug, Default)]
pub struct ImmediateScheduler;

#[async_trait]
impl Scheduler for ImmediateScheduler {
    async fn wait(&mut self) {
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_control_clamps() {
        assert_eq!(SpeedControl::new(1).interval_ms(), MIN_INTERVAL_MS);
        assert_eq!(SpeedControl::new(10_000).interval_ms(), MAX_INTERVAL_MS);
        assert_eq!(SpeedControl::new(200).interval_ms(), 200);
    }

    #[test]
    fn test_faster_and_slower() {
        let speed = SpeedControl::new(200);
        assert_eq!(speed.faster(), 150);
        assert_eq!(speed.slower(), 200);
        assert_eq!(speed.slower(), 250);
    }

    #[test]
    fn test_faster_stops_at_minimum() {
        let speed = SpeedControl::new(40);
        assert_eq!(speed.faster(), MIN_INTERVAL_MS);
        assert_eq!(speed.faster(), MIN_INTERVAL_MS);
    }

    #[test]
    fn test_clones_share_interval() {
        let speed = SpeedControl::new(500);
        let handle = speed.clone();
        handle.set_interval_ms(300);
        assert_eq!(speed.interval_ms(), 300);
        assert_eq!(speed.interval(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_scheduler_sleeps_current_interval() {
        let speed = SpeedControl::new(100);
        let mut scheduler = IntervalScheduler::new(speed.clone());

        let start = tokio::time::Instant::now();
        scheduler.wait().await;
        let first = start.elapsed();
        assert!(first >= Duration::from_millis(100) && first < Duration::from_millis(400));

        speed.set_interval_ms(400);
        let start = tokio::time::Instant::now();
        scheduler.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(400));
    }

    #[test]
    fn test_immediate_scheduler_returns() {
        let mut scheduler = ImmediateScheduler;
        tokio_test::block_on(scheduler.wait());
    }
}
