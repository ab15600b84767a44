//! Async host loop

use super::{SimError, Simulation, StepReport};
use crate::playback::Scheduler;
use std::future::Future;
use tokio::sync::mpsc;

/// Why a playback loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Every bar was revealed
    Exhausted,
    /// The shutdown future completed
    Cancelled,
    /// The configured step limit was hit
    StepLimit,
}

/// Drives `Simulation::step` at the pace of an injected scheduler
pub struct PlaybackLoop<S> {
    scheduler: S,
    frames: Option<mpsc::Sender<StepReport>>,
    max_steps: Option<usize>,
}

impl<S: Scheduler> PlaybackLoop<S> {
    /// Create a loop paced by `scheduler`
    pub fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            frames: None,
            max_steps: None,
        }
    }

    /// Forward renderable step reports to a consumer
    pub fn with_frames(mut self, tx: mpsc::Sender<StepReport>) -> Self {
        self.frames = Some(tx);
        self
    }

    /// Stop after at most `max_steps` committed steps
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    /// The scheduler
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Step `sim` until it is exhausted, the step limit is hit or `shutdown`
    /// completes
    ///
    /// Cancellation is only observed between steps, so the simulation is
    /// always left at a committed step.
    pub async fn run<F>(&mut self, sim: &mut Simulation, shutdown: F) -> Result<StopReason, SimError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let run_id = sim.run_id();
        let mut steps = 0usize;
        tracing::info!(%run_id, remaining = sim.cursor().remaining(), "Playback loop started");

        let reason = loop {
            if self.max_steps.is_some_and(|max| steps >= max) {
                break StopReason::StepLimit;
            }

            let Some(report) = sim.step()? else {
                break StopReason::Exhausted;
            };
            steps += 1;

            if report.frame.is_renderable() {
                if let Some(tx) = &self.frames {
                    if tx.send(report).await.is_err() {
                        tracing::warn!(%run_id, "Frame consumer dropped, continuing without it");
                        self.frames = None;
                    }
                }
            }

            let cancelled = tokio::select! {
                biased;
                _ = &mut shutdown => true,
                _ = self.scheduler.wait() => false,
            };
            if cancelled {
                break StopReason::Cancelled;
            }
        };

        tracing::info!(%run_id, steps, ?reason, "Playback loop stopped");
        Ok(reason)
    }
}
