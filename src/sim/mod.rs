//! Simulation: one replay run
//!
//! A `Simulation` owns a playback cursor, a decision agent and a ledger.
//! Each `step` asks the agent about the next tick before anything moves, so a
//! rejected decision leaves the run exactly as it was.

mod analytics;
pub mod host;

pub use analytics::{DrawdownTracker, EquityPoint, RunSummary};
pub use host::{PlaybackLoop, StopReason};

use crate::agent::{AgentError, DecisionAgent, Observation, Outcome};
use crate::ledger::{Action, AuditRecord, Ledger, LedgerError};
use crate::playback::{Frame, PlaybackCursor, Step};
use crate::telemetry::record_step;
use rust_decimal::Decimal;
use std::time::Instant;
use thiserror::Error;
use uuid::Uuid;

/// Simulation errors
#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Everything one committed step produced
#[derive(Debug, Clone)]
pub struct StepReport {
    /// Revealed tick and aggregated window
    pub frame: Frame,
    /// Ledger entry for the tick
    pub record: AuditRecord,
    /// Portfolio value at the tick close
    pub equity: EquityPoint,
}

/// Cursor, agent and ledger advancing together
pub struct Simulation {
    run_id: Uuid,
    cursor: PlaybackCursor,
    agent: Box<dyn DecisionAgent>,
    ledger: Ledger,
    equity_curve: Vec<EquityPoint>,
    drawdown: DrawdownTracker,
}

impl Simulation {
    /// Start a run
    pub fn new(cursor: PlaybackCursor, agent: Box<dyn DecisionAgent>, ledger: Ledger) -> Self {
        let run_id = Uuid::new_v4();
        let drawdown = DrawdownTracker::new(ledger.initial_cash());
        tracing::info!(
            %run_id,
            agent = agent.name(),
            start = cursor.position(),
            bars = cursor.len(),
            timeframe = %cursor.timeframe(),
            "Simulation created"
        );
        Self {
            run_id,
            cursor,
            agent,
            ledger,
            equity_curve: Vec::new(),
            drawdown,
        }
    }

    /// Advance one tick
    ///
    /// Returns `Ok(None)` once the series is exhausted. On error nothing has
    /// been committed.
    pub fn step(&mut self) -> Result<Option<StepReport>, SimError> {
        let started = Instant::now();
        let Some(tick) = self.cursor.peek_tick() else {
            return Ok(None);
        };
        let price = tick.close;
        if price <= Decimal::ZERO {
            return Err(LedgerError::NonPositivePrice(price).into());
        }

        let requested = match self.agent.decide(&Observation::from_bar(tick)) {
            Ok(action) => action,
            Err(e) => {
                tracing::warn!(
                    run_id = %self.run_id,
                    index = self.cursor.position(),
                    error = %e,
                    "Agent decision rejected"
                );
                return Err(e.into());
            }
        };

        let Step::Frame(frame) = self.cursor.step() else {
            return Ok(None);
        };
        let record = self.ledger.apply(requested, price)?;
        let equity = EquityPoint {
            timestamp: frame.tick.timestamp,
            equity: record.equity(),
        };
        self.equity_curve.push(equity);
        self.drawdown.update(equity.equity);

        if let Some(trainable) = self.agent.as_trainable() {
            trainable.observe(&Outcome {
                timestamp: equity.timestamp,
                requested: record.requested,
                applied: record.applied,
                price,
                equity: equity.equity,
            });
        }

        record_step(&record, started.elapsed());
        tracing::debug!(
            run_id = %self.run_id,
            index = frame.index,
            action = %record.applied,
            %price,
            equity = %equity.equity,
            "Step committed"
        );

        Ok(Some(StepReport {
            frame,
            record,
            equity,
        }))
    }

    /// Step until the series is exhausted
    pub fn run_to_end(&mut self) -> Result<RunSummary, SimError> {
        while self.step()?.is_some() {}
        Ok(self.summary())
    }

    /// Summary of what has been committed so far
    pub fn summary(&self) -> RunSummary {
        let initial_equity = self.ledger.initial_cash();
        let final_equity = self
            .equity_curve
            .last()
            .map_or(initial_equity, |p| p.equity);
        let return_pct = if initial_equity.is_zero() {
            Decimal::ZERO
        } else {
            (final_equity - initial_equity) / initial_equity
        };

        RunSummary {
            agent: self.agent.name().to_string(),
            steps: self.equity_curve.len(),
            initial_equity,
            final_equity,
            return_pct,
            max_drawdown: self.drawdown.max_drawdown,
            max_drawdown_pct: self.drawdown.max_drawdown_pct,
            buys: self.ledger.applied_count(Action::Buy),
            sells: self.ledger.applied_count(Action::Sell),
            downgrades: self.ledger.downgrade_count(),
            final_cash: self.ledger.cash(),
            final_holdings: self.ledger.holdings(),
        }
    }

    /// Run identifier used in logs
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Playback state
    pub fn cursor(&self) -> &PlaybackCursor {
        &self.cursor
    }

    /// Ledger state
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Decision agent
    pub fn agent(&self) -> &dyn DecisionAgent {
        self.agent.as_ref()
    }

    /// Mark-to-market value after every committed step
    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.equity_curve
    }

    /// True once the cursor has nothing left to reveal
    pub fn is_done(&self) -> bool {
        self.cursor.is_done()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{LinearPolicyAgent, ScriptedAgent};
    use crate::candle::{Bar, CandleSeries, Timeframe};
    use crate::ledger::{InvalidAction, Position};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn cursor(closes: &[i64]) -> PlaybackCursor {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let ts = Utc.timestamp_opt(1_749_340_800 + i as i64 * 60, 0).unwrap();
                let c = Decimal::from(c);
                Bar::new(ts, c, c, c, c, dec!(1))
            })
            .collect();
        let series = Arc::new(CandleSeries::new(bars).unwrap());
        PlaybackCursor::with_start(series, Timeframe::ONE_MINUTE, 4, 0).unwrap()
    }

    fn sim(closes: &[i64], agent: impl DecisionAgent + 'static) -> Simulation {
        Simulation::new(
            cursor(closes),
            Box::new(agent),
            Ledger::new(dec!(1000)).unwrap(),
        )
    }

    #[test]
    fn test_buy_sell_sell_scenario() {
        let mut sim = sim(
            &[100, 110, 50],
            ScriptedAgent::new([Action::Buy, Action::Sell, Action::Sell]),
        );

        let first = sim.step().unwrap().unwrap();
        assert_eq!(first.record.applied, Action::Buy);
        assert_eq!(sim.ledger().cash(), dec!(900));
        assert_eq!(sim.ledger().position(), Position::Long);

        sim.step().unwrap();
        assert_eq!(sim.ledger().cash(), dec!(1010));
        assert_eq!(sim.ledger().position(), Position::Flat);

        let third = sim.step().unwrap().unwrap();
        assert_eq!(third.record.requested, Action::Sell);
        assert_eq!(third.record.applied, Action::Hold);
        assert_eq!(sim.ledger().cash(), dec!(1010));

        assert!(sim.step().unwrap().is_none());
        let summary = sim.summary();
        assert_eq!(summary.steps, 3);
        assert_eq!(summary.final_equity, dec!(1010));
        assert_eq!(summary.downgrades, 1);
        assert_eq!((summary.buys, summary.sells), (1, 1));
    }

    #[test]
    fn test_invalid_action_leaves_state_untouched() {
        let mut sim = sim(&[100, 101], ScriptedAgent::from_indices([1, 5]));
        sim.step().unwrap();
        let position = sim.cursor().position();
        let trail = sim.ledger().audit_trail().len();

        let err = sim.step().unwrap_err();

        assert_eq!(err, SimError::Agent(AgentError::InvalidAction(InvalidAction(5))));
        assert_eq!(sim.cursor().position(), position);
        assert_eq!(sim.ledger().audit_trail().len(), trail);
        assert_eq!(sim.equity_curve().len(), 1);
    }

    #[test]
    fn test_steps_after_exhaustion_change_nothing() {
        let mut sim = sim(&[100, 110], ScriptedAgent::new([Action::Buy, Action::Buy, Action::Buy]));
        sim.run_to_end().unwrap();
        let trail = sim.ledger().audit_trail().len();
        let cash = sim.ledger().cash();
        let holdings = sim.ledger().holdings();
        let curve = sim.equity_curve().to_vec();

        for _ in 0..3 {
            assert!(sim.step().unwrap().is_none());
        }

        assert_eq!(trail, 2);
        assert_eq!(sim.ledger().audit_trail().len(), trail);
        assert_eq!(sim.ledger().cash(), cash);
        assert_eq!(sim.ledger().holdings(), holdings);
        assert_eq!(sim.equity_curve(), &curve[..]);
        assert_eq!(sim.summary().steps, 2);
    }

    #[test]
    fn test_trainable_agent_sees_outcomes() {
        let mut sim = sim(&[100, 101, 102], LinearPolicyAgent::zeroed());
        let summary = sim.run_to_end().unwrap();
        assert_eq!(summary.steps, 3);
        assert_eq!(summary.final_equity, dec!(1000));
        assert!(sim.is_done());
    }

    #[test]
    fn test_equity_curve_tracks_mark_to_market() {
        let mut sim = sim(&[100, 120, 80], ScriptedAgent::new([Action::Buy]));
        sim.run_to_end().unwrap();
        let equity: Vec<_> = sim.equity_curve().iter().map(|p| p.equity).collect();
        assert_eq!(equity, vec![dec!(1000), dec!(1020), dec!(980)]);
        let summary = sim.summary();
        assert_eq!(summary.max_drawdown, dec!(40));
    }
}
