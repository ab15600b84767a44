//! Hand-written policies

use super::{AgentError, DecisionAgent, Observation};
use crate::ledger::Action;
use rust_decimal::Decimal;
use std::collections::VecDeque;

/// Never trades
#[derive(Debug, Clone, Copy, Default)]
pub struct HoldAgent;

impl DecisionAgent for HoldAgent {
    fn decide(&mut self, _observation: &Observation) -> Result<Action, AgentError> {
        Ok(Action::Hold)
    }

    fn name(&self) -> &str {
        "hold"
    }
}

/// Buys green candles and sells red ones
///
/// A candle only counts when its body exceeds `min_body` (absolute price).
#[derive(Debug, Clone, Default)]
pub struct MomentumAgent {
    min_body: Decimal,
}

impl MomentumAgent {
    /// Create an agent ignoring bodies of at most `min_body`
    pub fn new(min_body: Decimal) -> Self {
        Self { min_body }
    }
}

impl DecisionAgent for MomentumAgent {
    fn decide(&mut self, observation: &Observation) -> Result<Action, AgentError> {
        let body = observation.close - observation.open;
        let action = if body > self.min_body {
            Action::Buy
        } else if -body > self.min_body {
            Action::Sell
        } else {
            Action::Hold
        };
        Ok(action)
    }

    fn name(&self) -> &str {
        "momentum"
    }
}

/// Replays a fixed list of raw action indices, then holds
///
/// Indices go through the same `0/1/2` mapping as model output, so a script
/// can also exercise the invalid-action path.
#[derive(Debug, Clone, Default)]
pub struct ScriptedAgent {
    script: VecDeque<i64>,
}

impl ScriptedAgent {
    /// Script of actions
    pub fn new(actions: impl IntoIterator<Item = Action>) -> Self {
        Self::from_indices(actions.into_iter().map(|a| match a {
            Action::Hold => 0,
            Action::Buy => 1,
            Action::Sell => 2,
        }))
    }

    /// Script of raw policy indices
    pub fn from_indices(indices: impl IntoIterator<Item = i64>) -> Self {
        Self {
            script: indices.into_iter().collect(),
        }
    }

    /// Entries not yet consumed
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl DecisionAgent for ScriptedAgent {
    fn decide(&mut self, _observation: &Observation) -> Result<Action, AgentError> {
        let Some(&index) = self.script.front() else {
            return Ok(Action::Hold);
        };
        // An invalid entry stays queued so the failed step can be inspected
        let action = Action::try_from(index)?;
        self.script.pop_front();
        Ok(action)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InvalidAction;
    use rust_decimal_macros::dec;

    fn candle(open: Decimal, close: Decimal) -> Observation {
        Observation {
            open,
            high: open.max(close),
            low: open.min(close),
            close,
            volume: dec!(1),
        }
    }

    #[test]
    fn test_hold_agent() {
        let mut agent = HoldAgent;
        assert_eq!(agent.decide(&candle(dec!(1), dec!(5))).unwrap(), Action::Hold);
        assert!(agent.as_trainable().is_none());
    }

    #[test]
    fn test_momentum_agent_follows_candle_colour() {
        let mut agent = MomentumAgent::default();
        assert_eq!(agent.decide(&candle(dec!(10), dec!(11))).unwrap(), Action::Buy);
        assert_eq!(agent.decide(&candle(dec!(11), dec!(10))).unwrap(), Action::Sell);
        assert_eq!(agent.decide(&candle(dec!(10), dec!(10))).unwrap(), Action::Hold);
    }

    #[test]
    fn test_momentum_agent_min_body() {
        let mut agent = MomentumAgent::new(dec!(0.5));
        assert_eq!(agent.decide(&candle(dec!(10), dec!(10.4))).unwrap(), Action::Hold);
        assert_eq!(agent.decide(&candle(dec!(10), dec!(10.6))).unwrap(), Action::Buy);
        assert_eq!(agent.decide(&candle(dec!(10), dec!(9.4))).unwrap(), Action::Sell);
    }

    #[test]
    fn test_scripted_agent_replays_then_holds() {
        let mut agent = ScriptedAgent::new([Action::Buy, Action::Sell]);
        let obs = candle(dec!(1), dec!(1));
        assert_eq!(agent.decide(&obs).unwrap(), Action::Buy);
        assert_eq!(agent.decide(&obs).unwrap(), Action::Sell);
        assert_eq!(agent.decide(&obs).unwrap(), Action::Hold);
        assert_eq!(agent.remaining(), 0);
    }

    #[test]
    fn test_scripted_agent_invalid_index() {
        let mut agent = ScriptedAgent::from_indices([7]);
        let err = agent.decide(&candle(dec!(1), dec!(1))).unwrap_err();
        assert_eq!(err, AgentError::InvalidAction(InvalidAction(7)));
        assert_eq!(agent.remaining(), 1);
    }
}
