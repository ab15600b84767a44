//! Decision agents
//!
//! The simulation talks to a policy only through `DecisionAgent::decide`.
//! Learning is a separate `Trainable` capability an agent may expose.

mod linear;
mod rule;

pub use linear::LinearPolicyAgent;
pub use rule::{HoldAgent, MomentumAgent, ScriptedAgent};

use crate::candle::Bar;
use crate::config::{AgentConfig, AgentKind};
use crate::ledger::{Action, InvalidAction};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of features in an observation
pub const OBSERVATION_DIM: usize = 5;

/// Agent errors
#[derive(Debug, Error, PartialEq)]
pub enum AgentError {
    /// Policy produced an index outside the action set
    #[error(transparent)]
    InvalidAction(#[from] InvalidAction),
    /// Agent could not be built from its configuration
    #[error("Invalid agent configuration: {0}")]
    Config(String),
}

/// Features of the newest tick: `[open, high, low, close, volume]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Observation {
    /// Observation of a raw bar
    pub fn from_bar(bar: &Bar) -> Self {
        Self {
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        }
    }

    /// Feature vector in fixed order
    pub fn as_array(&self) -> [f64; OBSERVATION_DIM] {
        [self.open, self.high, self.low, self.close, self.volume]
            .map(|v| v.to_f64().unwrap_or_default())
    }
}

/// What happened after an action was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// Tick the action was priced on
    pub timestamp: DateTime<Utc>,
    /// Action the agent asked for
    pub requested: Action,
    /// Action the ledger applied
    pub applied: Action,
    /// Tick price
    pub price: Decimal,
    /// Portfolio value after the action
    pub equity: Decimal,
}

/// Maps observations to actions
pub trait DecisionAgent: Send {
    /// Choose an action for the newest tick
    fn decide(&mut self, observation: &Observation) -> Result<Action, AgentError>;

    /// Short name for logs and reports
    fn name(&self) -> &str;

    /// Learning capability, if this agent has one
    fn as_trainable(&mut self) -> Option<&mut dyn Trainable> {
        None
    }
}

/// Agents that learn from the outcome of their actions
pub trait Trainable {
    /// Receive the outcome of the last applied action
    fn observe(&mut self, outcome: &Outcome);
}

/// Build the configured agent
pub fn build_agent(config: &AgentConfig) -> Result<Box<dyn DecisionAgent>, AgentError> {
    let agent: Box<dyn DecisionAgent> = match config.kind {
        AgentKind::Hold => Box::new(HoldAgent),
        AgentKind::Momentum => Box::new(MomentumAgent::default()),
        AgentKind::Linear => {
            if config.weights.is_empty() {
                Box::new(LinearPolicyAgent::zeroed())
            } else {
                Box::new(LinearPolicyAgent::new(
                    config.weights.clone(),
                    config.bias.clone(),
                )?)
            }
        }
    };
    tracing::info!(agent = agent.name(), "Agent ready");
    Ok(agent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_observation_order() {
        let bar = Bar::new(
            Utc.timestamp_opt(0, 0).unwrap(),
            dec!(1),
            dec!(2),
            dec!(0.5),
            dec!(1.5),
            dec!(10),
        );
        let obs = Observation::from_bar(&bar);
        assert_eq!(obs.as_array(), [1.0, 2.0, 0.5, 1.5, 10.0]);
    }

    #[test]
    fn test_build_each_kind() {
        for (kind, name) in [
            (AgentKind::Hold, "hold"),
            (AgentKind::Momentum, "momentum"),
            (AgentKind::Linear, "linear"),
        ] {
            let config = AgentConfig {
                kind,
                ..AgentConfig::default()
            };
            assert_eq!(build_agent(&config).unwrap().name(), name);
        }
    }

    #[test]
    fn test_build_rejects_ragged_weights() {
        let config = AgentConfig {
            kind: AgentKind::Linear,
            weights: vec![vec![1.0, 0.0]],
            bias: vec![],
        };
        assert!(matches!(build_agent(&config), Err(AgentError::Config(_))));
    }
}
