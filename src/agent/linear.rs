//! Linear argmax policy

use super::{AgentError, DecisionAgent, Observation, Outcome, Trainable, OBSERVATION_DIM};
use crate::ledger::Action;

/// Scores each action as `w · obs + b` and picks the highest score
///
/// Row `i` of the weights scores action index `i` (0 hold, 1 buy, 2 sell).
/// Extra rows are allowed, but an argmax landing on one is an invalid action.
/// Ties go to the lowest index.
#[derive(Debug, Clone)]
pub struct LinearPolicyAgent {
    weights: Vec<[f64; OBSERVATION_DIM]>,
    bias: Vec<f64>,
    experience: Vec<Outcome>,
}

impl LinearPolicyAgent {
    /// Create a policy; `bias` may be empty (all zero)
    pub fn new(weights: Vec<Vec<f64>>, bias: Vec<f64>) -> Result<Self, AgentError> {
        if weights.is_empty() {
            return Err(AgentError::Config("linear policy needs at least one row".into()));
        }

        let rows = weights
            .iter()
            .enumerate()
            .map(|(i, row)| {
                <[f64; OBSERVATION_DIM]>::try_from(row.as_slice()).map_err(|_| {
                    AgentError::Config(format!(
                        "weight row {} has {} columns, expected {}",
                        i,
                        row.len(),
                        OBSERVATION_DIM
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let bias = if bias.is_empty() {
            vec![0.0; rows.len()]
        } else if bias.len() == rows.len() {
            bias
        } else {
            return Err(AgentError::Config(format!(
                "bias has {} entries for {} weight rows",
                bias.len(),
                rows.len()
            )));
        };

        Ok(Self {
            weights: rows,
            bias,
            experience: Vec::new(),
        })
    }

    /// Untrained three-action policy; every score is zero so it always holds
    pub fn zeroed() -> Self {
        Self {
            weights: vec![[0.0; OBSERVATION_DIM]; Action::ALL.len()],
            bias: vec![0.0; Action::ALL.len()],
            experience: Vec::new(),
        }
    }

    /// Raw scores for an observation
    pub fn logits(&self, observation: &Observation) -> Vec<f64> {
        let x = observation.as_array();
        self.weights
            .iter()
            .zip(&self.bias)
            .map(|(row, b)| row.iter().zip(x.iter()).map(|(w, v)| w * v).sum::<f64>() + b)
            .collect()
    }

    /// Outcomes received through `Trainable::observe`
    pub fn experience(&self) -> &[Outcome] {
        &self.experience
    }
}

impl DecisionAgent for LinearPolicyAgent {
    fn decide(&mut self, observation: &Observation) -> Result<Action, AgentError> {
        let logits = self.logits(observation);
        let best = logits
            .iter()
            .enumerate()
            .fold((0usize, f64::NEG_INFINITY), |(best_i, best_v), (i, &v)| {
                if v > best_v {
                    (i, v)
                } else {
                    (best_i, best_v)
                }
            })
            .0;

        let index = i64::try_from(best).unwrap_or(i64::MAX);
        Action::try_from(index).map_err(|err| {
            tracing::warn!(index, "Linear policy chose an index outside the action set");
            AgentError::from(err)
        })
    }

    fn name(&self) -> &str {
        "linear"
    }

    fn as_trainable(&mut self) -> Option<&mut dyn Trainable> {
        Some(self)
    }
}

impl Trainable for LinearPolicyAgent {
    // Weights stay fixed; outcomes are only collected.
    fn observe(&mut self, outcome: &Outcome) {
        self.experience.push(*outcome);
    }
}
