//! Ledger types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Discrete trading action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Do nothing
    Hold,
    /// Buy one unit
    Buy,
    /// Sell one unit
    Sell,
}

impl Action {
    /// All actions in policy output order
    pub const ALL: [Action; 3] = [Action::Hold, Action::Buy, Action::Sell];

    /// Lowercase label
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Hold => "hold",
            Action::Buy => "buy",
            Action::Sell => "sell",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Policy output index outside `0..=2`
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("Invalid action index {0}, expected 0 (hold), 1 (buy) or 2 (sell)")]
pub struct InvalidAction(pub i64);

impl TryFrom<i64> for Action {
    type Error = InvalidAction;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Action::Hold),
            1 => Ok(Action::Buy),
            2 => Ok(Action::Sell),
            other => Err(InvalidAction(other)),
        }
    }
}

/// Market exposure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    /// No holdings
    #[default]
    Flat,
    /// One or more units held
    Long,
}

/// One immutable entry of the audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// What the agent asked for
    pub requested: Action,
    /// What the ledger actually did
    pub applied: Action,
    /// Tick price the action was applied at
    pub price: Decimal,
    /// Cash after the action
    pub cash: Decimal,
    /// Holdings after the action
    pub holdings: u64,
}

impl AuditRecord {
    /// A Buy/Sell that was downgraded to Hold for lack of cash or holdings
    pub fn was_downgraded(&self) -> bool {
        self.requested != self.applied
    }

    /// Portfolio value at the record's price
    pub fn equity(&self) -> Decimal {
        self.cash + Decimal::from(self.holdings) * self.price
    }
}

/// Ledger errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// Actions can only be priced at a positive tick price
    #[error("Price must be positive, got {0}")]
    NonPositivePrice(Decimal),
    /// Starting cash must not be negative
    #[error("Initial cash must not be negative, got {0}")]
    NegativeCash(Decimal),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_action_from_index() {
        assert_eq!(Action::try_from(0), Ok(Action::Hold));
        assert_eq!(Action::try_from(1), Ok(Action::Buy));
        assert_eq!(Action::try_from(2), Ok(Action::Sell));
        assert_eq!(Action::try_from(3), Err(InvalidAction(3)));
        assert_eq!(Action::try_from(-1), Err(InvalidAction(-1)));
    }

    #[test]
    fn test_action_labels() {
        assert_eq!(Action::Buy.to_string(), "buy");
        assert_eq!(serde_json::to_string(&Action::Sell).unwrap(), "\"sell\"");
    }

    #[test]
    fn test_audit_record_downgrade_and_equity() {
        let record = AuditRecord {
            requested: Action::Sell,
            applied: Action::Hold,
            price: dec!(50),
            cash: dec!(1010),
            holdings: 2,
        };
        assert!(record.was_downgraded());
        assert_eq!(record.equity(), dec!(1110));
    }
}
