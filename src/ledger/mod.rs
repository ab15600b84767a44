//! Simulated cash/position ledger
//!
//! Applies agent actions to a tick price under fixed rules and keeps an
//! append-only audit trail of every request.

mod types;

pub use types::{Action, AuditRecord, InvalidAction, LedgerError, Position};

use rust_decimal::Decimal;

/// Cash, position and holdings of one simulated account
#[derive(Debug, Clone)]
pub struct Ledger {
    initial_cash: Decimal,
    cash: Decimal,
    position: Position,
    holdings: u64,
    trail: Vec<AuditRecord>,
}

impl Ledger {
    /// Open a flat ledger
    pub fn new(initial_cash: Decimal) -> Result<Self, LedgerError> {
        if initial_cash < Decimal::ZERO {
            return Err(LedgerError::NegativeCash(initial_cash));
        }
        Ok(Self {
            initial_cash,
            cash: initial_cash,
            position: Position::Flat,
            holdings: 0,
            trail: Vec::new(),
        })
    }

    /// Apply `requested` at `price`
    ///
    /// A Buy without `cash > price` or a Sell without holdings degrades to
    /// Hold. Degraded requests are still recorded with `applied = Hold`.
    pub fn apply(&mut self, requested: Action, price: Decimal) -> Result<AuditRecord, LedgerError> {
        if price <= Decimal::ZERO {
            return Err(LedgerError::NonPositivePrice(price));
        }

        let applied = match requested {
            Action::Buy if self.cash > price => {
                self.cash -= price;
                self.holdings += 1;
                self.position = Position::Long;
                Action::Buy
            }
            Action::Sell if self.holdings > 0 => {
                self.cash += price;
                self.holdings -= 1;
                if self.holdings == 0 {
                    self.position = Position::Flat;
                }
                Action::Sell
            }
            _ => Action::Hold,
        };

        let record = AuditRecord {
            requested,
            applied,
            price,
            cash: self.cash,
            holdings: self.holdings,
        };
        self.trail.push(record);

        if record.was_downgraded() {
            tracing::debug!(
                %requested,
                %price,
                cash = %self.cash,
                holdings = self.holdings,
                "Action downgraded to hold"
            );
        }

        Ok(record)
    }

    /// Cash plus holdings valued at `price`
    pub fn mark_to_market(&self, price: Decimal) -> Decimal {
        self.cash + Decimal::from(self.holdings) * price
    }

    /// Current cash
    pub fn cash(&self) -> Decimal {
        self.cash
    }

    /// Starting cash
    pub fn initial_cash(&self) -> Decimal {
        self.initial_cash
    }

    /// Current exposure
    pub fn position(&self) -> Position {
        self.position
    }

    /// Units held
    pub fn holdings(&self) -> u64 {
        self.holdings
    }

    /// Every `apply` call so far, oldest first
    pub fn audit_trail(&self) -> &[AuditRecord] {
        &self.trail
    }

    /// Number of Buy/Sell requests that were downgraded to Hold
    pub fn downgrade_count(&self) -> usize {
        self.trail.iter().filter(|r| r.was_downgraded()).count()
    }

    /// Number of times `action` was actually applied
    pub fn applied_count(&self, action: Action) -> usize {
        self.trail.iter().filter(|r| r.applied == action).count()
    }
}
