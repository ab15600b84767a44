//! Run analytics and reporting

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// One point of the equity curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquityPoint {
    /// Tick the value was marked on
    pub timestamp: DateTime<Utc>,
    /// Cash plus holdings at the tick close
    pub equity: Decimal,
}

/// Tracks peak equity and the worst drop from it
#[derive(Debug, Clone)]
pub struct DrawdownTracker {
    /// Peak equity value
    pub peak_equity: Decimal,
    /// Current equity value
    pub current_equity: Decimal,
    /// Largest peak-to-trough drop seen (absolute)
    pub max_drawdown: Decimal,
    /// Largest peak-to-trough drop seen (fraction of peak)
    pub max_drawdown_pct: Decimal,
}

impl DrawdownTracker {
    /// Create a tracker starting at `initial_equity`
    pub fn new(initial_equity: Decimal) -> Self {
        Self {
            peak_equity: initial_equity,
            current_equity: initial_equity,
            max_drawdown: dec!(0),
            max_drawdown_pct: dec!(0),
        }
    }

    /// Update with new equity value
    pub fn update(&mut self, new_equity: Decimal) {
        self.current_equity = new_equity;
        if new_equity > self.peak_equity {
            self.peak_equity = new_equity;
        }

        let fall = self.peak_equity - new_equity;
        if fall > self.max_drawdown {
            self.max_drawdown = fall;
        }
        let pct = self.current_drawdown();
        if pct > self.max_drawdown_pct {
            self.max_drawdown_pct = pct;
        }
    }

    /// Current drawdown from peak as a fraction
    pub fn current_drawdown(&self) -> Decimal {
        if self.peak_equity <= dec!(0) {
            return dec!(0);
        }
        (self.peak_equity - self.current_equity) / self.peak_equity
    }
}

/// Summary statistics of a finished (or interrupted) run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Agent name
    pub agent: String,
    /// Steps committed
    pub steps: usize,
    /// Starting cash
    pub initial_equity: Decimal,
    /// Last marked equity
    pub final_equity: Decimal,
    /// Return as a fraction of initial equity
    pub return_pct: Decimal,
    /// Maximum drawdown (absolute)
    pub max_drawdown: Decimal,
    /// Maximum drawdown (fraction of peak)
    pub max_drawdown_pct: Decimal,
    /// Buys applied
    pub buys: usize,
    /// Sells applied
    pub sells: usize,
    /// Buy/Sell requests downgraded to Hold
    pub downgrades: usize,
    /// Cash at the end
    pub final_cash: Decimal,
    /// Units held at the end
    pub final_holdings: u64,
}

impl RunSummary {
    /// Format as table for CLI output
    pub fn format_table(&self) -> String {
        format!(
            r#"
══════════════════════════════════════════════════════
               REPLAY RESULTS ({})
══════════════════════════════════════════════════════

PERFORMANCE
───────────────────────────────────────────────────────
Initial Equity:   {:.2}
Final Equity:     {:.2} ({:+.2}%)
Max Drawdown:     {:.2} ({:.2}%)

ACTIVITY
───────────────────────────────────────────────────────
Steps:            {}
Buys / Sells:     {} / {}
Downgraded:       {}
Final Cash:       {:.2}
Final Holdings:   {}
══════════════════════════════════════════════════════
"#,
            self.agent,
            self.initial_equity,
            self.final_equity,
            self.return_pct * dec!(100),
            self.max_drawdown,
            self.max_drawdown_pct * dec!(100),
            self.steps,
            self.buys,
            self.sells,
            self.downgrades,
            self.final_cash,
            self.final_holdings,
        )
    }
}
