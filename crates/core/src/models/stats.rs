use serde::{Deserialize, Serialize};

/// Aggregate figures over a projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Number of entries aggregated
    pub total_trades: usize,

    /// Sum of positive amounts
    pub total_profit: f64,

    /// Magnitude of the sum of negative amounts (always ≥ 0)
    pub total_loss: f64,

    /// Sum of all amounts
    pub net: f64,

    /// Share of entries with amount > 0, in `0.0..=1.0`; 0 when empty
    pub win_rate: f64,

    /// Mean amount; 0 when empty
    pub average_amount: f64,

    /// Largest single amount, if any
    pub best: Option<f64>,

    /// Smallest single amount, if any
    pub worst: Option<f64>,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            total_trades: 0,
            total_profit: 0.0,
            total_loss: 0.0,
            net: 0.0,
            win_rate: 0.0,
            average_amount: 0.0,
            best: None,
            worst: None,
        }
    }
}

impl Stats {
    /// Win rate as a percentage (e.g., 66.67).
    #[must_use]
    pub fn win_rate_pct(&self) -> f64 {
        self.win_rate * 100.0
    }
}
