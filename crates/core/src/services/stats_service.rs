use crate::models::entry::Entry;
use crate::models::stats::Stats;

/// Aggregates profit/loss figures over a set of entries.
pub struct StatsService;

impl StatsService {
    pub fn new() -> Self {
        Self
    }

    /// Compute [`Stats`] over `entries`. Empty input yields all-zero stats.
    pub fn compute<'a, I>(&self, entries: I) -> Stats
    where
        I: IntoIterator<Item = &'a Entry>,
    {
        let mut stats = Stats::default();
        let mut wins = 0usize;

        for entry in entries {
            let amount = entry.amount;
            stats.total_trades += 1;
            stats.net += amount;
            if amount > 0.0 {
                stats.total_profit += amount;
                wins += 1;
            } else if amount < 0.0 {
                stats.total_loss += -amount;
            }
            stats.best = Some(stats.best.map_or(amount, |b| b.max(amount)));
            stats.worst = Some(stats.worst.map_or(amount, |w| w.min(amount)));
        }

        if stats.total_trades > 0 {
            let count = stats.total_trades as f64;
            stats.win_rate = wins as f64 / count;
            stats.average_amount = stats.net / count;
        }

        stats
    }
}

impl Default for StatsService {
    fn default() -> Self {
        Self::new()
    }
}
