use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::entry::Entry;

/// Which entries a projection keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum EntryFilter {
    /// Everything (default)
    #[default]
    All,
    /// amount > 0
    Profit,
    /// amount < 0
    Loss,
    /// Entries dated today
    Today,
    /// Today and the six days before it
    Last7Days,
    /// Today and the 29 days before it
    Last30Days,
    /// Same calendar month as today
    ThisMonth,
    /// Same calendar year as today
    ThisYear,
    /// Inclusive date range
    Range { from: NaiveDate, to: NaiveDate },
}

impl EntryFilter {
    /// Evaluate the predicate. Date presets are resolved against `today`.
    #[must_use]
    pub fn matches(&self, entry: &Entry, today: NaiveDate) -> bool {
        match self {
            EntryFilter::All => true,
            EntryFilter::Profit => entry.amount > 0.0,
            EntryFilter::Loss => entry.amount < 0.0,
            EntryFilter::Today => entry.date == today,
            EntryFilter::Last7Days => within_days(entry.date, today, 7),
            EntryFilter::Last30Days => within_days(entry.date, today, 30),
            EntryFilter::ThisMonth => {
                entry.date.year() == today.year() && entry.date.month() == today.month()
            }
            EntryFilter::ThisYear => entry.date.year() == today.year(),
            EntryFilter::Range { from, to } => entry.date >= *from && entry.date <= *to,
        }
    }
}

impl std::str::FromStr for EntryFilter {
    type Err = String;

    /// Parses the preset names used by config files and the CLI.
    /// Custom ranges are written `FROM..TO`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some((from, to)) = s.split_once("..") {
            let from = NaiveDate::parse_from_str(from.trim(), "%Y-%m-%d")
                .map_err(|e| format!("invalid range start '{from}': {e}"))?;
            let to = NaiveDate::parse_from_str(to.trim(), "%Y-%m-%d")
                .map_err(|e| format!("invalid range end '{to}': {e}"))?;
            if from > to {
                return Err(format!("range start {from} is after range end {to}"));
            }
            return Ok(EntryFilter::Range { from, to });
        }
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(EntryFilter::All),
            "profit" => Ok(EntryFilter::Profit),
            "loss" => Ok(EntryFilter::Loss),
            "today" => Ok(EntryFilter::Today),
            "7d" | "last7days" | "week" => Ok(EntryFilter::Last7Days),
            "30d" | "last30days" => Ok(EntryFilter::Last30Days),
            "month" | "this_month" => Ok(EntryFilter::ThisMonth),
            "year" | "this_year" => Ok(EntryFilter::ThisYear),
            other => Err(format!("unknown filter '{other}'")),
        }
    }
}

fn within_days(date: NaiveDate, today: NaiveDate, days: i64) -> bool {
    date <= today && date > today - Duration::days(days)
}

/// Sort order for projections. Ties keep their stored relative order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Newest date first (default for display)
    #[default]
    DateDesc,
    /// Oldest date first
    DateAsc,
    /// Largest amount first
    AmountDesc,
    /// Smallest amount first
    AmountAsc,
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "date_desc" | "newest" => Ok(SortKey::DateDesc),
            "date_asc" | "oldest" => Ok(SortKey::DateAsc),
            "amount_desc" => Ok(SortKey::AmountDesc),
            "amount_asc" => Ok(SortKey::AmountAsc),
            other => Err(format!("unknown sort key '{other}'")),
        }
    }
}
