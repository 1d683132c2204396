use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::models::entry::Entry;
use crate::models::filter::{EntryFilter, SortKey};

/// Derives filtered, sorted views of the canonical collection.
///
/// Pure business logic, never touches the store. Sorting is stable, so
/// entries with equal keys keep their stored relative order.
pub struct ProjectionService;

impl ProjectionService {
    pub fn new() -> Self {
        Self
    }

    /// Filter then sort. Date presets resolve against `today`.
    pub fn project<'a>(
        &self,
        entries: &'a [Entry],
        filter: &EntryFilter,
        sort: SortKey,
        today: NaiveDate,
    ) -> Vec<&'a Entry> {
        let mut projected: Vec<&Entry> = entries
            .iter()
            .filter(|e| filter.matches(e, today))
            .collect();
        self.sort(&mut projected, sort);
        projected
    }

    /// Stable in-place sort.
    pub fn sort(&self, entries: &mut [&Entry], sort: SortKey) {
        match sort {
            SortKey::DateDesc => entries.sort_by(|a, b| date_key(b).cmp(&date_key(a))),
            SortKey::DateAsc => entries.sort_by(|a, b| date_key(a).cmp(&date_key(b))),
            SortKey::AmountDesc => entries.sort_by(|a, b| cmp_amount(b, a)),
            SortKey::AmountAsc => entries.sort_by(|a, b| cmp_amount(a, b)),
        }
    }

    /// Case-insensitive match on description and trade symbol/strategy.
    pub fn search<'a, I>(&self, entries: I, query: &str) -> Vec<&'a Entry>
    where
        I: IntoIterator<Item = &'a Entry>,
    {
        let q = query.trim().to_lowercase();
        entries
            .into_iter()
            .filter(|e| {
                e.description.to_lowercase().contains(&q)
                    || e.trade.as_ref().is_some_and(|t| {
                        t.symbol.to_lowercase().contains(&q)
                            || t.strategy.to_lowercase().contains(&q)
                    })
            })
            .collect()
    }
}

impl Default for ProjectionService {
    fn default() -> Self {
        Self::new()
    }
}

/// Date, then time of day (entries without a time sort first within a day).
fn date_key(entry: &Entry) -> (NaiveDate, Option<chrono::NaiveTime>) {
    (entry.date, entry.time)
}

fn cmp_amount(a: &Entry, b: &Entry) -> Ordering {
    a.amount.partial_cmp(&b.amount).unwrap_or(Ordering::Equal)
}
