use std::collections::{BTreeMap, BTreeSet};

use time::Date;

use super::dto::{DayUpdate, MealCounts};

/// Confirmed per-date selections for the current account plus the set of
/// dates with a write in flight. This is the single source of truth the
/// calendar renders; it is only mutated after a remote write succeeds.
#[derive(Debug, Default)]
pub struct SelectionStore {
    selections: BTreeMap<Date, MealCounts>,
    pending: BTreeSet<Date>,
}

impl SelectionStore {
    /// Replace all selections, e.g. after the initial fetch. Zero entries
    /// are dropped so "no order" stays representable only by absence.
    pub fn replace(&mut self, entries: impl IntoIterator<Item = DayUpdate>) {
        self.selections = entries
            .into_iter()
            .filter(|u| !u.counts.is_zero())
            .map(|u| (u.date, u.counts))
            .collect();
    }

    /// Commit updates locally: zero removes the entry, anything else sets it.
    pub fn apply_local(&mut self, updates: &[DayUpdate]) {
        for update in updates {
            if update.counts.is_zero() {
                self.selections.remove(&update.date);
            } else {
                self.selections.insert(update.date, update.counts);
            }
        }
    }

    pub fn get(&self, date: Date) -> MealCounts {
        self.selections.get(&date).copied().unwrap_or_default()
    }

    pub fn snapshot(&self) -> BTreeMap<Date, MealCounts> {
        self.selections.clone()
    }

    pub fn mark_pending(&mut self, dates: &[Date]) {
        self.pending.extend(dates.iter().copied());
    }

    pub fn clear_pending(&mut self, dates: &[Date]) {
        for date in dates {
            self.pending.remove(date);
        }
    }

    pub fn is_pending(&self, date: Date) -> bool {
        self.pending.contains(&date)
    }
}
