use serde::Serialize;
use time::Date;

/// Per-day order quantities. An individual may have at most one of the two
/// non-zero; a group order may carry both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MealCounts {
    pub veg: u32,
    pub meat: u32,
}

impl MealCounts {
    pub const ZERO: MealCounts = MealCounts { veg: 0, meat: 0 };

    pub fn new(veg: u32, meat: u32) -> Self {
        Self { veg, meat }
    }

    /// Zero on both sides means "no order" and is represented remotely by
    /// the absence of a row.
    pub fn is_zero(&self) -> bool {
        self.veg == 0 && self.meat == 0
    }
}

/// One desired write: the counts a date should end up with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayUpdate {
    pub date: Date,
    pub counts: MealCounts,
}

/// What a quantity-form submission applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    SingleDay(Date),
    /// Every unlocked weekday of the week containing the date.
    WeekBatch(Date),
}

/// Result of a calendar click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Locked, closed, or already-pending date; nothing happened.
    Ignored,
    /// Individual cycle computed and persisted.
    Saved,
    /// Group-order role: the caller should open the quantity form seeded
    /// with `current` and submit via `submit_quantities`.
    QuantityForm {
        target: EditTarget,
        current: MealCounts,
    },
}
