//! Pure state-transition logic for the calendar: the individual 3-cycle,
//! week boundaries, locking rules, and the whole-week fill rule.

use time::{Date, Duration, Weekday};

use super::dto::MealCounts;

/// Individual toggle cycle: none -> meat -> veg -> none.
pub fn next_cycle(current: MealCounts) -> MealCounts {
    if current.is_zero() {
        MealCounts::new(0, 1)
    } else if current.meat > 0 {
        MealCounts::new(1, 0)
    } else {
        MealCounts::ZERO
    }
}

/// The dining hall is closed on Friday and Saturday.
pub fn is_weekend(date: Date) -> bool {
    matches!(date.weekday(), Weekday::Friday | Weekday::Saturday)
}

/// Today and past dates are immutable.
pub fn is_locked(date: Date, today: Date) -> bool {
    date <= today
}

pub fn is_editable(date: Date, today: Date) -> bool {
    !is_locked(date, today) && !is_weekend(date)
}

/// Sunday through Thursday of the calendar week containing `date`,
/// regardless of which day was given (Sunday-start week).
pub fn week_days(date: Date) -> [Date; 5] {
    let offset = date.weekday().number_days_from_sunday() as i64;
    let sunday = date - Duration::days(offset);
    [
        sunday,
        sunday + Duration::days(1),
        sunday + Duration::days(2),
        sunday + Duration::days(3),
        sunday + Duration::days(4),
    ]
}

/// The week's weekdays that can still be edited.
pub fn editable_week_days(date: Date, today: Date) -> Vec<Date> {
    week_days(date)
        .into_iter()
        .filter(|d| is_editable(*d, today))
        .collect()
}

/// Fill to apply when the week button is pressed, from the current content
/// of the week's editable days: all empty -> meat, meat with no veg -> veg,
/// any veg -> clear, any other mix -> meat.
pub fn classify_week_fill(states: &[MealCounts]) -> MealCounts {
    let mut empty = 0usize;
    let mut meat = 0usize;
    let mut veg = 0usize;
    for s in states {
        if s.is_zero() {
            empty += 1;
        } else if s.meat > 0 {
            meat += 1;
        } else if s.veg > 0 {
            veg += 1;
        }
    }

    if empty == states.len() {
        MealCounts::new(0, 1)
    } else if meat > 0 && veg == 0 {
        MealCounts::new(1, 0)
    } else if veg > 0 {
        MealCounts::ZERO
    } else {
        MealCounts::new(0, 1)
    }
}
