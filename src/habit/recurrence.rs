//! Recurrence evaluation: is a habit due on a day, and when is it due next.

use chrono::{Datelike, NaiveDate};

use super::calendar::{add_days, weekday_name};
use super::types::{Frequency, Habit};

/// True iff `habit` is scheduled on `date`.
///
/// `Weekly` habits have no anchor day and are due every day.
pub fn is_due(habit: &Habit, date: NaiveDate) -> bool {
    match habit.target_frequency {
        Frequency::Daily | Frequency::Weekly => true,
        Frequency::Custom => {
            let name = weekday_name(date);
            habit.custom_days.iter().any(|d| d == name)
        }
    }
}

/// The first scheduled date strictly after `after`.
///
/// `Custom` scans up to seven days ahead and falls back to `after + 7` so an
/// empty day set still terminates. `Weekly` returns the next Sunday, never
/// `after` itself.
pub fn next_due(habit: &Habit, after: NaiveDate) -> NaiveDate {
    match habit.target_frequency {
        Frequency::Daily => add_days(after, 1),
        Frequency::Weekly => {
            let from_sunday = after.weekday().num_days_from_sunday() as u64;
            add_days(after, 7 - from_sunday)
        }
        Frequency::Custom => (1..=7)
            .map(|offset| add_days(after, offset))
            .find(|candidate| is_due(habit, *candidate))
            .unwrap_or_else(|| add_days(after, 7)),
    }
}

/// Days from `today` until the habit is next due; 0 when it is due today.
pub fn days_until_next(habit: &Habit, today: NaiveDate) -> u32 {
    if is_due(habit, today) {
        return 0;
    }
    let next = next_due(habit, today);
    (next - today).num_days().clamp(0, i64::from(u32::MAX)) as u32
}
