//! Streak derivation from a completion log and a recurrence rule.
//!
//! Both streaks count due-and-completed days. Days on which the habit is not
//! due are skipped: they neither extend nor break a run.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

use super::calendar::{add_days, previous_day};
use super::completions::completed_days;
use super::recurrence::is_due;
use super::types::Habit;
use crate::error::HabitResult;

/// Derived streak fields for one habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreakSummary {
    pub current: u32,
    pub best: u32,
}

/// Current streak as of `today`.
///
/// The walk starts at `today`, or at yesterday when today is not completed
/// but yesterday is, so an unfinished today does not end a live streak.
pub fn current_streak(habit: &Habit, today: NaiveDate) -> HabitResult<u32> {
    let days = completed_days(&habit.completions)?;
    Ok(walk_back(habit, &days, today))
}

/// Longest run in the log up to `today`; never less than the current streak.
pub fn best_streak(habit: &Habit, today: NaiveDate) -> HabitResult<u32> {
    let days = completed_days(&habit.completions)?;
    let current = walk_back(habit, &days, today);
    Ok(longest_run(habit, &days, today).max(current))
}

/// Both streaks from a single parse of the log.
pub fn summarize(habit: &Habit, today: NaiveDate) -> HabitResult<StreakSummary> {
    let days = completed_days(&habit.completions)?;
    let current = walk_back(habit, &days, today);
    let best = longest_run(habit, &days, today).max(current);
    Ok(StreakSummary { current, best })
}

fn walk_back(habit: &Habit, days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let Some(&earliest) = days.first() else {
        return 0;
    };

    let mut cursor = today;
    if !days.contains(&today) {
        if let Some(yesterday) = previous_day(today).filter(|d| days.contains(d)) {
            cursor = yesterday;
        }
    }

    let mut streak = 0;
    while cursor >= earliest {
        if is_due(habit, cursor) {
            if !days.contains(&cursor) {
                break;
            }
            streak += 1;
        }
        match previous_day(cursor) {
            Some(prev) => cursor = prev,
            None => break,
        }
    }
    streak
}

fn longest_run(habit: &Habit, days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let (Some(&first), Some(&last)) = (days.first(), days.last()) else {
        return 0;
    };
    // Future-dated entries do not count.
    let last = last.min(today);

    let mut best = 0;
    let mut run = 0;
    let mut cursor = first;
    while cursor <= last {
        if is_due(habit, cursor) {
            if days.contains(&cursor) {
                run += 1;
                best = best.max(run);
            } else {
                run = 0;
            }
        }
        if cursor == NaiveDate::MAX {
            break;
        }
        cursor = add_days(cursor, 1);
    }
    best
}
