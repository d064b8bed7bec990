//! Core habit engine: recurrence, completion log, streaks, and the tracker
//! that ties them to the local cache and the remote.

pub mod analytics;
pub mod calendar;
pub mod completions;
pub mod recurrence;
pub mod streak;
pub mod tracker;
pub mod types;

pub use tracker::HabitTracker;
pub use types::{Frequency, Habit, HabitRecord, NewHabit, TodayStatus, ToggleAction};
