//! Per-habit statistics and the current-week overview.

use chrono::{Days, Local, NaiveDate};
use serde::Serialize;
use tracing::warn;

use super::calendar::{add_days, start_of_week, weekday_name};
use super::completions::completed_days;
use super::recurrence::is_due;
use super::streak::summarize;
use super::types::Habit;
use crate::error::HabitResult;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitMetrics {
    pub habit_id: String,
    pub name: String,
    /// Due days from creation through today.
    pub scheduled_days: u32,
    /// Due days from creation through today that were completed.
    pub completed_days: u32,
    /// Distinct completed days, due or not.
    pub total_completions: u32,
    /// `completed_days / scheduled_days` as a percentage.
    pub success_rate: f64,
    pub current_streak: u32,
    pub best_streak: u32,
    /// Current streak as a percentage of the best.
    pub streak_consistency: f64,
    /// Completions in the last 7 days, today included.
    pub recent_completions: u32,
    /// Completions in the 7 days before that.
    pub previous_completions: u32,
    /// Percent change from the previous to the recent window.
    pub improvement_trend: f64,
}

pub fn habit_metrics(habit: &Habit, today: NaiveDate) -> HabitResult<HabitMetrics> {
    let days = completed_days(&habit.completions)?;
    let streaks = summarize(habit, today)?;

    let created = habit.created_at.with_timezone(&Local).date_naive().min(today);
    let mut scheduled = 0u32;
    let mut completed = 0u32;
    let mut cursor = created;
    loop {
        if is_due(habit, cursor) {
            scheduled += 1;
            if days.contains(&cursor) {
                completed += 1;
            }
        }
        if cursor >= today {
            break;
        }
        cursor = add_days(cursor, 1);
    }

    let days_ago = |n: u64| today.checked_sub_days(Days::new(n)).unwrap_or(NaiveDate::MIN);
    let window = |from: u64, to: u64| days.range(days_ago(from)..=days_ago(to)).count() as u32;
    let recent = window(6, 0);
    let previous = window(13, 7);

    Ok(HabitMetrics {
        habit_id: habit.id.clone(),
        name: habit.name.clone(),
        scheduled_days: scheduled,
        completed_days: completed,
        total_completions: days.len() as u32,
        success_rate: percent(completed, scheduled),
        current_streak: streaks.current,
        best_streak: streaks.best,
        streak_consistency: percent(streaks.current, streaks.best),
        recent_completions: recent,
        previous_completions: previous,
        improvement_trend: trend(recent, previous),
    })
}

fn percent(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        0.0
    } else {
        f64::from(part) / f64::from(whole) * 100.0
    }
}

fn trend(recent: u32, previous: u32) -> f64 {
    match (recent, previous) {
        (_, 0) if recent > 0 => 100.0,
        (_, 0) => 0.0,
        _ => (f64::from(recent) - f64::from(previous)) / f64::from(previous) * 100.0,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub weekday: &'static str,
    pub scheduled: usize,
    pub completed: usize,
    pub completion_rate: f64,
}

/// Sunday-to-Saturday view of the week containing `today`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekOverview {
    pub week_start: NaiveDate,
    pub days: Vec<DaySummary>,
    /// Mean of the daily rates over days with anything scheduled.
    pub completion_rate: f64,
}

/// Habits with unreadable logs are left out of the overview.
pub fn week_overview(habits: &[Habit], today: NaiveDate) -> WeekOverview {
    let readable: Vec<_> = habits
        .iter()
        .filter_map(|habit| match completed_days(&habit.completions) {
            Ok(days) => Some((habit, days)),
            Err(e) => {
                warn!(habit_id = %habit.id, error = %e, "leaving habit out of week overview");
                None
            }
        })
        .collect();

    let week_start = start_of_week(today);
    let days: Vec<DaySummary> = (0..7)
        .map(|offset| {
            let date = add_days(week_start, offset);
            let due: Vec<_> = readable.iter().filter(|(h, _)| is_due(h, date)).collect();
            let completed = due.iter().filter(|(_, days)| days.contains(&date)).count();
            DaySummary {
                date,
                weekday: weekday_name(date),
                scheduled: due.len(),
                completed,
                completion_rate: percent(completed as u32, due.len() as u32),
            }
        })
        .collect();

    let active: Vec<f64> = days
        .iter()
        .filter(|d| d.scheduled > 0)
        .map(|d| d.completion_rate)
        .collect();
    let completion_rate = if active.is_empty() {
        0.0
    } else {
        active.iter().sum::<f64>() / active.len() as f64
    };

    WeekOverview {
        week_start,
        days,
        completion_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::calendar::local_noon;
    use crate::habit::types::HabitRecord;
    use chrono::Utc;

    // Wednesday
    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 12).unwrap()
    }

    fn ago(n: u64) -> NaiveDate {
        today() - Days::new(n)
    }

    fn habit(frequency: &str, custom: &[&str], created: NaiveDate, done: &[NaiveDate]) -> Habit {
        HabitRecord {
            id: Some(format!("h-{frequency}")),
            name: Some(frequency.into()),
            target_frequency: Some(frequency.into()),
            custom_days: Some(custom.iter().map(|d| d.to_string()).collect()),
            created_at: Some(local_noon(created).unwrap().to_rfc3339()),
            completions: Some(
                done.iter()
                    .map(|d| local_noon(*d).unwrap().to_rfc3339())
                    .collect(),
            ),
            ..HabitRecord::default()
        }
        .normalize(Utc::now())
    }

    #[test]
    fn success_rate_counts_due_days_since_creation() {
        let h = habit("daily", &[], ago(9), &[ago(0), ago(1), ago(5), ago(9), ago(30)]);
        let m = habit_metrics(&h, today()).unwrap();
        assert_eq!(m.scheduled_days, 10);
        assert_eq!(m.completed_days, 4);
        assert_eq!(m.total_completions, 5);
        assert!((m.success_rate - 40.0).abs() < 1e-9);
        assert_eq!(m.current_streak, 2);
    }

    #[test]
    fn trend_compares_two_weeks() {
        let h = habit(
            "daily",
            &[],
            ago(20),
            &[ago(0), ago(1), ago(2), ago(3), ago(8), ago(9)],
        );
        let m = habit_metrics(&h, today()).unwrap();
        assert_eq!(m.recent_completions, 4);
        assert_eq!(m.previous_completions, 2);
        assert!((m.improvement_trend - 100.0).abs() < 1e-9);
        assert!((m.streak_consistency - 100.0).abs() < 1e-9);
    }

    #[test]
    fn new_habit_has_zeroed_metrics() {
        let h = habit("daily", &[], today(), &[]);
        let m = habit_metrics(&h, today()).unwrap();
        assert_eq!(m.scheduled_days, 1);
        assert_eq!(m.success_rate, 0.0);
        assert_eq!(m.streak_consistency, 0.0);
        assert_eq!(m.improvement_trend, 0.0);
    }

    #[test]
    fn week_starts_sunday_and_respects_schedules() {
        let daily = habit("daily", &[], ago(30), &[ago(3), ago(1)]); // Sun, Tue
        let gym = habit("custom", &["monday"], ago(30), &[ago(2)]); // Mon
        let overview = week_overview(&[daily, gym], today());

        assert_eq!(overview.week_start, ago(3));
        assert_eq!(overview.days.len(), 7);
        assert_eq!(overview.days[0].weekday, "sunday");
        assert_eq!(overview.days[0].scheduled, 1);
        assert_eq!(overview.days[0].completed, 1);
        // Monday: both due, only gym done
        assert_eq!(overview.days[1].scheduled, 2);
        assert_eq!(overview.days[1].completed, 1);
        assert!((overview.days[1].completion_rate - 50.0).abs() < 1e-9);
    }

    #[test]
    fn unreadable_habits_are_left_out() {
        let mut broken = habit("daily", &[], ago(3), &[]);
        broken.completions.push("nope".into());
        let overview = week_overview(&[broken], today());
        assert!(overview.days.iter().all(|d| d.scheduled == 0));
        assert_eq!(overview.completion_rate, 0.0);
    }
}
