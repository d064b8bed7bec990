//! CLI habit commands: `add`, `toggle`, `delete`, `today`, `list`.

use anyhow::{Context, Result};

use cadence::config::CadenceConfig;
use cadence::habit::calendar::{local_noon, parse_day_key};
use cadence::habit::tracker::HabitView;
use cadence::habit::{Frequency, NewHabit};

pub async fn add(
    config: &CadenceConfig,
    name: &str,
    description: Option<String>,
    frequency: Frequency,
    days: Vec<String>,
) -> Result<()> {
    let mut tracker = super::open_tracker(config)?;
    let habit = tracker.create(NewHabit {
        name: name.to_string(),
        description,
        target_frequency: frequency,
        custom_days: days,
    })?;
    println!("Created {} ({})", habit.name, habit.id);
    super::finish(&mut tracker).await;
    Ok(())
}

/// Toggle today, or the given `YYYY-MM-DD` day.
pub async fn toggle(config: &CadenceConfig, id: &str, date: Option<&str>) -> Result<()> {
    let at = match date {
        Some(raw) => Some(local_noon(parse_day_key(raw)?)?),
        None => None,
    };
    let mut tracker = super::open_tracker(config)?;
    let outcome = tracker
        .toggle_completion(id, at)
        .with_context(|| format!("failed to toggle habit {id}"))?;
    println!(
        "{}: {} (streak {}, best {})",
        outcome.habit.name, outcome.action, outcome.habit.streak, outcome.habit.best_streak
    );
    super::finish(&mut tracker).await;
    Ok(())
}

pub async fn delete(config: &CadenceConfig, id: &str) -> Result<()> {
    let mut tracker = super::open_tracker(config)?;
    let removed = tracker.delete(id)?;
    println!("Deleted {} ({})", removed.name, removed.id);
    super::finish(&mut tracker).await;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodayFilter {
    Due,
    Pending,
    Completed,
}

pub fn today(config: &CadenceConfig, filter: TodayFilter) -> Result<()> {
    let tracker = super::open_tracker(config)?;
    let views = match filter {
        TodayFilter::Due => tracker.due_today(),
        TodayFilter::Pending => tracker.pending(),
        TodayFilter::Completed => tracker.completed(),
    };

    println!("Today ({})", tracker.today());
    println!("{}", "=".repeat(40));
    if views.is_empty() {
        println!("  nothing here");
    }
    for view in &views {
        let mark = match view.today_status {
            cadence::habit::TodayStatus::Completed => "x",
            cadence::habit::TodayStatus::Pending => " ",
        };
        println!(
            "  [{mark}] {:<24} streak {:<3} {}",
            view.habit.name, view.habit.streak, view.habit.id
        );
    }
    Ok(())
}

pub fn list(config: &CadenceConfig) -> Result<()> {
    let tracker = super::open_tracker(config)?;
    let views = tracker.today_view();

    println!("{:<38} {:<24} {:<8} {:>6} {:>5} {:>5}", "ID", "NAME", "FREQ", "STREAK", "BEST", "NEXT");
    for view in &views {
        println!("{}", format_row(view));
    }
    eprintln!("{} habit(s).", views.len());
    Ok(())
}

fn format_row(view: &HabitView<'_>) -> String {
    let habit = view.habit;
    let frequency = match habit.target_frequency {
        Frequency::Custom if !habit.custom_days.is_empty() => habit
            .custom_days
            .iter()
            .map(|d| d.get(..3).unwrap_or(d))
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    };
    let next = if view.due_today {
        "today".to_string()
    } else {
        format!("+{}d", view.days_until_next)
    };
    format!(
        "{:<38} {:<24} {:<8} {:>6} {:>5} {:>5}",
        habit.id, habit.name, frequency, habit.streak, habit.best_streak, next
    )
}
