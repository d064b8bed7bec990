use anyhow::Result;

use cadence::config::CadenceConfig;
use cadence::habit::analytics::{habit_metrics, week_overview};

/// Display per-habit metrics and the current week in the terminal.
pub fn stats(config: &CadenceConfig, json: bool) -> Result<()> {
    let tracker = super::open_tracker(config)?;
    let today = tracker.today();

    let mut metrics = Vec::new();
    for habit in tracker.habits() {
        match habit_metrics(habit, today) {
            Ok(m) => metrics.push(m),
            Err(e) => eprintln!("warning: no metrics for {} ({e})", habit.name),
        }
    }
    let week = week_overview(tracker.habits(), today);

    if json {
        let body = serde_json::json!({ "habits": metrics, "week": week });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!("Habit Statistics");
    println!("{}", "=".repeat(40));
    for m in &metrics {
        println!("{}", m.name);
        println!("  Success rate:        {:.1}% ({}/{} due days)", m.success_rate, m.completed_days, m.scheduled_days);
        println!("  Streak:              {} (best {}, {:.0}% of best)", m.current_streak, m.best_streak, m.streak_consistency);
        println!(
            "  Last 7 days:         {} (previous 7: {}, {:+.0}%)",
            m.recent_completions, m.previous_completions, m.improvement_trend
        );
    }
    println!();

    println!("Week of {}", week.week_start);
    for day in &week.days {
        println!(
            "  {:<10} {}/{} {:>5.0}%",
            day.weekday, day.completed, day.scheduled, day.completion_rate
        );
    }
    println!("  Overall:   {:.1}%", week.completion_rate);

    let sync = tracker.sync_stats();
    if sync.failed > 0 || sync.skipped > 0 {
        println!();
        println!("Sync: {} pushed, {} failed, {} skipped", sync.pushed, sync.failed, sync.skipped);
    }

    Ok(())
}
