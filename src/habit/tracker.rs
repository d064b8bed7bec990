//! The habit state machine.
//!
//! [`HabitTracker`] owns the in-memory collection and is the only place it is
//! mutated. Each mutation runs the same sequence: validate, update the
//! collection, recompute derived streaks, write the local cache, append to the
//! audit log, then hand the change to the [`Reconciler`] for a background push.

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::calendar::{self, Clock};
use super::completions;
use super::recurrence::{days_until_next, is_due};
use super::streak;
use super::types::{Habit, HabitRecord, NewHabit, TodayStatus, ToggleAction};
use crate::db::cache::LocalCache;
use crate::error::{HabitError, HabitResult};
use crate::sync::{Reconciler, SyncOp, SyncStats};

/// Result of a successful toggle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToggleOutcome {
    pub habit: Habit,
    pub action: ToggleAction,
}

/// A habit as seen on a particular day.
#[derive(Debug, Clone, Serialize)]
pub struct HabitView<'a> {
    pub habit: &'a Habit,
    pub due_today: bool,
    pub today_status: TodayStatus,
    pub days_until_next: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecomputeFailure {
    pub habit_id: String,
    pub error: String,
}

/// Outcome of recomputing every habit's streaks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecomputeReport {
    pub recomputed: usize,
    pub failed: Vec<RecomputeFailure>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PullReport {
    pub fetched: usize,
    pub added: usize,
    pub updated: usize,
    pub kept_local: usize,
    /// Remote records without an id.
    pub skipped: usize,
}

pub struct HabitTracker {
    habits: Vec<Habit>,
    cache: Box<dyn LocalCache>,
    reconciler: Reconciler,
    clock: Arc<dyn Clock>,
    last_known_day: NaiveDate,
}

impl HabitTracker {
    /// Load the cached collection and recompute every streak for today.
    ///
    /// A habit whose log cannot be read keeps its stored streaks and is
    /// reported in the returned [`RecomputeReport`]; the rest still load.
    pub fn open(
        cache: Box<dyn LocalCache>,
        reconciler: Reconciler,
        clock: Arc<dyn Clock>,
    ) -> Result<(Self, RecomputeReport)> {
        let habits = cache.load(clock.now().with_timezone(&Utc))?;
        let last_known_day = clock.today();
        let mut tracker = Self {
            habits,
            cache,
            reconciler,
            clock,
            last_known_day,
        };
        let report = tracker.recompute_all();
        tracker.persist();
        info!(
            habits = tracker.habits.len(),
            failed = report.failed.len(),
            "habit tracker ready"
        );
        Ok((tracker, report))
    }

    pub fn habits(&self) -> &[Habit] {
        &self.habits
    }

    pub fn get(&self, id: &str) -> Option<&Habit> {
        self.habits.iter().find(|h| h.id == id)
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn last_known_day(&self) -> NaiveDate {
        self.last_known_day
    }

    pub fn sync_stats(&self) -> SyncStats {
        self.reconciler.stats()
    }

    /// Wait for background pushes to finish.
    pub async fn drain_sync(&mut self) {
        self.reconciler.drain().await;
    }

    /// Add a habit. The name is trimmed and must not be empty; custom days
    /// must be weekday names.
    pub fn create(&mut self, input: NewHabit) -> HabitResult<Habit> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(HabitError::Validation("habit name is required".into()));
        }

        let mut custom_days: Vec<String> = Vec::new();
        for raw in &input.custom_days {
            let day = calendar::canonical_day_name(raw)
                .ok_or_else(|| HabitError::Validation(format!("unknown weekday: {raw}")))?;
            if !custom_days.iter().any(|d| d == day) {
                custom_days.push(day.to_string());
            }
        }

        let now = self.clock.now().with_timezone(&Utc);
        let habit = Habit {
            id: uuid::Uuid::now_v7().to_string(),
            name: name.to_string(),
            description: input
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            target_frequency: input.target_frequency,
            custom_days,
            created_at: now,
            completions: Vec::new(),
            streak: 0,
            best_streak: 0,
            last_updated: now,
        };

        self.habits.push(habit.clone());
        self.persist();
        self.audit(
            "create",
            &habit.id,
            serde_json::json!({ "name": habit.name, "frequency": habit.target_frequency }),
        );
        self.reconciler.dispatch(SyncOp::Create(habit.clone()));
        info!(habit_id = %habit.id, name = %habit.name, "habit created");
        Ok(habit)
    }

    /// Flip completion for the day of `at` (defaults to now).
    ///
    /// Days after today are rejected. On error the habit is left untouched.
    pub fn toggle_completion(
        &mut self,
        id: &str,
        at: Option<DateTime<Local>>,
    ) -> HabitResult<ToggleOutcome> {
        let now = self.clock.now();
        let today = self.clock.today();
        let at = at.unwrap_or(now);
        if at.date_naive() > today {
            return Err(HabitError::Validation(format!(
                "cannot complete a future day: {}",
                calendar::day_key(at.date_naive())
            )));
        }

        let slot = self
            .habits
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or_else(|| HabitError::NotFound(id.to_string()))?;

        let (log, action) = completions::toggle(&slot.completions, at)?;
        let mut updated = slot.clone();
        updated.completions = log;
        let summary = streak::summarize(&updated, today)?;
        updated.streak = summary.current;
        updated.best_streak = summary.best;
        updated.last_updated = now.with_timezone(&Utc);
        *slot = updated.clone();

        self.persist();
        let day = calendar::day_key(at.date_naive());
        self.audit(
            "toggle",
            id,
            serde_json::json!({ "day": day, "action": action, "streak": updated.streak }),
        );
        self.reconciler.dispatch(SyncOp::Toggle {
            habit_id: id.to_string(),
            date: at.to_rfc3339(),
        });
        info!(habit_id = %id, %day, %action, streak = updated.streak, "completion toggled");

        Ok(ToggleOutcome {
            habit: updated,
            action,
        })
    }

    pub fn delete(&mut self, id: &str) -> HabitResult<Habit> {
        let index = self
            .habits
            .iter()
            .position(|h| h.id == id)
            .ok_or_else(|| HabitError::NotFound(id.to_string()))?;
        let removed = self.habits.remove(index);

        self.persist();
        self.audit("delete", id, serde_json::json!({ "name": removed.name }));
        self.reconciler.dispatch(SyncOp::Delete {
            habit_id: id.to_string(),
        });
        info!(habit_id = %id, "habit deleted");
        Ok(removed)
    }

    /// Every habit with its status for the current day.
    ///
    /// A habit whose log cannot be read is shown as pending.
    pub fn today_view(&self) -> Vec<HabitView<'_>> {
        let today = self.clock.today();
        self.habits
            .iter()
            .map(|habit| {
                let done = completions::is_completed_on(&habit.completions, today)
                    .unwrap_or_else(|e| {
                        debug!(habit_id = %habit.id, error = %e, "treating unreadable log as pending");
                        false
                    });
                HabitView {
                    habit,
                    due_today: is_due(habit, today),
                    today_status: if done {
                        TodayStatus::Completed
                    } else {
                        TodayStatus::Pending
                    },
                    days_until_next: days_until_next(habit, today),
                }
            })
            .collect()
    }

    pub fn due_today(&self) -> Vec<HabitView<'_>> {
        self.today_view().into_iter().filter(|v| v.due_today).collect()
    }

    /// Due today and not yet done.
    pub fn pending(&self) -> Vec<HabitView<'_>> {
        self.due_today()
            .into_iter()
            .filter(|v| v.today_status == TodayStatus::Pending)
            .collect()
    }

    /// Due today and done.
    pub fn completed(&self) -> Vec<HabitView<'_>> {
        self.due_today()
            .into_iter()
            .filter(|v| v.today_status == TodayStatus::Completed)
            .collect()
    }

    /// Reload from the cache and recompute everything for today.
    pub fn refresh(&mut self) -> Result<RecomputeReport> {
        self.habits = self.cache.load(self.clock.now().with_timezone(&Utc))?;
        let report = self.recompute_all();
        self.persist();
        self.last_known_day = self.clock.today();
        Ok(report)
    }

    /// Recompute streaks if the local day changed since the last check.
    pub fn check_day_rollover(&mut self) -> Option<RecomputeReport> {
        let today = self.clock.today();
        if today == self.last_known_day {
            return None;
        }
        info!(from = %self.last_known_day, to = %today, "day changed, recomputing streaks");
        let report = self.recompute_all();
        self.persist();
        self.last_known_day = today;
        Some(report)
    }

    /// Add records from an export. Records whose id already exists are skipped.
    pub fn import(&mut self, records: Vec<HabitRecord>) -> ImportReport {
        let now = self.clock.now().with_timezone(&Utc);
        let mut report = ImportReport::default();
        for record in records {
            let habit = record.normalize(now);
            if self.get(&habit.id).is_some() {
                debug!(habit_id = %habit.id, "import skipped, id exists");
                report.skipped += 1;
                continue;
            }
            self.audit("import", &habit.id, serde_json::json!({ "name": habit.name }));
            self.habits.push(habit);
            report.imported += 1;
        }
        if report.imported > 0 {
            self.recompute_all();
            self.persist();
        }
        info!(imported = report.imported, skipped = report.skipped, "import finished");
        report
    }

    /// Remove every habit. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.habits.len();
        self.habits.clear();
        self.persist();
        self.audit("reset", "*", serde_json::json!({ "removed": removed }));
        warn!(removed, "all habits removed");
        removed
    }

    /// Replace local state with the remote's, keeping local-only habits and
    /// local edits newer than the remote copy.
    pub async fn pull_remote(&mut self) -> Result<PullReport> {
        let session = self.reconciler.require_session()?;
        let remote = self
            .reconciler
            .remote()
            .ok_or_else(|| HabitError::Sync("no remote configured".into()))?;

        let records = remote
            .fetch_all(&session)
            .await
            .map_err(|e| HabitError::Sync(format!("{e:#}")))?;

        let now = self.clock.now().with_timezone(&Utc);
        let mut report = PullReport {
            fetched: records.len(),
            ..PullReport::default()
        };
        let mut index: HashMap<String, usize> = self
            .habits
            .iter()
            .enumerate()
            .map(|(i, h)| (h.id.clone(), i))
            .collect();

        for record in records {
            // A fresh id would add a new copy on every pull.
            if !record.id.as_deref().is_some_and(|id| !id.trim().is_empty()) {
                warn!(name = ?record.name, "skipping remote habit without an id");
                report.skipped += 1;
                continue;
            }
            let incoming = record.normalize(now);
            match index.get(&incoming.id) {
                Some(&i) if incoming.last_updated > self.habits[i].last_updated => {
                    self.habits[i] = incoming;
                    report.updated += 1;
                }
                Some(_) => report.kept_local += 1,
                None => {
                    index.insert(incoming.id.clone(), self.habits.len());
                    self.habits.push(incoming);
                    report.added += 1;
                }
            }
        }

        self.recompute_all();
        self.persist();
        if let Err(e) = self.cache.note_pull(now) {
            warn!(error = %format!("{e:#}"), "failed to record pull time");
        }
        self.audit("pull", "*", serde_json::to_value(&report).unwrap_or_default());
        info!(
            fetched = report.fetched,
            added = report.added,
            updated = report.updated,
            kept_local = report.kept_local,
            skipped = report.skipped,
            "pulled habits from remote"
        );
        Ok(report)
    }

    fn recompute_all(&mut self) -> RecomputeReport {
        let today = self.clock.today();
        let mut report = RecomputeReport::default();
        for habit in &mut self.habits {
            match streak::summarize(habit, today) {
                Ok(summary) => {
                    habit.streak = summary.current;
                    habit.best_streak = summary.best;
                    report.recomputed += 1;
                }
                Err(e) => {
                    warn!(habit_id = %habit.id, error = %e, "skipping streak recompute");
                    report.failed.push(RecomputeFailure {
                        habit_id: habit.id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        report
    }

    fn persist(&mut self) {
        if let Err(e) = self.cache.save(&self.habits) {
            error!(error = %format!("{e:#}"), "failed to write local cache");
        }
    }

    fn audit(&mut self, operation: &str, habit_id: &str, details: serde_json::Value) {
        if let Err(e) = self.cache.record(operation, habit_id, Some(&details)) {
            warn!(operation, habit_id, error = %format!("{e:#}"), "failed to write audit log");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::cache::SqliteCache;
    use crate::habit::calendar::{local_noon, FixedClock};
    use crate::habit::types::Frequency;

    fn tracker_on(date: NaiveDate) -> (HabitTracker, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::on(date));
        let (tracker, _) = HabitTracker::open(
            Box::new(SqliteCache::in_memory().unwrap()),
            Reconciler::local_only(),
            clock.clone(),
        )
        .unwrap();
        (tracker, clock)
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    #[test]
    fn create_trims_and_rejects_blank_names() {
        let (mut tracker, _) = tracker_on(monday());
        let habit = tracker.create(NewHabit::daily("  Read  ")).unwrap();
        assert_eq!(habit.name, "Read");
        assert_eq!(habit.streak, 0);
        assert!(habit.completions.is_empty());

        let err = tracker.create(NewHabit::daily("   ")).unwrap_err();
        assert!(matches!(err, HabitError::Validation(_)));
        assert_eq!(tracker.habits().len(), 1);
    }

    #[test]
    fn create_rejects_unknown_weekdays() {
        let (mut tracker, _) = tracker_on(monday());
        let err = tracker
            .create(NewHabit::custom("Gym", ["monday", "caturday"]))
            .unwrap_err();
        assert!(matches!(err, HabitError::Validation(_)));
        assert!(tracker.habits().is_empty());
    }

    #[test]
    fn toggle_unknown_id_is_not_found() {
        let (mut tracker, _) = tracker_on(monday());
        assert_eq!(
            tracker.toggle_completion("missing", None),
            Err(HabitError::NotFound("missing".into()))
        );
        assert!(matches!(tracker.delete("missing"), Err(HabitError::NotFound(_))));
    }

    #[test]
    fn toggle_updates_streaks_and_timestamp() {
        let (mut tracker, clock) = tracker_on(monday());
        let id = tracker.create(NewHabit::daily("Read")).unwrap().id;

        clock.advance_days(1);
        let outcome = tracker.toggle_completion(&id, None).unwrap();
        assert_eq!(outcome.action, ToggleAction::Completed);
        assert_eq!(outcome.habit.streak, 1);
        assert_eq!(outcome.habit.best_streak, 1);
        assert_eq!(outcome.habit.last_updated, clock.now().with_timezone(&Utc));
        assert_eq!(tracker.get(&id).unwrap(), &outcome.habit);
    }

    #[test]
    fn corrupt_log_leaves_habit_untouched() {
        let (mut tracker, _) = tracker_on(monday());
        let id = tracker.create(NewHabit::daily("Read")).unwrap().id;
        tracker.habits[0].completions.push("bogus".into());
        let before = tracker.get(&id).unwrap().clone();

        let err = tracker.toggle_completion(&id, None).unwrap_err();
        assert_eq!(err, HabitError::InvalidDate("bogus".into()));
        assert_eq!(tracker.get(&id).unwrap(), &before);
    }

    #[test]
    fn views_split_by_due_and_status() {
        let (mut tracker, _) = tracker_on(monday());
        let done = tracker.create(NewHabit::daily("Read")).unwrap().id;
        tracker.create(NewHabit::daily("Run")).unwrap();
        tracker
            .create(NewHabit::custom("Gym", ["tuesday"]))
            .unwrap();
        tracker.toggle_completion(&done, None).unwrap();

        assert_eq!(tracker.today_view().len(), 3);
        assert_eq!(tracker.due_today().len(), 2);
        let completed = tracker.completed();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].habit.id, done);
        assert_eq!(tracker.pending().len(), 1);

        let gym = tracker
            .today_view()
            .into_iter()
            .find(|v| v.habit.name == "Gym")
            .unwrap();
        assert!(!gym.due_today);
        assert_eq!(gym.days_until_next, 1);
    }

    #[test]
    fn rollover_recomputes_once_per_day_change() {
        let (mut tracker, clock) = tracker_on(monday());
        let id = tracker.create(NewHabit::daily("Read")).unwrap().id;
        tracker.toggle_completion(&id, None).unwrap();
        assert!(tracker.check_day_rollover().is_none());

        // Tuesday: streak survives via yesterday
        clock.advance_days(1);
        assert!(tracker.check_day_rollover().is_some());
        assert_eq!(tracker.get(&id).unwrap().streak, 1);
        assert!(tracker.check_day_rollover().is_none());

        // Thursday: Wednesday was missed
        clock.advance_days(2);
        tracker.check_day_rollover().unwrap();
        assert_eq!(tracker.get(&id).unwrap().streak, 0);
        assert_eq!(tracker.get(&id).unwrap().best_streak, 1);
    }

    #[test]
    fn toggle_on_explicit_past_day() {
        let (mut tracker, _) = tracker_on(monday());
        let id = tracker.create(NewHabit::daily("Read")).unwrap().id;
        let sunday = local_noon(monday().pred_opt().unwrap()).unwrap();

        tracker.toggle_completion(&id, Some(sunday)).unwrap();
        let habit = tracker.get(&id).unwrap();
        assert_eq!(habit.streak, 1);

        let outcome = tracker.toggle_completion(&id, None).unwrap();
        assert_eq!(outcome.habit.streak, 2);
        assert_eq!(outcome.habit.target_frequency, Frequency::Daily);
    }

    #[test]
    fn future_days_cannot_be_completed() {
        let (mut tracker, _) = tracker_on(monday());
        let id = tracker.create(NewHabit::daily("Read")).unwrap().id;
        let before = tracker.get(&id).unwrap().clone();
        let wednesday = local_noon(monday() + chrono::Days::new(2)).unwrap();

        let err = tracker.toggle_completion(&id, Some(wednesday)).unwrap_err();
        assert!(matches!(err, HabitError::Validation(_)));
        assert_eq!(tracker.get(&id).unwrap(), &before);
    }

    #[test]
    fn import_skips_existing_ids() {
        let (mut tracker, _) = tracker_on(monday());
        let existing = tracker.create(NewHabit::daily("Read")).unwrap();
        let records = vec![
            HabitRecord::from(&existing),
            HabitRecord {
                name: Some("Meditate".into()),
                completions: Some(vec!["2025-03-10".into()]),
                ..HabitRecord::default()
            },
        ];

        let report = tracker.import(records);
        assert_eq!(report, ImportReport { imported: 1, skipped: 1 });
        let meditate = tracker.habits().iter().find(|h| h.name == "Meditate").unwrap();
        assert_eq!(meditate.streak, 1);
    }

    #[test]
    fn clear_removes_everything() {
        let (mut tracker, _) = tracker_on(monday());
        tracker.create(NewHabit::daily("Read")).unwrap();
        tracker.create(NewHabit::daily("Run")).unwrap();
        assert_eq!(tracker.clear(), 2);
        assert!(tracker.habits().is_empty());
    }
}
