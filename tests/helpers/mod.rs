#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use cadence::db::cache::SqliteCache;
use cadence::habit::calendar::{local_noon, FixedClock};
use cadence::habit::{Habit, HabitRecord, HabitTracker};
use cadence::sync::remote::RemoteHabits;
use cadence::sync::session::{Session, StaticSession};
use cadence::sync::Reconciler;
use chrono::{DateTime, Local, NaiveDate};
use std::sync::{Arc, Mutex};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn noon(day: NaiveDate) -> DateTime<Local> {
    local_noon(day).unwrap()
}

/// In-process stand-in for the remote. Records every call.
#[derive(Default)]
pub struct FakeRemote {
    pub calls: Mutex<Vec<String>>,
    pub stored: Mutex<Vec<HabitRecord>>,
    pub failing: Mutex<bool>,
}

impl FakeRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let remote = Self::default();
        *remote.failing.lock().unwrap() = true;
        Arc::new(remote)
    }

    pub fn with_habits(records: Vec<HabitRecord>) -> Arc<Self> {
        let remote = Self::default();
        *remote.stored.lock().unwrap() = records;
        Arc::new(remote)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn hit(&self, call: String) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        if *self.failing.lock().unwrap() {
            bail!("connection refused");
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteHabits for FakeRemote {
    async fn create_remote(&self, _session: &Session, habit: &Habit) -> Result<()> {
        self.hit(format!("create {}", habit.id))
    }

    async fn toggle_remote(&self, _session: &Session, habit_id: &str, date: &str) -> Result<()> {
        self.hit(format!("toggle {habit_id} {date}"))
    }

    async fn delete_remote(&self, _session: &Session, habit_id: &str) -> Result<()> {
        self.hit(format!("delete {habit_id}"))
    }

    async fn fetch_all(&self, _session: &Session) -> Result<Vec<HabitRecord>> {
        self.hit("fetch".to_string())?;
        Ok(self.stored.lock().unwrap().clone())
    }
}

pub fn signed_in(remote: Arc<FakeRemote>) -> Reconciler {
    Reconciler::new(
        Some(remote as Arc<dyn RemoteHabits>),
        Arc::new(StaticSession::new("user-1", "token-1")),
    )
}

pub fn signed_out(remote: Arc<FakeRemote>) -> Reconciler {
    Reconciler::new(
        Some(remote as Arc<dyn RemoteHabits>),
        Arc::new(StaticSession::signed_out()),
    )
}

/// A tracker over a fresh in-memory cache with the clock pinned to `today`.
pub fn tracker(today: NaiveDate, reconciler: Reconciler) -> (HabitTracker, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::on(today));
    let (tracker, _) = HabitTracker::open(
        Box::new(SqliteCache::in_memory().unwrap()),
        reconciler,
        clock.clone(),
    )
    .unwrap();
    (tracker, clock)
}
