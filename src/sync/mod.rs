//! Best-effort propagation of local mutations to the remote.
//!
//! Local state is authoritative for the running session. Every mutation is
//! applied and cached first; the [`Reconciler`] then pushes it in the
//! background. A failed or skipped push is logged and counted, never surfaced
//! to the caller, and never rolls back local state.

pub mod remote;
pub mod rollover;
pub mod session;

use serde::Serialize;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{HabitError, HabitResult};
use crate::habit::types::Habit;
use remote::RemoteHabits;
use session::{Session, SessionProvider};

/// One mutation to mirror on the remote.
#[derive(Debug, Clone)]
pub enum SyncOp {
    Create(Habit),
    Toggle { habit_id: String, date: String },
    Delete { habit_id: String },
}

impl SyncOp {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Toggle { .. } => "toggle",
            Self::Delete { .. } => "delete",
        }
    }

    pub fn habit_id(&self) -> &str {
        match self {
            Self::Create(habit) => &habit.id,
            Self::Toggle { habit_id, .. } | Self::Delete { habit_id } => habit_id,
        }
    }
}

/// Push outcomes since start-up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    pub pushed: u64,
    pub failed: u64,
    /// Pushes not attempted: signed out or no async runtime.
    pub skipped: u64,
    pub last_error: Option<String>,
}

pub struct Reconciler {
    remote: Option<Arc<dyn RemoteHabits>>,
    session: Arc<dyn SessionProvider>,
    stats: Arc<Mutex<SyncStats>>,
    in_flight: Vec<JoinHandle<()>>,
}

impl Reconciler {
    pub fn new(remote: Option<Arc<dyn RemoteHabits>>, session: Arc<dyn SessionProvider>) -> Self {
        Self {
            remote,
            session,
            stats: Arc::new(Mutex::new(SyncStats::default())),
            in_flight: Vec::new(),
        }
    }

    /// No remote at all; every dispatch is a no-op.
    pub fn local_only() -> Self {
        Self::new(None, Arc::new(session::StaticSession::signed_out()))
    }

    pub fn remote(&self) -> Option<Arc<dyn RemoteHabits>> {
        self.remote.clone()
    }

    pub fn session(&self) -> Option<Session> {
        self.session.current()
    }

    pub fn require_session(&self) -> HabitResult<Session> {
        self.session.current().ok_or(HabitError::Unauthenticated)
    }

    /// Start pushing `op` in the background and return immediately.
    pub fn dispatch(&mut self, op: SyncOp) {
        self.in_flight.retain(|handle| !handle.is_finished());

        let Some(remote) = self.remote.clone() else {
            debug!(op = op.kind(), "local-only mode, not pushing");
            return;
        };
        let Some(session) = self.session.current() else {
            warn!(op = op.kind(), habit_id = %op.habit_id(), "not signed in; change kept locally only");
            self.bump(|s| s.skipped += 1);
            return;
        };
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!(op = op.kind(), "no async runtime; remote push dropped");
                self.bump(|s| s.skipped += 1);
                return;
            }
        };

        let stats = Arc::clone(&self.stats);
        let task = runtime.spawn(async move {
            let result = match &op {
                SyncOp::Create(habit) => remote.create_remote(&session, habit).await,
                SyncOp::Toggle { habit_id, date } => {
                    remote.toggle_remote(&session, habit_id, date).await
                }
                SyncOp::Delete { habit_id } => remote.delete_remote(&session, habit_id).await,
            };
            let mut stats = stats.lock().unwrap_or_else(|p| p.into_inner());
            match result {
                Ok(()) => {
                    debug!(op = op.kind(), habit_id = %op.habit_id(), "pushed to remote");
                    stats.pushed += 1;
                }
                Err(e) => {
                    let err = HabitError::Sync(format!("{e:#}"));
                    warn!(op = op.kind(), habit_id = %op.habit_id(), error = %err, "remote push failed; local state kept");
                    stats.failed += 1;
                    stats.last_error = Some(err.to_string());
                }
            }
        });
        self.in_flight.push(task);
    }

    /// Wait for every in-flight push to settle.
    pub async fn drain(&mut self) {
        for handle in self.in_flight.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, "remote push task aborted");
            }
        }
    }

    pub fn pending(&self) -> usize {
        self.in_flight.iter().filter(|h| !h.is_finished()).count()
    }

    pub fn stats(&self) -> SyncStats {
        self.stats.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    fn bump(&self, f: impl FnOnce(&mut SyncStats)) {
        let mut guard = self.stats.lock().unwrap_or_else(|p| p.into_inner());
        f(&mut *guard);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::types::HabitRecord;
    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use chrono::Utc;
    use super::session::StaticSession;

    struct Recording {
        calls: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl RemoteHabits for Recording {
        async fn create_remote(&self, _: &Session, habit: &Habit) -> Result<()> {
            self.hit(format!("create {}", habit.id))
        }
        async fn toggle_remote(&self, _: &Session, habit_id: &str, _: &str) -> Result<()> {
            self.hit(format!("toggle {habit_id}"))
        }
        async fn delete_remote(&self, _: &Session, habit_id: &str) -> Result<()> {
            self.hit(format!("delete {habit_id}"))
        }
        async fn fetch_all(&self, _: &Session) -> Result<Vec<HabitRecord>> {
            Ok(Vec::new())
        }
    }

    impl Recording {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                fail,
            })
        }

        fn hit(&self, call: String) -> Result<()> {
            self.calls.lock().unwrap().push(call);
            if self.fail {
                bail!("remote unavailable");
            }
            Ok(())
        }
    }

    fn habit(id: &str) -> Habit {
        HabitRecord {
            id: Some(id.into()),
            ..HabitRecord::default()
        }
        .normalize(Utc::now())
    }

    #[tokio::test]
    async fn successful_pushes_are_counted() {
        let remote = Recording::new(false);
        let mut reconciler =
            Reconciler::new(Some(remote.clone() as Arc<dyn RemoteHabits>), Arc::new(StaticSession::new("u", "t")));
        reconciler.dispatch(SyncOp::Create(habit("a")));
        reconciler.dispatch(SyncOp::Delete { habit_id: "a".into() });
        reconciler.drain().await;

        assert_eq!(reconciler.stats().pushed, 2);
        assert_eq!(remote.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn failures_are_recorded_not_raised() {
        let remote = Recording::new(true);
        let mut reconciler =
            Reconciler::new(Some(remote.clone() as Arc<dyn RemoteHabits>), Arc::new(StaticSession::new("u", "t")));
        reconciler.dispatch(SyncOp::Toggle {
            habit_id: "a".into(),
            date: "2025-03-10T12:00:00Z".into(),
        });
        reconciler.drain().await;

        let stats = reconciler.stats();
        assert_eq!(stats.failed, 1);
        assert!(stats.last_error.unwrap().contains("remote unavailable"));
    }

    #[tokio::test]
    async fn signed_out_pushes_are_skipped() {
        let remote = Recording::new(false);
        let mut reconciler =
            Reconciler::new(Some(remote.clone() as Arc<dyn RemoteHabits>), Arc::new(StaticSession::signed_out()));
        reconciler.dispatch(SyncOp::Create(habit("a")));
        reconciler.drain().await;

        assert_eq!(reconciler.stats().skipped, 1);
        assert!(remote.calls.lock().unwrap().is_empty());
        assert_eq!(reconciler.require_session(), Err(HabitError::Unauthenticated));
    }

    #[test]
    fn dispatch_without_runtime_does_not_panic() {
        let remote = Recording::new(false);
        let mut reconciler =
            Reconciler::new(Some(remote.clone() as Arc<dyn RemoteHabits>), Arc::new(StaticSession::new("u", "t")));
        reconciler.dispatch(SyncOp::Create(habit("a")));
        assert_eq!(reconciler.stats().skipped, 1);
    }
}
