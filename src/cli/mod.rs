pub mod doctor;
pub mod export;
pub mod habits;
pub mod import;
pub mod reset;
pub mod stats;
pub mod sync;

use anyhow::{Context, Result};
use std::sync::Arc;

use cadence::config::CadenceConfig;
use cadence::db::cache::SqliteCache;
use cadence::habit::calendar::SystemClock;
use cadence::habit::HabitTracker;
use cadence::sync::session::StaticSession;
use cadence::sync::{remote, Reconciler};

/// Open the tracker against the configured cache, remote, and session.
pub fn open_tracker(config: &CadenceConfig) -> Result<HabitTracker> {
    let db_path = config.resolved_db_path();
    let cache = SqliteCache::open(&db_path)
        .with_context(|| format!("failed to open habit cache at {}", db_path.display()))?;
    let remote = remote::create_client(&config.remote)?;
    let session = Arc::new(StaticSession::from_config(&config.session));
    let reconciler = Reconciler::new(remote, session);

    let (tracker, report) =
        HabitTracker::open(Box::new(cache), reconciler, Arc::new(SystemClock))?;
    for failure in &report.failed {
        eprintln!(
            "warning: habit {} has an unreadable completion log ({})",
            failure.habit_id, failure.error
        );
    }
    Ok(tracker)
}

/// Wait for background pushes, then report failures on stderr.
pub async fn finish(tracker: &mut HabitTracker) {
    tracker.drain_sync().await;
    let stats = tracker.sync_stats();
    if stats.failed > 0 {
        eprintln!(
            "warning: {} change(s) could not be pushed to the remote and were kept locally",
            stats.failed
        );
    }
}
