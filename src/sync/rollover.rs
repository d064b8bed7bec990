//! Day-rollover watcher.
//!
//! Streaks depend on "today", so they go stale at midnight without any user
//! action. The watcher re-checks the local day on a fixed interval and on
//! every focus event, and recomputes when it has changed.

use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::habit::HabitTracker;

/// Run until `shutdown` resolves. Returns how many day changes were handled.
///
/// `focus` delivers one message per regained-focus event; when it closes the
/// watcher keeps polling on the interval alone.
pub async fn watch_day_rollover(
    tracker: &mut HabitTracker,
    poll: Duration,
    focus: mpsc::Receiver<()>,
    shutdown: impl Future<Output = ()>,
) -> usize {
    let mut ticker = tokio::time::interval(poll);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut focus = Some(focus);
    let mut rollovers = 0;
    tokio::pin!(shutdown);

    info!(poll_secs = poll.as_secs(), day = %tracker.last_known_day(), "watching for day rollover");
    loop {
        tokio::select! {
            biased;

            _ = ticker.tick() => {
                if tracker.check_day_rollover().is_some() {
                    rollovers += 1;
                }
            }
            event = next_focus(&mut focus) => match event {
                Some(()) => {
                    debug!("focus regained");
                    if tracker.check_day_rollover().is_some() {
                        rollovers += 1;
                    }
                }
                None => {
                    debug!("focus source closed");
                    focus = None;
                }
            },
            _ = &mut shutdown => break,
        }
    }

    info!(rollovers, "rollover watcher stopped");
    rollovers
}

async fn next_focus(focus: &mut Option<mpsc::Receiver<()>>) -> Option<()> {
    match focus {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
