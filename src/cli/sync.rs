//! CLI `pull` and `watch` commands.

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use cadence::config::CadenceConfig;
use cadence::sync::rollover::watch_day_rollover;

/// Reload from the remote, merging into the local cache.
pub async fn pull(config: &CadenceConfig) -> Result<()> {
    let mut tracker = super::open_tracker(config)?;
    let report = tracker.pull_remote().await?;
    println!(
        "Pulled {} habits: {} added, {} updated, {} local copies kept.",
        report.fetched, report.added, report.updated, report.kept_local
    );
    if report.skipped > 0 {
        println!("Skipped {} remote habits without an id.", report.skipped);
    }
    Ok(())
}

/// Keep streaks current across midnight until Ctrl-C.
///
/// Each line read from stdin counts as a focus event.
pub async fn watch(config: &CadenceConfig) -> Result<()> {
    let mut tracker = super::open_tracker(config)?;

    let (focus_tx, focus_rx) = mpsc::channel(8);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(_)) = lines.next_line().await {
            if focus_tx.send(()).await.is_err() {
                break;
            }
        }
    });

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
        }
    };

    eprintln!("Watching for day changes (Ctrl-C to stop)...");
    let rollovers =
        watch_day_rollover(&mut tracker, config.rollover.poll_interval(), focus_rx, shutdown).await;
    eprintln!("Stopped after {rollovers} day change(s).");

    super::finish(&mut tracker).await;
    Ok(())
}
