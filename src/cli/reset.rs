//! CLI `reset` command: delete all habits after user confirmation.

use anyhow::{bail, Result};
use std::io::Write;

use cadence::config::CadenceConfig;

/// Delete all habits from the local cache after user confirmation.
///
/// The remote is not touched; a later `pull` brings remote habits back.
pub fn reset(config: &CadenceConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    println!("WARNING: This will permanently delete ALL locally cached habits.");
    println!("Cache: {}", db_path.display());
    print!("\nType YES to confirm: ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    if input.trim() != "YES" {
        bail!("reset cancelled");
    }

    let mut tracker = super::open_tracker(config)?;
    let removed = tracker.clear();

    println!("{removed} habits deleted. Cache reset complete.");
    Ok(())
}
