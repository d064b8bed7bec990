use anyhow::{Context, Result};
use std::path::Path;

use super::export::ImportData;
use cadence::config::CadenceConfig;

/// Import habits from a JSON file.
///
/// Records are normalised on the way in. Skips habits whose id already exists.
pub async fn import(config: &CadenceConfig, file: &Path) -> Result<()> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read import file: {}", file.display()))?;

    let data: ImportData = serde_json::from_str(&json).context("failed to parse import JSON")?;
    let records = data.into_records();

    println!("Importing {} habits...", records.len());

    let mut tracker = super::open_tracker(config)?;
    let report = tracker.import(records);

    println!(
        "Import complete: {} imported, {} skipped (already exist).",
        report.imported, report.skipped
    );
    super::finish(&mut tracker).await;
    Ok(())
}
