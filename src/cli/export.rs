use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use cadence::config::CadenceConfig;
use cadence::habit::{Habit, HabitRecord};

pub const EXPORT_VERSION: &str = "1.0";

/// Export format: the habit collection plus when and by what it was written.
#[derive(Debug, Serialize)]
pub struct ExportData<'a> {
    pub habits: &'a [Habit],
    pub timestamp: String,
    pub version: &'static str,
}

/// Anything `import` accepts: the export envelope, or a bare array of habits.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ImportData {
    Envelope { habits: Vec<HabitRecord> },
    Bare(Vec<HabitRecord>),
}

impl ImportData {
    pub fn into_records(self) -> Vec<HabitRecord> {
        match self {
            Self::Envelope { habits } | Self::Bare(habits) => habits,
        }
    }
}

/// Export every habit as JSON to stdout.
pub fn export(config: &CadenceConfig) -> Result<()> {
    let tracker = super::open_tracker(config)?;
    let data = ExportData {
        habits: tracker.habits(),
        timestamp: Utc::now().to_rfc3339(),
        version: EXPORT_VERSION,
    };

    let json = serde_json::to_string_pretty(&data)?;
    println!("{json}");

    eprintln!("Exported {} habits.", data.habits.len());
    Ok(())
}
