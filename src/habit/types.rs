//! Core habit type definitions.
//!
//! [`Habit`] is the typed, validated record the engine works with.
//! [`HabitRecord`] is the loose on-disk / on-wire shape in which every field is
//! optional; [`HabitRecord::normalize`] turns one into the other and is applied
//! exactly once, when records enter the engine (cache load, import, remote pull).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::calendar;

/// Recurrence rule of a habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    /// Due every day.
    Daily,
    /// Due every day as well: no anchor day exists yet (see DESIGN.md).
    Weekly,
    /// Due on the weekdays listed in `custom_days`.
    Custom,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Custom => "custom",
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "custom" => Ok(Self::Custom),
            other => Err(format!("unknown frequency: {other}")),
        }
    }
}

/// A tracked habit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    /// UUID v7, immutable after creation.
    pub id: String,
    /// Non-empty, trimmed display name.
    pub name: String,
    pub description: Option<String>,
    pub target_frequency: Frequency,
    /// Lower-case full weekday names; only consulted for [`Frequency::Custom`].
    pub custom_days: Vec<String>,
    pub created_at: DateTime<Utc>,
    /// Raw completion timestamps (RFC 3339). Several entries may share a
    /// calendar day; readers collapse them.
    pub completions: Vec<String>,
    /// Current streak as of the last recompute.
    pub streak: u32,
    /// Longest run in the whole log as of the last recompute.
    pub best_streak: u32,
    pub last_updated: DateTime<Utc>,
}

/// Input for creating a habit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHabit {
    pub name: String,
    pub description: Option<String>,
    pub target_frequency: Frequency,
    pub custom_days: Vec<String>,
}

impl NewHabit {
    pub fn daily(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            target_frequency: Frequency::Daily,
            custom_days: Vec::new(),
        }
    }

    pub fn custom<I, S>(name: impl Into<String>, days: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            description: None,
            target_frequency: Frequency::Custom,
            custom_days: days.into_iter().map(Into::into).collect(),
        }
    }
}

/// What a toggle did to the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleAction {
    Completed,
    Uncompleted,
}

impl ToggleAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Uncompleted => "uncompleted",
        }
    }
}

impl std::fmt::Display for ToggleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a habit has been done on the current day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodayStatus {
    Completed,
    Pending,
}

impl TodayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Pending => "pending",
        }
    }
}

impl std::fmt::Display for TodayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted or transmitted habit whose shape has not been checked yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HabitRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub target_frequency: Option<String>,
    pub custom_days: Option<Vec<String>>,
    pub created_at: Option<String>,
    pub completions: Option<Vec<String>>,
    pub streak: Option<u32>,
    pub best_streak: Option<u32>,
    pub last_updated: Option<String>,
}

impl HabitRecord {
    /// Fill in defaults and canonicalise fields. `now` stands in for any
    /// missing or unparseable timestamp.
    ///
    /// Completion entries are kept verbatim: a malformed entry surfaces as
    /// [`crate::error::HabitError::InvalidDate`] when the habit is recomputed,
    /// which isolates the failure to that one habit.
    pub fn normalize(self, now: DateTime<Utc>) -> Habit {
        let id = self
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| uuid::Uuid::now_v7().to_string());

        let name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Unnamed Habit".to_string());

        let target_frequency = match self.target_frequency.as_deref() {
            None => Frequency::Daily,
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                warn!(habit_id = %id, error = %e, "falling back to daily frequency");
                Frequency::Daily
            }),
        };

        let mut custom_days = Vec::new();
        for raw in self.custom_days.unwrap_or_default() {
            match calendar::canonical_day_name(&raw) {
                Some(day) if !custom_days.iter().any(|d| d == day) => {
                    custom_days.push(day.to_string())
                }
                Some(_) => {}
                None => warn!(habit_id = %id, day = %raw, "dropping unknown weekday name"),
            }
        }

        Habit {
            name,
            description: self.description.filter(|d| !d.trim().is_empty()),
            target_frequency,
            custom_days,
            created_at: parse_or(self.created_at.as_deref(), now),
            completions: self.completions.unwrap_or_default(),
            streak: self.streak.unwrap_or(0),
            best_streak: self.best_streak.unwrap_or(0),
            last_updated: parse_or(self.last_updated.as_deref(), now),
            id,
        }
    }
}

impl From<&Habit> for HabitRecord {
    fn from(habit: &Habit) -> Self {
        Self {
            id: Some(habit.id.clone()),
            name: Some(habit.name.clone()),
            description: habit.description.clone(),
            target_frequency: Some(habit.target_frequency.as_str().to_string()),
            custom_days: Some(habit.custom_days.clone()),
            created_at: Some(habit.created_at.to_rfc3339()),
            completions: Some(habit.completions.clone()),
            streak: Some(habit.streak),
            best_streak: Some(habit.best_streak),
            last_updated: Some(habit.last_updated.to_rfc3339()),
        }
    }
}

fn parse_or(raw: Option<&str>, fallback: DateTime<Utc>) -> DateTime<Utc> {
    raw.and_then(|s| calendar::parse_timestamp(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(fallback)
}
