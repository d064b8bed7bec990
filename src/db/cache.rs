//! The local cache: a durable copy of the whole habit collection.
//!
//! The cache is written after every mutation and read once at start-up, so
//! the app works offline and survives restarts.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::{debug, warn};

use crate::habit::types::{Habit, HabitRecord};

pub const META_SAVED_AT: &str = "saved_at";
pub const META_PULLED_AT: &str = "pulled_at";

/// Persistent storage for the habit collection.
pub trait LocalCache: Send {
    /// Every readable habit, in saved order. Unreadable records are skipped.
    /// `now` fills in missing timestamps.
    fn load(&self, now: DateTime<Utc>) -> Result<Vec<Habit>>;

    /// Replace the stored collection with `habits`.
    fn save(&mut self, habits: &[Habit]) -> Result<()>;

    /// Append an audit entry. Caches without an audit log ignore it.
    fn record(
        &mut self,
        operation: &str,
        habit_id: &str,
        details: Option<&serde_json::Value>,
    ) -> Result<()> {
        let _ = (operation, habit_id, details);
        Ok(())
    }

    /// Remember when the collection was last reloaded from the remote.
    fn note_pull(&mut self, at: DateTime<Utc>) -> Result<()> {
        let _ = at;
        Ok(())
    }
}

/// SQLite-backed [`LocalCache`].
pub struct SqliteCache {
    conn: Connection,
}

impl SqliteCache {
    /// Wrap an already initialized connection (see [`crate::db::open_database`]).
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(super::open_database(path)?))
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(super::open_memory_database()?))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl LocalCache for SqliteCache {
    fn load(&self, now: DateTime<Utc>) -> Result<Vec<Habit>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, record FROM habits ORDER BY position")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to read habit rows")?;

        let mut habits = Vec::with_capacity(rows.len());
        for (id, raw) in rows {
            match serde_json::from_str::<HabitRecord>(&raw) {
                Ok(mut record) => {
                    record.id.get_or_insert(id);
                    habits.push(record.normalize(now));
                }
                Err(e) => warn!(habit_id = %id, error = %e, "skipping unreadable cached habit"),
            }
        }
        debug!(count = habits.len(), "loaded habits from cache");
        Ok(habits)
    }

    fn save(&mut self, habits: &[Habit]) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM habits", [])?;
        {
            let mut insert = tx.prepare(
                "INSERT OR REPLACE INTO habits (id, position, record, updated_at) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (position, habit) in habits.iter().enumerate() {
                let record = serde_json::to_string(habit)
                    .with_context(|| format!("failed to serialize habit {}", habit.id))?;
                insert.execute(params![
                    habit.id,
                    position as i64,
                    record,
                    habit.last_updated.to_rfc3339()
                ])?;
            }
        }
        write_meta(&tx, META_SAVED_AT, &Utc::now().to_rfc3339())?;
        tx.commit().context("failed to commit habit cache")?;
        debug!(count = habits.len(), "saved habits to cache");
        Ok(())
    }

    fn record(
        &mut self,
        operation: &str,
        habit_id: &str,
        details: Option<&serde_json::Value>,
    ) -> Result<()> {
        write_audit_log(&self.conn, operation, habit_id, details)
    }

    fn note_pull(&mut self, at: DateTime<Utc>) -> Result<()> {
        write_meta(&self.conn, META_PULLED_AT, &at.to_rfc3339())
    }
}

/// Write an entry to the habit_log audit table.
pub(crate) fn write_audit_log(
    conn: &Connection,
    operation: &str,
    habit_id: &str,
    details: Option<&serde_json::Value>,
) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    let details_json = details.map(|d| d.to_string());
    conn.execute(
        "INSERT INTO habit_log (operation, habit_id, details, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![operation, habit_id, details_json, now],
    )?;
    Ok(())
}

fn write_meta(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO cache_meta (key, value) VALUES (?1, ?2)",
        params![key, value],
    )?;
    Ok(())
}

pub fn read_meta(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM cache_meta WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::types::Frequency;
    use chrono::TimeZone;

    fn habit(id: &str, name: &str) -> Habit {
        HabitRecord {
            id: Some(id.into()),
            name: Some(name.into()),
            ..HabitRecord::default()
        }
        .normalize(Utc::now())
    }

    #[test]
    fn save_then_load_preserves_order_and_fields() {
        let mut cache = SqliteCache::in_memory().unwrap();
        let mut second = habit("b", "Stretch");
        second.target_frequency = Frequency::Custom;
        second.custom_days = vec!["monday".into()];
        second.completions = vec!["2025-03-10T12:00:00+00:00".into()];
        cache.save(&[habit("a", "Read"), second.clone()]).unwrap();

        let loaded = cache.load(Utc::now()).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, "a");
        assert_eq!(loaded[1], second);
    }

    #[test]
    fn save_replaces_previous_collection() {
        let mut cache = SqliteCache::in_memory().unwrap();
        cache.save(&[habit("a", "Read"), habit("b", "Run")]).unwrap();
        cache.save(&[habit("b", "Run")]).unwrap();

        let ids: Vec<String> = cache.load(Utc::now()).unwrap().into_iter().map(|h| h.id).collect();
        assert_eq!(ids, vec!["b".to_string()]);
        assert!(read_meta(cache.connection(), META_SAVED_AT).unwrap().is_some());
    }

    #[test]
    fn unreadable_rows_are_skipped() {
        let mut cache = SqliteCache::in_memory().unwrap();
        cache.save(&[habit("a", "Read")]).unwrap();
        cache
            .connection()
            .execute(
                "INSERT INTO habits (id, position, record, updated_at) VALUES ('x', 9, 'not json', '')",
                [],
            )
            .unwrap();

        let loaded = cache.load(Utc::now()).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "a");
    }

    #[test]
    fn sparse_records_are_normalized_on_load() {
        let cache = SqliteCache::in_memory().unwrap();
        cache
            .connection()
            .execute(
                "INSERT INTO habits (id, position, record, updated_at) VALUES ('sparse', 0, '{}', '')",
                [],
            )
            .unwrap();

        let stamp = Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap();
        let loaded = cache.load(stamp).unwrap();
        assert_eq!(loaded[0].id, "sparse");
        assert_eq!(loaded[0].created_at, stamp);
        assert_eq!(loaded[0].last_updated, stamp);
        assert_eq!(loaded[0].name, "Unnamed Habit");
        assert_eq!(loaded[0].target_frequency, Frequency::Daily);
        assert!(loaded[0].completions.is_empty());
    }

    #[test]
    fn audit_entries_are_written() {
        let mut cache = SqliteCache::in_memory().unwrap();
        cache
            .record("toggle", "a", Some(&serde_json::json!({"action": "completed"})))
            .unwrap();
        assert_eq!(crate::db::count_log_entries(cache.connection(), "a").unwrap(), 1);
    }
}
