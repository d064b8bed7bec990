pub mod cache;
pub mod migrations;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;
use std::path::Path;

/// Open (or create) the habit cache database at the given path with schema
/// initialized and migrations applied.
pub fn open_database(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let conn = Connection::open(path)
        .with_context(|| format!("failed to open database at {}", path.display()))?;

    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.busy_timeout(std::time::Duration::from_millis(5000))?;

    schema::init_schema(&conn).context("failed to initialize schema")?;
    migrations::run_migrations(&conn).context("failed to run migrations")?;

    tracing::info!(path = %path.display(), "database initialized");
    Ok(conn)
}

/// Open a fully migrated in-memory database.
pub fn open_memory_database() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    schema::init_schema(&conn).context("failed to initialize schema")?;
    migrations::run_migrations(&conn).context("failed to run migrations")?;
    Ok(conn)
}

/// Result of [`check_database_health`].
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub integrity_ok: bool,
    pub integrity_details: String,
    pub schema_version: u32,
    pub habit_count: i64,
    pub log_count: i64,
    /// Records that no longer parse as JSON habit records.
    pub unreadable_records: i64,
    pub last_saved_at: Option<String>,
    pub last_pulled_at: Option<String>,
}

/// Run integrity and consistency checks against an open cache.
pub fn check_database_health(conn: &Connection) -> Result<HealthReport> {
    let integrity: Vec<String> = conn
        .prepare("PRAGMA integrity_check")?
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<_>>()?;
    let integrity_ok = integrity.len() == 1 && integrity[0] == "ok";

    let schema_version = migrations::get_schema_version(conn)?;
    let habit_count: i64 = conn.query_row("SELECT COUNT(*) FROM habits", [], |r| r.get(0))?;
    let log_count: i64 = conn.query_row("SELECT COUNT(*) FROM habit_log", [], |r| r.get(0))?;

    let records: Vec<String> = conn
        .prepare("SELECT record FROM habits")?
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<_>>()?;
    let unreadable_records = records
        .iter()
        .filter(|r| serde_json::from_str::<serde_json::Value>(r).map_or(true, |v| !v.is_object()))
        .count() as i64;

    Ok(HealthReport {
        integrity_ok,
        integrity_details: integrity.join("; "),
        schema_version,
        habit_count,
        log_count,
        unreadable_records,
        last_saved_at: cache::read_meta(conn, cache::META_SAVED_AT)?,
        last_pulled_at: cache::read_meta(conn, cache::META_PULLED_AT)?,
    })
}

/// Number of rows in `habit_log` for one habit.
pub fn count_log_entries(conn: &Connection, habit_id: &str) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM habit_log WHERE habit_id = ?1",
        [habit_id],
        |r| r.get(0),
    )?;
    Ok(count)
}
