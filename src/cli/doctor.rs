//! CLI `doctor` command: run cache diagnostics and print a health report.

use anyhow::{Context, Result};

use cadence::config::CadenceConfig;
use cadence::db;

/// Run cache diagnostics and print a health report.
pub fn doctor(config: &CadenceConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    if !db_path.exists() {
        println!("Cache: not found at {}", db_path.display());
        println!("Run `cadence add <name>` to create it.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    let conn = db::open_database(&db_path).context("failed to open cache (may be corrupt)")?;

    let report = db::check_database_health(&conn).context("failed to run health check")?;

    println!("Cadence Health Report");
    println!("=====================");
    println!();
    println!("Cache:             {}", db_path.display());
    println!("File size:         {}", format_bytes(file_size));
    println!("Schema version:    {}", report.schema_version);
    println!("Last saved:        {}", report.last_saved_at.as_deref().unwrap_or("(never)"));
    println!("Last pulled:       {}", report.last_pulled_at.as_deref().unwrap_or("(never)"));
    println!();
    println!("Remote:            {}", config.remote.base_url().unwrap_or("(local only)"));
    println!(
        "Session:           {}",
        if config.session.token.is_some() { "configured" } else { "signed out" }
    );
    println!();
    println!("Row counts:");
    println!("  Habits:          {}", report.habit_count);
    println!("  Unreadable:      {}", report.unreadable_records);
    println!("  Audit log:       {}", report.log_count);
    println!();
    if report.integrity_ok {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED ({})", report.integrity_details);
        println!();
        println!("Recovery steps:");
        println!("  1. Restore from a backup: cp backup.db ~/.cadence/habits.db");
        println!("  2. Or export from a good copy and reimport:");
        println!("     cadence export > backup.json");
        println!("     cadence reset && cadence import backup.json");
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
