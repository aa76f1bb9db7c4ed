//! Versioned schema for the cache and rate-window tables.
//!
//! Applied versions are recorded in `_migrations`. Each pending step runs
//! in its own transaction together with its bookkeeping row, so a failed
//! step leaves the schema at the previous version.

use chrono::Utc;
use tokio_rusqlite::{Connection, params, rusqlite};

use super::{Error, timestamp};

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

/// Ordered by version; new steps are appended, never edited.
const MIGRATIONS: &[Migration] = &[
    Migration { version: 1, name: "cache_entries", sql: include_str!("../../migrations/001_cache_entries.sql") },
    Migration { version: 2, name: "rate_windows", sql: include_str!("../../migrations/002_rate_windows.sql") },
    Migration { version: 3, name: "cache_meta", sql: include_str!("../../migrations/003_cache_meta.sql") },
];

/// Bring the schema up to the latest version.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL
            )",
        )?;

        let current: u32 = conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;

        for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
            apply(conn, migration).map_err(|e| {
                Error::MigrationFailed(format!("{} ({}): {e}", migration.version, migration.name))
            })?;
            tracing::info!(version = migration.version, name = migration.name, "cache schema migrated");
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}

fn apply(conn: &mut rusqlite::Connection, migration: &Migration) -> Result<(), rusqlite::Error> {
    let tx = conn.transaction()?;
    tx.execute_batch(migration.sql)?;
    tx.execute(
        "INSERT INTO _migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
        params![migration.version, migration.name, timestamp(Utc::now())],
    )?;
    tx.commit()
}
