//! The shared SQLite handle.
//!
//! One database file holds the persistent cache layer and the rate-limit
//! windows. Every process serving grids opens the same file, so it runs in
//! WAL mode with a busy timeout.

use std::path::Path;

use tokio_rusqlite::Connection;

use super::migrations;
use crate::Error;

/// Applied to every connection before migrations run.
const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
PRAGMA synchronous=NORMAL;
PRAGMA temp_store=MEMORY;
PRAGMA busy_timeout=5000;";

/// Handle to the cache and rate-window tables.
///
/// Queries run on tokio-rusqlite's background thread. Clones share one
/// connection.
#[derive(Clone, Debug)]
pub struct CacheDb {
    pub(crate) conn: Connection,
}

impl CacheDb {
    /// Open (or create) the database file and migrate it.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        let db = Self::prepare(conn).await?;
        tracing::debug!(path = %path.display(), "cache database ready");
        Ok(db)
    }

    /// Private database, gone when the last clone drops.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory().await.map_err(|e| Error::Database(e.into()))?;
        Self::prepare(conn).await
    }

    async fn prepare(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| conn.execute_batch(PRAGMAS)).await.map_err(Error::Database)?;
        migrations::run(&conn).await?;
        Ok(Self { conn })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.sqlite");

        let db = CacheDb::open(&path).await.unwrap();
        db.put_entry("postgrid_persisted", "value", 60).await.unwrap();
        drop(db);

        let reopened = CacheDb::open(&path).await.unwrap();
        assert_eq!(reopened.get_entry("postgrid_persisted").await.unwrap().as_deref(), Some("value"));
    }

    #[tokio::test]
    async fn test_file_database_uses_wal() {
        let dir = tempfile::tempdir().unwrap();
        let db = CacheDb::open(dir.path().join("cache.sqlite")).await.unwrap();

        let mode: String = db
            .conn
            .call(|conn| conn.query_row("PRAGMA journal_mode", [], |row| row.get(0)))
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let other = db.clone();

        db.put_entry("postgrid_shared", "v", 60).await.unwrap();
        assert_eq!(other.get_entry("postgrid_shared").await.unwrap().as_deref(), Some("v"));
    }
}
