//! Persistent cache entry operations.
//!
//! Backs the slow layer of [`super::CacheStore`] with the `cache_entries`
//! table. Rows carry an absolute `expires_at`; expired rows read as missing
//! and stay until overwritten, flushed, or purged.

use super::connection::CacheDb;
use super::{expires_after, timestamp};
use crate::Error;
use chrono::Utc;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::OptionalExtension;

/// `cache_meta` row counting namespace flushes across every process.
const FLUSH_EPOCH: &str = "flush_epoch";

impl CacheDb {
    /// Number of namespace flushes applied to this database.
    ///
    /// Memory-layer entries written under an older epoch are stale.
    pub async fn flush_epoch(&self) -> Result<u64, Error> {
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let epoch: Option<i64> = conn
                    .query_row("SELECT value FROM cache_meta WHERE name = ?1", params![FLUSH_EPOCH], |row| row.get(0))
                    .optional()?;
                Ok(epoch.map_or(0, |value| value.max(0) as u64))
            })
            .await
            .map_err(Error::from)
    }

    /// Get an unexpired cache entry by key.
    ///
    /// Returns None if the key doesn't exist or has expired.
    pub async fn get_entry(&self, key: &str) -> Result<Option<String>, Error> {
        let key = key.to_string();
        let now = timestamp(Utc::now());
        self.conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let mut stmt = conn.prepare("SELECT value FROM cache_entries WHERE key = ?1 AND expires_at > ?2")?;

                let result = stmt.query_row(params![key, now], |row| row.get(0));

                match result {
                    Ok(value) => Ok(Some(value)),
                    Err(tokio_rusqlite::rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or replace a cache entry.
    ///
    /// Uses UPSERT semantics: the whole value and its expiry are replaced.
    pub async fn put_entry(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), Error> {
        let key = key.to_string();
        let value = value.to_string();

        let now = Utc::now();
        let created_at = timestamp(now);
        let expires_at = timestamp(expires_after(now, ttl_seconds));

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO cache_entries (key, value, created_at, expires_at)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(key) DO UPDATE SET
                        value = excluded.value,
                        created_at = excluded.created_at,
                        expires_at = excluded.expires_at",
                    params![key, value, created_at, expires_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a cache entry.
    ///
    /// Returns true if a row was removed.
    pub async fn delete_entry(&self, key: &str) -> Result<bool, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM cache_entries WHERE key = ?1", params![key])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every entry whose key starts with `prefix`, expired or not,
    /// and advance the flush epoch.
    ///
    /// Keys are enumerated first and removed one at a time inside a single
    /// transaction with the epoch bump. Returns the number of deleted entries.
    pub async fn flush_entries_with_prefix(&self, prefix: &str) -> Result<u64, Error> {
        let prefix = prefix.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let tx = conn.transaction()?;
                let keys: Vec<String> = {
                    // substr instead of LIKE: '_' in the prefix is a LIKE wildcard.
                    let mut stmt = tx.prepare("SELECT key FROM cache_entries WHERE substr(key, 1, ?2) = ?1")?;
                    let rows = stmt.query_map(params![prefix, prefix.chars().count() as i64], |row| row.get(0))?;
                    rows.collect::<Result<_, _>>()?
                };

                let mut deleted = 0u64;
                for key in &keys {
                    deleted += tx.execute("DELETE FROM cache_entries WHERE key = ?1", params![key])? as u64;
                }
                tx.execute("UPDATE cache_meta SET value = value + 1 WHERE name = ?1", params![FLUSH_EPOCH])?;
                tx.commit()?;
                Ok(deleted)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete expired cache entries.
    ///
    /// Returns the number of deleted entries.
    pub async fn purge_expired_entries(&self) -> Result<u64, Error> {
        let now = timestamp(Utc::now());
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM cache_entries WHERE expires_at <= ?1", params![now])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Count stored entries as `(total, expired)`.
    pub async fn count_entries(&self) -> Result<(u64, u64), Error> {
        let now = timestamp(Utc::now());
        self.conn
            .call(move |conn| -> Result<(u64, u64), Error> {
                let (total, expired): (i64, i64) = conn.query_row(
                    "SELECT COUNT(*), COALESCE(SUM(expires_at <= ?1), 0) FROM cache_entries",
                    params![now],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?;
                Ok((total as u64, expired as u64))
            })
            .await
            .map_err(Error::from)
    }
}
