//! Persistent rate-window operations.
//!
//! One row per client in `rate_windows`. A window's `expires_at` is fixed
//! when it opens; increments never move it. Expired rows read as absent and
//! are overwritten by the next `open_rate_window`.

use chrono::{DateTime, Utc};
use tokio_rusqlite::params;

use crate::Error;
use crate::cache::{CacheDb, expires_after, timestamp};

/// A client's current counting window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateWindow {
    pub client_id: String,
    pub window_start: String,
    pub count: u32,
    pub expires_at: String,
}

impl RateWindow {
    /// Whole seconds until the window closes, rounded up and at least 1.
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> u64 {
        DateTime::parse_from_rfc3339(&self.expires_at)
            .ok()
            .and_then(|at| u64::try_from((at.with_timezone(&Utc) - now).num_milliseconds()).ok())
            .map_or(0, |millis| millis.div_ceil(1000))
            .max(1)
    }
}

impl CacheDb {
    /// Get the client's unexpired window.
    pub async fn get_rate_window(&self, client_id: &str) -> Result<Option<RateWindow>, Error> {
        let client_id = client_id.to_string();
        let now = timestamp(Utc::now());
        self.conn
            .call(move |conn| -> Result<Option<RateWindow>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT client_id, window_start, count, expires_at
                     FROM rate_windows WHERE client_id = ?1 AND expires_at > ?2",
                )?;

                let result = stmt.query_row(params![client_id, now], |row| {
                    Ok(RateWindow {
                        client_id: row.get(0)?,
                        window_start: row.get(1)?,
                        count: row.get(2)?,
                        expires_at: row.get(3)?,
                    })
                });

                match result {
                    Ok(window) => Ok(Some(window)),
                    Err(tokio_rusqlite::rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Start a fresh window with a count of 1, replacing any previous row.
    pub async fn open_rate_window(&self, client_id: &str, window_secs: u64) -> Result<RateWindow, Error> {
        let now = Utc::now();
        let window = RateWindow {
            client_id: client_id.to_string(),
            window_start: timestamp(now),
            count: 1,
            expires_at: timestamp(expires_after(now, window_secs)),
        };

        let row = window.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO rate_windows (client_id, window_start, count, expires_at)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(client_id) DO UPDATE SET
                        window_start = excluded.window_start,
                        count = excluded.count,
                        expires_at = excluded.expires_at",
                    params![row.client_id, row.window_start, row.count, row.expires_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(window)
    }

    /// Add one to the client's count, leaving the window's expiry alone.
    pub async fn increment_rate_window(&self, client_id: &str) -> Result<(), Error> {
        let client_id = client_id.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute("UPDATE rate_windows SET count = count + 1 WHERE client_id = ?1", params![client_id])?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete closed windows. Returns the number of deleted rows.
    pub async fn purge_expired_rate_windows(&self) -> Result<u64, Error> {
        let now = timestamp(Utc::now());
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM rate_windows WHERE expires_at <= ?1", params![now])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[tokio::test]
    async fn test_open_and_get_window() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(db.get_rate_window("8.8.8.8").await.unwrap().is_none());

        let opened = db.open_rate_window("8.8.8.8", 60).await.unwrap();
        assert_eq!(opened.count, 1);

        let stored = db.get_rate_window("8.8.8.8").await.unwrap().unwrap();
        assert_eq!(stored, opened);
    }

    #[tokio::test]
    async fn test_increment_keeps_expiry() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let opened = db.open_rate_window("8.8.8.8", 60).await.unwrap();

        db.increment_rate_window("8.8.8.8").await.unwrap();
        db.increment_rate_window("8.8.8.8").await.unwrap();

        let stored = db.get_rate_window("8.8.8.8").await.unwrap().unwrap();
        assert_eq!(stored.count, 3);
        assert_eq!(stored.expires_at, opened.expires_at);
    }

    #[tokio::test]
    async fn test_expired_window_reads_absent_and_purges() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_rate_window("8.8.8.8", 1).await.unwrap();
        db.open_rate_window("1.1.1.1", 60).await.unwrap();

        tokio::time::sleep(tokio::time::Duration::from_secs(2)).await;

        assert!(db.get_rate_window("8.8.8.8").await.unwrap().is_none());
        assert_eq!(db.purge_expired_rate_windows().await.unwrap(), 1);
        assert!(db.get_rate_window("1.1.1.1").await.unwrap().is_some());
    }

    #[test]
    fn test_retry_after_at_least_one_second() {
        let now = Utc::now();
        let window = RateWindow {
            client_id: "8.8.8.8".into(),
            window_start: timestamp(now),
            count: 60,
            expires_at: timestamp(expires_after(now, 45)),
        };
        assert_eq!(window.retry_after_secs(now), 45);

        let closed = RateWindow { expires_at: timestamp(now), ..window };
        assert_eq!(closed.retry_after_secs(now), 1);
    }

    #[test]
    fn test_retry_after_rounds_partial_seconds_up() {
        let now = Utc::now();
        let window = RateWindow {
            client_id: "8.8.8.8".into(),
            window_start: timestamp(now),
            count: 60,
            expires_at: timestamp(now + TimeDelta::milliseconds(44_200)),
        };
        assert_eq!(window.retry_after_secs(now), 45);
        assert_eq!(window.retry_after_secs(now + TimeDelta::milliseconds(44_000)), 1);
    }
}
