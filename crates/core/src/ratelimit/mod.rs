//! Fixed-window per-client rate limiting for the public read path.
//!
//! Windows live in the same SQLite database as the cache. The
//! read-modify-write is not atomic across processes, so the limit is soft.

mod client_id;
mod windows;

pub use client_id::{ClientId, FALLBACK_CLIENT, is_private_or_reserved};
pub use windows::RateWindow;

use chrono::Utc;

use crate::cache::CacheDb;
use crate::{Error, Viewer};

/// Counts requests per client inside a fixed window.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    db: CacheDb,
    limit: u32,
    window_secs: u64,
}

impl RateLimiter {
    pub fn new(db: CacheDb, limit: u32, window_secs: u64) -> Self {
        Self { db, limit: limit.max(1), window_secs: window_secs.max(1) }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Same limiter with a different per-window limit.
    pub fn with_limit(&self, limit: u32) -> Self {
        Self { limit: limit.max(1), ..self.clone() }
    }

    /// Count the request and report whether it must be rejected.
    pub async fn should_reject(&self, viewer: &Viewer, client: &ClientId) -> bool {
        self.evaluate(viewer, client).await.is_some()
    }

    /// Count the request, failing with [`Error::RateLimited`] once the
    /// client's window is exhausted.
    pub async fn check(&self, viewer: &Viewer, client: &ClientId) -> Result<(), Error> {
        match self.evaluate(viewer, client).await {
            Some(retry_after_secs) => Err(Error::RateLimited { retry_after_secs }),
            None => Ok(()),
        }
    }

    /// Returns the retry-after delay when the request is rejected.
    ///
    /// Rejected requests leave the count untouched. Backend failures allow
    /// the request.
    async fn evaluate(&self, viewer: &Viewer, client: &ClientId) -> Option<u64> {
        if viewer.is_privileged() {
            return None;
        }

        let window = match self.db.get_rate_window(client.as_str()).await {
            Ok(window) => window,
            Err(e) => {
                tracing::warn!(client = %client, error = %e, "rate window read failed; allowing request");
                return None;
            }
        };

        let outcome = match window {
            None => self.db.open_rate_window(client.as_str(), self.window_secs).await.map(|_| None),
            Some(window) if window.count >= self.limit => {
                let retry_after = window.retry_after_secs(Utc::now());
                tracing::info!(client = %client, count = window.count, limit = self.limit, retry_after, "rate limit exceeded");
                Ok(Some(retry_after))
            }
            Some(_) => self.db.increment_rate_window(client.as_str()).await.map(|()| None),
        };

        outcome.unwrap_or_else(|e| {
            tracing::warn!(client = %client, error = %e, "rate window update failed; allowing request");
            None
        })
    }

    /// Delete closed windows.
    pub async fn purge_expired(&self) -> u64 {
        match self.db.purge_expired_rate_windows().await {
            Ok(deleted) => deleted,
            Err(e) => {
                tracing::warn!(error = %e, "expired rate window purge failed");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn limiter(limit: u32, window_secs: u64) -> RateLimiter {
        RateLimiter::new(CacheDb::open_in_memory().await.unwrap(), limit, window_secs)
    }

    fn client(ip: &str) -> ClientId {
        ClientId::from_headers(Some(ip), None, None)
    }

    #[tokio::test]
    async fn test_limit_boundary() {
        let limiter = limiter(5, 60).await;
        let client = client("8.8.8.8");
        let viewer = Viewer::anonymous();

        for i in 0..5 {
            assert!(!limiter.should_reject(&viewer, &client).await, "request {} rejected", i + 1);
        }
        assert!(limiter.should_reject(&viewer, &client).await);
        assert!(limiter.should_reject(&viewer, &client).await);
    }

    #[tokio::test]
    async fn test_rejection_does_not_increment() {
        let limiter = limiter(2, 60).await;
        let client = client("8.8.8.8");
        let viewer = Viewer::anonymous();

        for _ in 0..5 {
            limiter.should_reject(&viewer, &client).await;
        }
        let window = limiter.db.get_rate_window(client.as_str()).await.unwrap().unwrap();
        assert_eq!(window.count, 2);
    }

    #[tokio::test]
    async fn test_check_reports_retry_after() {
        let limiter = limiter(1, 60).await;
        let client = client("8.8.8.8");
        let viewer = Viewer::anonymous();

        limiter.check(&viewer, &client).await.unwrap();
        match limiter.check(&viewer, &client).await {
            Err(Error::RateLimited { retry_after_secs }) => assert!((1..=60).contains(&retry_after_secs)),
            other => panic!("expected rate limit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_clients_counted_separately() {
        let limiter = limiter(1, 60).await;
        let viewer = Viewer::anonymous();

        assert!(!limiter.should_reject(&viewer, &client("8.8.8.8")).await);
        assert!(!limiter.should_reject(&viewer, &client("1.1.1.1")).await);
        assert!(limiter.should_reject(&viewer, &client("8.8.8.8")).await);
    }

    #[tokio::test]
    async fn test_window_expiry_resets_count() {
        let limiter = limiter(1, 1).await;
        let client = client("8.8.8.8");
        let viewer = Viewer::anonymous();

        assert!(!limiter.should_reject(&viewer, &client).await);
        assert!(limiter.should_reject(&viewer, &client).await);

        tokio::time::sleep(tokio::time::Duration::from_secs(2)).await;
        assert!(!limiter.should_reject(&viewer, &client).await);
    }

    #[tokio::test]
    async fn test_privileged_viewer_exempt_and_uncounted() {
        let limiter = limiter(1, 60).await;
        let client = client("8.8.8.8");

        for _ in 0..10 {
            assert!(!limiter.should_reject(&Viewer::editor(), &client).await);
        }
        assert!(limiter.db.get_rate_window(client.as_str()).await.unwrap().is_none());
        assert!(!limiter.should_reject(&Viewer::anonymous(), &client).await);
    }

    #[tokio::test]
    async fn test_with_limit_overrides() {
        let limiter = limiter(60, 60).await.with_limit(1);
        let client = client("8.8.8.8");

        assert_eq!(limiter.limit(), 1);
        assert!(!limiter.should_reject(&Viewer::anonymous(), &client).await);
        assert!(limiter.should_reject(&Viewer::anonymous(), &client).await);
    }
}
