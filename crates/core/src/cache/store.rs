//! Two-layer render cache.
//!
//! Reads check the in-process [`MemoryLayer`] first and fall back to the
//! SQLite layer. A hit in the SQLite layer is returned as-is and is not
//! copied into the memory layer. Every process sharing the database keeps
//! its own memory layer; a flush from any of them advances the database's
//! flush epoch, and memory entries from an older epoch read as misses.
//!
//! Caching is an optimization only: every backend failure is logged and
//! reported as a miss (reads) or `false` (writes), never as an error.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::connection::CacheDb;
use super::hash::{NAMESPACE, is_namespaced};
use super::memory::MemoryLayer;
use super::MAX_TTL_SECS;

/// Entry counts reported by [`CacheStore::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Rows in the persistent layer, expired or not.
    pub persistent_entries: u64,
    /// Persistent rows past their expiry but not yet purged.
    pub persistent_expired: u64,
    /// Entries held by this process's memory layer.
    pub memory_entries: usize,
}

/// Cache facade over the memory and persistent layers.
#[derive(Clone)]
pub struct CacheStore {
    db: CacheDb,
    memory: Arc<MemoryLayer>,
}

impl CacheStore {
    pub fn new(db: CacheDb, memory_capacity: usize) -> Self {
        Self { db, memory: Arc::new(MemoryLayer::new(memory_capacity)) }
    }

    /// The database shared with the rate limiter.
    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    /// Look a key up in the memory layer, then the persistent layer.
    pub async fn get(&self, key: &str) -> Option<String> {
        let key = namespaced(key);

        match self.db.flush_epoch().await {
            Ok(epoch) => {
                if let Some(value) = self.memory.get(&key, epoch) {
                    tracing::trace!(key = %key, layer = "memory", "cache hit");
                    return Some(value);
                }
            }
            Err(e) => tracing::debug!(key = %key, error = %e, "flush epoch unavailable; skipping memory layer"),
        }

        match self.db.get_entry(&key).await {
            Ok(Some(value)) => {
                tracing::trace!(key = %key, layer = "persistent", "cache hit");
                Some(value)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::debug!(key = %key, error = %e, "persistent cache read failed; treating as miss");
                None
            }
        }
    }

    /// Store a value in both layers.
    ///
    /// `ttl_secs == 0` means "do not cache": nothing is written and `false`
    /// is returned. Returns `false` when the persistent write fails; the
    /// memory layer still holds the value for this process as long as the
    /// flush epoch could be read.
    pub async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> bool {
        if ttl_secs == 0 {
            return false;
        }
        let ttl_secs = ttl_secs.min(MAX_TTL_SECS);
        let key = namespaced(key);

        match self.db.flush_epoch().await {
            Ok(epoch) => self.memory.set(&key, value, Duration::from_secs(ttl_secs), epoch),
            Err(e) => tracing::debug!(key = %key, error = %e, "flush epoch unavailable; skipping memory layer"),
        }

        match self.db.put_entry(&key, value, ttl_secs).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "persistent cache write failed");
                false
            }
        }
    }

    /// Remove a key from both layers.
    ///
    /// Returns true if the persistent layer held the key.
    pub async fn delete(&self, key: &str) -> bool {
        let key = namespaced(key);
        self.memory.remove(&key);

        match self.db.delete_entry(&key).await {
            Ok(removed) => removed,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "persistent cache delete failed");
                false
            }
        }
    }

    /// Remove every entry in the namespace from both layers.
    ///
    /// Memory layers of other processes sharing the database drop their
    /// entries on the next read through the advanced flush epoch.
    pub async fn flush_namespace(&self) -> bool {
        self.memory.clear();

        match self.db.flush_entries_with_prefix(NAMESPACE).await {
            Ok(deleted) => {
                tracing::info!(deleted, "cache namespace flushed");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "cache namespace flush failed");
                false
            }
        }
    }

    /// Drop expired rows from the persistent layer.
    pub async fn purge_expired(&self) -> u64 {
        match self.db.purge_expired_entries().await {
            Ok(deleted) => deleted,
            Err(e) => {
                tracing::warn!(error = %e, "expired cache purge failed");
                0
            }
        }
    }

    pub async fn stats(&self) -> CacheStats {
        let (persistent_entries, persistent_expired) = self.db.count_entries().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "cache stats unavailable");
            (0, 0)
        });
        CacheStats { persistent_entries, persistent_expired, memory_entries: self.memory.len() }
    }
}

/// Every key written through the store lives under the namespace, so a
/// namespace flush reaches all of them.
fn namespaced(key: &str) -> Cow<'_, str> {
    if is_namespaced(key) { Cow::Borrowed(key) } else { Cow::Owned(format!("{NAMESPACE}{key}")) }
}
