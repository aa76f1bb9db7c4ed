//! In-process cache layer.
//!
//! Bounded LRU of namespaced keys to payloads, each carrying its own
//! deadline and the flush epoch it was written under. An entry from an older
//! epoch was flushed by some process sharing the database and reads as a
//! miss. Lives for the lifetime of the process only.

use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use lru::LruCache;

struct MemoryEntry {
    value: String,
    expires_at: Instant,
    epoch: u64,
}

/// Fast layer of the render cache.
pub struct MemoryLayer {
    entries: Mutex<LruCache<String, MemoryEntry>>,
}

impl MemoryLayer {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self { entries: Mutex::new(LruCache::new(capacity)) }
    }

    /// Get a live value written under `epoch`, evicting it if it expired or
    /// was written before a flush.
    pub fn get(&self, key: &str, epoch: u64) -> Option<String> {
        let mut entries = self.lock("get");
        let expired = match entries.get(key) {
            Some(entry) if entry.epoch == epoch && entry.expires_at > Instant::now() => {
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(key);
        }
        None
    }

    pub fn set(&self, key: &str, value: &str, ttl: Duration, epoch: u64) {
        let entry = MemoryEntry { value: value.to_string(), expires_at: Instant::now() + ttl, epoch };
        self.lock("set").put(key.to_string(), entry);
    }

    pub fn remove(&self, key: &str) -> bool {
        self.lock("remove").pop(key).is_some()
    }

    pub fn clear(&self) {
        self.lock("clear").clear();
    }

    pub fn len(&self) -> usize {
        self.lock("len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self, op: &'static str) -> MutexGuard<'_, LruCache<String, MemoryEntry>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!(op, result = "poisoned_recovered", "Recovered from poisoned memory cache lock");
                poisoned.into_inner()
            }
        }
    }
}
