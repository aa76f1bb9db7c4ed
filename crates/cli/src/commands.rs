//! Command implementations.
//!
//! These work on the database directly, outside any running server, so a
//! manual flush needs no credentials.

use anyhow::{Context, Result};
use postgrid_core::cache::{CacheStats, CacheStore};
use postgrid_core::{AppConfig, CacheDb, ContentEvent, InvalidationPolicy, RateLimiter};
use postgrid_query::{GridDisplay, GridPlanner};
use serde_json::Value;

use crate::args::{KeyArgs, KeySourceArg};

pub struct Admin {
    store: CacheStore,
    limiter: RateLimiter,
}

impl Admin {
    pub fn new(db: CacheDb, config: &AppConfig) -> Self {
        Self {
            store: CacheStore::new(db.clone(), config.memory_cache_capacity),
            limiter: RateLimiter::new(db, config.rate_limit, config.rate_window_secs),
        }
    }

    pub async fn flush(&self) -> bool {
        InvalidationPolicy::new(self.store.clone()).handle(&ContentEvent::ManualFlush).await
    }

    /// Returns `(entries, windows)` removed.
    pub async fn purge(&self) -> (u64, u64) {
        (self.store.purge_expired().await, self.limiter.purge_expired().await)
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.stats().await
    }
}

/// Cache key the server would use for these attributes.
///
/// `planner` must carry the server's extensions for the keys to match.
pub fn derive_key(args: &KeyArgs, planner: &GridPlanner) -> Result<String> {
    let attrs: Value = serde_json::from_str(&args.attributes).context("--attributes must be JSON")?;
    let criteria = planner.build_criteria(&attrs);

    Ok(match args.source {
        KeySourceArg::Rest => planner.rest_key(&criteria),
        KeySourceArg::Render => planner.render_key(&criteria, &GridDisplay::from_attributes(&attrs)),
    })
}
