//! Application context wiring the read path.
//!
//! Built once at startup and shared as `Arc<PostGrid>`. The read path is:
//! normalize attributes, check the bypass rule, derive the key, read the
//! cache, and on a miss pass the rate-limit gate (JSON endpoint only), run
//! the query, and write the payload back. Extensions may change the key,
//! the lifetime, the bypass decision, and the no-items message.

use std::sync::Arc;

use postgrid_core::cache::{CacheStats, CacheStore};
use postgrid_core::{AppConfig, CacheDb, ClientId, ContentEvent, Error, InvalidationPolicy, RateLimiter, Viewer};
use serde_json::Value;

use crate::attributes::{as_text, lookup, sanitize_key};
use crate::criteria::QueryCriteria;
use crate::display::GridDisplay;
use crate::extension::Extensions;
use crate::gateway::{CategoryEntry, QueryGateway};
use crate::record::ContentRecord;
use crate::render::{NO_ITEMS_MESSAGE, render_grid, render_no_items};
use crate::source::{ContentSource, ContentTypeInfo};

pub struct PostGrid {
    config: AppConfig,
    gateway: QueryGateway,
    store: CacheStore,
    limiter: RateLimiter,
    policy: InvalidationPolicy,
}

impl PostGrid {
    pub fn new(config: AppConfig, db: CacheDb, source: Arc<dyn ContentSource>, extensions: Extensions) -> Self {
        let store = CacheStore::new(db.clone(), config.memory_cache_capacity);
        let limit = extensions.rate_limit(config.rate_limit);
        let limiter = RateLimiter::new(db, limit, config.rate_window_secs);
        let policy = InvalidationPolicy::new(store.clone());
        let gateway = QueryGateway::new(source, extensions, &config);

        Self { config, gateway, store, limiter, policy }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn gateway(&self) -> &QueryGateway {
        &self.gateway
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Lifetime of cache writes after extensions.
    fn cache_ttl(&self) -> u64 {
        self.gateway.extensions().cache_ttl(self.config.cache_ttl_secs)
    }

    /// Whether this request skips the cache for both reads and writes.
    ///
    /// A zero lifetime always bypasses, whatever extensions decide.
    fn bypasses_cache(&self, viewer: &Viewer, criteria: &QueryCriteria, ttl_secs: u64) -> bool {
        let bypass = self.gateway.extensions().bypass_cache(viewer, criteria, self.policy.should_bypass(viewer));
        ttl_secs == 0 || bypass
    }

    fn no_items(&self) -> String {
        render_no_items(&self.gateway.extensions().no_items_message(NO_ITEMS_MESSAGE.to_string()))
    }

    /// Records for the JSON endpoint.
    ///
    /// The only error is [`Error::RateLimited`], raised on a cache miss.
    pub async fn fetch_posts(&self, attrs: &Value, viewer: &Viewer, client: &ClientId) -> Result<Vec<ContentRecord>, Error> {
        let criteria = self.gateway.build_criteria(attrs);
        let ttl = self.cache_ttl();
        let bypass = self.bypasses_cache(viewer, &criteria, ttl);
        let key = self.gateway.planner().rest_key(&criteria);

        if !bypass {
            if let Some(payload) = self.store.get(&key).await {
                match serde_json::from_str(&payload) {
                    Ok(records) => return Ok(records),
                    Err(e) => tracing::warn!(key = %key, error = %e, "cached payload unreadable; treating as miss"),
                }
            }
        }

        self.limiter.check(viewer, client).await?;

        let records = self.gateway.execute(&criteria).await;

        if !bypass {
            match serde_json::to_string(&records) {
                Ok(mut payload) => {
                    self.gateway.extensions().pre_cache_write(&mut payload);
                    self.store.set(&key, &payload, ttl).await;
                }
                Err(e) => tracing::warn!(key = %key, error = %e, "records not serializable; skipping cache write"),
            }
        }

        Ok(records)
    }

    /// Grid markup for the render entry point. Never fails.
    ///
    /// The no-items message is returned without being cached.
    pub async fn render(&self, attrs: &Value, viewer: &Viewer) -> String {
        let criteria = self.gateway.build_criteria(attrs);
        let display = GridDisplay::from_attributes(attrs);
        let ttl = self.cache_ttl();
        let bypass = self.bypasses_cache(viewer, &criteria, ttl);
        let key = self.gateway.planner().render_key(&criteria, &display);

        if !bypass {
            if let Some(markup) = self.store.get(&key).await {
                return markup;
            }
        }

        let records = self.gateway.execute(&criteria).await;
        if records.is_empty() {
            return self.no_items();
        }

        let mut markup = match render_grid(&records, &display) {
            Ok(markup) => markup,
            Err(e) => {
                tracing::warn!(error = %e, "grid template failed; rendering no-items markup");
                return self.no_items();
            }
        };

        if !bypass {
            self.gateway.extensions().pre_cache_write(&mut markup);
            self.store.set(&key, &markup, ttl).await;
        }

        markup
    }

    /// Category terms for the content type named in `attrs`.
    pub async fn categories(&self, attrs: &Value) -> Vec<CategoryEntry> {
        let content_type = lookup(attrs, &["post_type", "postType"])
            .and_then(as_text)
            .map(|raw| sanitize_key(&raw))
            .unwrap_or_else(|| self.gateway.planner().default_post_type().to_string());
        self.gateway.categories(&content_type).await
    }

    /// Supported content types. Requires edit capability.
    pub async fn content_types(&self, viewer: &Viewer) -> Result<Vec<ContentTypeInfo>, Error> {
        if !viewer.is_privileged() {
            return Err(Error::Forbidden("listing content types requires edit capability".into()));
        }
        Ok(self.gateway.content_types().await)
    }

    /// Apply a content event. Returns whether the cache was flushed.
    pub async fn handle_event(&self, event: &ContentEvent) -> bool {
        self.policy.handle(event).await
    }

    /// Manual flush. Requires manage capability.
    pub async fn flush(&self, viewer: &Viewer) -> Result<bool, Error> {
        if !(viewer.authenticated && viewer.can_manage) {
            return Err(Error::Forbidden("flushing the cache requires manage capability".into()));
        }
        Ok(self.policy.handle(&ContentEvent::ManualFlush).await)
    }

    /// Drop expired cache entries and rate windows.
    pub async fn purge_expired(&self) -> (u64, u64) {
        let entries = self.store.purge_expired().await;
        let windows = self.limiter.purge_expired().await;
        tracing::debug!(entries, windows, "expired rows purged");
        (entries, windows)
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.stats().await
    }
}
