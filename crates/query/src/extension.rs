//! Extension points on the read path.
//!
//! Extensions run in registration order. Every hook has a no-op default, so
//! an extension implements only what it needs.

use std::fmt;
use std::sync::Arc;

use postgrid_core::Viewer;

use crate::criteria::QueryCriteria;
use crate::record::ContentRecord;
use crate::source::QueryParams;

pub trait GridExtension: Send + Sync {
    /// Adjust criteria after normalization, before the cache key is derived.
    fn post_normalize(&self, _criteria: &mut QueryCriteria) {}

    /// Adjust the arguments sent to the content source.
    fn pre_query(&self, _params: &mut QueryParams) {}

    /// Adjust the shaped records before they are cached or rendered.
    fn post_query(&self, _records: &mut Vec<ContentRecord>) {}

    /// Adjust a payload right before it is written to the cache.
    fn pre_cache_write(&self, _payload: &mut String) {}

    /// Replace the per-window request limit.
    fn rate_limit(&self, limit: u32) -> u32 {
        limit
    }

    /// Replace the derived cache key. Keys outside the `postgrid_`
    /// namespace are prefixed by the store.
    fn cache_key(&self, key: String, _criteria: &QueryCriteria) -> String {
        key
    }

    /// Replace the lifetime of cache writes. 0 disables caching.
    fn cache_ttl(&self, ttl_secs: u64) -> u64 {
        ttl_secs
    }

    /// Decide whether a request skips the cache. `bypass` is the decision so far.
    fn bypass_cache(&self, _viewer: &Viewer, _criteria: &QueryCriteria, bypass: bool) -> bool {
        bypass
    }

    /// Replace the plain-text message shown for a grid with no items.
    fn no_items_message(&self, message: String) -> String {
        message
    }
}

/// Ordered list of registered extensions.
#[derive(Clone, Default)]
pub struct Extensions {
    hooks: Vec<Arc<dyn GridExtension>>,
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extensions").field("registered", &self.hooks.len()).finish()
    }
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, extension: Arc<dyn GridExtension>) {
        self.hooks.push(extension);
    }

    pub fn with(mut self, extension: impl GridExtension + 'static) -> Self {
        self.register(Arc::new(extension));
        self
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn post_normalize(&self, criteria: &mut QueryCriteria) {
        self.hooks.iter().for_each(|hook| hook.post_normalize(criteria));
    }

    pub fn pre_query(&self, params: &mut QueryParams) {
        self.hooks.iter().for_each(|hook| hook.pre_query(params));
    }

    pub fn post_query(&self, records: &mut Vec<ContentRecord>) {
        self.hooks.iter().for_each(|hook| hook.post_query(records));
    }

    pub fn pre_cache_write(&self, payload: &mut String) {
        self.hooks.iter().for_each(|hook| hook.pre_cache_write(payload));
    }

    pub fn rate_limit(&self, limit: u32) -> u32 {
        self.hooks.iter().fold(limit, |limit, hook| hook.rate_limit(limit))
    }

    pub fn cache_key(&self, key: String, criteria: &QueryCriteria) -> String {
        self.hooks.iter().fold(key, |key, hook| hook.cache_key(key, criteria))
    }

    pub fn cache_ttl(&self, ttl_secs: u64) -> u64 {
        self.hooks.iter().fold(ttl_secs, |ttl, hook| hook.cache_ttl(ttl))
    }

    pub fn bypass_cache(&self, viewer: &Viewer, criteria: &QueryCriteria, bypass: bool) -> bool {
        self.hooks.iter().fold(bypass, |bypass, hook| hook.bypass_cache(viewer, criteria, bypass))
    }

    pub fn no_items_message(&self, message: String) -> String {
        self.hooks.iter().fold(message, |message, hook| hook.no_items_message(message))
    }
}
