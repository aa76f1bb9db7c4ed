//! Event-driven cache invalidation.
//!
//! Any change that can alter a published listing flushes the whole cache
//! namespace. There is no per-key tracking.

use serde::{Deserialize, Serialize};

use crate::cache::CacheStore;
use crate::viewer::Viewer;

/// Status name of publicly visible content.
pub const PUBLISHED: &str = "publish";

/// A content mutation reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentEvent {
    PostSaved {
        id: u64,
        #[serde(default)]
        previous_status: Option<String>,
        status: String,
    },
    PostDeleted {
        id: u64,
        status: String,
    },
    ThemeSwitched,
    ManualFlush,
}

impl ContentEvent {
    /// Whether the event can change what a public grid shows.
    pub fn requires_flush(&self) -> bool {
        match self {
            ContentEvent::PostSaved { previous_status, status, .. } => {
                status == PUBLISHED || previous_status.as_deref() == Some(PUBLISHED)
            }
            ContentEvent::PostDeleted { status, .. } => status == PUBLISHED,
            ContentEvent::ThemeSwitched | ContentEvent::ManualFlush => true,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ContentEvent::PostSaved { .. } => "post_saved",
            ContentEvent::PostDeleted { .. } => "post_deleted",
            ContentEvent::ThemeSwitched => "theme_switched",
            ContentEvent::ManualFlush => "manual_flush",
        }
    }
}

/// Turns content events into namespace flushes.
#[derive(Clone)]
pub struct InvalidationPolicy {
    store: CacheStore,
}

impl InvalidationPolicy {
    pub fn new(store: CacheStore) -> Self {
        Self { store }
    }

    /// Flush the namespace if the event calls for it.
    ///
    /// Returns true when a flush ran and succeeded.
    pub async fn handle(&self, event: &ContentEvent) -> bool {
        if !event.requires_flush() {
            tracing::debug!(event = event.kind(), "event ignored for cache invalidation");
            return false;
        }

        let flushed = self.store.flush_namespace().await;
        tracing::info!(event = event.kind(), flushed, "cache invalidated");
        flushed
    }

    /// Editors bypass the cache entirely so they always see fresh content.
    pub fn should_bypass(&self, viewer: &Viewer) -> bool {
        viewer.is_privileged()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheDb;

    async fn policy() -> (InvalidationPolicy, CacheStore) {
        let store = CacheStore::new(CacheDb::open_in_memory().await.unwrap(), 16);
        (InvalidationPolicy::new(store.clone()), store)
    }

    fn saved(previous: Option<&str>, status: &str) -> ContentEvent {
        ContentEvent::PostSaved { id: 7, previous_status: previous.map(String::from), status: status.to_string() }
    }

    #[test]
    fn test_requires_flush() {
        assert!(saved(None, "publish").requires_flush());
        assert!(saved(Some("draft"), "publish").requires_flush());
        assert!(saved(Some("publish"), "draft").requires_flush());
        assert!(!saved(Some("draft"), "draft").requires_flush());
        assert!(!saved(None, "pending").requires_flush());

        assert!(ContentEvent::PostDeleted { id: 1, status: "publish".into() }.requires_flush());
        assert!(!ContentEvent::PostDeleted { id: 1, status: "trash".into() }.requires_flush());
        assert!(ContentEvent::ThemeSwitched.requires_flush());
        assert!(ContentEvent::ManualFlush.requires_flush());
    }

    #[test]
    fn test_event_json_shape() {
        let event: ContentEvent =
            serde_json::from_str(r#"{"type":"post_saved","id":3,"status":"publish"}"#).unwrap();
        assert_eq!(event, ContentEvent::PostSaved { id: 3, previous_status: None, status: "publish".into() });

        let event: ContentEvent = serde_json::from_str(r#"{"type":"theme_switched"}"#).unwrap();
        assert_eq!(event, ContentEvent::ThemeSwitched);

        assert!(serde_json::from_str::<ContentEvent>(r#"{"type":"unknown"}"#).is_err());
    }

    #[tokio::test]
    async fn test_publish_flushes_everything() {
        let (policy, store) = policy().await;
        store.set("postgrid_a", "a", 300).await;
        store.set("postgrid_b", "b", 300).await;

        assert!(policy.handle(&saved(Some("draft"), "publish")).await);
        assert!(store.get("postgrid_a").await.is_none());
        assert!(store.get("postgrid_b").await.is_none());
    }

    #[tokio::test]
    async fn test_draft_save_keeps_cache() {
        let (policy, store) = policy().await;
        store.set("postgrid_a", "a", 300).await;

        assert!(!policy.handle(&saved(Some("draft"), "draft")).await);
        assert_eq!(store.get("postgrid_a").await.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_should_bypass() {
        let (policy, _) = policy().await;
        assert!(policy.should_bypass(&Viewer::editor()));
        assert!(policy.should_bypass(&Viewer::administrator()));
        assert!(!policy.should_bypass(&Viewer::anonymous()));
        assert!(!policy.should_bypass(&Viewer { authenticated: true, can_edit: false, can_manage: false }));
    }
}
