//! Content-addressed cache key derivation.
//!
//! Keys are `postgrid_` followed by the hex SHA-256 of the canonical JSON
//! form of `{ "context": ..., "criteria": ... }`. The namespace prefix is
//! what `flush_namespace` matches on.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sha2::{Digest, Sha256};

/// Prefix shared by every key this subsystem produces.
pub const NAMESPACE: &str = "postgrid_";

/// Which read path a cached payload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeySource {
    /// JSON record list served by the posts endpoint.
    Rest,
    /// Markup produced by the render entry point.
    Render,
}

/// Request context mixed into the key alongside the criteria.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyContext {
    pub source: KeySource,
    /// Extra discriminator, e.g. the display settings of a render.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<Value>,
}

impl KeyContext {
    pub fn rest() -> Self {
        Self { source: KeySource::Rest, variant: None }
    }

    pub fn render(variant: Value) -> Self {
        Self { source: KeySource::Render, variant: Some(variant) }
    }
}

/// Derive the cache key for normalized criteria under a context.
///
/// serde_json objects are ordered maps, so the serialized form has a stable
/// field order and equal inputs always hash to the same key.
pub fn derive_cache_key<T: Serialize + ?Sized>(criteria: &T, context: &KeyContext) -> String {
    let criteria = serde_json::to_value(criteria).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "criteria not serializable; deriving key from null");
        Value::Null
    });

    let canonical = json!({ "context": context, "criteria": criteria });

    let mut hasher = Sha256::new();
    hasher.update(canonical.to_string().as_bytes());
    format!("{NAMESPACE}{}", hex::encode(hasher.finalize()))
}

/// Whether a key belongs to the cache namespace.
pub fn is_namespaced(key: &str) -> bool {
    key.starts_with(NAMESPACE)
}
