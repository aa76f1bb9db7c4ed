//! Render cache backed by an in-process LRU and SQLite.
//!
//! This module provides:
//!
//! - Deterministic, namespaced cache keys using SHA-256 hashing
//! - A two-layer store with TTL expiry and whole-namespace flush
//! - Automatic schema migrations
//! - WAL mode for concurrent access from several workers

pub mod connection;
pub mod entries;
pub mod hash;
pub mod memory;
pub mod migrations;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use hash::{KeyContext, KeySource, NAMESPACE, derive_cache_key};
pub use store::{CacheStats, CacheStore};

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};

/// Longest TTL honoured by the store (10 years).
pub const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Fixed-width RFC 3339 form, so stored timestamps compare as strings.
pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn expires_after(now: DateTime<Utc>, ttl_secs: u64) -> DateTime<Utc> {
    let secs = i64::try_from(ttl_secs.min(MAX_TTL_SECS)).unwrap_or(0);
    now.checked_add_signed(TimeDelta::seconds(secs)).unwrap_or(now)
}
