//! Core types and shared functionality for postgrid.
//!
//! This crate provides:
//! - Two-layer render cache (in-process LRU over a SQLite backend)
//! - Fixed-window per-client rate limiting
//! - Event-driven cache invalidation
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod invalidation;
pub mod ratelimit;
pub mod viewer;

pub use cache::{CacheDb, CacheStore, KeyContext, KeySource, derive_cache_key};
pub use config::AppConfig;
pub use error::Error;
pub use invalidation::{ContentEvent, InvalidationPolicy};
pub use ratelimit::{ClientId, RateLimiter};
pub use viewer::Viewer;
