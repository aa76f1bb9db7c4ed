//! Query construction, rendering, and the read path for postgrid.
//!
//! This crate provides:
//! - Normalization of raw grid attributes into [`QueryCriteria`]
//! - The [`ContentSource`] seam and a JSON fixture implementation
//! - Extension hooks around normalization, querying, and cache policy
//! - [`GridPlanner`], shared by the server and offline tooling to derive keys
//! - Record shaping and grid markup
//! - [`PostGrid`], the application context tying these to the cache

pub mod attributes;
pub mod criteria;
pub mod display;
pub mod extension;
pub mod gateway;
pub mod grid;
pub mod planner;
pub mod record;
pub mod render;
pub mod source;

pub use criteria::{OrderDirection, OrderField, QueryCriteria};
pub use display::GridDisplay;
pub use extension::{Extensions, GridExtension};
pub use gateway::{CategoryEntry, QueryGateway};
pub use grid::PostGrid;
pub use planner::{GridPlanner, render_cache_key, rest_cache_key};
pub use record::ContentRecord;
pub use render::{NO_ITEMS_MARKUP, NO_ITEMS_MESSAGE, render_grid, render_no_items};
pub use source::{ContentSource, ContentTypeInfo, JsonContentSource, QueryParams, RawItem, TermInfo};
