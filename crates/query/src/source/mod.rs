//! The external content store.
//!
//! [`ContentSource`] is the seam between the grid and whatever stores the
//! content. The source receives fully-normalized [`QueryParams`] and
//! returns raw items in the requested order; shaping into records happens
//! in the gateway.

pub mod json;

pub use json::JsonContentSource;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use postgrid_core::Error;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::criteria::{OrderDirection, OrderField, QueryCriteria};

/// Arguments handed to [`ContentSource::query`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryParams {
    pub limit: u32,
    pub order_field: OrderField,
    pub order_direction: OrderDirection,
    pub category: Option<u64>,
    pub content_type: String,
    pub search: Option<String>,
    /// Only items in this status are returned.
    pub status: String,
    pub extra: BTreeMap<String, Value>,
}

impl QueryParams {
    /// Published items matching the criteria.
    pub fn published(criteria: &QueryCriteria) -> Self {
        Self {
            limit: criteria.limit,
            order_field: criteria.order_field,
            order_direction: criteria.order_direction,
            category: criteria.category,
            content_type: criteria.content_type.clone(),
            search: criteria.search.clone(),
            status: postgrid_core::invalidation::PUBLISHED.to_string(),
            extra: criteria.extra.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAuthor {
    pub id: u64,
    pub name: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawImage {
    pub id: u64,
    pub url: String,
    #[serde(default)]
    pub alt: String,
}

/// A taxonomy term as listed by the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermInfo {
    pub id: u64,
    pub name: String,
    pub slug: String,
    pub taxonomy: String,
    #[serde(default)]
    pub link: String,
    /// Published items assigned to the term.
    #[serde(default)]
    pub count: u64,
}

/// Labels of a content type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTypeInfo {
    pub slug: String,
    pub name: String,
    pub singular_name: String,
}

/// A content item as the source returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    pub link: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub author: Option<RawAuthor>,
    #[serde(default)]
    pub featured_image: Option<RawImage>,
    #[serde(default)]
    pub categories: Vec<TermInfo>,
}

/// Query, taxonomy, and content-type capabilities of the content store.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Items matching `params`, ordered and limited as requested.
    async fn query(&self, params: &QueryParams) -> Result<Vec<RawItem>, Error>;

    /// Non-empty terms of `taxonomy` used by `content_type`.
    async fn terms(&self, content_type: &str, taxonomy: &str) -> Result<Vec<TermInfo>, Error>;

    /// Labels for a content type, if the source knows it.
    async fn content_type(&self, slug: &str) -> Result<Option<ContentTypeInfo>, Error>;
}
