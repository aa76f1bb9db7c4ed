//! Normalized query criteria.
//!
//! [`QueryCriteria::from_attributes`] never rejects input: every field has a
//! safe default and anything malformed is coerced to it. Attributes are
//! accepted under the block names (`postsPerPage`), the REST parameter names
//! (`per_page`), and the criteria names (`limit`).

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::attributes::{as_integer, as_text, lookup, sanitize_key};

pub const DEFAULT_LIMIT: u32 = 6;
pub const MAX_LIMIT: u32 = 100;

const LIMIT_NAMES: &[&str] = &["postsPerPage", "per_page", "limit"];
const ORDER_FIELD_NAMES: &[&str] = &["orderBy", "orderby", "orderField"];
const ORDER_DIRECTION_NAMES: &[&str] = &["order", "orderDirection"];
const CATEGORY_NAMES: &[&str] = &["selectedCategory", "category", "categoryFilter"];
const CONTENT_TYPE_NAMES: &[&str] = &["postType", "post_type", "contentType"];
const SEARCH_NAMES: &[&str] = &["searchTerm", "search"];

static TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("tag pattern compiles"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern compiles"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderField {
    #[default]
    Date,
    Title,
    MenuOrder,
    #[serde(rename = "rand")]
    Random,
}

impl OrderField {
    /// Parse an order name, falling back to [`OrderField::Date`].
    pub fn parse(raw: &str) -> Self {
        match sanitize_key(raw).as_str() {
            "title" => OrderField::Title,
            "menu_order" | "menuorder" => OrderField::MenuOrder,
            "rand" | "random" => OrderField::Random,
            _ => OrderField::Date,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    Asc,
    #[default]
    Desc,
}

impl OrderDirection {
    /// `asc` in any case is ascending; everything else is descending.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("asc") { OrderDirection::Asc } else { OrderDirection::Desc }
    }
}

/// Validated, normalized form of raw grid attributes.
///
/// This is the input to both key derivation and query execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryCriteria {
    pub limit: u32,
    pub order_field: OrderField,
    pub order_direction: OrderDirection,
    pub category: Option<u64>,
    pub content_type: String,
    pub search: Option<String>,
    /// Extension-supplied filters, kept apart from the core fields.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl QueryCriteria {
    /// Defaults for the given fallback content type.
    pub fn defaults(content_type: &str) -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            order_field: OrderField::Date,
            order_direction: OrderDirection::Desc,
            category: None,
            content_type: content_type.to_string(),
            search: None,
            extra: BTreeMap::new(),
        }
    }

    /// Normalize a raw attribute bag.
    ///
    /// `allowed_types` is the content-type allow-list; a type outside it
    /// becomes `default_type`.
    pub fn from_attributes(attrs: &Value, allowed_types: &[String], default_type: &str) -> Self {
        let mut criteria = Self::defaults(default_type);

        if let Some(limit) = lookup(attrs, LIMIT_NAMES).and_then(as_integer) {
            criteria.limit = limit.clamp(1, i64::from(MAX_LIMIT)) as u32;
        }

        if let Some(field) = lookup(attrs, ORDER_FIELD_NAMES).and_then(Value::as_str) {
            criteria.order_field = OrderField::parse(field);
        }

        if let Some(direction) = lookup(attrs, ORDER_DIRECTION_NAMES).and_then(Value::as_str) {
            criteria.order_direction = OrderDirection::parse(direction);
        }

        criteria.category = lookup(attrs, CATEGORY_NAMES)
            .and_then(as_integer)
            .filter(|id| *id > 0)
            .map(|id| id as u64);

        if let Some(content_type) = lookup(attrs, CONTENT_TYPE_NAMES).and_then(as_text) {
            let content_type = sanitize_key(&content_type);
            if allowed_types.iter().any(|allowed| *allowed == content_type) {
                criteria.content_type = content_type;
            }
        }

        criteria.search = lookup(attrs, SEARCH_NAMES).and_then(as_text).and_then(|raw| sanitize_search(&raw));

        criteria
    }
}

/// Remove anything that looks like a markup tag.
pub fn strip_tags(raw: &str) -> Cow<'_, str> {
    TAGS.replace_all(raw, "")
}

/// Strip markup, collapse whitespace, and trim. Empty results become None.
pub fn sanitize_search(raw: &str) -> Option<String> {
    let stripped = strip_tags(raw);
    let collapsed = WHITESPACE.replace_all(&stripped, " ");
    let trimmed = collapsed.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
