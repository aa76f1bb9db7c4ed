//! Render-only grid attributes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::attributes::{as_bool, as_integer, lookup};

pub const DEFAULT_COLUMNS: u8 = 3;
pub const MAX_COLUMNS: u8 = 6;
pub const DEFAULT_EXCERPT_LENGTH: u32 = 20;

/// How a rendered grid presents its records.
///
/// Parsed with the same never-reject coercion as the query criteria and
/// mixed into the render cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDisplay {
    pub columns: u8,
    pub show_date: bool,
    pub show_excerpt: bool,
    /// Words kept from the excerpt; 0 keeps it whole.
    pub excerpt_length: u32,
    pub show_thumbnail: bool,
    pub show_author: bool,
    pub show_categories: bool,
}

impl Default for GridDisplay {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMNS,
            show_date: true,
            show_excerpt: true,
            excerpt_length: DEFAULT_EXCERPT_LENGTH,
            show_thumbnail: false,
            show_author: false,
            show_categories: false,
        }
    }
}

impl GridDisplay {
    pub fn from_attributes(attrs: &Value) -> Self {
        let defaults = Self::default();
        let flag = |names: &[&str], default: bool| lookup(attrs, names).and_then(as_bool).unwrap_or(default);

        Self {
            columns: lookup(attrs, &["columns"])
                .and_then(as_integer)
                .map_or(defaults.columns, |n| n.clamp(1, i64::from(MAX_COLUMNS)) as u8),
            show_date: flag(&["showDate", "show_date"], defaults.show_date),
            show_excerpt: flag(&["showExcerpt", "show_excerpt"], defaults.show_excerpt),
            excerpt_length: lookup(attrs, &["excerptLength", "excerpt_length"])
                .and_then(as_integer)
                .map_or(defaults.excerpt_length, |n| n.clamp(0, i64::from(u32::MAX)) as u32),
            show_thumbnail: flag(&["showThumbnail", "show_thumbnail"], defaults.show_thumbnail),
            show_author: flag(&["showAuthor", "show_author"], defaults.show_author),
            show_categories: flag(&["showCategories", "show_categories"], defaults.show_categories),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let display = GridDisplay::from_attributes(&json!({}));
        assert_eq!(display, GridDisplay::default());
        assert_eq!(display.columns, 3);
        assert!(display.show_date && display.show_excerpt);
        assert!(!display.show_thumbnail && !display.show_author && !display.show_categories);
    }

    #[test]
    fn test_coercion() {
        let display = GridDisplay::from_attributes(&json!({
            "columns": "9",
            "showDate": "false",
            "showAuthor": 1,
            "showCategories": "yes",
            "excerptLength": "-5",
            "showThumbnail": "unclear",
        }));
        assert_eq!(display.columns, 6);
        assert!(!display.show_date);
        assert!(display.show_author);
        assert!(display.show_categories);
        assert_eq!(display.excerpt_length, 0);
        assert!(!display.show_thumbnail);
    }
}
