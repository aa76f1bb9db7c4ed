//! Attribute normalization and cache keys.
//!
//! The read path and offline tooling both go through [`GridPlanner`], so a
//! key derived outside the server matches the one the server writes under
//! the same extensions.

use postgrid_core::AppConfig;
use postgrid_core::cache::{KeyContext, derive_cache_key};
use serde_json::Value;

use crate::criteria::QueryCriteria;
use crate::display::GridDisplay;
use crate::extension::Extensions;

/// Key of the JSON record list for `criteria`, before extensions.
pub fn rest_cache_key(criteria: &QueryCriteria) -> String {
    derive_cache_key(criteria, &KeyContext::rest())
}

/// Key of the rendered markup for `criteria` shown with `display`, before extensions.
pub fn render_cache_key(criteria: &QueryCriteria, display: &GridDisplay) -> String {
    let variant = serde_json::to_value(display).unwrap_or(Value::Null);
    derive_cache_key(criteria, &KeyContext::render(variant))
}

#[derive(Debug, Clone)]
pub struct GridPlanner {
    extensions: Extensions,
    supported_post_types: Vec<String>,
    default_post_type: String,
}

impl GridPlanner {
    pub fn new(extensions: Extensions, config: &AppConfig) -> Self {
        Self {
            extensions,
            supported_post_types: config.supported_post_types.clone(),
            default_post_type: config.default_post_type().to_string(),
        }
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn supported_post_types(&self) -> &[String] {
        &self.supported_post_types
    }

    pub fn default_post_type(&self) -> &str {
        &self.default_post_type
    }

    pub fn supports(&self, content_type: &str) -> bool {
        self.supported_post_types.iter().any(|supported| supported == content_type)
    }

    /// Normalize raw attributes and let extensions adjust the result.
    pub fn build_criteria(&self, attrs: &Value) -> QueryCriteria {
        let mut criteria = QueryCriteria::from_attributes(attrs, &self.supported_post_types, &self.default_post_type);
        self.extensions.post_normalize(&mut criteria);
        criteria
    }

    pub fn rest_key(&self, criteria: &QueryCriteria) -> String {
        self.extensions.cache_key(rest_cache_key(criteria), criteria)
    }

    pub fn render_key(&self, criteria: &QueryCriteria, display: &GridDisplay) -> String {
        self.extensions.cache_key(render_cache_key(criteria, display), criteria)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::GridExtension;
    use serde_json::json;

    struct Partitioned;

    impl GridExtension for Partitioned {
        fn post_normalize(&self, criteria: &mut QueryCriteria) {
            criteria.extra.insert("site".into(), json!("blog"));
        }

        fn cache_key(&self, key: String, criteria: &QueryCriteria) -> String {
            format!("{key}_{}", criteria.limit)
        }
    }

    fn config() -> AppConfig {
        AppConfig { supported_post_types: vec!["post".into(), "page".into()], ..AppConfig::default() }
    }

    #[test]
    fn test_build_criteria_uses_allow_list() {
        let planner = GridPlanner::new(Extensions::new(), &config());
        assert_eq!(planner.build_criteria(&json!({ "post_type": "page" })).content_type, "page");
        assert_eq!(planner.build_criteria(&json!({ "post_type": "product" })).content_type, "post");
        assert!(planner.supports("page"));
        assert!(!planner.supports("product"));
    }

    #[test]
    fn test_keys_differ_by_source_and_display() {
        let criteria = QueryCriteria::defaults("post");
        let rest = rest_cache_key(&criteria);
        let render = render_cache_key(&criteria, &GridDisplay::default());
        let wide = render_cache_key(&criteria, &GridDisplay { columns: 4, ..GridDisplay::default() });

        assert_ne!(rest, render);
        assert_ne!(render, wide);
        assert_eq!(rest, rest_cache_key(&QueryCriteria::defaults("post")));
    }

    #[test]
    fn test_extensions_shape_criteria_and_keys() {
        let plain = GridPlanner::new(Extensions::new(), &config());
        let partitioned = GridPlanner::new(Extensions::new().with(Partitioned), &config());

        let criteria = partitioned.build_criteria(&json!({}));
        assert_eq!(criteria.extra.get("site"), Some(&json!("blog")));

        let key = partitioned.rest_key(&criteria);
        assert_eq!(key, format!("{}_6", rest_cache_key(&criteria)));
        assert_ne!(key, plain.rest_key(&plain.build_criteria(&json!({}))));
        assert!(partitioned.render_key(&criteria, &GridDisplay::default()).ends_with("_6"));
    }
}
