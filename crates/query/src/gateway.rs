//! Criteria normalization and query execution.
//!
//! The gateway never fails outward: content-source errors are logged and
//! read as an empty result.

use std::sync::Arc;

use postgrid_core::AppConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::criteria::QueryCriteria;
use crate::extension::Extensions;
use crate::planner::GridPlanner;
use crate::record::ContentRecord;
use crate::source::{ContentSource, ContentTypeInfo, QueryParams};

/// Category listing entry served to filter UIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub id: u64,
    pub name: String,
    pub slug: String,
    pub count: u64,
    pub taxonomy: String,
}

pub struct QueryGateway {
    source: Arc<dyn ContentSource>,
    planner: GridPlanner,
    supported_taxonomies: Vec<String>,
    date_format: String,
}

impl QueryGateway {
    pub fn new(source: Arc<dyn ContentSource>, extensions: Extensions, config: &AppConfig) -> Self {
        Self {
            source,
            planner: GridPlanner::new(extensions, config),
            supported_taxonomies: config.supported_taxonomies.clone(),
            date_format: config.date_format.clone(),
        }
    }

    pub fn planner(&self) -> &GridPlanner {
        &self.planner
    }

    pub fn extensions(&self) -> &Extensions {
        self.planner.extensions()
    }

    pub fn build_criteria(&self, attrs: &Value) -> QueryCriteria {
        self.planner.build_criteria(attrs)
    }

    /// Run the query for published items and shape the records.
    pub async fn execute(&self, criteria: &QueryCriteria) -> Vec<ContentRecord> {
        let mut params = QueryParams::published(criteria);
        self.extensions().pre_query(&mut params);

        let items = match self.source.query(&params).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(error = %e, content_type = %params.content_type, "content query failed; returning no items");
                return Vec::new();
            }
        };

        let mut records: Vec<ContentRecord> =
            items.into_iter().map(|item| ContentRecord::from_raw(item, &self.date_format)).collect();
        self.extensions().post_query(&mut records);

        tracing::debug!(count = records.len(), content_type = %params.content_type, "content query executed");
        records
    }

    /// Non-empty terms of every supported taxonomy for a content type.
    ///
    /// An unsupported content type lists the default type's terms.
    pub async fn categories(&self, content_type: &str) -> Vec<CategoryEntry> {
        let content_type =
            if self.planner.supports(content_type) { content_type } else { self.planner.default_post_type() };

        let mut entries = Vec::new();
        for taxonomy in &self.supported_taxonomies {
            match self.source.terms(content_type, taxonomy).await {
                Ok(terms) => entries.extend(terms.into_iter().map(|term| CategoryEntry {
                    id: term.id,
                    name: term.name,
                    slug: term.slug,
                    count: term.count,
                    taxonomy: taxonomy.clone(),
                })),
                Err(e) => tracing::warn!(error = %e, taxonomy = %taxonomy, "term listing failed"),
            }
        }
        entries
    }

    /// Labels of every supported content type the source knows.
    pub async fn content_types(&self) -> Vec<ContentTypeInfo> {
        let supported = self.planner.supported_post_types();
        let mut types = Vec::with_capacity(supported.len());
        for slug in supported {
            match self.source.content_type(slug).await {
                Ok(Some(info)) => types.push(info),
                Ok(None) => tracing::debug!(slug = %slug, "supported content type unknown to source"),
                Err(e) => tracing::warn!(error = %e, slug = %slug, "content type lookup failed"),
            }
        }
        types
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::GridExtension;
    use crate::source::json::tests::source;
    use crate::source::{RawItem, TermInfo};
    use async_trait::async_trait;
    use postgrid_core::Error;
    use serde_json::json;

    struct FailingSource;

    #[async_trait]
    impl ContentSource for FailingSource {
        async fn query(&self, _params: &QueryParams) -> Result<Vec<RawItem>, Error> {
            Err(Error::ContentSource("store offline".into()))
        }

        async fn terms(&self, _content_type: &str, _taxonomy: &str) -> Result<Vec<TermInfo>, Error> {
            Err(Error::ContentSource("store offline".into()))
        }

        async fn content_type(&self, _slug: &str) -> Result<Option<ContentTypeInfo>, Error> {
            Err(Error::ContentSource("store offline".into()))
        }
    }

    struct OnlyFirst;

    impl GridExtension for OnlyFirst {
        fn post_query(&self, records: &mut Vec<ContentRecord>) {
            records.truncate(1);
        }
    }

    fn config() -> AppConfig {
        AppConfig { supported_post_types: vec!["post".into(), "page".into()], ..AppConfig::default() }
    }

    fn gateway(extensions: Extensions) -> QueryGateway {
        QueryGateway::new(Arc::new(source()), extensions, &config())
    }

    #[tokio::test]
    async fn test_execute_shapes_records() {
        let gateway = gateway(Extensions::new());
        let records = gateway.execute(&gateway.build_criteria(&json!({}))).await;

        let ids: Vec<u64> = records.iter().map(|record| record.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(records[0].date_formatted, "January 3, 2025");
        assert_eq!(records[0].featured_image.as_ref().map(|image| image.alt.as_str()), Some("Bravo cover"));
    }

    #[tokio::test]
    async fn test_post_query_extension_applies() {
        let gateway = gateway(Extensions::new().with(OnlyFirst));
        assert_eq!(gateway.execute(&QueryCriteria::defaults("post")).await.len(), 1);
    }

    #[tokio::test]
    async fn test_source_failure_reads_as_empty() {
        let gateway = QueryGateway::new(Arc::new(FailingSource), Extensions::new(), &config());

        assert!(gateway.execute(&QueryCriteria::defaults("post")).await.is_empty());
        assert!(gateway.categories("post").await.is_empty());
        assert!(gateway.content_types().await.is_empty());
    }

    #[tokio::test]
    async fn test_categories_fall_back_to_default_type() {
        let gateway = gateway(Extensions::new());

        let entries = gateway.categories("product").await;
        let slugs: Vec<&str> = entries.iter().map(|entry| entry.slug.as_str()).collect();
        assert_eq!(slugs, vec!["news", "rust"]);
        assert!(entries.iter().all(|entry| entry.taxonomy == "category"));
    }

    #[tokio::test]
    async fn test_content_types() {
        let gateway = gateway(Extensions::new());
        let slugs: Vec<String> = gateway.content_types().await.into_iter().map(|info| info.slug).collect();
        assert_eq!(slugs, vec!["post", "page"]);
    }
}
