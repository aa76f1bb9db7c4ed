//! Content source backed by a JSON fixture file.
//!
//! The file holds every item, term, and content type up front:
//!
//! ```json
//! {
//!   "content_types": [{ "slug": "post", "name": "Posts", "singular_name": "Post" }],
//!   "terms": [{ "id": 3, "name": "News", "slug": "news", "taxonomy": "category", "link": "/category/news" }],
//!   "items": [{ "id": 1, "type": "post", "status": "publish", "title": "Hello", "link": "/hello",
//!               "date": "2025-01-20T09:30:00Z", "terms": [3] }]
//! }
//! ```
//!
//! Filters in [`QueryParams::extra`] are not understood by this source and
//! are ignored.

use std::cmp::Ordering;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use postgrid_core::Error;
use serde::Deserialize;

use super::{ContentSource, ContentTypeInfo, QueryParams, RawAuthor, RawImage, RawItem, TermInfo};
use crate::criteria::{OrderDirection, OrderField};

/// Taxonomy whose terms are reported as an item's categories.
const CATEGORY_TAXONOMY: &str = "category";

#[derive(Debug, Default, Deserialize)]
struct Fixture {
    #[serde(default)]
    content_types: Vec<ContentTypeInfo>,
    #[serde(default)]
    terms: Vec<FixtureTerm>,
    #[serde(default)]
    items: Vec<FixtureItem>,
}

#[derive(Debug, Clone, Deserialize)]
struct FixtureTerm {
    id: u64,
    name: String,
    slug: String,
    taxonomy: String,
    #[serde(default)]
    link: String,
}

#[derive(Debug, Clone, Deserialize)]
struct FixtureItem {
    id: u64,
    #[serde(rename = "type", default = "default_type")]
    content_type: String,
    #[serde(default = "default_status")]
    status: String,
    title: String,
    #[serde(default)]
    excerpt: String,
    #[serde(default)]
    content: String,
    link: String,
    date: DateTime<Utc>,
    #[serde(default)]
    menu_order: i64,
    #[serde(default)]
    author: Option<RawAuthor>,
    #[serde(default)]
    featured_image: Option<RawImage>,
    #[serde(default)]
    terms: Vec<u64>,
}

fn default_type() -> String {
    "post".into()
}

fn default_status() -> String {
    postgrid_core::invalidation::PUBLISHED.into()
}

impl FixtureItem {
    fn matches_search(&self, search: &str) -> bool {
        let haystack = format!("{} {} {}", self.title, self.excerpt, self.content).to_lowercase();
        search.split_whitespace().all(|word| haystack.contains(&word.to_lowercase()))
    }

    fn compare(&self, other: &Self, field: OrderField) -> Ordering {
        let primary = match field {
            OrderField::Date | OrderField::Random => self.date.cmp(&other.date),
            OrderField::Title => self.title.to_lowercase().cmp(&other.title.to_lowercase()),
            OrderField::MenuOrder => self.menu_order.cmp(&other.menu_order),
        };
        primary.then(self.id.cmp(&other.id))
    }
}

/// In-memory content store loaded from a fixture.
#[derive(Debug, Default)]
pub struct JsonContentSource {
    fixture: Fixture,
}

impl JsonContentSource {
    /// Read and parse a fixture file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::ContentSource(format!("failed to read {}: {e}", path.display())))?;
        let source = Self::from_json(&raw)?;

        tracing::info!(
            path = %path.display(),
            items = source.fixture.items.len(),
            terms = source.fixture.terms.len(),
            "content fixture loaded"
        );
        Ok(source)
    }

    pub fn from_json(raw: &str) -> Result<Self, Error> {
        let fixture =
            serde_json::from_str(raw).map_err(|e| Error::ContentSource(format!("invalid content fixture: {e}")))?;
        Ok(Self { fixture })
    }

    fn term(&self, id: u64) -> Option<&FixtureTerm> {
        self.fixture.terms.iter().find(|term| term.id == id)
    }

    fn published_of_type<'a>(&'a self, content_type: &'a str) -> impl Iterator<Item = &'a FixtureItem> + 'a {
        self.fixture
            .items
            .iter()
            .filter(move |item| item.content_type == content_type && item.status == postgrid_core::invalidation::PUBLISHED)
    }

    fn to_raw(&self, item: &FixtureItem) -> RawItem {
        let categories = item
            .terms
            .iter()
            .filter_map(|id| self.term(*id))
            .filter(|term| term.taxonomy == CATEGORY_TAXONOMY)
            .map(|term| TermInfo {
                id: term.id,
                name: term.name.clone(),
                slug: term.slug.clone(),
                taxonomy: term.taxonomy.clone(),
                link: term.link.clone(),
                count: 0,
            })
            .collect();

        RawItem {
            id: item.id,
            title: item.title.clone(),
            excerpt: item.excerpt.clone(),
            link: item.link.clone(),
            date: item.date,
            author: item.author.clone(),
            featured_image: item.featured_image.clone(),
            categories,
        }
    }
}

#[async_trait]
impl ContentSource for JsonContentSource {
    async fn query(&self, params: &QueryParams) -> Result<Vec<RawItem>, Error> {
        let mut matched: Vec<&FixtureItem> = self
            .fixture
            .items
            .iter()
            .filter(|item| item.status == params.status && item.content_type == params.content_type)
            .filter(|item| params.category.is_none_or(|category| item.terms.contains(&category)))
            .filter(|item| params.search.as_deref().is_none_or(|search| item.matches_search(search)))
            .collect();

        match params.order_field {
            OrderField::Random => matched.sort_by_cached_key(|_| uuid::Uuid::new_v4()),
            field => {
                matched.sort_by(|a, b| a.compare(b, field));
                if params.order_direction == OrderDirection::Desc {
                    matched.reverse();
                }
            }
        }

        Ok(matched.into_iter().take(params.limit as usize).map(|item| self.to_raw(item)).collect())
    }

    async fn terms(&self, content_type: &str, taxonomy: &str) -> Result<Vec<TermInfo>, Error> {
        let mut terms: Vec<TermInfo> = self
            .fixture
            .terms
            .iter()
            .filter(|term| term.taxonomy == taxonomy)
            .map(|term| {
                let count = self.published_of_type(content_type).filter(|item| item.terms.contains(&term.id)).count();
                TermInfo {
                    id: term.id,
                    name: term.name.clone(),
                    slug: term.slug.clone(),
                    taxonomy: term.taxonomy.clone(),
                    link: term.link.clone(),
                    count: count as u64,
                }
            })
            .filter(|term| term.count > 0)
            .collect();

        terms.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(terms)
    }

    async fn content_type(&self, slug: &str) -> Result<Option<ContentTypeInfo>, Error> {
        Ok(self.fixture.content_types.iter().find(|info| info.slug == slug).cloned())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::criteria::QueryCriteria;

    pub(crate) const FIXTURE: &str = r#"{
        "content_types": [
            { "slug": "post", "name": "Posts", "singular_name": "Post" },
            { "slug": "page", "name": "Pages", "singular_name": "Page" }
        ],
        "terms": [
            { "id": 3, "name": "News", "slug": "news", "taxonomy": "category", "link": "https://example.com/category/news" },
            { "id": 4, "name": "Rust", "slug": "rust", "taxonomy": "category", "link": "https://example.com/category/rust" },
            { "id": 5, "name": "Empty", "slug": "empty", "taxonomy": "category" },
            { "id": 9, "name": "tagged", "slug": "tagged", "taxonomy": "post_tag" }
        ],
        "items": [
            { "id": 1, "title": "Alpha", "excerpt": "First post about rust", "link": "https://example.com/alpha",
              "date": "2025-01-01T10:00:00Z", "menu_order": 3, "terms": [3, 9],
              "author": { "id": 2, "name": "Ada", "link": "https://example.com/author/ada" } },
            { "id": 2, "title": "Bravo", "excerpt": "Second post", "link": "https://example.com/bravo",
              "date": "2025-01-03T10:00:00Z", "menu_order": 1, "terms": [3, 4],
              "featured_image": { "id": 40, "url": "https://example.com/bravo.jpg", "alt": "Bravo cover" } },
            { "id": 3, "title": "Charlie", "excerpt": "Third <em>post</em>", "link": "https://example.com/charlie",
              "date": "2025-01-02T10:00:00Z", "menu_order": 2, "terms": [4] },
            { "id": 4, "title": "Draft", "status": "draft", "link": "https://example.com/?p=4",
              "date": "2025-01-05T10:00:00Z", "terms": [5] },
            { "id": 5, "type": "page", "title": "About", "link": "https://example.com/about",
              "date": "2024-12-01T10:00:00Z" }
        ]
    }"#;

    pub(crate) fn source() -> JsonContentSource {
        JsonContentSource::from_json(FIXTURE).unwrap()
    }

    fn params(edit: impl FnOnce(&mut QueryCriteria)) -> QueryParams {
        let mut criteria = QueryCriteria::defaults("post");
        edit(&mut criteria);
        QueryParams::published(&criteria)
    }

    fn ids(items: &[RawItem]) -> Vec<u64> {
        items.iter().map(|item| item.id).collect()
    }

    #[tokio::test]
    async fn test_default_query_newest_first_published_only() {
        let items = source().query(&params(|_| {})).await.unwrap();
        assert_eq!(ids(&items), vec![2, 3, 1]);
    }

    #[tokio::test]
    async fn test_ordering_and_limit() {
        let source = source();

        let items = source
            .query(&params(|c| {
                c.order_field = OrderField::Title;
                c.order_direction = OrderDirection::Asc;
            }))
            .await
            .unwrap();
        assert_eq!(ids(&items), vec![1, 2, 3]);

        let items = source
            .query(&params(|c| {
                c.order_field = OrderField::MenuOrder;
                c.order_direction = OrderDirection::Asc;
                c.limit = 2;
            }))
            .await
            .unwrap();
        assert_eq!(ids(&items), vec![2, 3]);

        let mut random = ids(&source.query(&params(|c| c.order_field = OrderField::Random)).await.unwrap());
        random.sort_unstable();
        assert_eq!(random, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_category_and_search_filters() {
        let source = source();

        let items = source.query(&params(|c| c.category = Some(4))).await.unwrap();
        assert_eq!(ids(&items), vec![2, 3]);

        let items = source.query(&params(|c| c.search = Some("POST rust".into()))).await.unwrap();
        assert_eq!(ids(&items), vec![1]);

        let items = source.query(&params(|c| c.content_type = "page".into())).await.unwrap();
        assert_eq!(ids(&items), vec![5]);
    }

    #[tokio::test]
    async fn test_item_categories_exclude_other_taxonomies() {
        let items = source().query(&params(|c| c.search = Some("alpha".into()))).await.unwrap();
        let slugs: Vec<&str> = items[0].categories.iter().map(|term| term.slug.as_str()).collect();
        assert_eq!(slugs, vec!["news"]);
    }

    #[tokio::test]
    async fn test_terms_hide_empty() {
        let terms = source().terms("post", "category").await.unwrap();
        let counts: Vec<(&str, u64)> = terms.iter().map(|term| (term.slug.as_str(), term.count)).collect();
        assert_eq!(counts, vec![("news", 2), ("rust", 2)]);

        assert!(source().terms("page", "category").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_content_type_labels() {
        let info = source().content_type("page").await.unwrap().unwrap();
        assert_eq!(info.singular_name, "Page");
        assert!(source().content_type("product").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("content.json");
        tokio::fs::write(&path, FIXTURE).await.unwrap();

        let source = JsonContentSource::load(&path).await.unwrap();
        assert_eq!(source.query(&params(|_| {})).await.unwrap().len(), 3);

        let missing = JsonContentSource::load(dir.path().join("missing.json")).await;
        assert!(matches!(missing, Err(Error::ContentSource(_))));
    }

    #[test]
    fn test_invalid_fixture() {
        assert!(matches!(JsonContentSource::from_json("{ nope"), Err(Error::ContentSource(_))));
    }
}
