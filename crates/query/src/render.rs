//! Grid markup.

use askama::Template;

use crate::criteria::strip_tags;
use crate::display::GridDisplay;
use crate::record::{ContentRecord, RecordAuthor, RecordImage, RecordTerm};

/// Message shown for a grid with nothing to show.
pub const NO_ITEMS_MESSAGE: &str = "No posts found.";

/// Markup for a grid with nothing to show. Never cached.
pub const NO_ITEMS_MARKUP: &str = r#"<p class="wp-block-postgrid__no-posts">No posts found.</p>"#;

/// Per-item view with the display settings already applied.
struct ItemView<'a> {
    record: &'a ContentRecord,
    thumbnail: Option<&'a RecordImage>,
    author: Option<&'a RecordAuthor>,
    show_date: bool,
    categories: &'a [RecordTerm],
    has_meta: bool,
    excerpt: Option<String>,
}

impl<'a> ItemView<'a> {
    fn new(record: &'a ContentRecord, display: &GridDisplay) -> Self {
        let author = record.author.as_ref().filter(|_| display.show_author);
        let categories = if display.show_categories { record.categories.as_slice() } else { &[] };

        Self {
            record,
            thumbnail: record.featured_image.as_ref().filter(|_| display.show_thumbnail),
            author,
            show_date: display.show_date,
            categories,
            has_meta: author.is_some() || display.show_date || !categories.is_empty(),
            excerpt: display.show_excerpt.then(|| trim_words(&record.excerpt_html, display.excerpt_length)),
        }
    }
}

#[derive(Template)]
#[template(path = "grid.html")]
struct GridTemplate<'a> {
    columns: u8,
    items: Vec<ItemView<'a>>,
}

#[derive(Template)]
#[template(source = r#"<p class="wp-block-postgrid__no-posts">{{ message }}</p>"#, ext = "html")]
struct NoItemsTemplate<'a> {
    message: &'a str,
}

/// No-items markup for a plain-text `message`, escaped.
pub fn render_no_items(message: &str) -> String {
    NoItemsTemplate { message }.render().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "no-items template failed; using default message");
        NO_ITEMS_MARKUP.to_string()
    })
}

/// Render records as grid markup, or the no-items message for an empty list.
pub fn render_grid(records: &[ContentRecord], display: &GridDisplay) -> Result<String, askama::Error> {
    if records.is_empty() {
        return Ok(NO_ITEMS_MARKUP.to_string());
    }

    let template = GridTemplate {
        columns: display.columns,
        items: records.iter().map(|record| ItemView::new(record, display)).collect(),
    };
    template.render()
}

/// Plain-text excerpt cut to `max_words` words, with an ellipsis when cut.
/// `max_words == 0` keeps every word.
pub fn trim_words(excerpt: &str, max_words: u32) -> String {
    let text = strip_tags(excerpt);
    let words: Vec<&str> = text.split_whitespace().collect();

    if max_words == 0 || words.len() <= max_words as usize {
        return words.join(" ");
    }
    format!("{}\u{2026}", words[..max_words as usize].join(" "))
}
