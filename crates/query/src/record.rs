//! Output records.
//!
//! A record is produced fresh for every query execution and never cached on
//! its own; only the assembled list or markup is.

use std::fmt::Write;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::source::{RawAuthor, RawImage, RawItem};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordAuthor {
    pub id: u64,
    pub name: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordImage {
    pub id: u64,
    pub url: String,
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordTerm {
    pub id: u64,
    pub name: String,
    pub slug: String,
    pub link: String,
}

/// One item of a grid response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: u64,
    pub title: String,
    #[serde(rename = "excerpt")]
    pub excerpt_html: String,
    #[serde(rename = "link")]
    pub permalink: String,
    #[serde(rename = "date")]
    pub date_iso: String,
    pub date_formatted: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<RecordAuthor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<RecordImage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<RecordTerm>,
}

impl ContentRecord {
    /// Shape a raw item, formatting its date with the strftime `date_format`.
    pub fn from_raw(item: RawItem, date_format: &str) -> Self {
        Self {
            id: item.id,
            date_iso: item.date.to_rfc3339_opts(SecondsFormat::Secs, false),
            date_formatted: format_date(item.date, date_format),
            title: item.title,
            excerpt_html: item.excerpt,
            permalink: item.link,
            author: item.author.map(|RawAuthor { id, name, link }| RecordAuthor { id, name, link }),
            featured_image: item.featured_image.map(|RawImage { id, url, alt }| RecordImage { id, url, alt }),
            categories: item
                .categories
                .into_iter()
                .map(|term| RecordTerm { id: term.id, name: term.name, slug: term.slug, link: term.link })
                .collect(),
        }
    }
}

/// Falls back to the calendar date when `format` is not a valid strftime string.
fn format_date(date: DateTime<Utc>, format: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", date.format(format)).is_err() {
        tracing::warn!(format, "invalid date format; using ISO date");
        return date.format("%Y-%m-%d").to_string();
    }
    out
}
