//! Page metadata extraction
//!
//! Reads article identity and provenance from HTML, in priority order:
//! 1. Schema.org JSON-LD objects whose `@type` names an Article
//! 2. Open Graph (`og:title`, `article:published_time`, `article:modified_time`)
//! 3. `<link rel="canonical">`
//! 4. `<title>` as the last-resort title
//!
//! Earlier sources win; later ones only fill gaps.

use crate::types::ArticleMetadata;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Title used when the page has none at all
pub const UNKNOWN_TITLE: &str = "Unknown";

/// Everything the metadata parser found on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub url: String,
    /// `<link rel="canonical">` target, else the page URL
    pub canonical_url: String,
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub publish_date: Option<String>,
    pub modified_date: Option<String>,
    pub has_schema_org: bool,
    pub has_opengraph: bool,
    pub has_canonical: bool,
}

impl PageMetadata {
    fn empty(url: &str) -> Self {
        Self {
            url: url.to_string(),
            canonical_url: url.to_string(),
            title: None,
            authors: Vec::new(),
            publish_date: None,
            modified_date: None,
            has_schema_org: false,
            has_opengraph: false,
            has_canonical: false,
        }
    }

    /// Identity fields consumed by the fingerprint builder
    pub fn identity(&self) -> ArticleMetadata {
        ArticleMetadata::new(
            self.canonical_url.clone(),
            self.publish_date.clone(),
            self.title.clone(),
        )
    }
}

/// Extract metadata from a page
///
/// Malformed JSON-LD blocks are skipped; parsing never fails.
pub fn extract_metadata(html: &str, url: &str) -> PageMetadata {
    let document = Html::parse_document(html);
    let mut metadata = PageMetadata::empty(url);

    // Priority 1: JSON-LD
    if let Ok(sel) = Selector::parse(r#"script[type="application/ld+json"]"#) {
        for script in document.select(&sel) {
            let raw: String = script.text().collect();
            match serde_json::from_str::<Value>(raw.trim()) {
                Ok(value) => apply_json_ld(&mut metadata, &value),
                Err(e) => debug!(url = %url, error = %e, "Skipping malformed JSON-LD block"),
            }
        }
    }

    // Priority 2: Open Graph
    if let Some(title) = meta_property(&document, "og:title") {
        metadata.has_opengraph = true;
        fill(&mut metadata.title, title);
    }
    if let Some(published) = meta_property(&document, "article:published_time") {
        fill(&mut metadata.publish_date, published);
    }
    if let Some(modified) = meta_property(&document, "article:modified_time") {
        fill(&mut metadata.modified_date, modified);
    }

    // Priority 3: canonical link
    if let Ok(sel) = Selector::parse(r#"link[rel="canonical"]"#) {
        if let Some(link) = document.select(&sel).next() {
            metadata.has_canonical = true;
            if let Some(href) = link.value().attr("href").map(str::trim).filter(|h| !h.is_empty()) {
                metadata.canonical_url = href.to_string();
            }
        }
    }

    // Priority 4: <title>
    if metadata.title.is_none() {
        let title = Selector::parse("title")
            .ok()
            .and_then(|sel| {
                document
                    .select(&sel)
                    .next()
                    .map(|t| t.text().collect::<Vec<_>>().join(" "))
            })
            .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNKNOWN_TITLE.to_string());
        metadata.title = Some(title);
    }

    metadata
}

/// Set `slot` if it is still empty and `value` is non-blank
fn fill(slot: &mut Option<String>, value: String) {
    if slot.is_none() && !value.trim().is_empty() {
        *slot = Some(value.trim().to_string());
    }
}

fn meta_property(document: &Html, property: &str) -> Option<String> {
    let sel = Selector::parse(&format!(r#"meta[property="{}"]"#, property)).ok()?;
    document
        .select(&sel)
        .next()
        .and_then(|m| m.value().attr("content"))
        .map(str::to_string)
}

fn apply_json_ld(metadata: &mut PageMetadata, value: &Value) {
    match value {
        Value::Array(items) => {
            for item in items {
                apply_json_ld(metadata, item);
            }
        }
        Value::Object(map) => {
            if let Some(Value::Array(graph)) = map.get("@graph") {
                for item in graph {
                    apply_json_ld(metadata, item);
                }
            }
            if !is_article_type(map.get("@type")) {
                return;
            }
            metadata.has_schema_org = true;
            if let Some(headline) = map.get("headline").and_then(Value::as_str) {
                fill(&mut metadata.title, headline.to_string());
            }
            if let Some(published) = map.get("datePublished").and_then(Value::as_str) {
                fill(&mut metadata.publish_date, published.to_string());
            }
            if let Some(modified) = map.get("dateModified").and_then(Value::as_str) {
                fill(&mut metadata.modified_date, modified.to_string());
            }
            match map.get("author") {
                Some(Value::Array(authors)) => {
                    metadata.authors.extend(authors.iter().filter_map(author_name));
                }
                Some(author) => metadata.authors.extend(author_name(author)),
                None => {}
            }
        }
        _ => {}
    }
}

/// `@type` is a string or a list of strings; any entry containing "Article" counts
fn is_article_type(value: Option<&Value>) -> bool {
    match value {
        Some(Value::String(t)) => t.contains("Article"),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|t| t.contains("Article")),
        _ => false,
    }
}

fn author_name(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => map.get("name").and_then(Value::as_str).map(str::to_string),
        Value::String(name) => Some(name.clone()),
        _ => None,
    }
}
