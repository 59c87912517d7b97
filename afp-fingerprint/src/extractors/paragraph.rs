//! Built-in HTML extractors
//!
//! - `ParagraphExtractor`: text of `p` and `li` blocks under the first matching
//!   root element (`article`, or `main` then `body`)
//! - `BodyTextExtractor`: all text under `body`, skipping script, style,
//!   navigation and footer content
//!
//! Blocks are separated by newlines; spacing is left to the normalizer.

use super::TextExtractor;
use afp_common::{Error, Result};
use scraper::{ElementRef, Html, Selector};

/// Elements whose text never counts as article body
const EXCLUDED_ELEMENTS: [&str; 6] = ["script", "style", "noscript", "nav", "footer", "template"];

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Internal(format!("invalid selector '{}': {}", css, e)))
}

fn compact_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(elem: ElementRef<'_>) -> String {
    compact_ws(&elem.text().collect::<Vec<_>>().join(" "))
}

/// Paragraph and list-item blocks under a root element
#[derive(Debug, Clone)]
pub struct ParagraphExtractor {
    name: String,
    /// Root selectors tried in order; the first present one is used
    roots: Vec<String>,
}

impl ParagraphExtractor {
    pub fn new(name: impl Into<String>, roots: &[&str]) -> Self {
        Self {
            name: name.into(),
            roots: roots.iter().map(|r| r.to_string()).collect(),
        }
    }

    /// Blocks under `<article>`
    pub fn article() -> Self {
        Self::new("article_paragraphs", &["article"])
    }

    /// Blocks under `<main>`, else `<body>`
    pub fn body() -> Self {
        Self::new("body_paragraphs", &["main", "body"])
    }
}

impl TextExtractor for ParagraphExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract(&self, html: &str, _url: &str) -> Result<String> {
        let document = Html::parse_document(html);

        let mut root = None;
        for css in &self.roots {
            let sel = selector(css)?;
            if let Some(elem) = document.select(&sel).next() {
                root = Some(elem);
                break;
            }
        }
        let Some(root) = root else {
            return Err(Error::Extraction(format!(
                "no root element ({})",
                self.roots.join(", ")
            )));
        };

        let block_sel = selector("p, li")?;
        let blocks: Vec<String> = root
            .select(&block_sel)
            // nested blocks (p inside li) are covered by their parent
            .filter(|elem| {
                !elem
                    .ancestors()
                    .filter_map(ElementRef::wrap)
                    .take_while(|a| a.id() != root.id())
                    .any(|a| matches!(a.value().name(), "p" | "li"))
            })
            .filter(|elem| !is_excluded(*elem))
            .map(element_text)
            .filter(|text| !text.is_empty())
            .collect();

        if blocks.is_empty() {
            return Err(Error::Extraction("no paragraph text found".to_string()));
        }
        Ok(blocks.join("\n"))
    }
}

fn is_excluded(elem: ElementRef<'_>) -> bool {
    elem.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| EXCLUDED_ELEMENTS.contains(&a.value().name()))
}

/// Every visible text node under `<body>`
#[derive(Debug, Clone, Copy, Default)]
pub struct BodyTextExtractor;

impl TextExtractor for BodyTextExtractor {
    fn name(&self) -> &str {
        "body_text"
    }

    fn extract(&self, html: &str, _url: &str) -> Result<String> {
        let document = Html::parse_document(html);
        let body_sel = selector("body")?;
        let Some(body) = document.select(&body_sel).next() else {
            return Err(Error::Extraction("no body element".to_string()));
        };

        let mut parts: Vec<&str> = Vec::new();
        for node in body.descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };
            let hidden = node
                .ancestors()
                .filter_map(|a| a.value().as_element())
                .any(|e| EXCLUDED_ELEMENTS.contains(&e.name()));
            if hidden {
                continue;
            }
            let text: &str = text;
            if !text.trim().is_empty() {
                parts.push(text.trim());
            }
        }

        if parts.is_empty() {
            return Err(Error::Extraction("no body text found".to_string()));
        }
        Ok(compact_ws(&parts.join(" ")))
    }
}
