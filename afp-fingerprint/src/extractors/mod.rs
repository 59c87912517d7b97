// Extractor boundary - independent HTML-to-text methods
//
// Every extractor turns the same HTML into plain text in its own way. A failing
// extractor never fails the run: it yields an unavailable extraction (the typed
// form of an `ERROR:` marker) that the normalizer discards and the statistics
// count.

use crate::types::RawExtraction;
use afp_common::{Error, Result};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, warn};

pub mod paragraph;

pub use paragraph::{BodyTextExtractor, ParagraphExtractor};

/// Maximum extractors running at once on the blocking pool
const MAX_CONCURRENT_EXTRACTORS: usize = 4;

/// One method of deriving article text from HTML
pub trait TextExtractor: Send + Sync {
    /// Stable source id (e.g. "body_text")
    fn name(&self) -> &str;

    /// Extract plain article text
    ///
    /// # Arguments
    /// * `html` - Raw page HTML
    /// * `url` - Page URL (some extractors resolve relative content against it)
    ///
    /// # Returns
    /// * `Ok(String)` - Extracted text
    /// * `Err(_)` - Extraction failed (recorded as an error marker, run continues)
    fn extract(&self, html: &str, url: &str) -> Result<String>;
}

/// Names of the built-in extractors
pub const BUILTIN_EXTRACTORS: [&str; 3] = ["article_paragraphs", "body_paragraphs", "body_text"];

/// Look up a built-in extractor by name
pub fn builtin_extractor(name: &str) -> Option<Arc<dyn TextExtractor>> {
    match name {
        "article_paragraphs" => Some(Arc::new(ParagraphExtractor::article())),
        "body_paragraphs" => Some(Arc::new(ParagraphExtractor::body())),
        "body_text" => Some(Arc::new(BodyTextExtractor)),
        _ => None,
    }
}

/// Resolve a list of built-in extractor names
///
/// # Errors
/// Returns `Error::Config` naming the first unknown extractor
pub fn builtin_extractors(names: &[String]) -> Result<Vec<Arc<dyn TextExtractor>>> {
    names
        .iter()
        .map(|name| {
            builtin_extractor(name).ok_or_else(|| {
                Error::Config(format!(
                    "unknown extractor '{}' (available: {})",
                    name,
                    BUILTIN_EXTRACTORS.join(", ")
                ))
            })
        })
        .collect()
}

/// Run one extractor, converting failure into an unavailable extraction
fn run_one(extractor: &dyn TextExtractor, html: &str, url: &str) -> RawExtraction {
    match extractor.extract(html, url) {
        Ok(text) => {
            debug!(extractor = %extractor.name(), chars = text.len(), "Extractor succeeded");
            RawExtraction::new(extractor.name(), text)
        }
        Err(e) => {
            warn!(extractor = %extractor.name(), error = %e, "Extractor failed");
            RawExtraction::unavailable(extractor.name(), e.to_string())
        }
    }
}

/// Run extractors one after another, in the given order
pub fn run_extractors(extractors: &[Arc<dyn TextExtractor>], html: &str, url: &str) -> Vec<RawExtraction> {
    extractors
        .iter()
        .map(|extractor| run_one(extractor.as_ref(), html, url))
        .collect()
}

/// Run extractors on the blocking thread pool
///
/// Output order matches `extractors` regardless of completion order. A panicking
/// extractor yields an error marker like any other failure.
pub async fn run_extractors_concurrently(
    extractors: &[Arc<dyn TextExtractor>],
    html: &str,
    url: &str,
) -> Vec<RawExtraction> {
    let html: Arc<str> = Arc::from(html);
    let url: Arc<str> = Arc::from(url);

    stream::iter(extractors.iter().cloned())
        .map(|extractor| {
            let html = Arc::clone(&html);
            let url = Arc::clone(&url);
            async move {
                let name = extractor.name().to_string();
                let handle =
                    tokio::task::spawn_blocking(move || run_one(extractor.as_ref(), &html, &url));
                match handle.await {
                    Ok(raw) => raw,
                    Err(e) => {
                        warn!(extractor = %name, error = %e, "Extractor task failed");
                        RawExtraction::unavailable(name, format!("extractor task failed: {}", e))
                    }
                }
            }
        })
        .buffered(MAX_CONCURRENT_EXTRACTORS)
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawText;

    struct FixedExtractor(&'static str, &'static str);

    impl TextExtractor for FixedExtractor {
        fn name(&self) -> &str {
            self.0
        }

        fn extract(&self, _html: &str, _url: &str) -> Result<String> {
            Ok(self.1.to_string())
        }
    }

    struct FailingExtractor;

    impl TextExtractor for FailingExtractor {
        fn name(&self) -> &str {
            "failing"
        }

        fn extract(&self, _html: &str, _url: &str) -> Result<String> {
            Err(Error::Extraction("parser gave up".to_string()))
        }
    }

    struct PanickingExtractor;

    impl TextExtractor for PanickingExtractor {
        fn name(&self) -> &str {
            "panicking"
        }

        fn extract(&self, _html: &str, _url: &str) -> Result<String> {
            panic!("boom")
        }
    }

    fn extractors() -> Vec<Arc<dyn TextExtractor>> {
        vec![
            Arc::new(FixedExtractor("first", "First text.")),
            Arc::new(FailingExtractor),
            Arc::new(FixedExtractor("third", "Third text.")),
        ]
    }

    #[test]
    fn test_failure_becomes_unavailable() {
        let results = run_extractors(&extractors(), "<html></html>", "https://example.com");
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].text, RawText::Text("First text.".to_string()));
        assert_eq!(
            results[1],
            RawExtraction::new("failing", "ERROR: Extraction failed: parser gave up")
        );
        assert_eq!(results[2].source_id, "third");
    }

    #[tokio::test]
    async fn test_concurrent_run_preserves_order() {
        let results =
            run_extractors_concurrently(&extractors(), "<html></html>", "https://example.com").await;
        let names: Vec<&str> = results.iter().map(|r| r.source_id.as_str()).collect();
        assert_eq!(names, vec!["first", "failing", "third"]);
        assert!(matches!(results[1].text, RawText::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_panicking_extractor_is_isolated() {
        let extractors: Vec<Arc<dyn TextExtractor>> = vec![
            Arc::new(PanickingExtractor),
            Arc::new(FixedExtractor("ok", "Still here.")),
        ];
        let results =
            run_extractors_concurrently(&extractors, "<html></html>", "https://example.com").await;
        assert!(matches!(results[0].text, RawText::Unavailable(_)));
        assert_eq!(results[0].source_id, "panicking");
        assert_eq!(results[1].text, RawText::Text("Still here.".to_string()));
    }

    #[test]
    fn test_builtin_lookup() {
        for name in BUILTIN_EXTRACTORS {
            let extractor = builtin_extractor(name).unwrap();
            assert_eq!(extractor.name(), name);
        }
        assert!(builtin_extractor("newspaper").is_none());
    }

    #[test]
    fn test_unknown_builtin_rejected() {
        let names = vec!["body_text".to_string(), "nope".to_string()];
        match builtin_extractors(&names) {
            Err(Error::Config(msg)) => assert!(msg.contains("nope")),
            other => panic!("expected config error, got {:?}", other.map(|v| v.len())),
        }
    }
}
