//! Three-layer text normalization
//!
//! Makes heterogeneous extractor outputs comparable before voting:
//! - `base` - universal typography and spacing cleanup (all sources)
//! - `source_rules` - fixes for the habits of individual extraction engines
//! - `site_rules` - boilerplate removal and vetoes keyed by the article's domain
//!
//! Layers run strictly in that order, each on the previous layer's output.
//! Error markers are discarded before layer 1; empty output is discarded after
//! layer 3.

pub mod base;
pub mod site_rules;
pub mod source_rules;

pub use base::{collapse_whitespace, normalize_base};
pub use site_rules::{apply_site_rules, builtin_site_rules, DomainMatcher, SiteAction, SiteOutcome, SiteRule};
pub use source_rules::{apply_source_rules, builtin_source_rules, SourceRule};

use crate::types::{DiscardReason, NormalizeOutcome, NormalizedText, RawExtraction, RawText};
use tracing::debug;

/// Applies the three normalization layers with a given pair of rule tables
#[derive(Debug, Clone)]
pub struct Normalizer {
    source_rules: Vec<SourceRule>,
    site_rules: Vec<SiteRule>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            source_rules: builtin_source_rules(),
            site_rules: builtin_site_rules(),
        }
    }
}

impl Normalizer {
    /// Normalizer with custom rule tables
    pub fn new(source_rules: Vec<SourceRule>, site_rules: Vec<SiteRule>) -> Self {
        Self {
            source_rules,
            site_rules,
        }
    }

    /// Normalize one extractor output for the article at `url`
    ///
    /// # Returns
    /// * `NormalizeOutcome::Normalized` with the cleaned text, or
    /// * `NormalizeOutcome::Discarded` when the source is unavailable, vetoed
    ///   by a site rule, or empty after cleanup
    pub fn normalize(&self, raw: &RawExtraction, url: &str) -> NormalizeOutcome {
        let text = match &raw.text {
            RawText::Text(text) => text,
            RawText::Unavailable(reason) => {
                return NormalizeOutcome::Discarded(DiscardReason::SourceUnavailable {
                    reason: reason.clone(),
                });
            }
        };

        // Layer 1: base
        let text = normalize_base(text);

        // Layer 2: source-specific
        let text = collapse_whitespace(&apply_source_rules(
            &self.source_rules,
            &raw.source_id,
            &text,
        ));

        // Layer 3: site-specific
        let text = match apply_site_rules(&self.site_rules, url, &text) {
            SiteOutcome::Kept(text) => collapse_whitespace(&text),
            SiteOutcome::Vetoed { rule } => {
                debug!(source = %raw.source_id, rule = %rule, "Site rule vetoed text");
                return NormalizeOutcome::Discarded(DiscardReason::SiteRule { rule });
            }
        };

        if text.is_empty() {
            return NormalizeOutcome::Discarded(DiscardReason::Empty);
        }

        NormalizeOutcome::Normalized(NormalizedText {
            source_id: raw.source_id.clone(),
            text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://example.com/news/story";

    #[test]
    fn test_error_marker_discarded_before_layers() {
        let normalizer = Normalizer::default();
        let raw = RawExtraction::new("goose", "ERROR: parser crashed");
        assert_eq!(
            normalizer.normalize(&raw, URL),
            NormalizeOutcome::Discarded(DiscardReason::SourceUnavailable {
                reason: "parser crashed".to_string()
            })
        );
    }

    #[test]
    fn test_layers_run_in_order() {
        let normalizer = Normalizer::default();
        let raw = RawExtraction::new(
            "goose",
            "The mayor\u{2019}s plan passed .  (Photo by A. Person/Getty Images)  Critics objected.",
        );
        let outcome = normalizer.normalize(&raw, URL);
        let text = outcome.into_normalized().unwrap().text;
        assert_eq!(text, "The mayor's plan passed. Critics objected.");
    }

    #[test]
    fn test_live_blog_discarded_regardless_of_content() {
        let normalizer = Normalizer::default();
        let raw = RawExtraction::new(
            "trafilatura",
            "A perfectly reasonable article body with many sentences in it.",
        );
        let outcome = normalizer.normalize(&raw, "https://www.cnn.com/live-news/election");
        assert_eq!(
            outcome,
            NormalizeOutcome::Discarded(DiscardReason::SiteRule {
                rule: "cnn_live_blog".to_string()
            })
        );
        assert!(outcome.into_normalized().is_none());
    }

    #[test]
    fn test_empty_after_layers_discarded() {
        let normalizer = Normalizer::default();
        let raw = RawExtraction::new("goose", " \u{200B} (Reuters) ");
        assert_eq!(
            normalizer.normalize(&raw, URL),
            NormalizeOutcome::Discarded(DiscardReason::Empty)
        );
    }

    #[test]
    fn test_whitespace_only_input_discarded() {
        let normalizer = Normalizer::default();
        let raw = RawExtraction::new("readability", "\n\t  ");
        assert!(normalizer.normalize(&raw, URL).is_discarded());
    }

    #[test]
    fn test_empty_rule_tables_only_run_base_layer() {
        let normalizer = Normalizer::new(Vec::new(), Vec::new());
        let raw = RawExtraction::new("goose", "Kept (Reuters) text .");
        let text = normalizer.normalize(&raw, URL).into_normalized().unwrap().text;
        assert_eq!(text, "Kept (Reuters) text.");
    }
}
