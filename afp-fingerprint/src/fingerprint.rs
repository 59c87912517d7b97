//! Fingerprint Builder
//!
//! Orchestrates one pipeline run for one article:
//! 1. Normalize every raw extraction (discards are counted, never fatal)
//! 2. Pick the vote threshold from the number of surviving sources
//! 3. Vote on sentences
//! 4. Score pairwise agreement
//! 5. Hash the reconstructed text and the metadata identity
//!
//! The run is pure: no I/O, no clock, ordered maps only. Identical inputs yield
//! a bit-identical report.

use crate::consensus;
use crate::hashing::{article_id, content_hash, group_by_hash};
use crate::metadata::PageMetadata;
use crate::normalize::Normalizer;
use crate::types::{
    word_count, ArticleMetadata, DiscardedSource, ExtractionStats, FingerprintRecord,
    FingerprintReport, NormalizeOutcome, RawExtraction, RunStatus, SourceDiagnostics,
};
use crate::voting::SupermajorityVoter;
use afp_common::{Error, PipelineConfig, Result};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Characters of normalized text shown per source in diagnostics
const PREVIEW_CHARS: usize = 200;

/// Builds fingerprint records from raw extractor outputs
#[derive(Debug, Clone)]
pub struct Fingerprinter {
    config: PipelineConfig,
    normalizer: Normalizer,
    voter: SupermajorityVoter,
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl Fingerprinter {
    /// Fingerprinter with the built-in rule tables
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_normalizer(config, Normalizer::default())
    }

    /// Fingerprinter with custom normalization rules
    pub fn with_normalizer(config: PipelineConfig, normalizer: Normalizer) -> Self {
        let voter = SupermajorityVoter::new(config.min_sentence_chars);
        Self {
            config,
            normalizer,
            voter,
        }
    }

    /// Vote threshold for a number of surviving sources
    pub fn threshold_for(&self, survivors: usize) -> usize {
        if survivors >= self.config.supermajority_threshold {
            self.config.supermajority_threshold
        } else {
            self.config.fallback_threshold
        }
    }

    /// Run the full pipeline for one article
    ///
    /// # Arguments
    /// * `raw_extractions` - one entry per extractor, in any order
    /// * `metadata` - identity fields of the article
    /// * `url` - URL the article was fetched from (drives site rules)
    ///
    /// # Errors
    /// * `Error::InvalidMetadata` when the canonical URL is blank
    /// * `Error::NoSources` when `raw_extractions` is empty
    pub fn build(
        &self,
        raw_extractions: &[RawExtraction],
        metadata: &ArticleMetadata,
        url: &str,
    ) -> Result<FingerprintReport> {
        metadata.validate()?;
        if raw_extractions.is_empty() {
            return Err(Error::NoSources {
                url: url.to_string(),
            });
        }

        // Step 1: normalize
        let mut survivors: BTreeMap<String, String> = BTreeMap::new();
        let mut raw_word_counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut discarded = Vec::new();

        for raw in raw_extractions {
            match self.normalizer.normalize(raw, url) {
                NormalizeOutcome::Normalized(normalized) => {
                    if survivors.contains_key(&normalized.source_id) {
                        warn!(source = %normalized.source_id, "Duplicate source id, keeping first output");
                        continue;
                    }
                    raw_word_counts.insert(normalized.source_id.clone(), raw.text.word_count());
                    survivors.insert(normalized.source_id, normalized.text);
                }
                NormalizeOutcome::Discarded(reason) => {
                    debug!(source = %raw.source_id, reason = %reason, "Source discarded");
                    discarded.push(DiscardedSource {
                        source_id: raw.source_id.clone(),
                        reason,
                    });
                }
            }
        }

        // Step 2: threshold
        let threshold = self.threshold_for(survivors.len());

        // Step 3: vote
        let voting = self
            .voter
            .vote(&survivors, threshold, self.config.reference_source.as_deref());

        // Step 4: score
        let (similarities, agreement_score, confidence) =
            consensus::score_with_confidence(&survivors);

        // Step 5: hashes
        let (hashes, hash_groups) = group_by_hash(&survivors);
        let unique_hashes = hash_groups.len();

        let status = if survivors.is_empty() {
            warn!(url = %url, attempted = raw_extractions.len(), "No source survived normalization");
            RunStatus::Degraded
        } else {
            RunStatus::Complete
        };

        let record = FingerprintRecord {
            article_id: article_id(
                metadata,
                self.config.article_id_len,
                &self.config.missing_sentinel,
            ),
            content_hash: content_hash(&voting.reconstructed_text),
            confidence,
            agreement_score,
            word_count: word_count(&voting.reconstructed_text),
            extraction_method: format!(
                "supermajority_{}_of_{}_with_quirks",
                threshold,
                survivors.len()
            ),
        };

        let sources = survivors
            .iter()
            .map(|(source_id, text)| SourceDiagnostics {
                source_id: source_id.clone(),
                raw_word_count: raw_word_counts.get(source_id).copied().unwrap_or(0),
                normalized_word_count: word_count(text),
                hash: hashes.get(source_id).cloned().unwrap_or_default(),
                preview: preview(text, PREVIEW_CHARS),
            })
            .collect();

        let stats = ExtractionStats {
            attempted: raw_extractions.len(),
            succeeded: survivors.len(),
            discarded,
            unique_hashes_after_normalization: unique_hashes,
            hash_groups,
            threshold_description: format!("{}/{}", threshold, survivors.len()),
        };

        info!(
            article_id = %record.article_id,
            content_hash = %record.content_hash,
            method = %record.extraction_method,
            confidence = %record.confidence,
            agreement = agreement_score,
            words = record.word_count,
            "Fingerprint built"
        );

        Ok(FingerprintReport {
            record,
            status,
            url: url.to_string(),
            metadata: metadata.clone(),
            page: None,
            stats,
            sources,
            similarities,
            voting,
        })
    }

    /// Run the pipeline with metadata parsed from the page
    ///
    /// The article id comes from [`PageMetadata::identity`]; the full page
    /// metadata travels with the report.
    pub fn build_from_page(
        &self,
        raw_extractions: &[RawExtraction],
        page: &PageMetadata,
        url: &str,
    ) -> Result<FingerprintReport> {
        let mut report = self.build(raw_extractions, &page.identity(), url)?;
        report.page = Some(page.clone());
        Ok(report)
    }
}

/// First `max_chars` characters of `text`, with `...` when truncated
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConfidenceLevel, DiscardReason};

    const URL: &str = "https://example.com/news/budget";

    fn metadata() -> ArticleMetadata {
        ArticleMetadata::new(
            URL,
            Some("2026-01-15".to_string()),
            Some("Budget passes".to_string()),
        )
    }

    fn body(extra: &str) -> String {
        format!(
            "The city council approved the budget on Tuesday. \
             Members debated the plan for several hours. {}",
            extra
        )
    }

    #[test]
    fn test_threshold_selection() {
        let fingerprinter = Fingerprinter::default();
        assert_eq!(fingerprinter.threshold_for(0), 2);
        assert_eq!(fingerprinter.threshold_for(2), 2);
        assert_eq!(fingerprinter.threshold_for(3), 3);
        assert_eq!(fingerprinter.threshold_for(7), 3);
    }

    #[test]
    fn test_build_three_sources() {
        let raw = vec![
            RawExtraction::new("goose", body("A goose-only closing sentence here.")),
            RawExtraction::new("newspaper", body("")),
            RawExtraction::new("trafilatura", body("")),
        ];
        let report = Fingerprinter::default().build(&raw, &metadata(), URL).unwrap();

        assert_eq!(report.status, RunStatus::Complete);
        assert_eq!(report.record.extraction_method, "supermajority_3_of_3_with_quirks");
        assert_eq!(report.stats.threshold_description, "3/3");
        assert_eq!(
            report.voting.reconstructed_text,
            "The city council approved the budget on Tuesday.. \
             Members debated the plan for several hours."
        );
        assert_eq!(report.record.word_count, 15);
        assert_eq!(
            report.record.confidence,
            ConfidenceLevel::from_agreement(report.record.agreement_score)
        );
        assert_eq!(report.record.content_hash, content_hash(&report.voting.reconstructed_text));
        assert_eq!(report.record.article_id.len(), 16);
        assert_eq!(report.stats.unique_hashes_after_normalization, 2);
        assert_eq!(
            report.stats.hash_groups,
            vec![
                vec!["goose".to_string()],
                vec!["newspaper".to_string(), "trafilatura".to_string()],
            ]
        );
        assert_eq!(report.similarities.len(), 3);
        assert_eq!(report.sources.len(), 3);
    }

    #[test]
    fn test_error_markers_counted_not_fatal() {
        let raw = vec![
            RawExtraction::new("goose", body("")),
            RawExtraction::new("newspaper", "ERROR: download failed"),
            RawExtraction::new("trafilatura", body("")),
        ];
        let report = Fingerprinter::default().build(&raw, &metadata(), URL).unwrap();

        assert_eq!(report.stats.attempted, 3);
        assert_eq!(report.stats.succeeded, 2);
        assert_eq!(report.stats.unavailable().count(), 1);
        assert_eq!(report.record.extraction_method, "supermajority_2_of_2_with_quirks");
        assert!(!report.voting.reconstructed_text.contains("ERROR"));
        assert!(report.sources.iter().all(|s| s.source_id != "newspaper"));
    }

    #[test]
    fn test_no_raw_extractions_is_fatal() {
        let result = Fingerprinter::default().build(&[], &metadata(), URL);
        assert!(matches!(result, Err(Error::NoSources { .. })));
    }

    #[test]
    fn test_blank_canonical_url_is_fatal() {
        let raw = vec![RawExtraction::new("goose", body(""))];
        let metadata = ArticleMetadata::new("", None, None);
        let result = Fingerprinter::default().build(&raw, &metadata, URL);
        assert!(matches!(result, Err(Error::InvalidMetadata(_))));
    }

    #[test]
    fn test_all_sources_discarded_is_degraded() {
        let raw = vec![
            RawExtraction::new("goose", "ERROR: timeout"),
            RawExtraction::new("newspaper", "   "),
        ];
        let report = Fingerprinter::default().build(&raw, &metadata(), URL).unwrap();

        assert_eq!(report.status, RunStatus::Degraded);
        assert_eq!(report.record.word_count, 0);
        assert_eq!(report.record.agreement_score, 0.0);
        assert_eq!(report.record.confidence, ConfidenceLevel::Low);
        assert_eq!(report.record.content_hash, content_hash(""));
        assert_eq!(report.record.extraction_method, "supermajority_2_of_0_with_quirks");
        assert_eq!(report.voting.total_unique_sentences, 0);
        assert_eq!(report.stats.discarded[1].reason, DiscardReason::Empty);
    }

    #[test]
    fn test_build_from_page_keeps_page_metadata() {
        let page = PageMetadata {
            url: URL.to_string(),
            canonical_url: URL.to_string(),
            title: Some("Budget passes".to_string()),
            authors: vec!["Ana Ruiz".to_string()],
            publish_date: Some("2026-01-15".to_string()),
            modified_date: Some("2026-01-16".to_string()),
            has_schema_org: true,
            has_opengraph: false,
            has_canonical: true,
        };
        let raw = vec![RawExtraction::new("goose", body(""))];
        let fingerprinter = Fingerprinter::default();

        let from_page = fingerprinter.build_from_page(&raw, &page, URL).unwrap();
        let from_identity = fingerprinter.build(&raw, &metadata(), URL).unwrap();

        assert_eq!(from_page.record, from_identity.record);
        assert_eq!(from_page.metadata, metadata());
        assert_eq!(from_page.page.as_ref(), Some(&page));
        assert!(from_identity.page.is_none());
    }

    #[test]
    fn test_raw_word_count_in_diagnostics() {
        let raw = vec![
            RawExtraction::new("goose", "One two three four five six seven eight nine ten."),
            RawExtraction::new("newspaper", "One two three four five six seven eight nine ten."),
        ];
        let report = Fingerprinter::default().build(&raw, &metadata(), URL).unwrap();
        assert_eq!(report.sources[0].raw_word_count, 10);
        assert_eq!(report.sources[0].normalized_word_count, 10);
        assert_eq!(report.stats.unique_hashes_after_normalization, 1);
    }

    #[test]
    fn test_duplicate_source_id_keeps_first() {
        let raw = vec![
            RawExtraction::new("goose", body("")),
            RawExtraction::new("goose", "Completely different text from a second run."),
        ];
        let report = Fingerprinter::default().build(&raw, &metadata(), URL).unwrap();
        assert_eq!(report.stats.succeeded, 1);
        assert!(report.sources[0].preview.starts_with("The city council"));
    }

    #[test]
    fn test_preview_truncation() {
        assert_eq!(preview("short", 200), "short");
        assert_eq!(preview("abcdef", 3), "abc...");
        assert_eq!(preview("ééé", 2), "éé...");
    }
}
