//! Core Types for the Consensus Fingerprinting Pipeline
//!
//! Defines the data contracts passed between the pipeline stages:
//! - **Extractor boundary:** `RawExtraction` / `RawText`
//! - **Normalizer:** `NormalizedText`, `NormalizeOutcome`, `DiscardReason`
//! - **Voter / Scorer:** `VotingResult`, `PairwiseSimilarity`, `ConfidenceLevel`
//! - **Builder:** `FingerprintRecord` and the diagnostic `FingerprintReport`
//!
//! All types are immutable once built and serialize with `serde`.

use crate::metadata::PageMetadata;
use afp_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Prefix marking an extractor output as "no output"
pub const ERROR_MARKER_PREFIX: &str = "ERROR:";

// ============================================================================
// Extractor Boundary
// ============================================================================

/// Text returned by one extractor, or the reason it produced none
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RawText {
    Text(String),
    Unavailable(String),
}

impl RawText {
    /// Interpret an extractor's string output
    ///
    /// Any string beginning with `ERROR:` is an error marker, never content.
    pub fn from_output(output: impl Into<String>) -> Self {
        let output = output.into();
        match output.strip_prefix(ERROR_MARKER_PREFIX) {
            Some(reason) => RawText::Unavailable(reason.trim().to_string()),
            None => RawText::Text(output),
        }
    }

    /// Whitespace-delimited word count (0 when unavailable)
    pub fn word_count(&self) -> usize {
        match self {
            RawText::Text(text) => word_count(text),
            RawText::Unavailable(_) => 0,
        }
    }
}

/// Output of one extractor for one article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawExtraction {
    pub source_id: String,
    pub text: RawText,
}

impl RawExtraction {
    /// Build from an extractor's raw string output (error markers recognized)
    pub fn new(source_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            text: RawText::from_output(output),
        }
    }

    /// Build an explicitly unavailable extraction
    pub fn unavailable(source_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            text: RawText::Unavailable(reason.into()),
        }
    }
}

// ============================================================================
// Normalizer Outputs
// ============================================================================

/// Text of one source after all three normalization layers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedText {
    pub source_id: String,
    pub text: String,
}

/// Why a source was dropped before consensus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiscardReason {
    /// The extractor produced an error marker
    SourceUnavailable { reason: String },
    /// A site rule vetoed the text for this URL
    SiteRule { rule: String },
    /// Nothing was left after normalization
    Empty,
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscardReason::SourceUnavailable { reason } => {
                write!(f, "source unavailable: {}", reason)
            }
            DiscardReason::SiteRule { rule } => write!(f, "discarded by site rule '{}'", rule),
            DiscardReason::Empty => write!(f, "empty after normalization"),
        }
    }
}

/// Result of normalizing one raw extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizeOutcome {
    Normalized(NormalizedText),
    Discarded(DiscardReason),
}

impl NormalizeOutcome {
    /// Normalized text, if the source survived
    pub fn into_normalized(self) -> Option<NormalizedText> {
        match self {
            NormalizeOutcome::Normalized(text) => Some(text),
            NormalizeOutcome::Discarded(_) => None,
        }
    }

    pub fn is_discarded(&self) -> bool {
        matches!(self, NormalizeOutcome::Discarded(_))
    }
}

// ============================================================================
// Voter and Scorer Outputs
// ============================================================================

/// Outcome of supermajority sentence voting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingResult {
    /// Kept sentences joined into the canonical text
    pub reconstructed_text: String,
    /// Every distinct sentence, bucketed by how many sources produced it
    pub sentences_by_vote_count: BTreeMap<usize, Vec<String>>,
    pub total_unique_sentences: usize,
    pub sentences_kept: usize,
    pub threshold: usize,
}

impl VotingResult {
    /// Result for a run with nothing to vote on
    pub fn empty(threshold: usize) -> Self {
        Self {
            reconstructed_text: String::new(),
            sentences_by_vote_count: BTreeMap::new(),
            total_unique_sentences: 0,
            sentences_kept: 0,
            threshold,
        }
    }
}

/// Similarity of the full normalized texts of two sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairwiseSimilarity {
    pub source_a: String,
    pub source_b: String,
    /// Matching-block similarity ratio in [0, 1]
    pub ratio: f64,
    pub word_count_a: usize,
    pub word_count_b: usize,
}

/// Descriptive label for the mean pairwise agreement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    VeryHigh,
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    /// Step function over the agreement score
    ///
    /// - `> 0.95` very high
    /// - `> 0.90` high
    /// - `> 0.80` medium
    /// - otherwise low
    pub fn from_agreement(score: f64) -> Self {
        if score > 0.95 {
            ConfidenceLevel::VeryHigh
        } else if score > 0.90 {
            ConfidenceLevel::High
        } else if score > 0.80 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::VeryHigh => "very_high",
            ConfidenceLevel::High => "high",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::Low => "low",
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Fingerprint Outputs
// ============================================================================

/// Identity fields supplied by the metadata collaborator
///
/// `canonical_url` is required; absent optional values are rendered as a
/// sentinel when hashing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleMetadata {
    pub canonical_url: String,
    #[serde(default)]
    pub publish_date: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl ArticleMetadata {
    pub fn new(
        canonical_url: impl Into<String>,
        publish_date: Option<String>,
        title: Option<String>,
    ) -> Self {
        Self {
            canonical_url: canonical_url.into(),
            publish_date,
            title,
        }
    }

    /// Reject metadata that cannot identify an article
    ///
    /// # Errors
    /// Returns `Error::InvalidMetadata` when the canonical URL is blank
    pub fn validate(&self) -> Result<()> {
        if self.canonical_url.trim().is_empty() {
            return Err(Error::InvalidMetadata(
                "canonical_url is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Terminal output of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FingerprintRecord {
    pub article_id: String,
    pub content_hash: String,
    pub confidence: ConfidenceLevel,
    pub agreement_score: f64,
    pub word_count: usize,
    pub extraction_method: String,
}

/// Whether the run had any source left to build consensus from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Complete,
    /// No source survived normalization; content fields are empty
    Degraded,
}

/// Per-source diagnostics for a surviving source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDiagnostics {
    pub source_id: String,
    pub raw_word_count: usize,
    pub normalized_word_count: usize,
    /// SHA-256 of the normalized text
    pub hash: String,
    pub preview: String,
}

/// A source excluded from consensus, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscardedSource {
    pub source_id: String,
    pub reason: DiscardReason,
}

/// Extraction statistics for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub attempted: usize,
    pub succeeded: usize,
    pub discarded: Vec<DiscardedSource>,
    pub unique_hashes_after_normalization: usize,
    /// Surviving sources grouped by identical normalized text
    pub hash_groups: Vec<Vec<String>>,
    /// `"{threshold}/{survivors}"`
    pub threshold_description: String,
}

impl ExtractionStats {
    /// Sources that produced an error marker
    pub fn unavailable(&self) -> impl Iterator<Item = &DiscardedSource> {
        self.discarded
            .iter()
            .filter(|d| matches!(d.reason, DiscardReason::SourceUnavailable { .. }))
    }

    /// Sources vetoed by a site rule
    pub fn vetoed(&self) -> impl Iterator<Item = &DiscardedSource> {
        self.discarded
            .iter()
            .filter(|d| matches!(d.reason, DiscardReason::SiteRule { .. }))
    }
}

/// Fingerprint record plus everything needed to explain it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FingerprintReport {
    pub record: FingerprintRecord,
    pub status: RunStatus,
    pub url: String,
    /// Identity fields behind `record.article_id`
    pub metadata: ArticleMetadata,
    /// Full page metadata, when the identity was parsed from the page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<PageMetadata>,
    pub stats: ExtractionStats,
    pub sources: Vec<SourceDiagnostics>,
    pub similarities: Vec<PairwiseSimilarity>,
    pub voting: VotingResult,
}

/// Whitespace-delimited word count
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
