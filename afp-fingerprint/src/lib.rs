//! afp-fingerprint - consensus article fingerprinting
//!
//! Derives a stable identity (`article_id`) and content hash (`content_hash`)
//! for a news article from several independent text extractions of the same
//! HTML. Pipeline: normalize -> vote + score -> hash.
//!
//! Collaborators around the pure core: HTML extractors, the metadata parser
//! and report rendering.

pub mod consensus;
pub mod extractors;
pub mod fingerprint;
pub mod hashing;
pub mod metadata;
pub mod normalize;
pub mod report;
pub mod types;
pub mod voting;

pub use fingerprint::Fingerprinter;
pub use metadata::{extract_metadata, PageMetadata};
pub use normalize::Normalizer;
pub use types::{
    ArticleMetadata, ConfidenceLevel, FingerprintRecord, FingerprintReport, RawExtraction,
    RunStatus, VotingResult,
};
pub use voting::SupermajorityVoter;

use afp_common::{AfpConfig, Result};

/// Fingerprint a page with the configured built-in extractors
///
/// Extractors run concurrently on the blocking pool; metadata comes from the
/// page itself and is carried in full on the report.
///
/// # Errors
/// * `Error::Config` if the config names an unknown extractor
/// * Any error of [`Fingerprinter::build`]
pub async fn fingerprint_html(
    html: &str,
    url: &str,
    config: &AfpConfig,
) -> Result<FingerprintReport> {
    let extractors = extractors::builtin_extractors(&config.extractors.enabled)?;
    let raw = extractors::run_extractors_concurrently(&extractors, html, url).await;
    let page = extract_metadata(html, url);
    Fingerprinter::new(config.pipeline.clone()).build_from_page(&raw, &page, url)
}
