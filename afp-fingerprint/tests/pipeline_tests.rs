//! End-to-end tests of the fingerprint pipeline over raw extractor outputs

use afp_common::{Error, PipelineConfig};
use afp_fingerprint::hashing::content_hash;
use afp_fingerprint::types::DiscardReason;
use afp_fingerprint::{ArticleMetadata, Fingerprinter, RawExtraction, RunStatus};

const URL: &str = "https://www.example.com/2026/01/15/city-budget";

const BODY: &str = "The city council approved the budget on Tuesday night. \
    Members debated the spending plan for several hours. \
    The mayor called the vote a victory for residents.";

/// BODY's sentences as the voter joins them
const RECONSTRUCTED: &str = "The city council approved the budget on Tuesday night.. \
    Members debated the spending plan for several hours.. \
    The mayor called the vote a victory for residents.";

fn metadata() -> ArticleMetadata {
    ArticleMetadata::new(
        URL,
        Some("2026-01-15".to_string()),
        Some("City passes budget".to_string()),
    )
}

fn four_sources() -> Vec<RawExtraction> {
    vec![
        // stray spacing and a wire photo credit
        RawExtraction::new(
            "goose",
            "The city council approved the budget on Tuesday night .  \
             Members debated the spending plan for several hours. \
             The mayor called the vote a victory for residents. (AP Photo/Jane Doe)",
        ),
        RawExtraction::new(
            "newspaper",
            "Jan. 15, 2026 5:00 PM ET The city council approved the budget on Tuesday night. \
             Members debated the spending plan for several hours. \
             The mayor called the vote a victory for residents.",
        ),
        RawExtraction::new("readability", BODY),
        RawExtraction::new(
            "trafilatura",
            "The city council approved the budget on Tuesday night. \
             Members debated the spending plan for several hours. \
             Subscribe to our newsletter for daily updates.",
        ),
    ]
}

#[test]
fn test_pipeline_determinism() {
    let fingerprinter = Fingerprinter::default();
    let first = fingerprinter.build(&four_sources(), &metadata(), URL).unwrap();
    let second = fingerprinter.build(&four_sources(), &metadata(), URL).unwrap();
    assert_eq!(first, second);

    let mut reversed = four_sources();
    reversed.reverse();
    let third = fingerprinter.build(&reversed, &metadata(), URL).unwrap();
    assert_eq!(first.record, third.record);
    assert_eq!(first.voting, third.voting);
}

#[test]
fn test_three_of_four_consensus() {
    let report = Fingerprinter::default().build(&four_sources(), &metadata(), URL).unwrap();

    assert_eq!(report.status, RunStatus::Complete);
    assert_eq!(report.record.extraction_method, "supermajority_3_of_4_with_quirks");
    assert_eq!(report.voting.reconstructed_text, RECONSTRUCTED);
    assert!(!report.voting.reconstructed_text.contains("newsletter"));
    assert_eq!(report.record.content_hash, content_hash(RECONSTRUCTED));
    assert_eq!(report.record.word_count, 26);
    // goose, newspaper and readability agree after normalization
    assert_eq!(report.stats.unique_hashes_after_normalization, 2);
    assert_eq!(report.similarities.len(), 6);
}

#[test]
fn test_hash_stability_across_runs() {
    let a = Fingerprinter::default().build(&four_sources(), &metadata(), URL).unwrap();
    let b = Fingerprinter::default().build(&four_sources(), &metadata(), URL).unwrap();
    assert_eq!(a.record.article_id, b.record.article_id);
    assert_eq!(a.record.content_hash, b.record.content_hash);
    assert_eq!(a.record.article_id.len(), 16);
    assert_eq!(a.record.content_hash.len(), 64);
}

#[test]
fn test_article_id_independent_of_content() {
    let fingerprinter = Fingerprinter::default();
    let full = fingerprinter.build(&four_sources(), &metadata(), URL).unwrap();
    let partial = fingerprinter
        .build(&four_sources()[..2], &metadata(), URL)
        .unwrap();
    assert_eq!(full.record.article_id, partial.record.article_id);
}

#[test]
fn test_curly_quotes_scenario() {
    let raw = vec![
        RawExtraction::new("a", "She said \u{201C}Hello\u{201D} to the assembled crowd."),
        RawExtraction::new("b", "She said \"Hello\" to the assembled crowd."),
    ];
    let report = Fingerprinter::default().build(&raw, &metadata(), URL).unwrap();
    assert_eq!(
        report.voting.reconstructed_text,
        "She said \"Hello\" to the assembled crowd."
    );
    assert!(report.voting.reconstructed_text.is_ascii());
    assert_eq!(report.stats.unique_hashes_after_normalization, 1);
    assert_eq!(report.record.agreement_score, 1.0);
}

#[test]
fn test_error_marker_excluded() {
    let mut raw = four_sources();
    raw[3] = RawExtraction::new("trafilatura", "ERROR: HTTP 403");
    let report = Fingerprinter::default().build(&raw, &metadata(), URL).unwrap();

    assert_eq!(report.stats.attempted, 4);
    assert_eq!(report.stats.succeeded, 3);
    assert_eq!(report.stats.unavailable().count(), 1);
    assert_eq!(report.stats.threshold_description, "3/3");
    assert!(report.sources.iter().all(|s| s.source_id != "trafilatura"));
    assert!(!report.voting.reconstructed_text.contains("ERROR"));
}

#[test]
fn test_live_blog_vetoed() {
    let url = "https://www.cnn.com/politics/live-news/election-results";
    let metadata = ArticleMetadata::new(url, None, None);
    let report = Fingerprinter::default().build(&four_sources(), &metadata, url).unwrap();

    assert_eq!(report.status, RunStatus::Degraded);
    assert_eq!(report.stats.vetoed().count(), 4);
    assert!(report.stats.discarded.iter().all(|d| d.reason
        == DiscardReason::SiteRule {
            rule: "cnn_live_blog".to_string()
        }));
    assert_eq!(report.voting.reconstructed_text, "");
    assert_eq!(report.record.content_hash, content_hash(""));
}

#[test]
fn test_single_source_keeps_nothing() {
    let raw = vec![RawExtraction::new("readability", BODY)];
    let report = Fingerprinter::default().build(&raw, &metadata(), URL).unwrap();

    assert_eq!(report.status, RunStatus::Complete);
    assert_eq!(report.record.extraction_method, "supermajority_2_of_1_with_quirks");
    assert_eq!(report.voting.reconstructed_text, "");
    assert_eq!(report.voting.total_unique_sentences, 3);
    assert_eq!(report.record.agreement_score, 0.0);
    assert!(report.similarities.is_empty());
}

#[test]
fn test_threshold_three_with_single_source_config() {
    let config = PipelineConfig {
        fallback_threshold: 3,
        ..Default::default()
    };
    let raw = vec![RawExtraction::new("readability", BODY)];
    let report = Fingerprinter::new(config).build(&raw, &metadata(), URL).unwrap();
    assert_eq!(report.voting.threshold, 3);
    assert_eq!(report.voting.sentences_kept, 0);
}

#[test]
fn test_reference_source_from_config() {
    let raw = vec![
        RawExtraction::new("a", "First sentence is right here. Second sentence is right here."),
        RawExtraction::new("b", "Second sentence is right here. First sentence is right here."),
    ];
    let config = PipelineConfig {
        reference_source: Some("b".to_string()),
        ..Default::default()
    };
    let report = Fingerprinter::new(config).build(&raw, &metadata(), URL).unwrap();
    assert_eq!(
        report.voting.reconstructed_text,
        "Second sentence is right here.. First sentence is right here."
    );
}

#[test]
fn test_fatal_errors() {
    let fingerprinter = Fingerprinter::default();
    assert!(matches!(
        fingerprinter.build(&[], &metadata(), URL),
        Err(Error::NoSources { .. })
    ));
    assert!(matches!(
        fingerprinter.build(&four_sources(), &ArticleMetadata::new(" ", None, None), URL),
        Err(Error::InvalidMetadata(_))
    ));
}

#[test]
fn test_report_serializes_to_json() {
    let report = Fingerprinter::default().build(&four_sources(), &metadata(), URL).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["record"]["confidence"], report.record.confidence.as_str());
    assert_eq!(json["status"], "complete");
    assert_eq!(json["stats"]["attempted"], 4);
}
