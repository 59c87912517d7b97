//! Human-readable fingerprint reports (Markdown and standalone HTML)
//!
//! Sections: fingerprint, metadata, extraction statistics, hash groups,
//! per-source table, pairwise similarities, vote-count breakdown, final text.
//! The vote breakdown lists the first five sentences per bucket, cut to 80
//! characters.

use crate::fingerprint::preview;
use crate::metadata::PageMetadata;
use crate::types::{ConfidenceLevel, FingerprintReport, RunStatus};
use chrono::{DateTime, Utc};
use std::fmt::Write;

/// Sentences listed per vote-count bucket
const SENTENCES_PER_BUCKET: usize = 5;

/// Characters shown per listed sentence
const SENTENCE_PREVIEW_CHARS: usize = 80;

/// Characters of the per-source preview shown in tables
const TABLE_PREVIEW_CHARS: usize = 100;

/// Hex characters of a per-source hash shown in tables
const TABLE_HASH_CHARS: usize = 16;

fn percent(ratio: f64) -> String {
    format!("{:.2}%", ratio * 100.0)
}

fn short_hash(hash: &str) -> &str {
    &hash[..hash.len().min(TABLE_HASH_CHARS)]
}

fn or_not_found(value: Option<&str>) -> &str {
    value.unwrap_or("Not found")
}

fn authors(page: &PageMetadata) -> String {
    if page.authors.is_empty() {
        "None".to_string()
    } else {
        page.authors.join(", ")
    }
}

fn check(present: bool) -> &'static str {
    if present {
        "\u{2713}"
    } else {
        "\u{2717}"
    }
}

// ============================================================================
// Markdown
// ============================================================================

/// Render a report as Markdown
pub fn render_markdown(report: &FingerprintReport, generated_at: DateTime<Utc>) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_markdown(&mut out, report, generated_at);
    out
}

fn write_markdown(
    out: &mut String,
    report: &FingerprintReport,
    generated_at: DateTime<Utc>,
) -> std::fmt::Result {
    let record = &report.record;
    let stats = &report.stats;

    writeln!(out, "# Article Fingerprint Report\n")?;
    if report.status == RunStatus::Degraded {
        writeln!(
            out,
            "> **Degraded run:** no extraction survived normalization; content fields are empty.\n"
        )?;
    }

    writeln!(out, "## Primary Fingerprint\n")?;
    writeln!(out, "- **Article ID:** `{}`", record.article_id)?;
    writeln!(out, "- **Content Hash:** `{}`", record.content_hash)?;
    writeln!(
        out,
        "- **Confidence:** {}",
        record.confidence.as_str().to_uppercase()
    )?;
    writeln!(out, "- **Agreement Score:** {}", percent(record.agreement_score))?;
    writeln!(out, "- **Word Count:** {} words", record.word_count)?;
    writeln!(out, "- **Method:** {}\n", record.extraction_method)?;

    writeln!(out, "## Metadata\n")?;
    writeln!(out, "- **URL:** {}", report.url)?;
    writeln!(out, "- **Canonical:** {}", report.metadata.canonical_url)?;
    writeln!(
        out,
        "- **Title:** {}",
        or_not_found(report.metadata.title.as_deref())
    )?;
    writeln!(
        out,
        "- **Published:** {}",
        or_not_found(report.metadata.publish_date.as_deref())
    )?;
    if let Some(page) = &report.page {
        writeln!(out, "- **Authors:** {}", authors(page))?;
        writeln!(
            out,
            "- **Modified:** {}",
            or_not_found(page.modified_date.as_deref())
        )?;
        writeln!(out, "- **Schema.org:** {}", check(page.has_schema_org))?;
        writeln!(out, "- **Open Graph:** {}", check(page.has_opengraph))?;
        writeln!(out, "- **Canonical Tag:** {}", check(page.has_canonical))?;
    }
    writeln!(out)?;

    writeln!(out, "## Extraction Statistics\n")?;
    writeln!(
        out,
        "- Extractors successful: {}/{}",
        stats.succeeded, stats.attempted
    )?;
    writeln!(
        out,
        "- Unique hashes (after normalization): {}",
        stats.unique_hashes_after_normalization
    )?;
    writeln!(
        out,
        "- Identical outputs: {}",
        stats.succeeded - stats.unique_hashes_after_normalization
    )?;
    writeln!(out, "- Supermajority threshold: {}", stats.threshold_description)?;
    for discarded in &stats.discarded {
        writeln!(out, "- Discarded `{}`: {}", discarded.source_id, discarded.reason)?;
    }

    writeln!(out, "\n### Hash Groups (After Normalization)\n")?;
    for (i, group) in stats.hash_groups.iter().enumerate() {
        writeln!(out, "{}. {}", i + 1, group.join(", "))?;
    }

    writeln!(out, "\n## Individual Extractions\n")?;
    writeln!(out, "| Source | Raw Words | Normalized Words | Hash | Preview |")?;
    writeln!(out, "|--------|-----------|------------------|------|---------|")?;
    for source in &report.sources {
        writeln!(
            out,
            "| {} | {} | {} | `{}...` | {} |",
            source.source_id,
            source.raw_word_count,
            source.normalized_word_count,
            short_hash(&source.hash),
            preview(&source.preview, TABLE_PREVIEW_CHARS).replace('|', "\\|")
        )?;
    }

    writeln!(out, "\n## Pairwise Similarities\n")?;
    writeln!(out, "| Source 1 | Source 2 | Similarity | Words 1 | Words 2 | Difference |")?;
    writeln!(out, "|----------|----------|------------|---------|---------|------------|")?;
    for sim in &report.similarities {
        writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} |",
            sim.source_a,
            sim.source_b,
            percent(sim.ratio),
            sim.word_count_a,
            sim.word_count_b,
            sim.word_count_a.abs_diff(sim.word_count_b)
        )?;
    }

    writeln!(out, "\n## Supermajority Voting\n")?;
    for (votes, sentences) in report.voting.sentences_by_vote_count.iter().rev() {
        writeln!(
            out,
            "### {}/{} Sources ({} sentences)\n",
            votes,
            stats.succeeded,
            sentences.len()
        )?;
        for sentence in sentences.iter().take(SENTENCES_PER_BUCKET) {
            writeln!(out, "- {}", preview(sentence, SENTENCE_PREVIEW_CHARS))?;
        }
        if sentences.len() > SENTENCES_PER_BUCKET {
            writeln!(
                out,
                "- *... and {} more*",
                sentences.len() - SENTENCES_PER_BUCKET
            )?;
        }
        writeln!(out)?;
    }

    writeln!(out, "## Final Supermajority Extraction\n")?;
    writeln!(out, "- **Threshold:** {} sources", report.voting.threshold)?;
    writeln!(
        out,
        "- **Sentences kept:** {}/{}",
        report.voting.sentences_kept, report.voting.total_unique_sentences
    )?;
    writeln!(out, "- **Word Count:** {} words", record.word_count)?;
    writeln!(out, "- **Hash:** `{}`\n", record.content_hash)?;
    writeln!(out, "### Content\n")?;
    writeln!(out, "{}\n", report.voting.reconstructed_text)?;
    writeln!(out, "---\n")?;
    writeln!(out, "*Generated: {}*", generated_at.to_rfc3339())?;

    Ok(())
}

// ============================================================================
// HTML
// ============================================================================

const HTML_STYLE: &str = "\
body{font-family:-apple-system,'Segoe UI',Arial,sans-serif;max-width:1200px;margin:40px auto;padding:20px;background:#f5f5f5}
.container{background:white;border-radius:8px;padding:30px;box-shadow:0 2px 4px rgba(0,0,0,0.1)}
h1{color:#333;border-bottom:3px solid #007bff;padding-bottom:10px}
h2{color:#555;margin-top:30px;border-bottom:2px solid #e0e0e0;padding-bottom:8px}
.box{background:#f8f9fa;border-left:4px solid #007bff;padding:20px;margin:20px 0;border-radius:4px}
.label{font-weight:bold;color:#555;display:inline-block;width:180px}
.badge{display:inline-block;padding:4px 12px;border-radius:12px;color:white;font-weight:bold;text-transform:uppercase}
.degraded{background:#fff3cd;border-left:4px solid #dc3545;padding:12px}
table{width:100%;border-collapse:collapse;margin:20px 0}
th{background:#007bff;color:white;padding:12px;text-align:left}
td{padding:10px;border-bottom:1px solid #e0e0e0}
.hash{font-family:'Courier New',monospace;color:#666}
.group{background:#e7f3ff;padding:8px 12px;margin:5px 0;border-radius:4px}
";

/// Escape text for inclusion in HTML content or attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn confidence_color(confidence: ConfidenceLevel) -> &'static str {
    match confidence {
        ConfidenceLevel::VeryHigh => "#28a745",
        ConfidenceLevel::High => "#5cb85c",
        ConfidenceLevel::Medium => "#ffc107",
        ConfidenceLevel::Low => "#dc3545",
    }
}

fn similarity_color(ratio: f64) -> &'static str {
    if ratio > 0.95 {
        "green"
    } else if ratio > 0.80 {
        "orange"
    } else {
        "red"
    }
}

/// Render a report as a standalone HTML page
///
/// All text taken from the article or its sources is escaped.
pub fn render_html(report: &FingerprintReport, generated_at: DateTime<Utc>) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_html(&mut out, report, generated_at);
    out
}

fn write_html(
    out: &mut String,
    report: &FingerprintReport,
    generated_at: DateTime<Utc>,
) -> std::fmt::Result {
    let record = &report.record;
    let stats = &report.stats;
    let e = escape_html;

    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(
        out,
        "<html><head><meta charset=\"UTF-8\"><title>Article Fingerprint Report</title>"
    )?;
    writeln!(out, "<style>\n{}</style></head>", HTML_STYLE)?;
    writeln!(out, "<body><div class=\"container\">")?;
    writeln!(out, "<h1>Article Fingerprint Report</h1>")?;
    if report.status == RunStatus::Degraded {
        writeln!(
            out,
            "<p class=\"degraded\">Degraded run: no extraction survived normalization.</p>"
        )?;
    }

    writeln!(out, "<div class=\"box\"><h3>Primary Fingerprint</h3>")?;
    writeln!(
        out,
        "<div><span class=\"label\">Article ID:</span><span class=\"hash\">{}</span></div>",
        e(&record.article_id)
    )?;
    writeln!(
        out,
        "<div><span class=\"label\">Content Hash:</span><span class=\"hash\">{}</span></div>",
        e(&record.content_hash)
    )?;
    writeln!(
        out,
        "<div><span class=\"label\">Confidence:</span><span class=\"badge\" style=\"background-color:{};\">{}</span></div>",
        confidence_color(record.confidence),
        record.confidence
    )?;
    writeln!(
        out,
        "<div><span class=\"label\">Agreement Score:</span><span>{}</span></div>",
        percent(record.agreement_score)
    )?;
    writeln!(
        out,
        "<div><span class=\"label\">Word Count:</span><span>{} words</span></div>",
        record.word_count
    )?;
    writeln!(
        out,
        "<div><span class=\"label\">Method:</span><span>{}</span></div></div>",
        e(&record.extraction_method)
    )?;

    writeln!(out, "<h2>Metadata</h2><div class=\"box\">")?;
    writeln!(out, "<div><span class=\"label\">URL:</span> {}</div>", e(&report.url))?;
    writeln!(
        out,
        "<div><span class=\"label\">Canonical:</span> {}</div>",
        e(&report.metadata.canonical_url)
    )?;
    writeln!(
        out,
        "<div><span class=\"label\">Title:</span> {}</div>",
        e(or_not_found(report.metadata.title.as_deref()))
    )?;
    writeln!(
        out,
        "<div><span class=\"label\">Published:</span> {}</div>",
        e(or_not_found(report.metadata.publish_date.as_deref()))
    )?;
    if let Some(page) = &report.page {
        writeln!(
            out,
            "<div><span class=\"label\">Authors:</span> {}</div>",
            e(&authors(page))
        )?;
        writeln!(
            out,
            "<div><span class=\"label\">Modified:</span> {}</div>",
            e(or_not_found(page.modified_date.as_deref()))
        )?;
        writeln!(
            out,
            "<div><span class=\"label\">Schema.org:</span> {} &middot; \
             <span class=\"label\">Open Graph:</span> {} &middot; \
             <span class=\"label\">Canonical Tag:</span> {}</div>",
            check(page.has_schema_org),
            check(page.has_opengraph),
            check(page.has_canonical)
        )?;
    }
    writeln!(out, "</div>")?;

    writeln!(out, "<h2>Extraction Statistics</h2>")?;
    writeln!(
        out,
        "<p>Extractors successful: {}/{} &middot; Unique hashes: {} &middot; Threshold: {}</p>",
        stats.succeeded,
        stats.attempted,
        stats.unique_hashes_after_normalization,
        e(&stats.threshold_description)
    )?;
    if !stats.discarded.is_empty() {
        writeln!(out, "<ul>")?;
        for discarded in &stats.discarded {
            writeln!(
                out,
                "<li>Discarded {}: {}</li>",
                e(&discarded.source_id),
                e(&discarded.reason.to_string())
            )?;
        }
        writeln!(out, "</ul>")?;
    }
    writeln!(out, "<h3>Hash Groups</h3>")?;
    for (i, group) in stats.hash_groups.iter().enumerate() {
        writeln!(
            out,
            "<div class=\"group\">Group {}: {}</div>",
            i + 1,
            e(&group.join(", "))
        )?;
    }

    writeln!(out, "<h2>Individual Extractions</h2>")?;
    writeln!(
        out,
        "<table><tr><th>Source</th><th>Raw Words</th><th>Normalized Words</th><th>Hash</th><th>Preview</th></tr>"
    )?;
    for source in &report.sources {
        writeln!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td class=\"hash\">{}...</td><td>{}</td></tr>",
            e(&source.source_id),
            source.raw_word_count,
            source.normalized_word_count,
            e(short_hash(&source.hash)),
            e(&source.preview)
        )?;
    }
    writeln!(out, "</table>")?;

    writeln!(out, "<h2>Pairwise Similarities</h2>")?;
    writeln!(
        out,
        "<table><tr><th>Source 1</th><th>Source 2</th><th>Similarity</th><th>Words 1</th><th>Words 2</th><th>Difference</th></tr>"
    )?;
    for sim in &report.similarities {
        writeln!(
            out,
            "<tr><td>{}</td><td>{}</td><td style=\"color:{};font-weight:bold;\">{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            e(&sim.source_a),
            e(&sim.source_b),
            similarity_color(sim.ratio),
            percent(sim.ratio),
            sim.word_count_a,
            sim.word_count_b,
            sim.word_count_a.abs_diff(sim.word_count_b)
        )?;
    }
    writeln!(out, "</table>")?;

    writeln!(out, "<h2>Supermajority Voting</h2>")?;
    for (votes, sentences) in report.voting.sentences_by_vote_count.iter().rev() {
        writeln!(
            out,
            "<h4>{}/{} Sources ({} sentences)</h4>\n<ul>",
            votes,
            stats.succeeded,
            sentences.len()
        )?;
        for sentence in sentences.iter().take(SENTENCES_PER_BUCKET) {
            writeln!(out, "<li>{}</li>", e(&preview(sentence, SENTENCE_PREVIEW_CHARS)))?;
        }
        if sentences.len() > SENTENCES_PER_BUCKET {
            writeln!(
                out,
                "<li><em>... and {} more</em></li>",
                sentences.len() - SENTENCES_PER_BUCKET
            )?;
        }
        writeln!(out, "</ul>")?;
    }

    writeln!(out, "<div class=\"box\"><h3>Final Supermajority Extraction</h3>")?;
    writeln!(
        out,
        "<p><strong>Word Count:</strong> {} words</p>",
        record.word_count
    )?;
    writeln!(
        out,
        "<p style=\"white-space:pre-wrap\">{}</p></div>",
        e(&report.voting.reconstructed_text)
    )?;
    writeln!(
        out,
        "<p style=\"text-align:center;color:#999\">Generated: {}</p>",
        generated_at.to_rfc3339()
    )?;
    writeln!(out, "</div></body></html>")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::Fingerprinter;
    use crate::metadata::extract_metadata;
    use crate::types::{ArticleMetadata, RawExtraction};
    use chrono::TimeZone;

    fn generated_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap()
    }

    fn report(title: &str, sentences: &[&str]) -> FingerprintReport {
        let body = sentences.join(" ");
        let raw = vec![
            RawExtraction::new("goose", body.clone()),
            RawExtraction::new("newspaper", body.clone()),
            RawExtraction::new("trafilatura", body),
        ];
        let metadata = ArticleMetadata::new(
            "https://example.com/a",
            Some("2026-01-15".to_string()),
            Some(title.to_string()),
        );
        Fingerprinter::default()
            .build(&raw, &metadata, "https://example.com/a")
            .unwrap()
    }

    #[test]
    fn test_markdown_sections() {
        let report = report(
            "Budget passes",
            &["The city council approved the budget on Tuesday."],
        );
        let md = render_markdown(&report, generated_at());

        assert!(md.starts_with("# Article Fingerprint Report"));
        assert!(md.contains(&format!("- **Article ID:** `{}`", report.record.article_id)));
        assert!(md.contains("- **Confidence:** VERY_HIGH"));
        assert!(md.contains("- **Agreement Score:** 100.00%"));
        assert!(md.contains("- Supermajority threshold: 3/3"));
        assert!(md.contains("1. goose, newspaper, trafilatura"));
        assert!(md.contains("### 3/3 Sources (1 sentences)"));
        assert!(md.contains("*Generated: 2026-01-15T12:00:00+00:00*"));
        assert!(!md.contains("Degraded run"));
    }

    #[test]
    fn test_vote_bucket_truncation() {
        let sentences: Vec<String> = (1..=7)
            .map(|i| format!("Sentence number {} is long enough to be counted as real text.", i))
            .collect();
        let refs: Vec<&str> = sentences.iter().map(String::as_str).collect();
        let md = render_markdown(&report("T", &refs), generated_at());

        assert!(md.contains("### 3/3 Sources (7 sentences)"));
        assert!(md.contains("- *... and 2 more*"));
        let listed = md
            .lines()
            .filter(|line| line.starts_with("- Sentence number"))
            .count();
        assert_eq!(listed, 5);
    }

    #[test]
    fn test_long_sentences_previewed() {
        let long = format!("{} end.", "word ".repeat(40));
        let md = render_markdown(&report("T", &[long.as_str()]), generated_at());
        let line = md
            .lines()
            .find(|line| line.starts_with("- word"))
            .unwrap();
        assert_eq!(line.chars().count(), 2 + SENTENCE_PREVIEW_CHARS + 3);
        assert!(line.ends_with("..."));
    }

    #[test]
    fn test_html_escapes_content() {
        let report = report(
            "<script>alert('x')</script>",
            &["Tom & Jerry said <b>hello</b> to everyone there."],
        );
        let html = render_html(&report, generated_at());

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;alert(&#x27;x&#x27;)&lt;/script&gt;"));
        assert!(html.contains("Tom &amp; Jerry said &lt;b&gt;hello&lt;/b&gt;"));
        assert!(html.ends_with("</div></body></html>\n"));
    }

    #[test]
    fn test_degraded_banner() {
        let raw = vec![RawExtraction::new("goose", "ERROR: timeout")];
        let metadata = ArticleMetadata::new("https://example.com/a", None, None);
        let report = Fingerprinter::default()
            .build(&raw, &metadata, "https://example.com/a")
            .unwrap();

        let md = render_markdown(&report, generated_at());
        assert!(md.contains("Degraded run"));
        assert!(md.contains("- **Title:** Not found"));
        assert!(md.contains("- Discarded `goose`: source unavailable: timeout"));
        assert!(render_html(&report, generated_at()).contains("class=\"degraded\""));
    }

    #[test]
    fn test_page_metadata_rendered() {
        let html = r#"<html><head>
            <script type="application/ld+json">
              {"@type": "NewsArticle", "headline": "Budget passes",
               "dateModified": "2026-01-16", "author": [{"name": "Ana Ruiz"}, "Ben Cho"]}
            </script>
            <link rel="canonical" href="https://example.com/a">
        </head><body></body></html>"#;
        let page = extract_metadata(html, "https://example.com/a?ref=home");
        let raw = vec![RawExtraction::new(
            "goose",
            "The city council approved the budget on Tuesday.",
        )];
        let report = Fingerprinter::default()
            .build_from_page(&raw, &page, "https://example.com/a")
            .unwrap();

        let md = render_markdown(&report, generated_at());
        assert!(md.contains("- **Authors:** Ana Ruiz, Ben Cho"));
        assert!(md.contains("- **Modified:** 2026-01-16"));
        assert!(md.contains("- **Schema.org:** \u{2713}"));
        assert!(md.contains("- **Open Graph:** \u{2717}"));
        assert!(md.contains("- **Canonical Tag:** \u{2713}"));

        let html = render_html(&report, generated_at());
        assert!(html.contains("<span class=\"label\">Authors:</span> Ana Ruiz, Ben Cho"));
        assert!(html.contains("<span class=\"label\">Modified:</span> 2026-01-16"));
    }

    #[test]
    fn test_identity_only_report_omits_page_fields() {
        let md = render_markdown(&report("T", &["A sentence that is long enough."]), generated_at());
        assert!(!md.contains("Authors:"));
        assert!(!md.contains("Schema.org:"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&#x27;");
        assert_eq!(escape_html("plain"), "plain");
    }
}
