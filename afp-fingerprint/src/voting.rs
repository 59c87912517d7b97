//! Supermajority sentence voting
//!
//! Reconciles several normalized texts of the same article into one canonical
//! text. Each text is split into sentences; a sentence is kept only when at
//! least `threshold` distinct sources produced it verbatim (after whitespace
//! canonicalization).
//!
//! **Ordering:** kept sentences follow the order of a reference source
//! (caller-supplied, default the lexicographically smallest source id).
//! Sentences the reference never produced are appended in the order they are
//! first seen while scanning sources in ascending id order.

use crate::normalize::collapse_whitespace;
use crate::types::VotingResult;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Default minimum sentence length, in characters
pub const DEFAULT_MIN_SENTENCE_CHARS: usize = 20;

/// Supermajority voter
#[derive(Debug, Clone)]
pub struct SupermajorityVoter {
    /// Segments shorter than this (after trimming) are dropped as noise
    pub min_sentence_chars: usize,
}

impl Default for SupermajorityVoter {
    fn default() -> Self {
        Self {
            min_sentence_chars: DEFAULT_MIN_SENTENCE_CHARS,
        }
    }
}

/// Sentence -> set of source ids that produced it, plus first-seen order
#[derive(Debug, Default)]
struct SentenceTally {
    sources: BTreeMap<String, BTreeSet<String>>,
    first_seen: Vec<String>,
}

impl SentenceTally {
    fn record(&mut self, sentence: String, source_id: &str) {
        let entry = self.sources.entry(sentence.clone()).or_default();
        if entry.is_empty() {
            self.first_seen.push(sentence);
        }
        entry.insert(source_id.to_string());
    }

    fn votes(&self, sentence: &str) -> usize {
        self.sources.get(sentence).map_or(0, BTreeSet::len)
    }
}

impl SupermajorityVoter {
    pub fn new(min_sentence_chars: usize) -> Self {
        Self { min_sentence_chars }
    }

    /// Vote on sentences across sources
    ///
    /// # Arguments
    /// * `texts` - normalized text per source id
    /// * `threshold` - minimum number of distinct sources for a sentence to be kept
    /// * `reference_source` - source whose sentence order is used; falls back to
    ///   the smallest source id when `None` or not present in `texts`
    ///
    /// # Returns
    /// Reconstructed text plus every distinct sentence bucketed by vote count
    pub fn vote(
        &self,
        texts: &BTreeMap<String, String>,
        threshold: usize,
        reference_source: Option<&str>,
    ) -> VotingResult {
        let reference = match reference_source {
            Some(id) if texts.contains_key(id) => Some(id),
            Some(id) => {
                debug!(reference = %id, "Reference source not among texts, using smallest id");
                texts.keys().next().map(String::as_str)
            }
            None => texts.keys().next().map(String::as_str),
        };

        let Some(reference) = reference else {
            return VotingResult::empty(threshold);
        };

        // Step 1: tally every sentence of every source (ascending id order)
        let mut tally = SentenceTally::default();
        for (source_id, text) in texts {
            for sentence in split_sentences(text, self.min_sentence_chars) {
                tally.record(sentence, source_id);
            }
        }

        // Step 2: reference order first, then everything else in first-seen order
        let mut seen = BTreeSet::new();
        let mut ordered: Vec<&str> = Vec::with_capacity(tally.sources.len());
        let reference_sentences = split_sentences(&texts[reference], self.min_sentence_chars);
        for sentence in reference_sentences.iter().chain(tally.first_seen.iter()) {
            if seen.insert(sentence.as_str()) {
                ordered.push(sentence.as_str());
            }
        }

        // Step 3: bucket by vote count and keep sentences meeting the threshold
        let mut by_vote_count: BTreeMap<usize, Vec<String>> = BTreeMap::new();
        let mut kept = Vec::new();
        for sentence in ordered {
            let votes = tally.votes(sentence);
            by_vote_count
                .entry(votes)
                .or_default()
                .push(sentence.to_string());
            if votes >= threshold {
                kept.push(sentence);
            }
        }

        debug!(
            sources = texts.len(),
            reference = %reference,
            unique = tally.sources.len(),
            kept = kept.len(),
            threshold,
            "Sentence vote complete"
        );

        VotingResult {
            reconstructed_text: reconstruct(&kept),
            sentences_by_vote_count: by_vote_count,
            total_unique_sentences: tally.sources.len(),
            sentences_kept: kept.len(),
            threshold,
        }
    }
}

/// Split text into whitespace-canonicalized sentences
///
/// A boundary is any whitespace run directly following `.`, `!` or `?`.
/// Segments shorter than `min_chars` characters after trimming are dropped.
pub fn split_sentences(text: &str, min_chars: usize) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut prev: Option<char> = None;

    for (i, c) in text.char_indices() {
        if c.is_whitespace() && matches!(prev, Some('.' | '!' | '?')) {
            push_segment(&mut sentences, &text[start..i], min_chars);
            start = i;
        }
        prev = Some(c);
    }
    push_segment(&mut sentences, &text[start..], min_chars);

    sentences
}

fn push_segment(sentences: &mut Vec<String>, segment: &str, min_chars: usize) {
    let sentence = collapse_whitespace(segment);
    if !sentence.is_empty() && sentence.chars().count() >= min_chars {
        sentences.push(sentence);
    }
}

/// Join kept sentences into one text
///
/// Sentences are joined with `". "` verbatim and a non-empty result that does
/// not already end in `.` gets one appended. Sentence text is never trimmed,
/// so a sentence that carries its own period yields `..` at the join.
fn reconstruct(sentences: &[&str]) -> String {
    let mut text = sentences.join(". ");
    if !text.is_empty() && !text.ends_with('.') {
        text.push('.');
    }
    text
}
