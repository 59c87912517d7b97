// Consensus Scorer - pairwise agreement between normalized sources
//
// Ratio is the Ratcliff/Obershelp matching-block similarity over characters:
// 2*M / (len_a + len_b), where M is the total size of the matching blocks found
// by recursively taking the longest common block and recursing on both sides.

use crate::types::{word_count, ConfidenceLevel, PairwiseSimilarity};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Sequences at least this long get the popular-element heuristic
const AUTOJUNK_MIN_LEN: usize = 200;

/// Score agreement across all surviving sources
///
/// # Arguments
/// * `texts` - normalized text per source id
///
/// # Returns
/// * One `PairwiseSimilarity` per unordered pair, in ascending id order
/// * Mean ratio over all pairs (0.0 when fewer than two sources)
pub fn score(texts: &BTreeMap<String, String>) -> (Vec<PairwiseSimilarity>, f64) {
    let entries: Vec<(&String, &String)> = texts.iter().collect();
    let mut similarities = Vec::new();

    for (i, (id_a, text_a)) in entries.iter().enumerate() {
        for (id_b, text_b) in &entries[i + 1..] {
            let ratio = similarity_ratio(text_a, text_b);
            debug!(source_a = %id_a, source_b = %id_b, ratio, "Pairwise similarity");
            similarities.push(PairwiseSimilarity {
                source_a: (*id_a).clone(),
                source_b: (*id_b).clone(),
                ratio,
                word_count_a: word_count(text_a),
                word_count_b: word_count(text_b),
            });
        }
    }

    let aggregate = if similarities.is_empty() {
        0.0
    } else {
        similarities.iter().map(|s| s.ratio).sum::<f64>() / similarities.len() as f64
    };

    (similarities, aggregate)
}

/// Score and label in one step
pub fn score_with_confidence(
    texts: &BTreeMap<String, String>,
) -> (Vec<PairwiseSimilarity>, f64, ConfidenceLevel) {
    let (similarities, aggregate) = score(texts);
    (similarities, aggregate, ConfidenceLevel::from_agreement(aggregate))
}

/// Matching-block similarity ratio of two texts, in [0, 1]
///
/// Two empty texts are identical (1.0).
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matches = BlockMatcher::new(&a, &b).matching_characters();
    2.0 * matches as f64 / total as f64
}

/// Longest-common-block matcher over two character sequences
struct BlockMatcher<'a> {
    a: &'a [char],
    b: &'a [char],
    /// Positions of each character in `b`, popular characters removed
    b2j: HashMap<char, Vec<usize>>,
}

impl<'a> BlockMatcher<'a> {
    fn new(a: &'a [char], b: &'a [char]) -> Self {
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, c) in b.iter().enumerate() {
            b2j.entry(*c).or_default().push(j);
        }

        // Characters occurring in more than 1% of a long `b` don't seed matches
        if b.len() >= AUTOJUNK_MIN_LEN {
            let limit = b.len() / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= limit);
        }

        Self { a, b, b2j }
    }

    /// Total size of all matching blocks
    fn matching_characters(&self) -> usize {
        let mut total = 0;
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];

        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let (i, j, k) = self.longest_match(alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            total += k;
            if alo < i && blo < j {
                queue.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                queue.push((i + k, ahi, j + k, bhi));
            }
        }

        total
    }

    /// Longest block `a[i..i+k] == b[j..j+k]` within the given ranges
    ///
    /// Ties go to the block starting earliest in `a`, then earliest in `b`.
    fn longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> (usize, usize, usize) {
        let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0);
        // j -> length of the match ending at a[i-1], b[j]
        let mut run_lengths: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            let mut next_runs = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| run_lengths.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next_runs.insert(j, k);
                    if k > best_k {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_k = k;
                    }
                }
            }
            run_lengths = next_runs;
        }

        // Popular characters never seed a block but may extend one
        while best_i > alo && best_j > blo && self.a[best_i - 1] == self.b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_k += 1;
        }
        while best_i + best_k < ahi
            && best_j + best_k < bhi
            && self.a[best_i + best_k] == self.b[best_j + best_k]
        {
            best_k += 1;
        }

        (best_i, best_j, best_k)
    }
}
