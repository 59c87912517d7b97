//! Layer 1: base normalization shared by every source
//!
//! Makes typography and spacing uniform so that outputs of different
//! extractors compare equal when they carry the same words. The layer is
//! idempotent: `normalize_base(normalize_base(x)) == normalize_base(x)`.

use once_cell::sync::Lazy;
use regex::Regex;

/// Characters removed outright: zero-width space/joiners, word joiner, BOM
const ZERO_WIDTH: [char; 5] = ['\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}'];

/// Invisible soft hyphen left behind by hyphenation-aware CMSes
const SOFT_HYPHEN: char = '\u{00AD}';

static SPACE_BEFORE_PUNCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+([.,!?;:])").expect("valid regex"));

static MISSING_SPACE_AFTER_PUNCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([.,!?;:])(\p{L})").expect("valid regex"));

/// Apply base normalization
///
/// Steps, in order:
/// 1. Strip zero-width characters and soft hyphens
/// 2. Collapse every whitespace run (Unicode spaces included) to one ASCII space
/// 3. Remove whitespace before `. , ! ? ; :` and add one space after them
///    when a letter follows directly
/// 4. Curly quotes to ASCII, em/en dashes to `-`
/// 5. Collapse whitespace again
pub fn normalize_base(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    // Step 1: invisible characters
    let visible: String = text
        .chars()
        .filter(|c| !ZERO_WIDTH.contains(c) && *c != SOFT_HYPHEN)
        .collect();

    // Step 2: whitespace
    let collapsed = collapse_whitespace(&visible);

    // Step 3: punctuation spacing ("word ." -> "word.", "word.Next" -> "word. Next")
    let spaced = SPACE_BEFORE_PUNCT.replace_all(&collapsed, "$1");
    let spaced = MISSING_SPACE_AFTER_PUNCT.replace_all(&spaced, "$1 $2");

    // Step 4: typography
    let ascii: String = spaced.chars().map(ascii_typography).collect();

    // Step 5
    collapse_whitespace(&ascii)
}

/// Collapse all whitespace runs to single ASCII spaces and trim
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn ascii_typography(c: char) -> char {
    match c {
        '\u{201C}' | '\u{201D}' => '"',
        '\u{2018}' | '\u{2019}' => '\'',
        '\u{2014}' | '\u{2013}' => '-',
        other => other,
    }
}
