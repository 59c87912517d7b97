//! Layer 2: cleanup rules keyed by extraction source
//!
//! Each extraction engine has its own habits (a dateline preamble, spaces
//! pushed inside quotes, photo credits kept inline). Rules are an ordered
//! table; every rule whose `source_id` matches is applied in table order.
//! Sources with no rule pass through unchanged.

use afp_common::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// One regex rewrite applied to a single source's text
#[derive(Debug, Clone)]
pub struct SourceRule {
    pub source_id: String,
    /// Short identifier used in logs and tests
    pub name: String,
    pattern: Regex,
    replacement: String,
}

impl SourceRule {
    /// Build a rule from a pattern string
    ///
    /// # Errors
    /// Returns `Error::Config` if the pattern does not compile
    pub fn new(
        source_id: impl Into<String>,
        name: impl Into<String>,
        pattern: &str,
        replacement: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        let pattern = Regex::new(pattern)
            .map_err(|e| Error::Config(format!("source rule '{}': {}", name, e)))?;
        Ok(Self {
            source_id: source_id.into(),
            name,
            pattern,
            replacement: replacement.into(),
        })
    }

    pub fn applies_to(&self, source_id: &str) -> bool {
        self.source_id == source_id
    }

    /// Rewrite every match in `text`
    pub fn apply(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, self.replacement.as_str())
            .into_owned()
    }
}

static BUILTIN_SOURCE_RULES: Lazy<Vec<SourceRule>> = Lazy::new(|| {
    [
        (
            "newspaper",
            "dateline_preamble",
            r"(?i)^(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\.?\s+\d{1,2},\s+\d{4}.*?\b(?:ET|EST|PST|CST)\b\s*",
            "",
        ),
        ("readability", "space_after_quote", r#""\s+"#, r#"""#),
        ("readability", "space_before_quote", r#"\s+""#, r#"""#),
        (
            "goose",
            "wire_photo_credit",
            r"(?i)\([^()]*?\b(?:Getty Images|Reuters|AFP|AP|Bloomberg)\b[^()]*\)",
            "",
        ),
    ]
    .into_iter()
    .map(|(source, name, pattern, replacement)| {
        SourceRule::new(source, name, pattern, replacement)
            .expect("built-in source rule pattern compiles")
    })
    .collect()
});

/// The built-in source rule table
pub fn builtin_source_rules() -> Vec<SourceRule> {
    BUILTIN_SOURCE_RULES.clone()
}

/// Apply all rules registered for `source_id`, in table order
pub fn apply_source_rules(rules: &[SourceRule], source_id: &str, text: &str) -> String {
    rules
        .iter()
        .filter(|rule| rule.applies_to(source_id))
        .fold(text.to_string(), |acc, rule| rule.apply(&acc))
}
