//! Layer 3: rules keyed by the article's site
//!
//! Each rule pairs a domain matcher with an action:
//! - `Strip` removes boilerplate (listen prompts, app-download calls to
//!   action, syndication bylines, staff bios, contact trailers)
//! - `Veto` discards the whole text when the URL names a content type that
//!   cannot be fingerprinted reliably (live-updating blogs)
//!
//! Rules run in table order. A veto stops processing immediately.

use afp_common::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Matches a registrable domain and all of its subdomains
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainMatcher {
    domain: String,
}

impl DomainMatcher {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into().to_ascii_lowercase(),
        }
    }

    /// True when the URL's host is the domain or one of its subdomains
    ///
    /// Unparseable URLs fall back to a case-insensitive substring test.
    pub fn matches(&self, url: &str) -> bool {
        match Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_ascii_lowercase)) {
            Some(host) => {
                host == self.domain
                    || host
                        .strip_suffix(self.domain.as_str())
                        .is_some_and(|prefix| prefix.ends_with('.'))
            }
            None => url.to_ascii_lowercase().contains(&self.domain),
        }
    }
}

/// What a site rule does when its domain matches
#[derive(Debug, Clone)]
pub enum SiteAction {
    /// Remove every match of `pattern` from the text
    Strip { pattern: Regex },
    /// Discard the text when the URL matches `url_pattern`
    Veto { url_pattern: Regex },
}

/// One entry of the site rule table
#[derive(Debug, Clone)]
pub struct SiteRule {
    pub name: String,
    pub matcher: DomainMatcher,
    pub action: SiteAction,
}

impl SiteRule {
    /// Build a boilerplate-stripping rule
    ///
    /// # Errors
    /// Returns `Error::Config` if the pattern does not compile
    pub fn strip(name: impl Into<String>, domain: &str, pattern: &str) -> Result<Self> {
        let name = name.into();
        let pattern = compile(&name, pattern)?;
        Ok(Self {
            name,
            matcher: DomainMatcher::new(domain),
            action: SiteAction::Strip { pattern },
        })
    }

    /// Build a URL veto rule
    ///
    /// # Errors
    /// Returns `Error::Config` if the pattern does not compile
    pub fn veto(name: impl Into<String>, domain: &str, url_pattern: &str) -> Result<Self> {
        let name = name.into();
        let url_pattern = compile(&name, url_pattern)?;
        Ok(Self {
            name,
            matcher: DomainMatcher::new(domain),
            action: SiteAction::Veto { url_pattern },
        })
    }
}

fn compile(name: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::Config(format!("site rule '{}': {}", name, e)))
}

/// Result of running the site layer over one text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteOutcome {
    Kept(String),
    Vetoed { rule: String },
}

static BUILTIN_SITE_RULES: Lazy<Vec<SiteRule>> = Lazy::new(|| {
    let rules = [
        SiteRule::strip(
            "foxnews_listen_prompt",
            "foxnews.com",
            r"(?i)^NEW You can now listen to Fox News articles!?\s*",
        ),
        SiteRule::strip(
            "foxnews_app_cta",
            "foxnews.com",
            r"(?i)CLICK HERE TO (?:GET|DOWNLOAD) (?:THE )?FOX NEWS APP\s*",
        ),
        SiteRule::strip(
            "foxnews_contributed_byline",
            "foxnews.com",
            r"(?i)Fox News['\s]+[\w\s]+contributed to this report\.?\s*$",
        ),
        SiteRule::strip(
            "foxnews_staff_bio",
            "foxnews.com",
            r"(?i)[\w\s]+ is a (?:reporter|correspondent|anchor) with Fox News Digital.*$",
        ),
        SiteRule::strip(
            "foxnews_contact_trailer",
            "foxnews.com",
            r"(?i)Send tips to .*? or on (?:X|Twitter):\s*@\w+\.?\s*$",
        ),
        SiteRule::veto("cnn_live_blog", "cnn.com", r"(?i)live-(?:news|updates)"),
    ];
    rules
        .into_iter()
        .map(|rule| rule.expect("built-in site rule pattern compiles"))
        .collect()
});

/// The built-in site rule table
pub fn builtin_site_rules() -> Vec<SiteRule> {
    BUILTIN_SITE_RULES.clone()
}

/// Run every rule whose domain matches `url`, in table order
pub fn apply_site_rules(rules: &[SiteRule], url: &str, text: &str) -> SiteOutcome {
    let mut text = text.to_string();
    for rule in rules.iter().filter(|r| r.matcher.matches(url)) {
        match &rule.action {
            SiteAction::Veto { url_pattern } => {
                if url_pattern.is_match(url) {
                    return SiteOutcome::Vetoed {
                        rule: rule.name.clone(),
                    };
                }
            }
            SiteAction::Strip { pattern } => {
                text = pattern.replace_all(&text, "").trim().to_string();
            }
        }
    }
    SiteOutcome::Kept(text)
}
