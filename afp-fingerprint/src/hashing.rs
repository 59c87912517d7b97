//! Content and identity hashing
//!
//! - `content_hash`: SHA-256 hex of the exact bytes of a text
//! - `article_id`: truncated SHA-256 of `"{canonical_url}|{publish_date}|{title}"`
//!
//! Both are pure functions of their inputs; identical inputs give identical
//! hashes on every run and platform.

use crate::types::ArticleMetadata;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Default number of hex characters kept for `article_id`
pub const DEFAULT_ARTICLE_ID_LEN: usize = 16;

/// Rendering of an absent metadata value inside the identity string
pub const DEFAULT_MISSING_SENTINEL: &str = "None";

/// SHA-256 of `text`, lowercase hex (64 characters)
pub fn content_hash(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

/// Identity string hashed into `article_id`
pub fn identity_string(metadata: &ArticleMetadata, sentinel: &str) -> String {
    format!(
        "{}|{}|{}",
        metadata.canonical_url,
        metadata.publish_date.as_deref().unwrap_or(sentinel),
        metadata.title.as_deref().unwrap_or(sentinel)
    )
}

/// Stable article identifier derived from metadata only
///
/// # Arguments
/// * `metadata` - canonical URL, publish date and title
/// * `len` - number of leading hex characters to keep (capped at 64)
/// * `sentinel` - rendering of a missing publish date or title
pub fn article_id(metadata: &ArticleMetadata, len: usize, sentinel: &str) -> String {
    let mut id = content_hash(&identity_string(metadata, sentinel));
    id.truncate(len.min(id.len()));
    id
}

/// Hash every text and group sources whose texts are identical
///
/// # Returns
/// * Hash per source id
/// * Groups of source ids sharing a hash, ordered by their smallest member
pub fn group_by_hash(texts: &BTreeMap<String, String>) -> (BTreeMap<String, String>, Vec<Vec<String>>) {
    let hashes: BTreeMap<String, String> = texts
        .iter()
        .map(|(id, text)| (id.clone(), content_hash(text)))
        .collect();

    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    for (id, hash) in &hashes {
        match groups.iter_mut().find(|(h, _)| h == hash) {
            Some((_, members)) => members.push(id.clone()),
            None => groups.push((hash.clone(), vec![id.clone()])),
        }
    }

    (hashes, groups.into_iter().map(|(_, members)| members).collect())
}
