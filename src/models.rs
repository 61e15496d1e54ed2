//! Data models for listing summaries and enriched articles.
//!
//! - [`ArticleSummary`]: one article block of a listing page
//! - [`ArticleContent`]: fields extracted from the article page itself
//! - [`EnrichedArticle`]: a summary joined with its content
//!
//! All text fields are stored as normalized token lists (see [`crate::text`]),
//! never as raw text. Author names are never stored; only [`AuthorId`]s.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// Token to number of occurrences within an article body.
pub type WordFrequencies = BTreeMap<String, u32>;

/// An article as it appears on a listing page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArticleSummary {
    /// Site-relative path of the article, unique within one listing page.
    pub link: String,
    pub published_at: NaiveDate,
    /// `None` when the site reports midnight, which it uses for "no time recorded".
    pub published_time: Option<NaiveTime>,
    pub title_tokens: Vec<String>,
    /// Tokens of the preview lead paragraph, if the listing shows one.
    pub lead_tokens_short: Option<Vec<String>>,
    pub is_premium: bool,
    pub is_video: bool,
    pub is_gallery: bool,
}

impl ArticleSummary {
    /// Premium, video and gallery articles are never fetched.
    pub fn is_restricted(&self) -> bool {
        self.is_premium || self.is_video || self.is_gallery
    }
}

/// Opaque, irreversible identifier of an author: the SHA-256 digest of the
/// trimmed display name, in lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct AuthorId(String);

impl AuthorId {
    pub fn from_name(name: &str) -> Self {
        let digest = Sha256::digest(name.trim().as_bytes());
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fields extracted from an article page. Each is `None` when the page could
/// not be fetched or the element was missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArticleContent {
    pub lead_tokens_full: Option<Vec<String>>,
    pub word_frequencies: Option<WordFrequencies>,
    pub author_ids: Option<Vec<AuthorId>>,
    pub topics: Option<Vec<String>>,
}

impl ArticleContent {
    /// Content of an article that was skipped or could not be resolved.
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn is_absent(&self) -> bool {
        self.lead_tokens_full.is_none()
            && self.word_frequencies.is_none()
            && self.author_ids.is_none()
            && self.topics.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EnrichedArticle {
    pub summary: ArticleSummary,
    pub content: ArticleContent,
}
