//! Data models for scraped articles and the feed built from them.
//!
//! This module defines the data contract shared by the whole pipeline:
//! - [`RawPage`]: One fetched category listing, alive for a single scrape
//! - [`Entry`]: A normalized article record placed into the feed
//! - [`FeedMetadata`]: Fixed top-level feed fields, set once per build
//! - [`Feed`]: Metadata plus the entries collected during one build
//!
//! None of these types carry behavior beyond small accessors; parsing lives
//! in [`crate::scrapers`] and serialization in [`crate::outputs`].

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// The body of one category listing page together with its HTTP status.
#[derive(Debug, Clone)]
pub struct RawPage {
    /// The URL the page was fetched from.
    pub url: String,
    /// HTTP status code of the response (always 2xx when handed to an extractor).
    pub status: u16,
    /// Decoded response body.
    pub body: String,
}

/// A normalized article record.
///
/// `id` and `link` both come from the headline anchor's `href` and are never
/// empty: extractors drop article blocks without an anchor instead of
/// emitting a half-filled entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Unique identifier, taken from the canonical article link.
    pub id: String,
    /// URL of the full article.
    pub link: String,
    /// Plain-text title, fragments joined with `" / "`.
    pub title: String,
    /// Author display name, when the listing shows one.
    pub author: Option<String>,
    /// Plain-text excerpt (perex).
    pub summary: Option<String>,
    /// Publication instant, normalized to UTC.
    pub published: Option<DateTime<Utc>>,
}

/// Fixed top-level metadata of the generated feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeedMetadata {
    /// Feed identifier (Atom `<id>`).
    pub id: String,
    /// Feed title.
    pub title: String,
    /// Feed author name.
    pub author: String,
    /// Site link (`rel="alternate"`).
    pub link: String,
    /// Logo image URL.
    pub logo: String,
    /// Short tagline.
    pub subtitle: String,
    /// Language code, e.g. `sk`.
    pub language: String,
}

impl Default for FeedMetadata {
    fn default() -> Self {
        Self {
            id: "https://github.com/fadawar/postoj-rss".to_string(),
            title: "Postoj.sk".to_string(),
            author: "Postoj.sk".to_string(),
            link: "https://www.postoj.sk".to_string(),
            logo: "https://www.postoj.sk/assets/frontend/build/img/brand-main.png".to_string(),
            subtitle: "Konzervatívny denník".to_string(),
            language: "sk".to_string(),
        }
    }
}

/// The aggregate produced by a single feed build.
///
/// A `Feed` is created fresh per request, filled by the aggregator in the
/// order sources complete, serialized and dropped.
#[derive(Debug, Clone)]
pub struct Feed {
    /// Fixed metadata.
    pub metadata: FeedMetadata,
    /// Time the build started; used as the feed's `updated` stamp.
    pub generated_at: DateTime<Utc>,
    /// Collected entries.
    pub entries: Vec<Entry>,
}

impl Feed {
    /// Create an empty feed stamped with the current time.
    pub fn new(metadata: FeedMetadata) -> Self {
        Self {
            metadata,
            generated_at: Utc::now(),
            entries: Vec::new(),
        }
    }
}
