//! Feed document generation.
//!
//! A populated [`Feed`] is rendered into one of two syndication formats:
//!
//! # Submodules
//!
//! - [`atom`]: Atom 1.0 via `atom_syndication`, served on `/`
//! - [`rss`]: RSS 2.0 via `rss`, served on `/rss`
//!
//! Both map the feed onto the crate's document model and let its writer do
//! the escaping. A feed whose metadata lacks an id, title or link is
//! rejected with [`FeedError::MissingMetadata`]: that is a configuration
//! defect, not a scraping condition.

use crate::error::FeedError;
use crate::models::{Feed, FeedMetadata};

pub mod atom;
pub mod rss;

/// Value of the `generator` element in both formats.
const GENERATOR: &str = "postoj_feed";

/// Output document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    Atom,
    Rss,
}

impl FeedFormat {
    /// `Content-Type` header value for responses in this format.
    pub fn content_type(self) -> &'static str {
        match self {
            FeedFormat::Atom => "application/atom+xml; charset=utf-8",
            FeedFormat::Rss => "application/rss+xml; charset=utf-8",
        }
    }
}

/// Render `feed` as a complete XML document.
///
/// # Errors
///
/// [`FeedError::MissingMetadata`] for a blank id, title or link, otherwise
/// whatever the format's writer reports.
pub fn render(feed: &Feed, format: FeedFormat) -> Result<String, FeedError> {
    check_metadata(&feed.metadata)?;
    match format {
        FeedFormat::Atom => atom::write_atom(feed),
        FeedFormat::Rss => rss::write_rss(feed),
    }
}

fn check_metadata(meta: &FeedMetadata) -> Result<(), FeedError> {
    if meta.id.trim().is_empty() {
        return Err(FeedError::MissingMetadata("id"));
    }
    if meta.title.trim().is_empty() {
        return Err(FeedError::MissingMetadata("title"));
    }
    if meta.link.trim().is_empty() {
        return Err(FeedError::MissingMetadata("link"));
    }
    Ok(())
}

/// `Some(value)` unless it is blank; optional metadata is left out entirely.
fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
