//! Article extraction from Postoj.sk category listings.
//!
//! Every listing page repeats one "article block" per listed article. An
//! [`ArticleExtractor`] knows how to find those blocks and map each one to an
//! [`Entry`]. Selectors are tied to the site's markup, so each known markup
//! version gets its own implementation and switching is a config change.
//!
//! # Supported Markups
//!
//! | Markup | Module | Fields |
//! |--------|--------|--------|
//! | `current` | [`postoj`] | title fragments, link, author, perex, date |
//! | `legacy` | [`legacy`] | title, link, perex |
//!
//! # Failure Handling
//!
//! - A block without its headline anchor is skipped and logged; its siblings
//!   are unaffected
//! - Missing optional landmarks leave the matching field empty
//! - An unparseable date leaves `published` empty and nothing else

use crate::error::ExtractError;
use crate::models::{Entry, RawPage};
use chrono::{DateTime, NaiveDateTime, Utc};
use clap::ValueEnum;
use itertools::Itertools;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::utils::normalize_text;

pub mod legacy;
pub mod postoj;

/// Separator placed between headline fragments (section label, headline).
pub const TITLE_SEPARATOR: &str = " / ";

/// Maps a listing page to entries.
pub trait ArticleExtractor: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Selector matching one article block.
    fn block_selector(&self) -> &Selector;

    /// Build an entry from one article block.
    ///
    /// # Errors
    ///
    /// [`ExtractError::MissingLandmark`] when the block lacks a required
    /// landmark. Optional fields never cause an error.
    fn build_entry(&self, block: ElementRef<'_>) -> Result<Entry, ExtractError>;

    /// Extract every well-formed article on the page, in document order.
    ///
    /// Never fails as a whole: malformed blocks are logged and skipped.
    fn extract(&self, page: &RawPage) -> Vec<Entry> {
        let document = Html::parse_document(&page.body);
        let mut entries = Vec::new();
        let mut skipped = 0usize;

        for (index, block) in document.select(self.block_selector()).enumerate() {
            match self.build_entry(block) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    skipped += 1;
                    warn!(
                        url = %page.url,
                        markup = self.name(),
                        index,
                        error = %e,
                        "Skipping malformed article block"
                    );
                }
            }
        }

        info!(
            url = %page.url,
            markup = self.name(),
            count = entries.len(),
            skipped,
            "Extracted articles"
        );
        entries
    }
}

/// Known markup versions of the listing pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Markup {
    /// Listing with section labels, author and publication date.
    #[default]
    Current,
    /// The original listing: headline and perex only.
    Legacy,
}

impl Markup {
    /// The extractor implementing this markup.
    pub fn extractor(self) -> Arc<dyn ArticleExtractor> {
        match self {
            Markup::Current => Arc::new(postoj::PostojListing::new()),
            Markup::Legacy => Arc::new(legacy::LegacyListing::new()),
        }
    }
}

/// First descendant of `block` matching `selector`.
pub(crate) fn first_match<'a>(block: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    block.select(selector).next()
}

/// Normalized text content of an element, all descendants concatenated.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    normalize_text(&element.text().collect::<String>())
}

/// Non-empty `href` of an anchor element.
pub(crate) fn anchor_href(anchor: ElementRef<'_>) -> Result<String, ExtractError> {
    anchor
        .value()
        .attr("href")
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
        .ok_or(ExtractError::MissingLandmark {
            landmark: "headline anchor href",
        })
}

/// Inline formatting that stays part of the surrounding fragment.
const INLINE_TAGS: &[&str] = &[
    "abbr", "b", "cite", "code", "em", "i", "mark", "q", "s", "small", "strong", "sub",
    "sup", "u",
];

/// Join the visual fragments of a headline in reading order.
///
/// Each structural child element of the anchor (a section label `<span>`,
/// the headline `<span>`) is one fragment. Bare text and inline formatting
/// between them form a fragment of their own, so
/// `<a><span>Komentáre</span> <span>Prečo…</span></a>` becomes
/// `"Komentáre / Prečo…"` while `<a>Prečo je <em>dôležité</em></a>` stays
/// `"Prečo je dôležité"`.
pub(crate) fn join_fragments(anchor: ElementRef<'_>) -> String {
    let mut fragments = Vec::new();
    let mut run = String::new();

    for child in anchor.children() {
        if let Some(text) = child.value().as_text() {
            run.push_str(text);
            continue;
        }
        let Some(element) = ElementRef::wrap(child) else {
            continue;
        };
        let name = element.value().name();
        if name == "br" {
            run.push(' ');
        } else if INLINE_TAGS.contains(&name) {
            run.extend(element.text());
        } else {
            fragments.push(normalize_text(&std::mem::take(&mut run)));
            fragments.push(element_text(element));
        }
    }
    fragments.push(normalize_text(&run));

    fragments
        .into_iter()
        .filter(|fragment| !fragment.is_empty())
        .join(TITLE_SEPARATOR)
}

/// Parse a listing date with `format`, reading the wall-clock value as UTC.
pub(crate) fn parse_published(value: &str, format: &str) -> Result<DateTime<Utc>, ExtractError> {
    let value = normalize_text(value);
    NaiveDateTime::parse_from_str(&value, format)
        .map(|naive| naive.and_utc())
        .map_err(|source| ExtractError::DateParse { value, source })
}

/// Parse an optional date, logging and dropping anything unparseable.
pub(crate) fn published_or_none(value: Option<String>, format: &str) -> Option<DateTime<Utc>> {
    let value = value?;
    match parse_published(&value, format) {
        Ok(published) => Some(published),
        Err(e) => {
            debug!(error = %e, "Ignoring publication date");
            None
        }
    }
}
