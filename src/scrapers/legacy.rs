//! Extractor for the original listing markup.
//!
//! The first version of the listing only exposed a headline anchor under
//! `h3` and a perex paragraph. The headline text is taken whole, there is no
//! author and no date.

use super::{anchor_href, element_text, first_match, ArticleExtractor};
use crate::error::ExtractError;
use crate::models::Entry;
use crate::utils::non_empty_text;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};

static BLOCK: Lazy<Selector> = Lazy::new(|| Selector::parse("article.listing-article").unwrap());
static HEADLINE: Lazy<Selector> = Lazy::new(|| Selector::parse("h3 a").unwrap());
static PEREX: Lazy<Selector> = Lazy::new(|| Selector::parse("div.perex p").unwrap());

/// [`ArticleExtractor`] for the original listing markup.
#[derive(Debug, Default)]
pub struct LegacyListing;

impl LegacyListing {
    /// Extractor for the original listing markup; selectors are compiled lazily
    /// on first use and shared by every instance.
    pub fn new() -> Self {
        Self
    }
}

impl ArticleExtractor for LegacyListing {
    fn name(&self) -> &'static str {
        "legacy"
    }

    fn block_selector(&self) -> &Selector {
        &BLOCK
    }

    fn build_entry(&self, block: ElementRef<'_>) -> Result<Entry, ExtractError> {
        let anchor = first_match(block, &HEADLINE).ok_or(ExtractError::MissingLandmark {
            landmark: "headline anchor",
        })?;
        let href = anchor_href(anchor)?;

        Ok(Entry {
            id: href.clone(),
            link: href,
            title: element_text(anchor),
            author: None,
            summary: first_match(block, &PEREX).and_then(|el| non_empty_text(&element_text(el))),
            published: None,
        })
    }
}
