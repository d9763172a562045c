//! Extractor for the current Postoj.sk listing markup.
//!
//! # Landmarks
//!
//! ```html
//! <article class="listing-article">
//!   <h3><a href="https://www.postoj.sk/123/slug">
//!     <span class="listing-article__tag">Komentáre</span>
//!     <span>Headline</span>
//!   </a></h3>
//!   <div class="listing-article__author">Jane Doe</div>
//!   <div class="perex"><p>Perex text</p></div>
//!   <time class="listing-article__date">01.02.2024, 09:30</time>
//! </article>
//! ```
//!
//! Only the headline anchor is required. Author, perex and date are mapped
//! independently of each other.

use super::{
    anchor_href, element_text, first_match, join_fragments, published_or_none, ArticleExtractor,
};
use crate::error::ExtractError;
use crate::models::Entry;
use crate::utils::non_empty_text;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};

/// Date format shown next to every listed article, read as UTC.
pub const DATE_FORMAT: &str = "%d.%m.%Y, %H:%M";

static BLOCK: Lazy<Selector> = Lazy::new(|| Selector::parse("article.listing-article").unwrap());
static HEADLINE: Lazy<Selector> = Lazy::new(|| Selector::parse("h3 a[href], h2 a[href]").unwrap());
static AUTHOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".listing-article__author, .author").unwrap());
static PEREX: Lazy<Selector> = Lazy::new(|| Selector::parse("div.perex").unwrap());
static DATE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("time.listing-article__date, .listing-article__date, time").unwrap());

/// [`ArticleExtractor`] for the current listing markup.
#[derive(Debug, Default)]
pub struct PostojListing;

impl PostojListing {
    /// Extractor for the current listing markup; selectors are compiled lazily
    /// on first use and shared by every instance.
    pub fn new() -> Self {
        Self
    }
}

impl ArticleExtractor for PostojListing {
    fn name(&self) -> &'static str {
        "current"
    }

    fn block_selector(&self) -> &Selector {
        &BLOCK
    }

    fn build_entry(&self, block: ElementRef<'_>) -> Result<Entry, ExtractError> {
        let anchor = first_match(block, &HEADLINE).ok_or(ExtractError::MissingLandmark {
            landmark: "headline anchor",
        })?;
        let href = anchor_href(anchor)?;
        let title = join_fragments(anchor);

        let author = first_match(block, &AUTHOR).and_then(|el| non_empty_text(&element_text(el)));
        let summary = first_match(block, &PEREX).and_then(|el| non_empty_text(&element_text(el)));
        let date_text = first_match(block, &DATE).map(element_text);
        let published = published_or_none(date_text, DATE_FORMAT);

        Ok(Entry {
            id: href.clone(),
            link: href,
            title,
            author,
            summary,
            published,
        })
    }
}
