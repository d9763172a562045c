//! Scraping of a single source URL: fetch, then extract.

use crate::error::FetchError;
use crate::fetcher::PageFetcher;
use crate::models::Entry;
use crate::scrapers::ArticleExtractor;
use tracing::{info, instrument, warn};

/// Outcome of scraping one source.
///
/// A failed fetch yields no entries and carries the error; it never aborts
/// the build.
#[derive(Debug)]
pub struct SourceReport {
    pub url: String,
    pub entries: Vec<Entry>,
    pub error: Option<FetchError>,
}

/// Fetch `url` and extract its articles.
#[instrument(level = "info", skip(fetcher, extractor))]
pub async fn scrape_source<F: PageFetcher>(
    fetcher: &F,
    extractor: &dyn ArticleExtractor,
    url: &str,
) -> SourceReport {
    match fetcher.fetch(url).await {
        Ok(page) => {
            let entries = extractor.extract(&page);
            info!(%url, status = page.status, count = entries.len(), "Scraped source");
            SourceReport {
                url: url.to_string(),
                entries,
                error: None,
            }
        }
        Err(e) => {
            warn!(
                url = %e.url(),
                timeout = e.is_timeout(),
                error = %e,
                "Source fetch failed; contributing no entries"
            );
            SourceReport {
                url: url.to_string(),
                entries: Vec::new(),
                error: Some(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawPage;
    use crate::scrapers::postoj::PostojListing;

    struct StaticFetcher(Result<&'static str, u16>);

    impl PageFetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> Result<RawPage, FetchError> {
            match self.0 {
                Ok(body) => Ok(RawPage {
                    url: url.to_string(),
                    status: 200,
                    body: body.to_string(),
                }),
                Err(status) => Err(FetchError::Status {
                    url: url.to_string(),
                    status,
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_successful_source() {
        let fetcher = StaticFetcher(Ok(
            r#"<article class="listing-article"><h3><a href="/x">Hello</a></h3></article>"#,
        ));
        let report = scrape_source(&fetcher, &PostojListing::new(), "https://www.postoj.sk/rodina").await;

        assert!(report.error.is_none());
        assert_eq!(report.url, "https://www.postoj.sk/rodina");
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].title, "Hello");
    }

    #[tokio::test]
    async fn test_failed_source_is_empty_with_error() {
        let fetcher = StaticFetcher(Err(404));
        let report = scrape_source(&fetcher, &PostojListing::new(), "https://www.postoj.sk/rodina").await;

        assert!(report.entries.is_empty());
        assert!(matches!(report.error, Some(FetchError::Status { status: 404, .. })));
    }
}
