//! Concurrent fan-out over the configured sources and merge into one feed.
//!
//! # Pipeline
//!
//! 1. Spawn one task per source URL onto a [`JoinSet`]; a [`Semaphore`]
//!    caps how many of them fetch at the same time
//! 2. Each task runs [`scrape_source`] and returns an owned [`SourceReport`]
//! 3. The coordinating task takes reports in completion order and appends
//!    their entries to the [`Feed`], skipping ids it has already seen
//! 4. The feed is serialized with [`outputs::render`]
//!
//! Tasks never touch the feed; all merging happens in the coordinating task,
//! so no locks are involved. A failed source contributes nothing and the
//! build goes on; if every source fails the result is a valid, empty feed.

use crate::config::Config;
use crate::error::{FeedError, FetchError};
use crate::fetcher::PageFetcher;
use crate::models::{Feed, FeedMetadata};
use crate::outputs::{self, FeedFormat};
use crate::scrapers::ArticleExtractor;
use crate::source::{scrape_source, SourceReport};
use clap::ValueEnum;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

/// How entries are ordered in the generated feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EntryOrder {
    /// Sources are merged as they finish; each keeps its page order.
    #[default]
    Completion,
    /// Newest first by publication date, undated entries last.
    Published,
}

/// Counters describing one build, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub sources: usize,
    pub failed: usize,
    pub entries: usize,
    pub duplicates: usize,
}

/// A serialized feed ready to be served.
#[derive(Debug, Clone)]
pub struct BuiltFeed {
    pub document: String,
    pub format: FeedFormat,
    pub stats: BuildStats,
    pub elapsed: Duration,
}

/// Builds feeds from a fixed list of sources.
///
/// Holds no state between builds beyond its immutable configuration.
pub struct Aggregator<F> {
    sources: Arc<[String]>,
    fetcher: Arc<F>,
    extractor: Arc<dyn ArticleExtractor>,
    metadata: FeedMetadata,
    max_concurrency: usize,
    order: EntryOrder,
}

impl<F> Aggregator<F>
where
    F: PageFetcher + 'static,
{
    /// Create an aggregator over `sources`.
    ///
    /// # Arguments
    ///
    /// * `sources` - Category listing URLs, fetched on every build
    /// * `fetcher` - Transport used for every source
    /// * `extractor` - Maps each fetched page to entries
    /// * `metadata` - Feed-level fields copied into every build
    ///
    /// # Returns
    ///
    /// An aggregator fetching at most 8 sources at once and keeping entries
    /// in completion order.
    pub fn new(
        sources: Vec<String>,
        fetcher: F,
        extractor: Arc<dyn ArticleExtractor>,
        metadata: FeedMetadata,
    ) -> Self {
        Self {
            sources: sources.into(),
            fetcher: Arc::new(fetcher),
            extractor,
            metadata,
            max_concurrency: 8,
            order: EntryOrder::Completion,
        }
    }

    /// Aggregator wired up from a validated [`Config`].
    pub fn from_config(config: &Config, fetcher: F) -> Self {
        Self::new(
            config.sources.clone(),
            fetcher,
            config.markup.extractor(),
            config.feed.clone(),
        )
        .with_max_concurrency(config.max_concurrency)
        .with_order(config.entry_order)
    }

    /// Cap the number of sources fetched at the same time.
    ///
    /// # Arguments
    ///
    /// * `max_concurrency` - Upper bound on in-flight fetches; `0` is read as `1`
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Choose how merged entries are ordered in the feed.
    pub fn with_order(mut self, order: EntryOrder) -> Self {
        self.order = order;
        self
    }

    /// Configured source URLs, in configuration order.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Scrape every source and merge the results into a fresh [`Feed`].
    #[instrument(level = "info", skip_all, fields(sources = self.sources.len()))]
    pub async fn collect(&self) -> (Feed, BuildStats) {
        let mut feed = Feed::new(self.metadata.clone());
        let mut stats = BuildStats {
            sources: self.sources.len(),
            ..BuildStats::default()
        };

        let permits = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();
        for url in self.sources.iter().cloned() {
            tasks.spawn(scrape_with_permit(
                Arc::clone(&permits),
                Arc::clone(&self.fetcher),
                Arc::clone(&self.extractor),
                url,
            ));
        }

        let mut seen = HashSet::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(report) => merge(&mut feed, &mut seen, &mut stats, report),
                Err(e) => {
                    stats.failed += 1;
                    error!(error = %e, "Source task did not complete");
                }
            }
        }

        if self.order == EntryOrder::Published {
            feed.entries.sort_by(|a, b| b.published.cmp(&a.published));
        }
        stats.entries = feed.entries.len();
        (feed, stats)
    }

    /// Run a full build and serialize it as `format`.
    ///
    /// Scraping failures never surface here; the only error is a feed that
    /// cannot be serialized.
    #[instrument(level = "info", skip(self))]
    pub async fn build_feed(&self, format: FeedFormat) -> Result<BuiltFeed, FeedError> {
        let t0 = Instant::now();
        let (feed, stats) = self.collect().await;

        let document = outputs::render(&feed, format).inspect_err(|e| {
            error!(error = %e, "Failed to serialize feed");
        })?;

        let elapsed = t0.elapsed();
        info!(
            sources = stats.sources,
            failed = stats.failed,
            entries = stats.entries,
            duplicates = stats.duplicates,
            bytes = document.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Feed built"
        );

        Ok(BuiltFeed {
            document,
            format,
            stats,
            elapsed,
        })
    }
}

/// Scrape `url` once a permit is free, holding it for the whole fetch.
///
/// A closed semaphore means the build is being torn down: the source is
/// reported as cancelled instead of being fetched without a bound.
async fn scrape_with_permit<F: PageFetcher>(
    permits: Arc<Semaphore>,
    fetcher: Arc<F>,
    extractor: Arc<dyn ArticleExtractor>,
    url: String,
) -> SourceReport {
    let Ok(_permit) = permits.acquire_owned().await else {
        warn!(%url, "Concurrency limiter closed; source not fetched");
        return SourceReport {
            error: Some(FetchError::Cancelled { url: url.clone() }),
            url,
            entries: Vec::new(),
        };
    };
    scrape_source(fetcher.as_ref(), extractor.as_ref(), &url).await
}

/// Append one source's entries, keeping the first occurrence of each id.
fn merge(feed: &mut Feed, seen: &mut HashSet<String>, stats: &mut BuildStats, report: SourceReport) {
    debug!(url = %report.url, entries = report.entries.len(), "Merging source");
    if report.error.is_some() {
        stats.failed += 1;
    }
    for entry in report.entries {
        if seen.insert(entry.id.clone()) {
            feed.entries.push(entry);
        } else {
            stats.duplicates += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::HttpFetcher;
    use crate::models::RawPage;
    use crate::scrapers::Markup;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory fetcher: URL -> (delay, body or HTTP status).
    #[derive(Default)]
    struct FakeFetcher {
        pages: HashMap<String, (Duration, Result<String, u16>)>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl FakeFetcher {
        fn page(mut self, url: &str, delay_ms: u64, body: String) -> Self {
            self.pages
                .insert(url.to_string(), (Duration::from_millis(delay_ms), Ok(body)));
            self
        }

        fn failing(mut self, url: &str, status: u16) -> Self {
            self.pages
                .insert(url.to_string(), (Duration::ZERO, Err(status)));
            self
        }
    }

    impl PageFetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<RawPage, FetchError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            let (delay, outcome) = self.pages.get(url).cloned().unwrap_or((Duration::ZERO, Err(404)));
            tokio::time::sleep(delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            match outcome {
                Ok(body) => Ok(RawPage {
                    url: url.to_string(),
                    status: 200,
                    body,
                }),
                Err(status) => Err(FetchError::Status {
                    url: url.to_string(),
                    status,
                }),
            }
        }
    }

    fn listing(items: &[(&str, &str, Option<&str>)]) -> String {
        let mut body = String::from("<html><body>");
        for (href, title, date) in items {
            body.push_str(&format!(
                r#"<article class="listing-article"><h3><a href="{href}">{title}</a></h3>"#
            ));
            if let Some(date) = date {
                body.push_str(&format!(r#"<time class="listing-article__date">{date}</time>"#));
            }
            body.push_str("</article>");
        }
        body.push_str("</body></html>");
        body
    }

    fn parse_atom(document: &str) -> atom_syndication::Feed {
        atom_syndication::Feed::read_from(document.as_bytes()).unwrap()
    }

    /// Listener that accepts connections and never answers them.
    async fn silent_server() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });
        format!("http://{addr}/svet")
    }

    fn aggregator(sources: &[&str], fetcher: FakeFetcher) -> Aggregator<FakeFetcher> {
        Aggregator::new(
            sources.iter().map(|s| s.to_string()).collect(),
            fetcher,
            Markup::Current.extractor(),
            FeedMetadata::default(),
        )
    }

    const A: &str = "https://www.postoj.sk/politika";
    const B: &str = "https://www.postoj.sk/kultura";
    const C: &str = "https://www.postoj.sk/rodina";

    #[tokio::test]
    async fn test_merges_in_completion_order() {
        let fetcher = FakeFetcher::default()
            .page(A, 300, listing(&[("/a1", "A1", None), ("/a2", "A2", None)]))
            .page(B, 0, listing(&[("/b1", "B1", None), ("/b2", "B2", None)]));
        let agg = aggregator(&[A, B], fetcher);

        let (feed, stats) = agg.collect().await;

        let ids: Vec<&str> = feed.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["/b1", "/b2", "/a1", "/a2"]);
        assert_eq!(stats.entries, 4);
        assert_eq!(stats.failed, 0);
    }

    #[tokio::test]
    async fn test_failed_source_does_not_abort_build() {
        let fetcher = FakeFetcher::default()
            .page(A, 0, listing(&[("/a1", "A1", None)]))
            .failing(B, 503)
            .page(C, 10, listing(&[("/c1", "C1", None)]));
        let agg = aggregator(&[A, B, C], fetcher);

        let built = agg.build_feed(FeedFormat::Atom).await.unwrap();

        assert_eq!(built.stats.sources, 3);
        assert_eq!(built.stats.failed, 1);
        assert_eq!(built.stats.entries, 2);
        assert_eq!(parse_atom(&built.document).entries.len(), 2);
    }

    #[tokio::test]
    async fn test_all_sources_failing_yields_empty_feed() {
        let fetcher = FakeFetcher::default().failing(A, 500).failing(B, 404);
        let agg = aggregator(&[A, B], fetcher);

        let built = agg.build_feed(FeedFormat::Atom).await.unwrap();

        assert_eq!(built.stats.failed, 2);
        assert_eq!(built.stats.entries, 0);
        let feed = parse_atom(&built.document);
        assert_eq!(feed.title.value, "Postoj.sk");
        assert!(feed.entries.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_ids_are_emitted_once() {
        let fetcher = FakeFetcher::default()
            .page(A, 0, listing(&[("/shared", "Shared", None), ("/a1", "A1", None)]))
            .page(B, 100, listing(&[("/shared", "Shared again", None)]));
        let agg = aggregator(&[A, B], fetcher);

        let (feed, stats) = agg.collect().await;

        assert_eq!(feed.entries.len(), 2);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(feed.entries[0].title, "Shared");
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let urls: Vec<String> = (0..6).map(|i| format!("https://www.postoj.sk/c{i}")).collect();
        let mut fetcher = FakeFetcher::default();
        for (i, url) in urls.iter().enumerate() {
            let href = format!("/{i}");
            fetcher = fetcher.page(url, 50, listing(&[(href.as_str(), "T", None)]));
        }
        let refs: Vec<&str> = urls.iter().map(String::as_str).collect();
        let agg = aggregator(&refs, fetcher).with_max_concurrency(2);

        let (feed, _) = agg.collect().await;

        assert_eq!(feed.entries.len(), 6);
        let peak = agg.fetcher.peak.load(Ordering::SeqCst);
        assert!(peak <= 2, "peak in-flight fetches was {peak}");
    }

    #[tokio::test]
    async fn test_sources_are_fetched_in_parallel() {
        let fetcher = FakeFetcher::default()
            .page(A, 100, listing(&[("/a", "A", None)]))
            .page(B, 100, listing(&[("/b", "B", None)]))
            .page(C, 100, listing(&[("/c", "C", None)]));
        let agg = aggregator(&[A, B, C], fetcher);

        let (feed, _) = agg.collect().await;

        assert_eq!(feed.entries.len(), 3);
        assert!(agg.fetcher.peak.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn test_published_order() {
        let fetcher = FakeFetcher::default().page(
            A,
            0,
            listing(&[
                ("/old", "Old", Some("01.02.2024, 09:30")),
                ("/undated", "Undated", None),
                ("/new", "New", Some("03.02.2024, 07:00")),
            ]),
        );
        let agg = aggregator(&[A], fetcher).with_order(EntryOrder::Published);

        let (feed, _) = agg.collect().await;

        let ids: Vec<&str> = feed.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["/new", "/old", "/undated"]);
    }

    #[tokio::test]
    async fn test_repeated_builds_have_same_entry_set() {
        let fetcher = FakeFetcher::default()
            .page(A, 5, listing(&[("/a1", "A1", Some("01.02.2024, 09:30"))]))
            .page(B, 5, listing(&[("/b1", "B1", None), ("/b2", "B2", None)]));
        let agg = aggregator(&[A, B], fetcher);

        let ((first, _), (second, _)) = futures::future::join(agg.collect(), agg.collect()).await;

        let mut first = first.entries;
        let mut second = second.entries;
        first.sort_by(|a, b| a.id.cmp(&b.id));
        second.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[tokio::test]
    async fn test_timed_out_source_is_skipped() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/politika")
            .with_status(200)
            .with_body(listing(&[("/p1", "P1", None), ("/p2", "P2", None)]))
            .create_async()
            .await;
        let healthy = format!("{}/politika", server.url());
        let stalled = silent_server().await;
        let fetcher = HttpFetcher::new(Duration::from_millis(200), "postoj_feed-test").unwrap();
        let agg = Aggregator::new(
            vec![stalled, healthy],
            fetcher,
            Markup::Current.extractor(),
            FeedMetadata::default(),
        );

        let built = agg.build_feed(FeedFormat::Atom).await.unwrap();

        assert_eq!(built.stats.sources, 2);
        assert_eq!(built.stats.failed, 1);
        assert_eq!(built.stats.entries, 2);
        let ids: Vec<String> = parse_atom(&built.document)
            .entries
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, ["/p1", "/p2"]);
    }

    #[tokio::test]
    async fn test_closed_limiter_cancels_without_fetching() {
        let permits = Arc::new(Semaphore::new(1));
        permits.close();
        let fetcher = Arc::new(FakeFetcher::default().page(A, 0, listing(&[("/a1", "A1", None)])));

        let report = scrape_with_permit(
            permits,
            Arc::clone(&fetcher),
            Markup::Current.extractor(),
            A.to_string(),
        )
        .await;

        assert!(report.entries.is_empty());
        assert!(matches!(report.error, Some(FetchError::Cancelled { ref url }) if url == A));
        assert_eq!(fetcher.peak.load(Ordering::SeqCst), 0);
    }
}
