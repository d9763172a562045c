//! Page fetching over HTTP.
//!
//! The [`PageFetcher`] trait is the seam between the pipeline and the
//! network: the aggregator only ever talks to it, so tests can substitute an
//! in-memory implementation. [`HttpFetcher`] is the production one.
//!
//! # Behavior
//!
//! - One GET per call, no retry and no caching
//! - Every request carries the client-wide timeout and user agent
//! - Non-2xx statuses and transport failures become a [`FetchError`]
//! - No cookie store, so nothing is shared between sources or requests

use crate::error::FetchError;
use crate::models::RawPage;
use crate::utils::truncate_for_log;
use reqwest::Client;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

/// Something that can turn a source URL into a [`RawPage`].
pub trait PageFetcher: Send + Sync {
    /// Fetch one page. Implementations must never panic on network failure;
    /// every failure is reported as a [`FetchError`].
    fn fetch(&self, url: &str) -> impl Future<Output = Result<RawPage, FetchError>> + Send;
}

/// [`PageFetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a fetcher whose every request carries `timeout` and `user_agent`.
    ///
    /// # Errors
    ///
    /// Fails only if the TLS backend cannot be initialised.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<RawPage, FetchError> {
        let t0 = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })?;

        debug!(
            status = status.as_u16(),
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            preview = %truncate_for_log(&body, 120),
            "Fetched page"
        );

        Ok(RawPage {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        })
    }
}
