//! HTTP surface of the service.
//!
//! | Route | Response |
//! |-------|----------|
//! | `GET /` | Atom feed, built on demand |
//! | `GET /rss` | RSS 2.0 feed, built on demand |
//! | `GET /health` | `ok`, without touching any source |
//!
//! Every feed request runs a complete build; nothing is cached between
//! requests. Scraping problems only shrink the feed, so the one failure that
//! reaches the client is a feed that cannot be serialized (500).

use crate::aggregator::Aggregator;
use crate::fetcher::PageFetcher;
use crate::outputs::FeedFormat;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

/// Build the application router around a shared aggregator.
pub fn router<F>(aggregator: Arc<Aggregator<F>>) -> Router
where
    F: PageFetcher + 'static,
{
    Router::new()
        .route("/", get(atom_feed::<F>))
        .route("/rss", get(rss_feed::<F>))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(aggregator)
}

async fn atom_feed<F: PageFetcher + 'static>(
    State(aggregator): State<Arc<Aggregator<F>>>,
) -> Response {
    serve_feed(&aggregator, FeedFormat::Atom).await
}

async fn rss_feed<F: PageFetcher + 'static>(
    State(aggregator): State<Arc<Aggregator<F>>>,
) -> Response {
    serve_feed(&aggregator, FeedFormat::Rss).await
}

async fn health() -> &'static str {
    "ok"
}

#[instrument(level = "info", skip(aggregator))]
async fn serve_feed<F: PageFetcher + 'static>(
    aggregator: &Aggregator<F>,
    format: FeedFormat,
) -> Response {
    match aggregator.build_feed(format).await {
        Ok(built) => {
            info!(
                entries = built.stats.entries,
                failed_sources = built.stats.failed,
                elapsed_ms = built.elapsed.as_millis() as u64,
                "Serving feed"
            );
            (
                [(header::CONTENT_TYPE, built.format.content_type())],
                built.document,
            )
                .into_response()
        }
        // Already logged by the aggregator.
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("cannot render feed: {e}"),
        )
            .into_response(),
    }
}
