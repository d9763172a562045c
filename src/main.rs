//! # Postoj Feed
//!
//! Serves the category listings of [Postoj.sk](https://www.postoj.sk) as a
//! single syndication feed. The site publishes no usable feed of its own, so
//! every request scrapes the configured category pages and rebuilds one.
//!
//! ## Usage
//!
//! ```sh
//! postoj_feed --host 0.0.0.0 --port 5000
//! curl http://localhost:5000/      # Atom
//! curl http://localhost:5000/rss   # RSS 2.0
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Fetching**: One GET per category URL, concurrently and with a timeout
//! 2. **Extraction**: Article blocks on each listing are mapped to entries
//! 3. **Aggregation**: Entries are merged as sources complete, failed sources
//!    contribute nothing
//! 4. **Output**: The merged feed is rendered as Atom or RSS and returned

use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use tracing::{info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod aggregator;
mod cli;
mod config;
mod error;
mod fetcher;
mod models;
mod outputs;
mod scrapers;
mod server;
mod source;
mod utils;

use aggregator::Aggregator;
use cli::Cli;
use config::Config;
use fetcher::HttpFetcher;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("postoj_feed starting up");

    let args = Cli::parse();
    let config = Config::load(&args)?;
    info!(
        sources = config.sources.len(),
        markup = ?config.markup,
        max_concurrency = config.max_concurrency,
        timeout_secs = config.request_timeout_secs,
        entry_order = ?config.entry_order,
        "Configuration loaded"
    );

    let fetcher = HttpFetcher::new(config.request_timeout(), &config.user_agent)?;
    let aggregator = Arc::new(Aggregator::from_config(&config, fetcher));
    for url in aggregator.sources() {
        info!(%url, "Source registered");
    }

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "Listening");

    axum::serve(listener, server::router(aggregator))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let elapsed = start_time.elapsed();
    info!(?elapsed, secs = elapsed.as_secs(), "Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Cannot listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
