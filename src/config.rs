//! Service configuration.
//!
//! Configuration is read once at startup, from an optional YAML file with
//! CLI flags layered on top, validated, and then passed by value into the
//! [`Aggregator`](crate::aggregator::Aggregator). Nothing reads it afterwards.
//!
//! # Example
//!
//! ```yaml
//! sources:
//!   - https://www.postoj.sk/politika
//!   - https://www.postoj.sk/kultura
//! markup: current
//! max_concurrency: 4
//! request_timeout_secs: 10
//! entry_order: completion
//! feed:
//!   title: Postoj.sk
//! ```

use crate::aggregator::EntryOrder;
use crate::cli::Cli;
use crate::error::ConfigError;
use crate::models::FeedMetadata;
use crate::scrapers::Markup;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

/// Category listing pages scraped when no source list is configured.
pub const DEFAULT_SOURCES: [&str; 6] = [
    "https://www.postoj.sk/komentare-nazory",
    "https://www.postoj.sk/politika",
    "https://www.postoj.sk/spolocnost",
    "https://www.postoj.sk/kultura",
    "https://www.postoj.sk/rodina",
    "https://svetkrestanstva.postoj.sk/svet-krestanstva",
];

/// Validated runtime configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Category listing URLs, one fetch each per build.
    pub sources: Vec<String>,
    /// Fixed feed metadata.
    pub feed: FeedMetadata,
    /// Which listing markup to parse.
    pub markup: Markup,
    /// Upper bound on concurrent source fetches.
    pub max_concurrency: usize,
    /// Per-fetch timeout, in seconds.
    pub request_timeout_secs: u64,
    /// User agent sent with every fetch.
    pub user_agent: String,
    /// Order of entries in the generated feed.
    pub entry_order: EntryOrder,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: DEFAULT_SOURCES.iter().map(|s| s.to_string()).collect(),
            feed: FeedMetadata::default(),
            markup: Markup::default(),
            max_concurrency: 8,
            request_timeout_secs: 15,
            user_agent: concat!("postoj_feed/", env!("CARGO_PKG_VERSION")).to_string(),
            entry_order: EntryOrder::default(),
        }
    }
}

impl Config {
    /// Parse a YAML document. Missing keys keep their defaults.
    pub fn from_yaml(yaml: &str, origin: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    /// Read and parse a YAML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        Self::from_yaml(&yaml, &display)
    }

    /// Build the effective configuration from the command line: the file
    /// named by `--config` (or defaults), then flag overrides, then
    /// validation.
    #[instrument(level = "info", skip_all)]
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => {
                info!(path = %path.display(), "Loading configuration file");
                Self::from_file(path)?
            }
            None => Self::default(),
        };

        if let Some(markup) = cli.markup {
            config.markup = markup;
        }
        if let Some(n) = cli.max_concurrency {
            config.max_concurrency = n;
        }
        if let Some(secs) = cli.timeout_secs {
            config.request_timeout_secs = secs;
        }
        if let Some(order) = cli.entry_order {
            config.entry_order = order;
        }

        config.validate()?;
        debug!(?config, "Effective configuration");
        Ok(config)
    }

    /// Check the source list and clamp numeric limits.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.sources = self
            .sources
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if self.sources.is_empty() {
            return Err(ConfigError::NoSources);
        }
        for url in &self.sources {
            Url::parse(url).map_err(|source| ConfigError::InvalidSourceUrl {
                url: url.clone(),
                source,
            })?;
        }
        self.max_concurrency = self.max_concurrency.max(1);
        self.request_timeout_secs = self.request_timeout_secs.max(1);
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
