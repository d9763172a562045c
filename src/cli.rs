//! Command-line interface definitions for the feed service.
//!
//! Every option can also be given through the environment; values given here
//! override the YAML configuration file.

use crate::aggregator::EntryOrder;
use crate::scrapers::Markup;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the feed service.
///
/// # Examples
///
/// ```sh
/// # Serve the default Postoj.sk categories on localhost:5000
/// postoj_feed
///
/// # Custom source list and bind address
/// postoj_feed -c ./postoj_feed.yaml --host 0.0.0.0 -p 8080
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML configuration file
    #[arg(short, long, env = "POSTOJ_FEED_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind the HTTP listener to
    #[arg(long, env = "POSTOJ_FEED_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind the HTTP listener to
    #[arg(short, long, env = "POSTOJ_FEED_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Listing markup to parse (overrides the config file)
    #[arg(long, value_enum)]
    pub markup: Option<Markup>,

    /// Maximum number of sources fetched at once
    #[arg(long)]
    pub max_concurrency: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Entry order in the generated feed
    #[arg(long, value_enum)]
    pub entry_order: Option<EntryOrder>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["postoj_feed"]);

        assert_eq!(cli.host, "127.0.0.1");
        assert_eq!(cli.port, 5000);
        assert!(cli.config.is_none());
        assert!(cli.markup.is_none());
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from(["postoj_feed", "-c", "/etc/postoj_feed.yaml", "-p", "8080"]);

        assert_eq!(cli.config, Some(PathBuf::from("/etc/postoj_feed.yaml")));
        assert_eq!(cli.port, 8080);
    }
}
