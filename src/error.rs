//! Error types for every stage of the pipeline.
//!
//! Only [`FeedError`] and [`ConfigError`] are allowed to surface: the first
//! as a 500 from the HTTP handler, the second as a startup failure. Fetch and
//! extraction errors are contained by the scraper and turned into absence.

use std::string::FromUtf8Error;
use thiserror::Error;

/// A failed fetch of one source URL.
#[derive(Debug, Error)]
pub enum FetchError {
    /// DNS, connect, TLS or timeout failure before a response arrived.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// The server answered with a non-2xx status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    /// The response body could not be read.
    #[error("reading body of {url} failed: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// The build gave up on the source before any request was sent.
    #[error("fetch of {url} was cancelled before it started")]
    Cancelled { url: String },
}

impl FetchError {
    /// The source URL this error belongs to.
    pub fn url(&self) -> &str {
        match self {
            FetchError::Transport { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::Body { url, .. }
            | FetchError::Cancelled { url } => url,
        }
    }

    /// True when the request hit the configured timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            FetchError::Transport { source, .. } | FetchError::Body { source, .. } => {
                source.is_timeout()
            }
            FetchError::Status { .. } | FetchError::Cancelled { .. } => false,
        }
    }
}

/// Failure to map one article block, or one of its fields.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// A required landmark (the headline anchor) is missing or empty.
    #[error("article block has no {landmark}")]
    MissingLandmark { landmark: &'static str },
    /// The date text did not match the source's format.
    #[error("unparseable date {value:?}: {source}")]
    DateParse {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Failure to render a feed document.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed metadata is missing `{0}`")]
    MissingMetadata(&'static str),
    #[error("cannot write Atom feed: {0}")]
    Atom(#[from] atom_syndication::Error),
    #[error("cannot write RSS feed: {0}")]
    Rss(#[from] rss::Error),
    #[error("feed document is not valid utf-8: {0}")]
    Utf8(#[from] FromUtf8Error),
}

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid source url {url:?}: {source}")]
    InvalidSourceUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("no source urls configured")]
    NoSources,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_message() {
        let e = FetchError::Status {
            url: "https://www.postoj.sk/politika".to_string(),
            status: 503,
        };
        assert_eq!(e.to_string(), "https://www.postoj.sk/politika returned HTTP 503");
        assert_eq!(e.url(), "https://www.postoj.sk/politika");
        assert!(!e.is_timeout());
    }

    #[test]
    fn test_missing_landmark_message() {
        let e = ExtractError::MissingLandmark {
            landmark: "headline anchor",
        };
        assert_eq!(e.to_string(), "article block has no headline anchor");
    }
}
