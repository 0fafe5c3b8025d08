//! Error types for each layer of the pipeline.
//!
//! Per-item conditions ([`FetchError`] while extracting, [`RenderError`]) are
//! absorbed at the item boundary. [`FeedError`] is turned into an empty
//! outcome by the orchestrator. Only [`PipelineError`] reaches the caller.

use thiserror::Error;

/// A failed network read through the [`crate::http::Fetch`] seam.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP status {status}")]
    Status { url: String, status: u16 },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl FetchError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Timeout { .. } | FetchError::Request { .. } => true,
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::InvalidUrl { .. } | FetchError::Client(_) => false,
        }
    }
}

/// The feed could not be retrieved or parsed.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed unavailable: {0}")]
    Unavailable(#[from] FetchError),

    #[error("malformed feed document: {0}")]
    Malformed(String),
}

/// A single page could not be laid out.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unrenderable character {ch:?} at offset {offset}")]
    Unrenderable { ch: char, offset: usize },
}

/// Serializing a finished document or report failed.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration file problems.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Whole-run failures with no defined recovery.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("requested article count {0} is outside 1..=50")]
    InvalidCount(usize),

    #[error("run cancelled before completion")]
    Cancelled,

    #[error("could not save document to {path}: {source}")]
    Persist {
        path: String,
        #[source]
        source: WriteError,
    },

    #[error(transparent)]
    Transport(#[from] FetchError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_statuses() {
        let status = |status| FetchError::Status {
            url: "https://example.com".to_string(),
            status,
        };
        assert!(status(503).is_transient());
        assert!(status(429).is_transient());
        assert!(!status(404).is_transient());
        assert!(
            FetchError::Timeout {
                url: "https://example.com".to_string()
            }
            .is_transient()
        );
    }

    #[test]
    fn test_feed_error_wraps_fetch_error() {
        let err: FeedError = FetchError::Status {
            url: "https://example.com/rss".to_string(),
            status: 502,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "feed unavailable: https://example.com/rss answered with HTTP status 502"
        );
    }
}
