//! Run configuration.
//!
//! Every key has a default, so the YAML file is optional and may set only a
//! subset of them. Command-line flags are applied on top in `main`.
//!
//! ```yaml
//! output_dir: ./pdf
//! request_delay_ms: 1500
//! timeout_secs: 15
//! accept_invalid_certs: false
//! ```

use crate::error::ConfigError;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, instrument};

/// The fixed feed this tool digests.
pub const FEED_URL: &str = "https://rss.rtbf.be/article/rss/highlight_rtbfinfo_regions-bruxelles.xml";

/// Upper bound on the number of articles a single run may request.
pub const MAX_ARTICLES: usize = 50;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Feed endpoint. Not configurable from the file or the command line.
    #[serde(skip, default = "default_feed_url")]
    pub feed_url: String,
    /// Directory the finished document is written to.
    pub output_dir: String,
    /// Short source name used in the artifact file name.
    pub source_tag: String,
    /// Title printed on the cover page.
    pub document_title: String,
    /// Pause between two article fetches.
    pub request_delay_ms: u64,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Retries for transient transport errors (on top of the first attempt).
    pub max_retries: usize,
    /// First retry delay; doubles on each further attempt.
    pub retry_base_delay_ms: u64,
    /// Skip TLS certificate validation. The feed host has historically served
    /// an incomplete chain; this is a trust decision, not a security boundary.
    pub accept_invalid_certs: bool,
    pub user_agent: String,
    pub accept_language: String,
}

fn default_feed_url() -> String {
    FEED_URL.to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            feed_url: default_feed_url(),
            output_dir: ".".to_string(),
            source_tag: "rtbf".to_string(),
            document_title: "Articles RTBF Bruxelles".to_string(),
            request_delay_ms: 1000,
            timeout_secs: 20,
            max_retries: 2,
            retry_base_delay_ms: 500,
            accept_invalid_certs: true,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
            accept_language: "fr,fr-FR;q=0.8,en-US;q=0.5,en;q=0.3".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load a YAML config file, falling back to defaults for missing keys.
    #[instrument(level = "info")]
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let config = Self::from_yaml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })?;
        info!(output_dir = %config.output_dir, "Loaded configuration");
        Ok(config)
    }

    fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}
