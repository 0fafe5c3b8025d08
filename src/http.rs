//! Network access with retry and exponential backoff.
//!
//! All reads of the feed and of article pages go through the [`Fetch`]
//! trait so the pipeline can be driven without a network in tests.
//!
//! # Architecture
//!
//! - [`Fetch`]: core trait, fetch a URL and return its body as text
//! - [`HttpFetcher`]: blocking `reqwest` implementation
//! - [`RetryFetch`]: decorator that retries transient failures of any `Fetch`
//!
//! # Trust posture
//!
//! [`HttpFetcher`] disables certificate validation unless the configuration
//! says otherwise. Content is read-only and never executed, and the source
//! site has served broken chains in the past. This is a known, accepted risk.
//!
//! # Retry Strategy
//!
//! - Only transient errors are retried (timeouts, connection errors, 429, 5xx)
//! - Exponential backoff from the configured base delay, capped at 10 seconds
//! - Random jitter (0-250ms) added to each delay

use crate::config::PipelineConfig;
use crate::error::FetchError;
use rand::{Rng, rng};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use std::fmt;
use std::thread::sleep;
use std::time::{Duration, Instant};
use tracing::{debug, error, instrument, warn};

/// Retrieve the body of a URL as text.
pub trait Fetch {
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

impl<T: Fetch + ?Sized> Fetch for &T {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        (**self).fetch(url)
    }
}

/// Blocking HTTP client configured with browser-like headers.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a client from the run configuration.
    ///
    /// Must not be called from inside an async context; the CLI builds it on
    /// the blocking worker that runs the pipeline.
    pub fn new(config: &PipelineConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"),
        );
        if let Ok(lang) = HeaderValue::from_str(&config.accept_language) {
            headers.insert(ACCEPT_LANGUAGE, lang);
        }

        if config.accept_invalid_certs {
            warn!("TLS certificate validation is disabled");
        }

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.timeout())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let t0 = Instant::now();
        let wrap = |source: reqwest::Error| {
            if source.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Request {
                    url: url.to_string(),
                    source,
                }
            }
        };

        let response = self.client.get(url).send().map_err(wrap)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.text().map_err(wrap)?;
        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched"
        );
        Ok(body)
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`Fetch`].
///
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryFetch<T> {
    inner: T,
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
}

impl<T: Fetch> RetryFetch<T> {
    pub fn new(inner: T, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(10),
        }
    }

    fn backoff(&self, attempt: usize) -> Duration {
        let shift = (attempt.saturating_sub(1)).min(16) as u32;
        let delay = self.base_delay.saturating_mul(1 << shift).min(self.max_delay);
        if delay.is_zero() {
            return delay;
        }
        let jitter_ms: u64 = rng().random_range(0..=250);
        delay + Duration::from_millis(jitter_ms)
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T: Fetch> Fetch for RetryFetch<T> {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let mut attempt = 0usize;
        loop {
            match self.inner.fetch(url) {
                Ok(body) => return Ok(body),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        error!(attempt, max = self.max_retries, error = %e, %url, "fetch exhausted retries");
                        return Err(e);
                    }
                    let delay = self.backoff(attempt);
                    warn!(attempt, max = self.max_retries, ?delay, error = %e, %url, "fetch failed; backing off");
                    sleep(delay);
                }
            }
        }
    }
}
