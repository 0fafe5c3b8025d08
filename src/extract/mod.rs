//! Full-text recovery from article pages.
//!
//! A page is fetched once and handed to an ordered list of
//! [`ExtractionStrategy`] values. The first strategy that produces usable
//! text (non-empty after sanitizing and trimming) wins; later strategies are
//! never run.
//!
//! # Default cascade
//!
//! | Tier | Strategy | Module | Looks at |
//! |------|----------|--------|----------|
//! | A | [`rtbf::ChapoAndBody`] | [`rtbf`] | `div.article__chapo` + filtered `div.article__body` |
//! | B | [`generic::ContentContainer`] | [`generic`] | first `article`/`main`-like container |
//! | C | [`generic::LongParagraphs`] | [`generic`] | every `p` longer than 50 characters |
//!
//! The extractor never fails: transport errors and empty pages both come
//! back as an [`Extraction`] with [`ContentOrigin::Unavailable`].

pub mod generic;
pub mod rtbf;

use crate::error::FetchError;
use crate::http::Fetch;
use crate::models::ContentOrigin;
use crate::sanitize::sanitize;
use crate::utils::truncate_for_log;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Body text used when no strategy finds anything.
pub const CONTENT_UNAVAILABLE: &str = "Content unavailable";

/// Paragraph and sub-heading elements collected by the container strategies.
pub(crate) static TEXT_BLOCKS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p, h2, h3").expect("static selector"));

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// The text of an element with runs of whitespace collapsed and trimmed.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    let raw = element.text().collect::<String>();
    WHITESPACE.replace_all(&raw, " ").trim().to_string()
}

/// One way of pulling article text out of a parsed page.
pub trait ExtractionStrategy {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Text fragments in document order. Empty when nothing matched.
    fn extract(&self, page: &Html) -> Vec<String>;
}

/// The default cascade, most specific first.
pub fn default_strategies() -> Vec<Box<dyn ExtractionStrategy>> {
    vec![
        Box::new(rtbf::ChapoAndBody),
        Box::new(generic::ContentContainer),
        Box::new(generic::LongParagraphs),
    ]
}

/// Result of extracting one article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub body_text: String,
    pub origin: ContentOrigin,
}

impl Extraction {
    fn unavailable(message: &str) -> Self {
        Self {
            body_text: sanitize(message),
            origin: ContentOrigin::Unavailable,
        }
    }
}

/// Run `strategies` in order and return the first usable result with the
/// name of the strategy that produced it.
pub fn run_cascade(
    page: &Html,
    strategies: &[Box<dyn ExtractionStrategy>],
) -> Option<(&'static str, String)> {
    strategies.iter().find_map(|strategy| {
        let fragments: Vec<String> = strategy
            .extract(page)
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect();
        let text = sanitize(&fragments.join("\n\n"));
        if text.trim().is_empty() {
            debug!(tier = strategy.name(), "Strategy found no usable text");
            None
        } else {
            Some((strategy.name(), text.trim().to_string()))
        }
    })
}

fn validate_link(link: &str) -> Result<Url, FetchError> {
    let url = Url::parse(link).map_err(|e| FetchError::InvalidUrl {
        url: link.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(FetchError::InvalidUrl {
            url: link.to_string(),
            reason: format!("unsupported scheme {other:?}"),
        }),
    }
}

/// Fetches article pages and runs the strategy cascade on them.
pub struct ArticleExtractor<F> {
    fetcher: F,
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl<F: Fetch> ArticleExtractor<F> {
    pub fn new(fetcher: F) -> Self {
        Self::with_strategies(fetcher, default_strategies())
    }

    pub fn with_strategies(fetcher: F, strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self {
            fetcher,
            strategies,
        }
    }

    /// Fetch `url` and recover its article text.
    #[instrument(level = "info", skip(self))]
    pub fn extract_content(&self, url: &str) -> Extraction {
        let body = match validate_link(url).and_then(|u| self.fetcher.fetch(u.as_str())) {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Could not retrieve article page");
                return Extraction::unavailable(&format!("Error while retrieving content: {e}"));
            }
        };
        self.extract_from_html(&body)
    }

    /// Run the cascade on an already fetched page.
    pub fn extract_from_html(&self, html: &str) -> Extraction {
        let page = Html::parse_document(html);
        match run_cascade(&page, &self.strategies) {
            Some((tier, text)) => {
                info!(tier, bytes = text.len(), preview = %truncate_for_log(&text, 80), "Extracted article text");
                Extraction {
                    body_text: text,
                    origin: ContentOrigin::FullArticle,
                }
            }
            None => {
                warn!("No strategy found article text");
                Extraction::unavailable(CONTENT_UNAVAILABLE)
            }
        }
    }
}
