//! The end-to-end run: feed, per-item extraction, assembly, persistence.
//!
//! # States
//!
//! ```text
//! Idle -> FetchingFeed -> Empty
//!                      -> ExtractingItems -> Assembling -> Done
//! (any) -> Failed
//! ```
//!
//! A run is a plain synchronous call. Items are processed one after the
//! other with a courtesy pause between page fetches; per-item problems are
//! absorbed and recorded, only whole-run failures come back as
//! [`PipelineError`].

use crate::config::{MAX_ARTICLES, PipelineConfig};
use crate::document::{PageKind, assemble};
use crate::error::{FeedError, PipelineError};
use crate::extract::{ArticleExtractor, Extraction};
use crate::feed::fetch_feed;
use crate::http::Fetch;
use crate::models::{ContentOrigin, ExtractedContent, FeedItem};
use crate::outputs::DocumentWriter;
use crate::utils::{artifact_file_name, truncate_for_log};
use chrono::Local;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::sleep;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    FetchingFeed,
    ExtractingItems,
    Assembling,
    Done,
    Empty,
    Failed,
}

/// One rendered article as recorded in the [`RunReport`].
#[derive(Debug, Clone, Serialize)]
pub struct ItemReport {
    pub index: usize,
    pub title: String,
    pub link: String,
    pub origin: ContentOrigin,
}

/// Summary of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub artifact: PathBuf,
    pub generated_at: String,
    pub requested: usize,
    /// Logical pages, cover included.
    pub pages: usize,
    /// Items dropped because their page could not be rendered.
    pub skipped: usize,
    pub items: Vec<ItemReport>,
}

/// How a run ended when it did not fail.
#[derive(Debug)]
pub enum Outcome {
    Done(RunReport),
    /// No articles to render. `cause` is set when the feed itself could not
    /// be read.
    Empty { cause: Option<FeedError> },
}

impl Outcome {
    /// Human-readable status line for the caller.
    pub fn status_message(&self) -> String {
        match self {
            Outcome::Done(report) => format!(
                "Document created: {} ({} articles)",
                report.artifact.display(),
                report.items.len()
            ),
            Outcome::Empty { cause: None } => "No articles found in the feed".to_string(),
            Outcome::Empty { cause: Some(e) } => format!("No articles retrieved: {e}"),
        }
    }
}

pub struct Pipeline<F, W> {
    config: PipelineConfig,
    fetcher: F,
    writer: W,
    cancel: Option<Arc<AtomicBool>>,
    state: PipelineState,
}

impl<F: Fetch, W: DocumentWriter> Pipeline<F, W> {
    pub fn new(config: PipelineConfig, fetcher: F, writer: W) -> Self {
        Self {
            config,
            fetcher,
            writer,
            cancel: None,
            state: PipelineState::Idle,
        }
    }

    /// Stop before the next item once `flag` is raised.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    fn transition(&mut self, next: PipelineState) {
        debug!(from = ?self.state, to = ?next, "Pipeline state change");
        self.state = next;
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Build a document from the first `requested_count` feed items.
    ///
    /// # Errors
    ///
    /// [`PipelineError::InvalidCount`] outside `1..=50`,
    /// [`PipelineError::Cancelled`] when the cancel flag is raised, and
    /// [`PipelineError::Persist`] when the document cannot be saved. No
    /// artifact exists after an error.
    #[instrument(level = "info", skip(self))]
    pub fn generate(&mut self, requested_count: usize) -> Result<Outcome, PipelineError> {
        let result = self.run(requested_count);
        if let Err(e) = &result {
            warn!(error = %e, "Pipeline failed");
            self.transition(PipelineState::Failed);
        }
        result
    }

    fn run(&mut self, requested_count: usize) -> Result<Outcome, PipelineError> {
        if !(1..=MAX_ARTICLES).contains(&requested_count) {
            return Err(PipelineError::InvalidCount(requested_count));
        }

        self.transition(PipelineState::FetchingFeed);
        let items = match fetch_feed(&self.fetcher, &self.config.feed_url) {
            Ok(items) if !items.is_empty() => items,
            Ok(_) => {
                info!("Feed has no items");
                self.transition(PipelineState::Empty);
                return Ok(Outcome::Empty { cause: None });
            }
            Err(e) => {
                warn!(error = %e, "Feed unavailable");
                self.transition(PipelineState::Empty);
                return Ok(Outcome::Empty { cause: Some(e) });
            }
        };

        self.transition(PipelineState::ExtractingItems);
        let extracted = self.extract_items(items, requested_count)?;

        self.transition(PipelineState::Assembling);
        let document = assemble(&self.config.document_title, Local::now(), extracted);
        let path = Path::new(&self.config.output_dir).join(artifact_file_name(
            &self.config.source_tag,
            &document.generated_at,
            self.writer.extension(),
        ));
        self.writer
            .write(&document, &path)
            .map_err(|source| PipelineError::Persist {
                path: path.display().to_string(),
                source,
            })?;

        let items = document
            .pages()
            .iter()
            .filter_map(|page| match &page.kind {
                PageKind::Article {
                    index,
                    title,
                    link,
                    origin,
                } => Some(ItemReport {
                    index: *index,
                    title: title.clone(),
                    link: link.clone(),
                    origin: *origin,
                }),
                PageKind::Cover => None,
            })
            .collect();
        let report = RunReport {
            artifact: path,
            generated_at: document.generated_at.to_rfc3339(),
            requested: requested_count,
            pages: document.page_count(),
            skipped: document.skipped(),
            items,
        };
        info!(pages = report.pages, skipped = report.skipped, artifact = %report.artifact.display(), "Document saved");

        self.transition(PipelineState::Done);
        Ok(Outcome::Done(report))
    }

    fn extract_items(
        &self,
        items: Vec<FeedItem>,
        requested_count: usize,
    ) -> Result<Vec<ExtractedContent>, PipelineError> {
        let extractor = ArticleExtractor::new(&self.fetcher);
        let total = items.len().min(requested_count);
        let delay = self.config.request_delay();
        let mut extracted = Vec::with_capacity(total);

        for (i, item) in items.into_iter().take(requested_count).enumerate() {
            if self.is_cancelled() {
                warn!(processed = i, total, "Cancellation requested");
                return Err(PipelineError::Cancelled);
            }
            if i > 0 && !delay.is_zero() {
                sleep(delay);
            }
            info!(index = i + 1, total, title = %truncate_for_log(&item.title, 80), "Processing article");

            let Extraction { body_text, origin } = extractor.extract_content(&item.link);
            extracted.push(ExtractedContent {
                source_item: item,
                body_text,
                origin,
            });
        }
        Ok(extracted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::extract::CONTENT_UNAVAILABLE;
    use crate::http::testing::MapFetcher;
    use crate::outputs::testing::{FailingWriter, MemoryWriter};

    const FEED_URL: &str = "https://feed.example/rss.xml";

    fn config() -> PipelineConfig {
        PipelineConfig {
            feed_url: FEED_URL.to_string(),
            output_dir: "/tmp/digest".to_string(),
            request_delay_ms: 0,
            ..PipelineConfig::default()
        }
    }

    fn link(n: usize) -> String {
        format!("https://www.rtbf.be/article/item-{n}")
    }

    fn feed_xml(titles: &[&str]) -> String {
        let items: String = titles
            .iter()
            .enumerate()
            .map(|(n, title)| {
                format!(
                    "<item><title>{title}</title><link>{}</link><pubDate>Mon, 14 Oct 2024 0{}:00:00 +0200</pubDate><description>Résumé de {title}</description></item>",
                    link(n),
                    n % 10
                )
            })
            .collect();
        format!("<?xml version=\"1.0\"?><rss><channel><title>Test</title>{items}</channel></rss>")
    }

    fn article_page(text: &str) -> String {
        format!(
            r#"<html><body><div class="article__chapo">{text}</div><div class="article__body"><p>Corps de l'article.</p></div></body></html>"#
        )
    }

    /// A fetcher serving `titles` as the feed and a full page for every item.
    fn fetcher_for(titles: &[&str]) -> MapFetcher {
        let mut fetcher = MapFetcher::default().with_body(FEED_URL, &feed_xml(titles));
        for (n, title) in titles.iter().enumerate() {
            fetcher = fetcher.with_body(&link(n), &article_page(&format!("Chapo {title}")));
        }
        fetcher
    }

    fn only_document(writer: &MemoryWriter) -> Document {
        let written = writer.written.borrow();
        assert_eq!(written.len(), 1);
        written[0].1.clone()
    }

    fn headlines(doc: &Document) -> Vec<String> {
        doc.pages()[1..].iter().map(|p| p.blocks[0].text.clone()).collect()
    }

    #[test]
    fn test_page_count_for_every_valid_count() {
        let titles: Vec<String> = (0..12).map(|n| format!("Article {n}")).collect();
        let titles: Vec<&str> = titles.iter().map(String::as_str).collect();
        let fetcher = fetcher_for(&titles);

        for requested in 1..=MAX_ARTICLES {
            let writer = MemoryWriter::default();
            let mut pipeline = Pipeline::new(config(), &fetcher, &writer);
            let outcome = pipeline.generate(requested).unwrap();
            let Outcome::Done(report) = outcome else {
                panic!("expected a document for {requested}");
            };
            let expected = 1 + requested.min(titles.len());
            assert_eq!(report.pages, expected);
            assert_eq!(only_document(&writer).page_count(), expected);
            assert_eq!(pipeline.state(), PipelineState::Done);
        }
    }

    #[test]
    fn test_pages_follow_feed_order() {
        let fetcher = fetcher_for(&["A", "B", "C"]);
        let writer = MemoryWriter::default();
        Pipeline::new(config(), &fetcher, &writer).generate(3).unwrap();
        let doc = only_document(&writer);
        assert_eq!(headlines(&doc), vec!["1. A", "2. B", "3. C"]);
        assert_eq!(doc.pages()[0].kind, PageKind::Cover);
    }

    #[test]
    fn test_truncates_to_requested_count() {
        let fetcher = fetcher_for(&["A", "B", "C", "D"]);
        let writer = MemoryWriter::default();
        Pipeline::new(config(), &fetcher, &writer).generate(2).unwrap();
        assert_eq!(headlines(&only_document(&writer)), vec!["1. A", "2. B"]);
        assert_eq!(fetcher.call_count(&link(2)), 0);
        assert_eq!(fetcher.call_count(&link(3)), 0);
    }

    #[test]
    fn test_failing_article_falls_back_to_summary() {
        let fetcher = fetcher_for(&["A", "B", "C", "D", "E"]).with_status(&link(2), 500);
        let writer = MemoryWriter::default();
        let outcome = Pipeline::new(config(), &fetcher, &writer).generate(5).unwrap();

        let Outcome::Done(report) = outcome else {
            panic!("expected a document");
        };
        assert_eq!(report.pages, 6);
        let origins: Vec<_> = report.items.iter().map(|i| i.origin).collect();
        assert_eq!(
            origins,
            vec![
                ContentOrigin::FullArticle,
                ContentOrigin::FullArticle,
                ContentOrigin::Summary,
                ContentOrigin::FullArticle,
                ContentOrigin::FullArticle,
            ]
        );
        let doc = only_document(&writer);
        assert_eq!(doc.pages()[3].blocks.last().unwrap().text, "Resume de C");
    }

    #[test]
    fn test_failing_article_without_summary_uses_placeholder() {
        let feed = r#"<rss><channel>
            <item><title>A</title><link>https://www.rtbf.be/article/empty</link></item>
        </channel></rss>"#;
        let fetcher = MapFetcher::default()
            .with_body(FEED_URL, feed)
            .with_body("https://www.rtbf.be/article/empty", "<html><body><nav>Menu</nav></body></html>");
        let writer = MemoryWriter::default();
        Pipeline::new(config(), &fetcher, &writer).generate(1).unwrap();

        let doc = only_document(&writer);
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.pages()[1].blocks.last().unwrap().text, CONTENT_UNAVAILABLE);
    }

    #[test]
    fn test_feed_failure_is_empty_without_artifact() {
        let fetcher = MapFetcher::default().with_timeout(FEED_URL);
        let writer = MemoryWriter::default();
        let mut pipeline = Pipeline::new(config(), &fetcher, &writer);

        let outcome = pipeline.generate(5).unwrap();
        assert!(matches!(
            outcome,
            Outcome::Empty {
                cause: Some(FeedError::Unavailable(_))
            }
        ));
        assert!(outcome.status_message().starts_with("No articles retrieved"));
        assert_eq!(pipeline.state(), PipelineState::Empty);
        assert!(writer.written.borrow().is_empty());
    }

    #[test]
    fn test_malformed_feed_is_empty() {
        let fetcher = MapFetcher::default().with_body(FEED_URL, "<rss><channel><item>");
        let writer = MemoryWriter::default();
        let outcome = Pipeline::new(config(), &fetcher, &writer).generate(1).unwrap();
        assert!(matches!(
            outcome,
            Outcome::Empty {
                cause: Some(FeedError::Malformed(_))
            }
        ));
        assert!(writer.written.borrow().is_empty());
    }

    #[test]
    fn test_feed_without_items_is_empty() {
        let fetcher = MapFetcher::default().with_body(FEED_URL, &feed_xml(&[]));
        let writer = MemoryWriter::default();
        let outcome = Pipeline::new(config(), &fetcher, &writer).generate(3).unwrap();
        assert!(matches!(outcome, Outcome::Empty { cause: None }));
        assert_eq!(outcome.status_message(), "No articles found in the feed");
    }

    #[test]
    fn test_rejects_out_of_range_counts() {
        let fetcher = fetcher_for(&["A"]);
        let writer = MemoryWriter::default();
        for requested in [0, MAX_ARTICLES + 1] {
            let mut pipeline = Pipeline::new(config(), &fetcher, &writer);
            let err = pipeline.generate(requested).unwrap_err();
            assert!(matches!(err, PipelineError::InvalidCount(n) if n == requested));
            assert_eq!(pipeline.state(), PipelineState::Failed);
        }
        assert!(fetcher.calls.borrow().is_empty());
    }

    #[test]
    fn test_cancellation_stops_before_next_item() {
        let fetcher = fetcher_for(&["A", "B"]);
        let writer = MemoryWriter::default();
        let flag = Arc::new(AtomicBool::new(true));
        let mut pipeline = Pipeline::new(config(), &fetcher, &writer).with_cancel_flag(flag);

        assert!(matches!(pipeline.generate(2), Err(PipelineError::Cancelled)));
        assert_eq!(pipeline.state(), PipelineState::Failed);
        assert!(writer.written.borrow().is_empty());
        assert_eq!(fetcher.call_count(&link(0)), 0);
    }

    #[test]
    fn test_persist_failure() {
        let fetcher = fetcher_for(&["A"]);
        let mut pipeline = Pipeline::new(config(), &fetcher, FailingWriter);
        let err = pipeline.generate(1).unwrap_err();
        assert!(matches!(err, PipelineError::Persist { .. }));
        assert!(err.to_string().contains("read-only file system"));
        assert_eq!(pipeline.state(), PipelineState::Failed);
    }

    #[test]
    fn test_unrenderable_item_is_skipped() {
        let fetcher = fetcher_for(&["A", "B\u{7}", "C"]);
        let writer = MemoryWriter::default();
        let outcome = Pipeline::new(config(), &fetcher, &writer).generate(3).unwrap();
        let Outcome::Done(report) = outcome else {
            panic!("expected a document");
        };
        assert_eq!(report.pages, 3);
        assert_eq!(report.skipped, 1);
        assert_eq!(headlines(&only_document(&writer)), vec!["1. A", "3. C"]);
    }

    #[test]
    fn test_artifact_name() {
        let fetcher = fetcher_for(&["A"]);
        let writer = MemoryWriter::default();
        let outcome = Pipeline::new(config(), &fetcher, &writer).generate(1).unwrap();
        let Outcome::Done(report) = &outcome else {
            panic!("expected a document");
        };
        let name = report.artifact.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("articles_rtbf_"));
        assert!(name.ends_with(".mem"));
        assert_eq!(name.len(), "articles_rtbf_YYYYMMDD_HHMMSS.mem".len());
        assert!(report.artifact.starts_with("/tmp/digest"));
        let stamp = chrono::DateTime::parse_from_rfc3339(&report.generated_at).unwrap();
        assert_eq!(
            name,
            format!("articles_rtbf_{}.mem", stamp.format("%Y%m%d_%H%M%S"))
        );
        assert_eq!(only_document(&writer).generated_at.to_rfc3339(), report.generated_at);
        assert!(outcome.status_message().starts_with("Document created: /tmp/digest/articles_rtbf_"));
    }
}
