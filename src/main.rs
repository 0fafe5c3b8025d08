//! # Feed Digest
//!
//! Turns the latest entries of a regional news RSS feed into a printable PDF
//! digest: one cover page, then one page per article with its full text.
//!
//! ## Features
//!
//! - Reads the RTBF Bruxelles feed and keeps the first N items in feed order
//! - Extracts article text with a cascade of strategies, site-specific first
//! - Falls back to the feed summary when a page yields nothing usable
//! - Folds every text to plain ASCII so the base PDF fonts can draw it
//! - Optionally writes a JSON report describing where each body came from
//!
//! ## Usage
//!
//! ```sh
//! feed_digest -n 15 -o ./digests --report
//! ```
//!
//! ## Architecture
//!
//! 1. **Feed**: fetch and parse the RSS document
//! 2. **Extraction**: fetch each article page and run the cascade, pausing between requests
//! 3. **Assembly**: build the paginated document in memory
//! 4. **Output**: write the PDF atomically, then the optional report

use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod document;
mod error;
mod extract;
mod feed;
mod http;
mod models;
mod outputs;
mod pipeline;
mod sanitize;
mod utils;

use cli::Cli;
use config::PipelineConfig;
use error::PipelineError;
use http::{HttpFetcher, RetryFetch};
use outputs::{json, pdf::PdfWriter};
use pipeline::{Outcome, Pipeline};
use utils::ensure_writable_dir;

/// Build the live HTTP stack and run the pipeline to completion.
fn run_pipeline(
    config: PipelineConfig,
    count: usize,
    cancel: Arc<AtomicBool>,
) -> Result<Outcome, PipelineError> {
    let fetcher = RetryFetch::new(
        HttpFetcher::new(&config)?,
        config.max_retries,
        config.retry_base_delay(),
    );
    let mut pipeline = Pipeline::new(config, fetcher, PdfWriter).with_cancel_flag(cancel);
    let result = pipeline.generate(count);
    debug!(state = ?pipeline.state(), "Pipeline finished");
    result
}

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
    info!("feed_digest starting up");

    let args = Cli::parse();
    debug!(count = args.count, ?args.output_dir, ?args.config, "Parsed CLI arguments");

    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    args.apply(&mut config);
    info!(feed = %config.feed_url, output_dir = %config.output_dir, "Configuration ready");

    // Early check: fail before any network traffic if the PDF cannot be saved
    if let Err(e) = ensure_writable_dir(&config.output_dir).await {
        error!(
            path = %config.output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received; stopping before the next article");
                cancel.store(true, Ordering::Relaxed);
            }
        });
    }

    let count = usize::from(args.count);
    let outcome = match tokio::task::spawn_blocking(move || run_pipeline(config, count, cancel)).await? {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "Digest generation failed");
            return Err(e.into());
        }
    };

    if args.report {
        if let Outcome::Done(report) = &outcome {
            if let Err(e) = json::write_report(report).await {
                error!(error = %e, "Failed to write run report");
            }
        }
    }

    println!("{}", outcome.status_message());

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}
