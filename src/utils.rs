//! Utility functions for logging, artifact naming and file system checks.

use chrono::{DateTime, TimeZone};
use std::error::Error;
use std::fmt::Display;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and the number
/// of dropped bytes appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// File name for a finished document.
///
/// The name is derived from the generation timestamp:
/// `articles_<source>_<YYYYMMDD_HHMMSS>.<extension>`.
pub fn artifact_file_name<Tz>(source: &str, generated_at: &DateTime<Tz>, extension: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "articles_{}_{}.{}",
        source,
        generated_at.format("%Y%m%d_%H%M%S"),
        extension
    )
}

/// Create `path` if needed and check that files can be written into it.
///
/// A probe file is written and removed again; a probe that cannot be
/// removed is only logged.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe = Path::new(path).join(".feed_digest_write_probe");
    fs::write(&probe, b"").await?;
    if let Err(e) = fs::remove_file(&probe).await {
        warn!(path = %probe.display(), error = %e, "Could not remove write probe");
    }
    info!("Output directory is writable");
    Ok(())
}
