//! JSON run report.
//!
//! The report sits next to the document it describes and records, for every
//! rendered article, where its body text came from. Useful for spotting
//! pages where the site layout changed and only summaries were rendered.

use crate::error::WriteError;
use crate::pipeline::RunReport;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// `<artifact>.json` for a given artifact path.
pub fn report_path_for(artifact: &Path) -> PathBuf {
    let mut path = artifact.as_os_str().to_owned();
    path.push(".json");
    PathBuf::from(path)
}

/// Write `report` as pretty-printed JSON next to its artifact.
#[instrument(level = "info", skip_all, fields(artifact = %report.artifact.display()))]
pub async fn write_report(report: &RunReport) -> Result<PathBuf, WriteError> {
    let json = serde_json::to_string_pretty(report)?;
    let path = report_path_for(&report.artifact);
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote run report");
    Ok(path)
}
