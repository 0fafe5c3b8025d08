//! Command-line interface definitions for Feed Digest.
//!
//! Every option has a counterpart in [`PipelineConfig`]; flags given on the
//! command line override values from the config file.

use crate::config::{MAX_ARTICLES, PipelineConfig};
use clap::Parser;

/// Command-line arguments for the Feed Digest application.
///
/// # Examples
///
/// ```sh
/// # Ten most recent articles into the current directory
/// feed_digest
///
/// # Twenty articles, with a JSON report next to the PDF
/// feed_digest -n 20 -o ./out --report
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Number of feed articles to include
    #[arg(short = 'n', long, default_value_t = 10, value_parser = clap::value_parser!(u16).range(1..=MAX_ARTICLES as i64))]
    pub count: u16,

    /// Output directory for the generated PDF
    #[arg(short, long, env = "FEED_DIGEST_OUTPUT_DIR")]
    pub output_dir: Option<String>,

    /// Optional path to a config.yaml file
    #[arg(short, long, env = "FEED_DIGEST_CONFIG")]
    pub config: Option<String>,

    /// Pause between article fetches, in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// HTTP request timeout, in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Also write a JSON run report next to the PDF
    #[arg(long)]
    pub report: bool,
}

impl Cli {
    /// Overlay command-line values onto `config`.
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(delay) = self.delay_ms {
            config.request_delay_ms = delay;
        }
        if let Some(timeout) = self.timeout_secs {
            config.timeout_secs = timeout;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["feed_digest"]);
        assert_eq!(cli.count, 10);
        assert!(!cli.report);
        assert!(cli.delay_ms.is_none());
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from(["feed_digest", "-n", "25", "-o", "/tmp/out", "-c", "digest.yaml"]);
        assert_eq!(cli.count, 25);
        assert_eq!(cli.output_dir.as_deref(), Some("/tmp/out"));
        assert_eq!(cli.config.as_deref(), Some("digest.yaml"));
    }

    #[test]
    fn test_cli_rejects_out_of_range_count() {
        assert!(Cli::try_parse_from(["feed_digest", "--count", "0"]).is_err());
        assert!(Cli::try_parse_from(["feed_digest", "--count", "51"]).is_err());
        assert!(Cli::try_parse_from(["feed_digest", "--count", "50"]).is_ok());
    }

    #[test]
    fn test_apply_overrides_config() {
        let cli = Cli::parse_from([
            "feed_digest",
            "--output-dir",
            "/tmp/out",
            "--delay-ms",
            "0",
            "--timeout-secs",
            "5",
        ]);
        let mut config = PipelineConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.output_dir, "/tmp/out");
        assert_eq!(config.request_delay_ms, 0);
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.source_tag, "rtbf");
    }

    #[test]
    fn test_apply_without_flags_keeps_config() {
        let cli = Cli::parse_from(["feed_digest"]);
        let mut config = PipelineConfig::default();
        config.output_dir = "from-file".to_string();
        cli.apply(&mut config);
        assert_eq!(config.output_dir, "from-file");
        assert_eq!(config.request_delay_ms, 1000);
    }
}
