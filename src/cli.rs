//! Command-line interface definitions for Guardian Feed.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Connection settings can be provided via command-line flags or environment
//! variables; the search itself comes from flags or a JSON event.

use crate::error::ValidationError;
use crate::models::MAX_PAGE_SIZE;
use crate::trigger::{self, TriggerEvent};
use clap::Parser;
use clap::builder::NonEmptyStringValueParser;
use std::io::Read;
use std::time::Duration;
use url::Url;

/// Command-line arguments for the Guardian Feed application.
///
/// # Examples
///
/// ```sh
/// # Search from flags
/// guardian_feed -s "machine learning" -d 2024-01-01
///
/// # Search from a JSON event file
/// guardian_feed --event event.json
///
/// # Event on stdin
/// echo '{"search_term": "climate"}' | guardian_feed --event -
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Search term to look for
    #[arg(short, long, conflicts_with = "event")]
    pub search_term: Option<String>,

    /// Only articles published on or after this date (YYYY-MM-DD)
    #[arg(short, long, conflicts_with = "event")]
    pub date_from: Option<String>,

    /// JSON trigger event file (`-` for stdin), e.g. {"search_term": "...", "date_from": "..."}
    #[arg(short, long)]
    pub event: Option<String>,

    /// Content API search endpoint
    #[arg(
        long,
        env = "GUARDIAN_API_URL",
        default_value = "https://content.guardianapis.com/search",
        value_parser = parse_url
    )]
    pub api_url: String,

    /// Content API key
    #[arg(
        long,
        env = "GUARDIAN_API_KEY",
        hide_env_values = true,
        value_parser = NonEmptyStringValueParser::new()
    )]
    pub api_key: String,

    /// URL of the SQS queue articles are published to
    #[arg(long, env = "SQS_QUEUE_URL", value_parser = parse_url)]
    pub queue_url: String,

    /// AWS region of the queue
    #[arg(long, env = "AWS_REGION", default_value = "eu-west-2")]
    pub region: String,

    /// Minimum milliseconds between content API calls
    #[arg(long, env = "RATE_LIMIT_MS", default_value_t = 1000)]
    pub rate_limit_ms: u64,

    /// Results per page
    #[arg(
        long,
        env = "PAGE_SIZE",
        default_value_t = 10,
        value_parser = clap::value_parser!(u32).range(1..=MAX_PAGE_SIZE as i64)
    )]
    pub page_size: u32,

    /// Stop after this many pages
    #[arg(long, env = "MAX_PAGES", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_pages: Option<u32>,

    /// Retries per page for transient content API failures (0 disables)
    #[arg(long, env = "MAX_RETRIES", default_value_t = 2)]
    pub max_retries: u32,

    /// Per-request HTTP timeout in seconds
    #[arg(
        long,
        env = "HTTP_TIMEOUT_SECS",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_secs: u64,
}

impl Cli {
    /// Minimum spacing between content API calls.
    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }

    /// Per-request HTTP timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The trigger event for this invocation: read from `--event` when given,
    /// otherwise assembled from `--search-term` / `--date-from`.
    ///
    /// # Errors
    ///
    /// [`ValidationError::InvalidEvent`] if the event cannot be read or decoded.
    pub fn trigger_event(&self) -> Result<TriggerEvent, ValidationError> {
        let raw = match self.event.as_deref() {
            None => {
                return Ok(TriggerEvent {
                    search_term: self.search_term.clone(),
                    date_from: self.date_from.clone(),
                });
            }
            Some("-") => {
                let mut raw = String::new();
                std::io::stdin()
                    .read_to_string(&mut raw)
                    .map_err(|e| ValidationError::InvalidEvent(format!("stdin: {e}")))?;
                raw
            }
            Some(path) => std::fs::read_to_string(path)
                .map_err(|e| ValidationError::InvalidEvent(format!("{path}: {e}")))?,
        };
        trigger::parse_event(&raw)
    }
}

fn parse_url(s: &str) -> Result<String, String> {
    Url::parse(s)
        .map(|_| s.to_string())
        .map_err(|e| format!("invalid URL {s:?}: {e}"))
}
