//! # Guardian Feed
//!
//! Fetches Guardian articles matching a search term and forwards each one,
//! as its own message, to an Amazon SQS queue for downstream consumers.
//!
//! ## Usage
//!
//! ```sh
//! GUARDIAN_API_KEY=... SQS_QUEUE_URL=https://sqs.eu-west-2.amazonaws.com/.../guardian_content \
//!     guardian_feed -s "machine learning" -d 2024-01-01
//! ```
//!
//! The invocation's result is printed to stdout as JSON
//! (`{"statusCode": ..., "body": {...}}`); logs go to stderr.
//!
//! ## Architecture
//!
//! One invocation is a single sequential pipeline:
//! 1. **Validating**: Check the search term and optional start date
//! 2. **Fetching**: Walk every result page, one rate-limited call at a time
//! 3. **Publishing**: Send each article to the queue, recording per-article outcomes
//! 4. **Reporting**: Summarize fetched vs. published counts

use clap::Parser;
use std::error::Error;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod error;
mod fetcher;
mod models;
mod pipeline;
mod publish;
mod rate_limit;
#[cfg(test)]
mod testing;
mod trigger;
mod utils;

use api::{GuardianClient, RetryPolicy};
use cli::Cli;
use fetcher::ContentFetcher;
use pipeline::PipelineRunner;
use publish::{MessagePublisher, SqsQueue};
use rate_limit::RateLimiter;
use trigger::{TriggerEvent, TriggerResponse};

/// Initial delay between fetch retries; doubles per attempt.
const RETRY_BASE_DELAY: std::time::Duration = std::time::Duration::from_secs(1);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!(version = env!("CARGO_PKG_VERSION"), "guardian_feed starting up");

    let args = Cli::parse();
    debug!(api_url = %args.api_url, queue_url = %args.queue_url, region = %args.region, "Parsed CLI arguments");

    let response = match args.trigger_event() {
        Ok(event) => run(&args, event).await?,
        Err(e) => {
            error!(error = %e, "Could not read trigger event");
            TriggerResponse::bad_request(e)
        }
    };
    println!("{}", serde_json::to_string(&response)?);

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        status_code = response.status_code,
        "Execution complete"
    );

    Ok(if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Build the concrete pipeline from `args` and handle one event with it.
async fn run(args: &Cli, event: TriggerEvent) -> Result<TriggerResponse, Box<dyn Error>> {
    // ---- Build pipeline ----
    let api = GuardianClient::new(&args.api_url, &args.api_key, args.timeout())
        .map_err(|e| e as Box<dyn Error>)?;
    let limiter = RateLimiter::new(args.rate_limit());
    info!(interval_ms = limiter.interval().as_millis() as u64, "Rate limiter configured");
    let fetcher = ContentFetcher::new(api, limiter, RetryPolicy::new(args.max_retries, RETRY_BASE_DELAY))
        .with_max_pages(args.max_pages);
    let queue = SqsQueue::connect(&args.queue_url, &args.region).await;
    let mut runner = PipelineRunner::new(fetcher, MessagePublisher::new(queue), args.page_size);

    // ---- Run ----
    Ok(trigger::handle(&mut runner, event).await)
}
