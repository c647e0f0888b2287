//! End-to-end orchestration of one invocation.
//!
//! [`PipelineRunner::run`] moves through these stages, never backwards:
//!
//! ```text
//! Validating ──► Fetching ──► Publishing(n) ──► Completed
//!      │             │
//!      ▼             ▼
//!  (ValidationError) FailedFetch
//! ```
//!
//! Validation and fetch failures end the run with an error and nothing is
//! published. Publish failures are recorded per article and the loop
//! continues.

use crate::api::ContentApi;
use crate::error::PipelineError;
use crate::fetcher::ContentFetcher;
use crate::models::{RunSummary, SearchRequest};
use crate::publish::{MessagePublisher, MessageQueue};
use std::time::Instant;
use tracing::{error, info, instrument};

#[derive(Debug)]
pub struct PipelineRunner<A, Q> {
    fetcher: ContentFetcher<A>,
    publisher: MessagePublisher<Q>,
    page_size: u32,
}

impl<A, Q> PipelineRunner<A, Q>
where
    A: ContentApi,
    Q: MessageQueue,
{
    /// Wire a fetcher and publisher into a runner.
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Retrieves every page of a search
    /// * `publisher` - Sends each fetched article as its own message
    /// * `page_size` - Results per page, validated on every run
    pub fn new(fetcher: ContentFetcher<A>, publisher: MessagePublisher<Q>, page_size: u32) -> Self {
        Self {
            fetcher,
            publisher,
            page_size,
        }
    }

    /// Fetch every article matching `search_term` (optionally published on or
    /// after `date_from`) and publish each one, in fetch order.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::Validation`] for a blank term or a bad date, before any network call
    /// - [`PipelineError::Fetch`] when any page cannot be retrieved; nothing is published
    #[instrument(level = "info", skip_all, fields(search_term = %search_term, date_from = ?date_from))]
    pub async fn run(
        &mut self,
        search_term: &str,
        date_from: Option<&str>,
    ) -> Result<RunSummary, PipelineError> {
        let t0 = Instant::now();

        let request = match SearchRequest::new(search_term, date_from, self.page_size) {
            Ok(request) => request,
            Err(e) => {
                error!(error = %e, "Validation failed");
                return Err(e.into());
            }
        };

        info!(page_size = request.page_size, "Fetching articles");
        let articles = match self.fetcher.fetch(&request).await {
            Ok(articles) => articles,
            Err(e) => {
                error!(page = e.page, error = %e, "Fetch failed; nothing will be published");
                return Err(e.into());
            }
        };

        let total_fetched = articles.len();
        info!(total_fetched, "Publishing articles");
        let mut outcomes = Vec::with_capacity(total_fetched);
        for article in &articles {
            outcomes.push(self.publisher.publish(article).await);
        }

        let summary = RunSummary {
            total_fetched,
            outcomes,
        };
        info!(
            total_fetched,
            published = summary.published(),
            failed = summary.failed(),
            status = ?summary.status(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Run complete"
        );
        Ok(summary)
    }
}
