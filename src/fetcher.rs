//! Paginated, rate-limited retrieval of search results.
//!
//! [`ContentFetcher::fetch`] walks the result pages of one [`SearchRequest`]
//! starting at page 1, until the page number reaches the total page count
//! reported by the source. Every HTTP attempt, retries included, is preceded
//! by [`RateLimiter::wait`].
//!
//! Any failure (transport error, non-2xx status, malformed envelope) aborts
//! the whole fetch with a [`FetchError`] naming the page; pages already
//! retrieved are dropped.

use crate::api::{ContentApi, RawResponse, RetryPolicy};
use crate::error::{FetchError, FetchErrorKind};
use crate::models::{Article, FetchResult, SearchEnvelope, SearchRequest};
use crate::rate_limit::RateLimiter;
use crate::utils::truncate_for_log;
use std::time::Instant;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// Maximum bytes of an error body kept in a [`FetchErrorKind::Status`].
const ERROR_BODY_MAX: usize = 300;

#[derive(Debug)]
pub struct ContentFetcher<A> {
    api: A,
    limiter: RateLimiter,
    retry: RetryPolicy,
    /// Stop after this many pages even if the source reports more.
    max_pages: Option<u32>,
}

impl<A> ContentFetcher<A>
where
    A: ContentApi,
{
    /// Create a fetcher with no page cap.
    ///
    /// # Arguments
    ///
    /// * `api` - Transport used for every search call
    /// * `limiter` - Awaited before each HTTP attempt, retries included
    /// * `retry` - Backoff applied to transient failures of a single page
    pub fn new(api: A, limiter: RateLimiter, retry: RetryPolicy) -> Self {
        Self {
            api,
            limiter,
            retry,
            max_pages: None,
        }
    }

    #[cfg(test)]
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Stop after `max_pages` pages even if the source reports more.
    /// `None` walks every page.
    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Fetch every page of `request` and return the articles in fetch order.
    ///
    /// `request.page` is ignored; fetching always starts at page 1.
    #[instrument(level = "info", skip_all, fields(term = %request.search_term))]
    pub async fn fetch(&mut self, request: &SearchRequest) -> Result<Vec<Article>, FetchError> {
        let t0 = Instant::now();
        let mut articles = Vec::new();
        let mut page = 1;

        loop {
            let result = self.fetch_page(&request.at_page(page)).await?;
            let total_pages = result.total_pages;
            debug!(
                page,
                current_page = result.current_page,
                total_pages,
                total = result.total,
                count = result.articles.len(),
                "Fetched page"
            );
            articles.extend(result.articles);

            if page >= total_pages {
                break;
            }
            if self.max_pages.is_some_and(|max| page >= max) {
                warn!(page, total_pages, "Page cap reached; stopping early");
                break;
            }
            page += 1;
        }

        info!(
            pages = page,
            count = articles.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetch complete"
        );
        Ok(articles)
    }

    /// Fetch one page, retrying transient failures per the retry policy.
    #[instrument(level = "debug", skip_all, fields(page = request.page))]
    async fn fetch_page(&mut self, request: &SearchRequest) -> Result<FetchResult, FetchError> {
        let params = request.query_params();
        let mut attempt = 0u32;

        loop {
            self.limiter.wait().await;
            let kind = match self.api.search(&params).await {
                Ok(response) => match parse_page(response) {
                    Ok(result) => return Ok(result),
                    Err(kind) => kind,
                },
                Err(e) => FetchErrorKind::Transport(e.to_string()),
            };

            attempt += 1;
            if !kind.is_retryable() || attempt > self.retry.max_retries {
                debug!(page = request.page, attempt, error = %kind, "Giving up on page");
                return Err(FetchError {
                    page: request.page,
                    kind,
                });
            }

            let delay = self.retry.delay_for(attempt);
            warn!(
                page = request.page,
                attempt,
                max = self.retry.max_retries,
                ?delay,
                error = %kind,
                "Fetch attempt failed; backing off"
            );
            sleep(delay).await;
        }
    }
}

/// Interpret one raw response as a page of results.
fn parse_page(response: RawResponse) -> Result<FetchResult, FetchErrorKind> {
    if !response.is_success() {
        return Err(FetchErrorKind::Status {
            status: response.status,
            body: truncate_for_log(&response.body, ERROR_BODY_MAX),
        });
    }

    let envelope: SearchEnvelope = serde_json::from_str(&response.body)
        .map_err(|e| FetchErrorKind::Malformed(e.to_string()))?;
    let page = envelope.response;

    if let Some(status) = page.status.as_deref() {
        if status != "ok" {
            return Err(FetchErrorKind::Malformed(format!(
                "source reported status {status:?}"
            )));
        }
    }

    let mut articles = Vec::with_capacity(page.results.len());
    for raw in page.results {
        match Article::from_result(raw) {
            Ok(article) => articles.push(article),
            Err(reason) => warn!(%reason, "Skipping incomplete result"),
        }
    }

    Ok(FetchResult {
        articles,
        current_page: page.current_page,
        total_pages: page.pages,
        total: page.total,
    })
}
