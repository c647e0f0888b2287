//! Error taxonomy for a pipeline invocation.
//!
//! Three families of failure exist, and they propagate differently:
//!
//! | Error | Raised by | Effect on the invocation |
//! |-------|-----------|--------------------------|
//! | [`ValidationError`] | [`crate::trigger::parse_event`], [`crate::models::SearchRequest::new`] | Fatal, before any network call |
//! | [`FetchError`] | [`crate::fetcher::ContentFetcher`] | Fatal, nothing is published |
//! | [`PublishError`] | [`crate::publish::MessagePublisher`] | Captured per article, never raised |
//!
//! [`PipelineError`] is what [`crate::pipeline::PipelineRunner::run`] returns:
//! the union of the two fatal kinds.

use chrono::NaiveDate;
use thiserror::Error;

/// Bad or missing input to a pipeline run.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid trigger event: {0}")]
    InvalidEvent(String),

    #[error("search_term is required")]
    MissingSearchTerm,

    #[error("search term cannot be empty")]
    EmptySearchTerm,

    #[error("date_from {value:?} is not a YYYY-MM-DD date: {source}")]
    InvalidDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("date_from {date} is in the future")]
    FutureDate { date: NaiveDate },

    #[error("page size must be between 1 and {max}, got {got}")]
    InvalidPageSize { got: u32, max: u32 },
}

/// What went wrong while fetching one page.
#[derive(Debug, Error)]
pub enum FetchErrorKind {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl FetchErrorKind {
    /// Transport failures, throttling and server errors may succeed on a
    /// later attempt; everything else will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchErrorKind::Transport(_) => true,
            FetchErrorKind::Status { status, .. } => *status == 429 || *status >= 500,
            FetchErrorKind::Malformed(_) => false,
        }
    }
}

/// A failure reaching or parsing the content API, tagged with the page that
/// was being fetched.
#[derive(Debug, Error)]
#[error("failed to fetch page {page}: {kind}")]
pub struct FetchError {
    pub page: u32,
    #[source]
    pub kind: FetchErrorKind,
}

/// Failure delivering a single article to the queue.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("could not serialize message: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("queue rejected message: {0}")]
    Delivery(String),
}

/// Fatal outcome of [`crate::pipeline::PipelineRunner::run`].
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}
