//! The inbound event and outbound response of one invocation.
//!
//! An external trigger supplies a [`TriggerEvent`]; [`handle`] runs the
//! pipeline and answers with a [`TriggerResponse`] shaped like an HTTP reply:
//!
//! | Status | When | Body |
//! |--------|------|------|
//! | 200 | the run got past fetching | summary: `status`, counts, `outcomes` |
//! | 400 | unreadable event or input that failed validation | `{"error": "..."}` |
//! | 500 | a page could not be fetched | `{"error": "...", "page": n}` |
//!
//! A 200 may still carry `"status": "partial"` or `"failed"` when some or
//! all publishes were rejected; the caller decides how to report that.

use crate::api::ContentApi;
use crate::error::{PipelineError, ValidationError};
use crate::models::RunSummary;
use crate::pipeline::PipelineRunner;
use crate::publish::MessageQueue;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

/// `{"search_term": "...", "date_from": "YYYY-MM-DD" | ""}`
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct TriggerEvent {
    #[serde(default)]
    pub search_term: Option<String>,
    #[serde(default)]
    pub date_from: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TriggerResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: Value,
}

impl TriggerResponse {
    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }

    /// A 400 response for input rejected before the pipeline could start,
    /// such as an unreadable event.
    pub fn bad_request(err: ValidationError) -> Self {
        Self::error(&PipelineError::from(err))
    }

    fn ok(summary: &RunSummary) -> Self {
        Self {
            status_code: 200,
            body: json!({
                "status": summary.status(),
                "total_fetched": summary.total_fetched,
                "published": summary.published(),
                "failed": summary.failed(),
                "outcomes": summary.outcomes,
            }),
        }
    }

    fn error(err: &PipelineError) -> Self {
        match err {
            PipelineError::Validation(e) => Self {
                status_code: 400,
                body: json!({ "error": e.to_string() }),
            },
            PipelineError::Fetch(e) => Self {
                status_code: 500,
                body: json!({ "error": e.to_string(), "page": e.page }),
            },
        }
    }
}

/// Decode a JSON trigger event.
///
/// # Errors
///
/// [`ValidationError::InvalidEvent`] when `raw` is not JSON or a field has the
/// wrong type (e.g. `{"search_term": 42}`).
pub fn parse_event(raw: &str) -> Result<TriggerEvent, ValidationError> {
    serde_json::from_str(raw).map_err(|e| ValidationError::InvalidEvent(e.to_string()))
}

/// Run the pipeline for `event` and translate the result into a response.
#[instrument(level = "info", skip_all)]
pub async fn handle<A, Q>(runner: &mut PipelineRunner<A, Q>, event: TriggerEvent) -> TriggerResponse
where
    A: ContentApi,
    Q: MessageQueue,
{
    let Some(search_term) = event.search_term else {
        return TriggerResponse::bad_request(ValidationError::MissingSearchTerm);
    };

    match runner.run(&search_term, event.date_from.as_deref()).await {
        Ok(summary) => TriggerResponse::ok(&summary),
        Err(e) => TriggerResponse::error(&e),
    }
}
