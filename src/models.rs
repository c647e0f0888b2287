//! Data models for search requests, fetched articles and publish results.
//!
//! This module defines the core data structures used throughout the application:
//! - [`SearchRequest`]: A validated query against the content API
//! - [`Article`]: One search result, immutable once fetched
//! - [`FetchResult`]: One page of results plus pagination metadata
//! - [`ArticleMessage`]: The canonical queue message body for an article
//! - [`PublishOutcome`] and [`RunSummary`]: What a run reports back
//!
//! The wire types ([`SearchEnvelope`], [`SearchPage`]) mirror the Guardian
//! Open Platform response, which uses camelCase field names.

use crate::error::ValidationError;
use crate::utils::preview;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Largest page size the content API accepts.
pub const MAX_PAGE_SIZE: u32 = 200;

/// Number of body characters carried in [`Article::content_preview`].
pub const PREVIEW_CHARS: usize = 1000;

/// A validated search against the content API.
///
/// Construct through [`SearchRequest::new`], which enforces:
/// - the search term is non-empty after trimming
/// - `date_from`, when given and non-empty, is a `YYYY-MM-DD` date no later than today (UTC)
/// - the page size is within `1..=MAX_PAGE_SIZE`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub search_term: String,
    pub date_from: Option<NaiveDate>,
    pub page: u32,
    pub page_size: u32,
}

impl SearchRequest {
    /// Validate raw input and build the request for page 1.
    ///
    /// An empty or whitespace-only `date_from` means "no lower bound",
    /// exactly like `None`.
    pub fn new(
        search_term: &str,
        date_from: Option<&str>,
        page_size: u32,
    ) -> Result<Self, ValidationError> {
        let search_term = search_term.trim();
        if search_term.is_empty() {
            return Err(ValidationError::EmptySearchTerm);
        }

        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(ValidationError::InvalidPageSize {
                got: page_size,
                max: MAX_PAGE_SIZE,
            });
        }

        let date_from = match date_from.map(str::trim).filter(|d| !d.is_empty()) {
            None => None,
            Some(raw) => {
                let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|source| {
                    ValidationError::InvalidDate {
                        value: raw.to_string(),
                        source,
                    }
                })?;
                if date > Utc::now().date_naive() {
                    return Err(ValidationError::FutureDate { date });
                }
                Some(date)
            }
        };

        Ok(Self {
            search_term: search_term.to_string(),
            date_from,
            page: 1,
            page_size,
        })
    }

    /// The same search, positioned at another page.
    pub fn at_page(&self, page: u32) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }

    /// Query parameters for this request, excluding credentials.
    ///
    /// The search term is phrase-quoted so multi-word terms match as a phrase.
    /// `from-date` is omitted entirely when there is no lower bound.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("q", format!("\"{}\"", self.search_term))];
        if let Some(date) = self.date_from {
            params.push(("from-date", date.format("%Y-%m-%d").to_string()));
        }
        params.push(("page", self.page.to_string()));
        params.push(("page-size", self.page_size.to_string()));
        params.push(("order-by", "newest".to_string()));
        params.push(("show-fields", "bodyText".to_string()));
        params
    }
}

/// Top-level body of a search response: `{"response": {...}}`.
#[derive(Debug, Deserialize)]
pub struct SearchEnvelope {
    pub response: SearchPage,
}

/// The `response` object of a search response.
///
/// Results are kept as raw JSON so that one odd item can be skipped without
/// failing the whole page.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub current_page: u32,
    #[serde(default)]
    pub pages: u32,
    pub results: Vec<Value>,
}

/// One search result from the content API.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    /// Source identifier, unique per article (e.g. `world/2024/jan/01/slug`).
    pub id: String,
    pub title: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
    /// Section name, or an empty string when the source has none.
    pub section: String,
    /// First [`PREVIEW_CHARS`] characters of the body text.
    pub content_preview: String,
    /// The result object exactly as the source returned it.
    pub raw: Value,
}

impl Article {
    /// Build an article from one raw result object.
    ///
    /// `webTitle`, `webUrl` and an RFC 3339 `webPublicationDate` are
    /// required; the error names what was missing. `id` falls back to the
    /// URL and `section` to `sectionId` when absent.
    pub fn from_result(raw: Value) -> Result<Self, String> {
        let field = |name: &str| raw.get(name).and_then(Value::as_str).map(str::to_string);

        let title = field("webTitle").ok_or("missing webTitle")?;
        let url = field("webUrl").ok_or("missing webUrl")?;
        let published = field("webPublicationDate").ok_or("missing webPublicationDate")?;
        let published_at = DateTime::parse_from_rfc3339(&published)
            .map_err(|e| format!("bad webPublicationDate {published:?}: {e}"))?
            .with_timezone(&Utc);

        let id = field("id").unwrap_or_else(|| url.clone());
        let section = field("sectionName")
            .or_else(|| field("sectionId"))
            .unwrap_or_default();
        let content_preview = raw
            .pointer("/fields/bodyText")
            .and_then(Value::as_str)
            .map(|body| preview(body, PREVIEW_CHARS))
            .unwrap_or_default();

        Ok(Self {
            id,
            title,
            url,
            published_at,
            section,
            content_preview,
            raw,
        })
    }
}

/// One page of articles plus what the source reported about pagination.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub articles: Vec<Article>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total: u64,
}

/// The canonical queue message for an [`Article`].
///
/// Key names follow the content API's vocabulary so consumers can treat
/// messages and API results alike.
#[derive(Debug, Serialize, PartialEq)]
pub struct ArticleMessage<'a> {
    pub id: &'a str,
    #[serde(rename = "webTitle")]
    pub title: &'a str,
    #[serde(rename = "webUrl")]
    pub url: &'a str,
    #[serde(rename = "webPublicationDate")]
    pub published_at: String,
    #[serde(rename = "sectionName")]
    pub section: &'a str,
    pub content_preview: &'a str,
}

impl<'a> From<&'a Article> for ArticleMessage<'a> {
    fn from(article: &'a Article) -> Self {
        Self {
            id: &article.id,
            title: &article.title,
            url: &article.url,
            published_at: article
                .published_at
                .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            section: &article.section,
            content_preview: &article.content_preview,
        }
    }
}

/// Result of handing one article to the queue.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PublishOutcome {
    pub article_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Identifier the queue assigned to the message, when it reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

impl PublishOutcome {
    pub fn sent(article_id: &str, message_id: Option<String>) -> Self {
        Self {
            article_id: article_id.to_string(),
            success: true,
            error: None,
            message_id,
        }
    }

    pub fn failed(article_id: &str, error: impl ToString) -> Self {
        Self {
            article_id: article_id.to_string(),
            success: false,
            error: Some(error.to_string()),
            message_id: None,
        }
    }
}

/// Overall verdict of a run that got past fetching.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every fetched article was published (including the zero-article case).
    Completed,
    /// Some, but not all, articles were published.
    Partial,
    /// Articles were fetched but none could be published.
    Failed,
}

/// What [`crate::pipeline::PipelineRunner::run`] reports back.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub total_fetched: usize,
    pub outcomes: Vec<PublishOutcome>,
}

impl RunSummary {
    pub fn published(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.published()
    }

    pub fn status(&self) -> RunStatus {
        match (self.published(), self.failed()) {
            (_, 0) => RunStatus::Completed,
            (0, _) => RunStatus::Failed,
            _ => RunStatus::Partial,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_result() -> Value {
        json!({
            "id": "technology/2024/jan/01/test-article",
            "sectionId": "technology",
            "sectionName": "Technology",
            "webPublicationDate": "2024-01-01T10:00:00Z",
            "webTitle": "Test Article",
            "webUrl": "http://test.com",
            "fields": {"bodyText": "Test content"}
        })
    }

    #[test]
    fn test_search_request_trims_term() {
        let req = SearchRequest::new("  machine learning ", None, 10).unwrap();
        assert_eq!(req.search_term, "machine learning");
        assert_eq!(req.page, 1);
        assert_eq!(req.date_from, None);
    }

    #[test]
    fn test_search_request_rejects_blank_term() {
        assert!(matches!(
            SearchRequest::new("   ", None, 10),
            Err(ValidationError::EmptySearchTerm)
        ));
    }

    #[test]
    fn test_search_request_rejects_bad_dates() {
        assert!(matches!(
            SearchRequest::new("test", Some("01/02/2024"), 10),
            Err(ValidationError::InvalidDate { .. })
        ));
        assert!(matches!(
            SearchRequest::new("test", Some("2024-02-30"), 10),
            Err(ValidationError::InvalidDate { .. })
        ));
        assert!(matches!(
            SearchRequest::new("test", Some("2999-01-01"), 10),
            Err(ValidationError::FutureDate { .. })
        ));
    }

    #[test]
    fn test_search_request_rejects_page_size() {
        assert!(matches!(
            SearchRequest::new("test", None, 0),
            Err(ValidationError::InvalidPageSize { got: 0, .. })
        ));
        assert!(SearchRequest::new("test", None, MAX_PAGE_SIZE + 1).is_err());
    }

    #[test]
    fn test_empty_date_from_matches_none() {
        let empty = SearchRequest::new("test", Some(""), 10).unwrap();
        let blank = SearchRequest::new("test", Some("  "), 10).unwrap();
        let none = SearchRequest::new("test", None, 10).unwrap();

        assert_eq!(empty, none);
        assert_eq!(blank, none);
        assert_eq!(empty.query_params(), none.query_params());
        assert!(none.query_params().iter().all(|(k, _)| *k != "from-date"));
    }

    #[test]
    fn test_query_params() {
        let req = SearchRequest::new("test", Some("2024-01-01"), 10)
            .unwrap()
            .at_page(3);
        let params = req.query_params();

        assert!(params.contains(&("q", "\"test\"".to_string())));
        assert!(params.contains(&("from-date", "2024-01-01".to_string())));
        assert!(params.contains(&("page", "3".to_string())));
        assert!(params.contains(&("page-size", "10".to_string())));
        assert!(params.contains(&("order-by", "newest".to_string())));
        assert!(params.contains(&("show-fields", "bodyText".to_string())));
    }

    #[test]
    fn test_article_from_result() {
        let article = Article::from_result(sample_result()).unwrap();
        assert_eq!(article.id, "technology/2024/jan/01/test-article");
        assert_eq!(article.title, "Test Article");
        assert_eq!(article.url, "http://test.com");
        assert_eq!(article.section, "Technology");
        assert_eq!(article.content_preview, "Test content");
        assert_eq!(article.published_at.to_rfc3339(), "2024-01-01T10:00:00+00:00");
    }

    #[test]
    fn test_article_requires_core_fields() {
        let mut raw = sample_result();
        raw.as_object_mut().unwrap().remove("webUrl");
        assert_eq!(Article::from_result(raw).unwrap_err(), "missing webUrl");

        let mut raw = sample_result();
        raw["webPublicationDate"] = json!("yesterday");
        assert!(Article::from_result(raw).is_err());
    }

    #[test]
    fn test_article_preview_is_truncated() {
        let mut raw = sample_result();
        raw["fields"]["bodyText"] = json!("é".repeat(PREVIEW_CHARS + 50));
        let article = Article::from_result(raw).unwrap();
        assert_eq!(article.content_preview.chars().count(), PREVIEW_CHARS);
    }

    #[test]
    fn test_article_message_shape() {
        let article = Article::from_result(sample_result()).unwrap();
        let body = serde_json::to_value(ArticleMessage::from(&article)).unwrap();
        assert_eq!(
            body,
            json!({
                "id": "technology/2024/jan/01/test-article",
                "webTitle": "Test Article",
                "webUrl": "http://test.com",
                "webPublicationDate": "2024-01-01T10:00:00Z",
                "sectionName": "Technology",
                "content_preview": "Test content"
            })
        );
    }

    #[test]
    fn test_run_summary_status() {
        let ok = PublishOutcome::sent("a", None);
        let bad = PublishOutcome::failed("b", "nope");

        let empty = RunSummary { total_fetched: 0, outcomes: vec![] };
        assert_eq!(empty.status(), RunStatus::Completed);

        let partial = RunSummary {
            total_fetched: 2,
            outcomes: vec![ok.clone(), bad.clone()],
        };
        assert_eq!(partial.published(), 1);
        assert_eq!(partial.failed(), 1);
        assert_eq!(partial.status(), RunStatus::Partial);

        let failed = RunSummary { total_fetched: 1, outcomes: vec![bad] };
        assert_eq!(failed.status(), RunStatus::Failed);
    }
}
