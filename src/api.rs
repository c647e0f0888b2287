//! Content API transport and retry policy.
//!
//! This module is the seam between the fetcher and the network:
//! - [`ContentApi`]: Core trait, "GET the search endpoint with these parameters"
//! - [`GuardianClient`]: `reqwest` implementation holding the endpoint, API key and timeout
//! - [`RetryPolicy`]: Bounded exponential backoff used by the fetcher between attempts
//!
//! The transport does no status or body interpretation. It returns whatever
//! the server sent, and [`crate::fetcher::ContentFetcher`] decides what is an
//! error. This keeps the fetcher testable against scripted responses.
//!
//! # Retry Strategy
//!
//! - Bounded by `max_retries` (0 disables retrying)
//! - Exponential backoff starting at `base_delay`
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to each delay

use rand::{Rng, rng};
use std::error::Error;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// Boxed transport error. `Send + Sync` so it can cross task boundaries.
pub type TransportError = Box<dyn Error + Send + Sync>;

/// What came back from one HTTP call, before interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for issuing one search call against the content API.
///
/// Implementors add credentials themselves; callers only supply the
/// search parameters.
pub trait ContentApi {
    /// Issue one GET with the given query parameters.
    ///
    /// # Returns
    ///
    /// The status and body of any completed HTTP exchange (including non-2xx),
    /// or an error if no response was received (connect failure, timeout, ...).
    async fn search(&self, params: &[(&'static str, String)]) -> Result<RawResponse, TransportError>;
}

/// `reqwest`-backed [`ContentApi`] for the Guardian Open Platform.
pub struct GuardianClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GuardianClient {
    /// Build a client for `endpoint` authenticating with `api_key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed
    /// (e.g. the TLS backend fails to initialize).
    pub fn new(endpoint: &str, api_key: &str, timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

// The API key never appears in Debug output.
impl std::fmt::Debug for GuardianClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardianClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl ContentApi for GuardianClient {
    #[instrument(level = "debug", skip_all, fields(endpoint = %self.endpoint))]
    async fn search(&self, params: &[(&'static str, String)]) -> Result<RawResponse, TransportError> {
        let t0 = Instant::now();
        let res = self
            .http
            .get(&self.endpoint)
            .query(params)
            .query(&[("api-key", self.api_key.as_str())])
            .send()
            .await;
        let dt = t0.elapsed();

        let response = match res {
            Ok(response) => response,
            Err(e) => {
                // reqwest errors carry the full URL, api-key included
                let e = e.without_url();
                warn!(elapsed_ms = dt.as_millis() as u64, error = %e, "Content API call failed");
                return Err(e.into());
            }
        };

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| e.without_url())?;
        debug!(
            status,
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Content API responded"
        );
        Ok(RawResponse { status, body })
    }
}

/// Bounded exponential backoff between fetch attempts.
///
/// The delay before retry `n` (1-based) follows:
/// ```text
/// delay = min(base_delay * 2^(n-1), max_delay) + random_jitter(0..=250ms)
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Initial delay between retries (doubles with each attempt).
    pub base_delay: Duration,
    /// Maximum delay cap, before jitter.
    pub max_delay: Duration,
    /// Upper bound of the random jitter added to every delay.
    pub max_jitter: Duration,
}

impl RetryPolicy {
    /// Create a policy with the default 30 second cap and 250ms jitter.
    ///
    /// # Arguments
    ///
    /// * `max_retries` - Retries after the first attempt; 0 disables retrying
    /// * `base_delay` - Delay before the first retry
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
            max_jitter: Duration::from_millis(250),
        }
    }

    /// A policy that never retries.
    #[cfg(test)]
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Delay to sleep before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        let mut delay = self.base_delay.saturating_mul(1 << shift);
        if delay > self.max_delay {
            delay = self.max_delay;
        }
        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            0
        } else {
            rng().random_range(0..=jitter_ms)
        };
        delay + Duration::from_millis(jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_jitter(max_retries: u32, base_ms: u64) -> RetryPolicy {
        RetryPolicy {
            max_jitter: Duration::ZERO,
            ..RetryPolicy::new(max_retries, Duration::from_millis(base_ms))
        }
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = no_jitter(5, 1000);
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
        assert_eq!(policy.delay_for(5), Duration::from_secs(16));
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = no_jitter(10, 1000);
        assert_eq!(policy.delay_for(6), Duration::from_secs(30));
        assert_eq!(policy.delay_for(40), Duration::from_secs(30));
    }

    #[test]
    fn test_jitter_bounds() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        for _ in 0..50 {
            let d = policy.delay_for(1);
            assert!(d >= Duration::from_millis(100));
            assert!(d <= Duration::from_millis(350));
        }
    }

    #[test]
    fn test_raw_response_success_range() {
        let ok = RawResponse { status: 204, body: String::new() };
        let bad = RawResponse { status: 301, body: String::new() };
        assert!(ok.is_success());
        assert!(!bad.is_success());
    }

    #[test]
    fn test_client_debug_hides_key() {
        let client = GuardianClient::new(
            "https://content.guardianapis.com/search",
            "secret-key",
            Duration::from_secs(30),
        )
        .unwrap();
        let dbg = format!("{client:?}");
        assert!(dbg.contains("content.guardianapis.com"));
        assert!(!dbg.contains("secret-key"));
    }
}
