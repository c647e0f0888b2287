//! Minimum spacing between outbound requests to the content API.
//!
//! The provider's usage policy is expressed as "no more than one call per
//! interval". [`RateLimiter::wait`] is called immediately before every HTTP
//! attempt and suspends until the interval since the previous call has
//! passed.
//!
//! Each limiter owns its own "last call" timestamp, so independent limiters
//! (one per fetcher, one per test) share no state.

use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::debug;

#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    last_call: Option<Instant>,
}

impl RateLimiter {
    /// Create a limiter allowing one call per `interval`.
    ///
    /// # Arguments
    ///
    /// * `interval` - Minimum spacing between consecutive calls; zero disables waiting
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_call: None,
        }
    }

    /// The configured minimum spacing.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Suspend until at least `interval` has elapsed since the previous
    /// `wait()` returned. The first call returns immediately.
    pub async fn wait(&mut self) {
        if let Some(last) = self.last_call {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                let delay = self.interval - elapsed;
                debug!(delay_ms = delay.as_millis() as u64, "Rate limit: waiting");
                sleep(delay).await;
            }
        }
        self.last_call = Some(Instant::now());
    }
}
