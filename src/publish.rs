//! Publishing articles onto the downstream queue.
//!
//! This module provides the queue abstraction and the per-article publisher:
//! - [`MessageQueue`]: one logical destination that accepts a message body
//! - [`SqsQueue`]: Amazon SQS implementation bound to a single queue URL
//! - [`MessagePublisher`]: serializes an [`Article`] and makes one send attempt
//!
//! # Delivery Semantics
//!
//! [`MessagePublisher::publish`] never fails. A serialization or delivery
//! problem is recorded in the returned [`PublishOutcome`] so the caller can
//! carry on with the remaining articles. There is no retry here; the AWS
//! SDK applies its own retry policy inside [`SqsQueue::send`].
//!
//! # Message Body
//!
//! One JSON object per article (see [`ArticleMessage`]):
//!
//! ```json
//! {
//!   "id": "technology/2024/jan/01/slug",
//!   "webTitle": "Headline",
//!   "webUrl": "https://www.theguardian.com/...",
//!   "webPublicationDate": "2024-01-01T10:00:00Z",
//!   "sectionName": "Technology",
//!   "content_preview": "First 1000 characters of the body..."
//! }
//! ```

use crate::error::PublishError;
use crate::models::{Article, ArticleMessage, PublishOutcome};
use aws_sdk_sqs::config::Region;
use aws_sdk_sqs::error::DisplayErrorContext;
use tracing::{debug, info, instrument, warn};

/// A single logical queue.
pub trait MessageQueue {
    /// Deliver one message body.
    ///
    /// # Returns
    ///
    /// The identifier the queue assigned to the message, when it reports one.
    async fn send(&self, body: String) -> Result<Option<String>, PublishError>;
}

/// Amazon SQS queue addressed by its URL.
#[derive(Debug, Clone)]
pub struct SqsQueue {
    client: aws_sdk_sqs::Client,
    queue_url: String,
}

impl SqsQueue {
    /// Connect to the queue at `queue_url` in `region`.
    ///
    /// Credentials come from the standard AWS provider chain (environment,
    /// shared profile, instance or task role). No request is made here; a
    /// bad URL or missing credentials surface on the first send.
    #[instrument(level = "info", skip_all, fields(%queue_url, %region))]
    pub async fn connect(queue_url: &str, region: &str) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;
        info!("SQS client initialized");
        Self {
            client: aws_sdk_sqs::Client::new(&config),
            queue_url: queue_url.to_string(),
        }
    }
}

impl MessageQueue for SqsQueue {
    async fn send(&self, body: String) -> Result<Option<String>, PublishError> {
        let output = self
            .client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| PublishError::Delivery(DisplayErrorContext(&e).to_string()))?;
        Ok(output.message_id().map(str::to_string))
    }
}

/// Hands articles to a [`MessageQueue`], one message each.
#[derive(Debug)]
pub struct MessagePublisher<Q> {
    queue: Q,
}

impl<Q> MessagePublisher<Q>
where
    Q: MessageQueue,
{
    /// Create a publisher that sends every message to `queue`.
    pub fn new(queue: Q) -> Self {
        Self { queue }
    }

    #[cfg(test)]
    pub fn queue(&self) -> &Q {
        &self.queue
    }

    /// Serialize `article` and make exactly one send attempt.
    #[instrument(level = "info", skip_all, fields(article_id = %article.id))]
    pub async fn publish(&self, article: &Article) -> PublishOutcome {
        match self.try_publish(article).await {
            Ok(message_id) => {
                debug!(?message_id, "Published article");
                PublishOutcome::sent(&article.id, message_id)
            }
            Err(e) => {
                warn!(error = %e, "Failed to publish article");
                PublishOutcome::failed(&article.id, e)
            }
        }
    }

    async fn try_publish(&self, article: &Article) -> Result<Option<String>, PublishError> {
        let body = serde_json::to_string(&ArticleMessage::from(article))?;
        self.queue.send(body).await
    }
}
