//! Message queue capability
//!
//! The gateway only needs `publish(topic, message) -> ack | failure`. The
//! Pub/Sub REST implementation lives in [`pubsub`]; tests substitute their
//! own [`Publisher`].

pub mod pubsub;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use pubsub::PubSubPublisher;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Queue rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Queue response missing message id")]
    MissingAck,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Durable queue publisher
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Publish one message and wait for the acknowledgement.
    ///
    /// Returns the queue-assigned message id.
    async fn publish(&self, topic: &str, message: &Value) -> Result<String, PublishError>;
}
