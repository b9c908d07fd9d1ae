//! # Queue Transport Traits
//!
//! Core trait definitions for provider-agnostic queue access.

use std::time::Duration;

use async_trait::async_trait;

use super::errors::MessagingError;
use super::types::{QueueStats, QueuedMessage, ReceiptHandle};

/// Core queue transport trait - provider-agnostic operations
///
/// Implementations provide the actual broker backend (RabbitMQ, InMemory).
/// The trait is designed to be implementable by any message queue system
/// that supports:
///
/// - Durable queue declaration (idempotent)
/// - Persistent message publish
/// - Message receive with bounded in-flight delivery
/// - Acknowledgment (ack/nack with requeue)
/// - Queue depth statistics
#[async_trait]
pub trait QueueTransport: Send + Sync + 'static {
    /// Declare a queue if it doesn't exist (idempotent)
    ///
    /// Safe to call from both producer and consumer paths without
    /// coordination; declaration is a no-op when the queue already exists
    /// with matching properties.
    async fn ensure_queue(&self, queue_name: &str) -> Result<(), MessagingError>;

    /// Publish a message to a queue with persistent delivery
    ///
    /// Fire-and-forget from the caller's perspective: the publish is
    /// handed to the broker without waiting for task completion.
    async fn send_message<T: QueueMessage>(
        &self,
        queue_name: &str,
        message: &T,
    ) -> Result<(), MessagingError>;

    /// Receive up to `max_messages` deliveries
    ///
    /// Received messages stay unacknowledged (invisible to other
    /// consumers) until acked or nacked. `visibility_timeout` bounds how
    /// long a provider that tracks visibility keeps the message claimed.
    async fn receive_messages<T: QueueMessage>(
        &self,
        queue_name: &str,
        max_messages: usize,
        visibility_timeout: Duration,
    ) -> Result<Vec<QueuedMessage<T>>, MessagingError>;

    /// Acknowledge successful processing (remove the message permanently)
    async fn ack_message(
        &self,
        queue_name: &str,
        receipt_handle: &ReceiptHandle,
    ) -> Result<(), MessagingError>;

    /// Negative acknowledge
    ///
    /// * `requeue=true` - the message returns to the queue for redelivery.
    /// * `requeue=false` - the message is routed to the dead-letter queue.
    async fn nack_message(
        &self,
        queue_name: &str,
        receipt_handle: &ReceiptHandle,
        requeue: bool,
    ) -> Result<(), MessagingError>;

    /// Get queue statistics (depth, in-flight count)
    async fn queue_stats(&self, queue_name: &str) -> Result<QueueStats, MessagingError>;

    /// Health check - verify the broker is reachable
    async fn health_check(&self) -> Result<bool, MessagingError>;

    /// Provider name for logging/metrics
    fn provider_name(&self) -> &'static str;
}

/// Message serialization contract
///
/// Types implementing this trait can be sent through the queue transport.
/// The wire format is UTF-8 JSON.
pub trait QueueMessage: Send + Sync + Clone + 'static {
    /// Serialize the message to bytes
    fn to_bytes(&self) -> Result<Vec<u8>, MessagingError>;

    /// Deserialize the message from bytes
    fn from_bytes(bytes: &[u8]) -> Result<Self, MessagingError>
    where
        Self: Sized;
}

/// Blanket implementation for serde-compatible types
impl<T> QueueMessage for T
where
    T: serde::Serialize + serde::de::DeserializeOwned + Send + Sync + Clone + 'static,
{
    fn to_bytes(&self) -> Result<Vec<u8>, MessagingError> {
        serde_json::to_vec(self).map_err(|e| MessagingError::serialization(e.to_string()))
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, MessagingError> {
        serde_json::from_slice(bytes).map_err(|e| MessagingError::deserialization(e.to_string()))
    }
}
