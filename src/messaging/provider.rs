//! # Transport Provider Enum
//!
//! Enum dispatch for queue transports, avoiding trait object overhead.

use std::time::Duration;

use super::errors::MessagingError;
use super::providers::{InMemoryTransport, RabbitMqTransport};
use super::traits::{QueueMessage, QueueTransport};
use super::types::{QueueStats, QueuedMessage, ReceiptHandle};

/// Provider enum for zero-cost dispatch
///
/// Uses enum dispatch instead of `Arc<dyn QueueTransport>` so the generic
/// `send_message`/`receive_messages` methods stay monomorphized and the
/// hot path pays no vtable indirection.
#[derive(Debug)]
pub enum TransportProvider {
    /// RabbitMQ transport (AMQP 0.9.1 via lapin)
    RabbitMq(RabbitMqTransport),

    /// In-memory transport for testing and development
    InMemory(InMemoryTransport),
}

impl TransportProvider {
    /// Get the provider name for logging/metrics
    pub fn provider_name(&self) -> &'static str {
        match self {
            Self::RabbitMq(t) => t.provider_name(),
            Self::InMemory(t) => t.provider_name(),
        }
    }

    /// Declare a queue if it doesn't exist (idempotent)
    pub async fn ensure_queue(&self, queue_name: &str) -> Result<(), MessagingError> {
        match self {
            Self::RabbitMq(t) => t.ensure_queue(queue_name).await,
            Self::InMemory(t) => t.ensure_queue(queue_name).await,
        }
    }

    /// Publish a message with persistent delivery
    pub async fn send_message<T: QueueMessage>(
        &self,
        queue_name: &str,
        message: &T,
    ) -> Result<(), MessagingError> {
        match self {
            Self::RabbitMq(t) => t.send_message(queue_name, message).await,
            Self::InMemory(t) => t.send_message(queue_name, message).await,
        }
    }

    /// Receive up to `max_messages` deliveries
    pub async fn receive_messages<T: QueueMessage>(
        &self,
        queue_name: &str,
        max_messages: usize,
        visibility_timeout: Duration,
    ) -> Result<Vec<QueuedMessage<T>>, MessagingError> {
        match self {
            Self::RabbitMq(t) => {
                t.receive_messages(queue_name, max_messages, visibility_timeout)
                    .await
            }
            Self::InMemory(t) => {
                t.receive_messages(queue_name, max_messages, visibility_timeout)
                    .await
            }
        }
    }

    /// Acknowledge a message
    pub async fn ack_message(
        &self,
        queue_name: &str,
        receipt_handle: &ReceiptHandle,
    ) -> Result<(), MessagingError> {
        match self {
            Self::RabbitMq(t) => t.ack_message(queue_name, receipt_handle).await,
            Self::InMemory(t) => t.ack_message(queue_name, receipt_handle).await,
        }
    }

    /// Negative acknowledge a message
    pub async fn nack_message(
        &self,
        queue_name: &str,
        receipt_handle: &ReceiptHandle,
        requeue: bool,
    ) -> Result<(), MessagingError> {
        match self {
            Self::RabbitMq(t) => t.nack_message(queue_name, receipt_handle, requeue).await,
            Self::InMemory(t) => t.nack_message(queue_name, receipt_handle, requeue).await,
        }
    }

    /// Get queue statistics
    pub async fn queue_stats(&self, queue_name: &str) -> Result<QueueStats, MessagingError> {
        match self {
            Self::RabbitMq(t) => t.queue_stats(queue_name).await,
            Self::InMemory(t) => t.queue_stats(queue_name).await,
        }
    }

    /// Health check
    pub async fn health_check(&self) -> Result<bool, MessagingError> {
        match self {
            Self::RabbitMq(t) => t.health_check().await,
            Self::InMemory(t) => t.health_check().await,
        }
    }

    /// Close the underlying connection, if the provider holds one
    pub async fn close(&self) {
        if let Self::RabbitMq(t) = self {
            t.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_provider_dispatch() {
        let provider = TransportProvider::InMemory(InMemoryTransport::new());
        assert_eq!(provider.provider_name(), "in_memory");

        provider.ensure_queue("dispatch_test").await.unwrap();
        provider
            .send_message("dispatch_test", &serde_json::json!({"k": "v"}))
            .await
            .unwrap();

        let stats = provider.queue_stats("dispatch_test").await.unwrap();
        assert_eq!(stats.message_count, 1);
        assert!(provider.health_check().await.unwrap());
    }
}
