//! # Messaging Types
//!
//! Core types for the provider-agnostic queue transport abstraction.

use std::time::Duration;

/// Handle for acknowledging a received message
///
/// The format is provider-specific:
/// - RabbitMQ: delivery tag as string
/// - InMemory: internal sequence number as string
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReceiptHandle(pub String);

impl ReceiptHandle {
    /// Create a new receipt handle
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ReceiptHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ReceiptHandle {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ReceiptHandle {
    fn from(handle: String) -> Self {
        Self(handle)
    }
}

impl From<&str> for ReceiptHandle {
    fn from(handle: &str) -> Self {
        Self(handle.to_string())
    }
}

/// A message received from a queue with delivery metadata
#[derive(Debug, Clone)]
pub struct QueuedMessage<T> {
    /// Handle for acknowledging this message
    pub receipt_handle: ReceiptHandle,

    /// The deserialized message payload
    pub message: T,

    /// Number of times this message has been delivered
    ///
    /// Increments on each redelivery. Providers that cannot track this
    /// natively approximate it from the redelivered flag.
    pub receive_count: u32,

    /// When the message was originally enqueued
    pub enqueued_at: chrono::DateTime<chrono::Utc>,
}

impl<T> QueuedMessage<T> {
    /// Create a new queued message
    pub fn new(
        receipt_handle: ReceiptHandle,
        message: T,
        receive_count: u32,
        enqueued_at: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        Self {
            receipt_handle,
            message,
            receive_count,
            enqueued_at,
        }
    }

    /// Map the message to a different type, keeping the delivery metadata
    pub fn map<U, F>(self, f: F) -> QueuedMessage<U>
    where
        F: FnOnce(T) -> U,
    {
        QueuedMessage {
            receipt_handle: self.receipt_handle,
            message: f(self.message),
            receive_count: self.receive_count,
            enqueued_at: self.enqueued_at,
        }
    }
}

/// Queue statistics for monitoring and depth assertions
#[derive(Debug, Clone)]
pub struct QueueStats {
    /// Queue name
    pub queue_name: String,

    /// Total number of messages in the queue (visible + in flight)
    pub message_count: u64,

    /// Number of messages currently being processed (invisible)
    ///
    /// Only available for providers that track this.
    pub in_flight_count: Option<u64>,

    /// Age of the oldest message in the queue
    pub oldest_message_age: Option<Duration>,
}

impl QueueStats {
    /// Create new queue stats
    pub fn new(queue_name: impl Into<String>, message_count: u64) -> Self {
        Self {
            queue_name: queue_name.into(),
            message_count,
            in_flight_count: None,
            oldest_message_age: None,
        }
    }

    /// Set the in-flight count
    pub fn with_in_flight_count(mut self, count: u64) -> Self {
        self.in_flight_count = Some(count);
        self
    }

    /// Set the oldest message age
    pub fn with_oldest_message_age(mut self, age: Duration) -> Self {
        self.oldest_message_age = Some(age);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_handle_conversions() {
        let from_u64 = ReceiptHandle::from(456_u64);
        assert_eq!(from_u64.as_str(), "456");

        let from_str = ReceiptHandle::from("tag-1");
        assert_eq!(from_str.as_str(), "tag-1");
    }

    #[test]
    fn test_queued_message_map() {
        let msg = QueuedMessage::new(ReceiptHandle::from("h"), 42_i32, 1, chrono::Utc::now());

        let mapped = msg.map(|n| n.to_string());
        assert_eq!(mapped.message, "42");
        assert_eq!(mapped.receive_count, 1);
        assert_eq!(mapped.receipt_handle.as_str(), "h");
    }

    #[test]
    fn test_queue_stats_builders() {
        let stats = QueueStats::new("email_queue", 3)
            .with_in_flight_count(1)
            .with_oldest_message_age(Duration::from_secs(5));

        assert_eq!(stats.message_count, 3);
        assert_eq!(stats.in_flight_count, Some(1));
        assert_eq!(stats.oldest_message_age, Some(Duration::from_secs(5)));
    }
}
