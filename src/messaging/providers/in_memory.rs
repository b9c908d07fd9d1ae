//! # In-Memory Queue Transport
//!
//! Thread-safe in-memory transport for tests and development.
//!
//! Mirrors broker semantics closely enough for the delivery-contract tests:
//! visibility timeouts on receive, dead-letter routing on
//! `nack(requeue=false)`, and a restart simulation that drops everything
//! not published persistently.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::messaging::errors::MessagingError;
use crate::messaging::traits::{QueueMessage, QueueTransport};
use crate::messaging::types::{QueueStats, QueuedMessage, ReceiptHandle};

/// Suffix for dead-letter queues, matching the RabbitMQ provider's naming
const DLQ_SUFFIX: &str = "_dlq";

/// In-memory message with visibility tracking
#[derive(Debug, Clone)]
struct StoredMessage {
    id: u64,
    payload: Vec<u8>,
    enqueued_at: DateTime<Utc>,
    /// When the message becomes visible again (None = visible now)
    visible_at: Option<DateTime<Utc>>,
    receive_count: u32,
    /// Survives `simulate_restart` when true
    persistent: bool,
}

/// A single in-memory queue (FIFO order)
#[derive(Debug, Default)]
struct StoredQueue {
    messages: VecDeque<StoredMessage>,
    next_id: u64,
}

/// In-memory queue transport for testing
///
/// All messages published through `send_message` are persistent, matching
/// the producer contract. `simulate_restart` models a broker restart:
/// non-persistent messages are dropped and in-flight claims are released.
#[derive(Debug, Default)]
pub struct InMemoryTransport {
    queues: RwLock<HashMap<String, StoredQueue>>,
}

impl InMemoryTransport {
    /// Create a new in-memory transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages currently in a queue (for tests)
    pub async fn queue_length(&self, queue_name: &str) -> usize {
        let queues = self.queues.read().await;
        queues
            .get(queue_name)
            .map(|q| q.messages.len())
            .unwrap_or(0)
    }

    /// Enqueue a raw payload with an explicit persistence flag (for tests)
    pub async fn send_raw(
        &self,
        queue_name: &str,
        payload: Vec<u8>,
        persistent: bool,
    ) -> Result<(), MessagingError> {
        let mut queues = self.queues.write().await;
        let queue = queues
            .get_mut(queue_name)
            .ok_or_else(|| MessagingError::queue_not_found(queue_name))?;

        queue.next_id += 1;
        queue.messages.push_back(StoredMessage {
            id: queue.next_id,
            payload,
            enqueued_at: Utc::now(),
            visible_at: None,
            receive_count: 0,
            persistent,
        });
        Ok(())
    }

    /// Simulate a broker restart
    ///
    /// Drops messages not marked persistent and releases every in-flight
    /// claim, as a restarted broker would redeliver unacknowledged work.
    pub async fn simulate_restart(&self) {
        let mut queues = self.queues.write().await;
        for queue in queues.values_mut() {
            queue.messages.retain(|m| m.persistent);
            for msg in queue.messages.iter_mut() {
                msg.visible_at = None;
            }
        }
    }

    /// Route a message to the queue's dead-letter queue
    ///
    /// The DLQ is created on demand, mirroring the RabbitMQ provider where
    /// `ensure_queue` sets it up alongside the main queue.
    fn dead_letter(queues: &mut HashMap<String, StoredQueue>, queue_name: &str, msg: StoredMessage) {
        let dlq = queues.entry(format!("{queue_name}{DLQ_SUFFIX}")).or_default();
        dlq.next_id += 1;
        dlq.messages.push_back(StoredMessage {
            id: dlq.next_id,
            visible_at: None,
            ..msg
        });
    }
}

#[async_trait]
impl QueueTransport for InMemoryTransport {
    async fn ensure_queue(&self, queue_name: &str) -> Result<(), MessagingError> {
        let mut queues = self.queues.write().await;
        queues.entry(queue_name.to_string()).or_default();
        queues
            .entry(format!("{queue_name}{DLQ_SUFFIX}"))
            .or_default();
        Ok(())
    }

    async fn send_message<T: QueueMessage>(
        &self,
        queue_name: &str,
        message: &T,
    ) -> Result<(), MessagingError> {
        let payload = message.to_bytes()?;
        self.send_raw(queue_name, payload, true).await
    }

    async fn receive_messages<T: QueueMessage>(
        &self,
        queue_name: &str,
        max_messages: usize,
        visibility_timeout: Duration,
    ) -> Result<Vec<QueuedMessage<T>>, MessagingError> {
        let mut queues = self.queues.write().await;
        let queue = queues
            .get_mut(queue_name)
            .ok_or_else(|| MessagingError::queue_not_found(queue_name))?;

        let now = Utc::now();
        let claim_until = now
            + chrono::Duration::from_std(visibility_timeout)
                .map_err(|e| MessagingError::internal(e.to_string()))?;
        let mut received = Vec::new();

        for msg in queue.messages.iter_mut() {
            if received.len() >= max_messages {
                break;
            }

            let is_visible = msg.visible_at.map(|vt| vt <= now).unwrap_or(true);
            if is_visible {
                let deserialized = T::from_bytes(&msg.payload)?;

                msg.visible_at = Some(claim_until);
                msg.receive_count += 1;

                received.push(QueuedMessage::new(
                    ReceiptHandle::from(msg.id),
                    deserialized,
                    msg.receive_count,
                    msg.enqueued_at,
                ));
            }
        }

        Ok(received)
    }

    async fn ack_message(
        &self,
        queue_name: &str,
        receipt_handle: &ReceiptHandle,
    ) -> Result<(), MessagingError> {
        let message_id: u64 = receipt_handle
            .as_str()
            .parse()
            .map_err(|_| MessagingError::invalid_receipt_handle(receipt_handle.as_str()))?;

        let mut queues = self.queues.write().await;
        let queue = queues
            .get_mut(queue_name)
            .ok_or_else(|| MessagingError::queue_not_found(queue_name))?;

        if let Some(pos) = queue.messages.iter().position(|m| m.id == message_id) {
            queue.messages.remove(pos);
            Ok(())
        } else {
            Err(MessagingError::message_not_found(message_id.to_string()))
        }
    }

    async fn nack_message(
        &self,
        queue_name: &str,
        receipt_handle: &ReceiptHandle,
        requeue: bool,
    ) -> Result<(), MessagingError> {
        let message_id: u64 = receipt_handle
            .as_str()
            .parse()
            .map_err(|_| MessagingError::invalid_receipt_handle(receipt_handle.as_str()))?;

        let mut queues = self.queues.write().await;
        let queue = queues
            .get_mut(queue_name)
            .ok_or_else(|| MessagingError::queue_not_found(queue_name))?;

        if requeue {
            if let Some(msg) = queue.messages.iter_mut().find(|m| m.id == message_id) {
                msg.visible_at = None;
                Ok(())
            } else {
                Err(MessagingError::message_not_found(message_id.to_string()))
            }
        } else {
            let pos = queue.messages.iter().position(|m| m.id == message_id);
            match pos.and_then(|p| queue.messages.remove(p)) {
                Some(msg) => {
                    Self::dead_letter(&mut queues, queue_name, msg);
                    Ok(())
                }
                None => Err(MessagingError::message_not_found(message_id.to_string())),
            }
        }
    }

    async fn queue_stats(&self, queue_name: &str) -> Result<QueueStats, MessagingError> {
        let queues = self.queues.read().await;
        let queue = queues
            .get(queue_name)
            .ok_or_else(|| MessagingError::queue_not_found(queue_name))?;

        let now = Utc::now();
        let in_flight = queue
            .messages
            .iter()
            .filter(|m| m.visible_at.map(|vt| vt > now).unwrap_or(false))
            .count() as u64;

        let mut stats = QueueStats::new(queue_name, queue.messages.len() as u64)
            .with_in_flight_count(in_flight);

        if let Some(front) = queue.messages.front() {
            let age = now - front.enqueued_at;
            if let Ok(age) = age.to_std() {
                stats = stats.with_oldest_message_age(age);
            }
        }

        Ok(stats)
    }

    async fn health_check(&self) -> Result<bool, MessagingError> {
        Ok(true)
    }

    fn provider_name(&self) -> &'static str {
        "in_memory"
    }
}
