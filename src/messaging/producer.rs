//! # Task Producer
//!
//! Publishes task envelopes to a named queue. Called synchronously from
//! request handling; never waits on task completion.

use std::sync::Arc;

use tracing::debug;

use crate::messaging::errors::MessagingResult;
use crate::messaging::manager::TransportManager;
use crate::messaging::message::TaskEnvelope;

/// Publishes tasks through the shared transport
///
/// Publishing before the transport manager has connected fails with
/// `NotInitialized`; tasks are never buffered locally.
#[derive(Debug, Clone)]
pub struct TaskProducer {
    manager: Arc<TransportManager>,
    max_retries: u32,
}

impl TaskProducer {
    /// Create a producer bound to a transport manager
    ///
    /// `max_retries` is stamped into every envelope's metadata and governs
    /// how many delivery attempts the consumer makes before dead-lettering.
    pub fn new(manager: Arc<TransportManager>, max_retries: u32) -> Self {
        Self {
            manager,
            max_retries,
        }
    }

    /// Publish a task to the named queue
    ///
    /// Serializes a `TaskEnvelope` and publishes it persistently. The
    /// queue is declared on the way (declaration is idempotent, so the
    /// producer and consumer paths need no coordination).
    pub async fn publish(
        &self,
        queue_name: &str,
        kind: impl Into<String>,
        payload: serde_json::Value,
    ) -> MessagingResult<()> {
        let transport = self.manager.transport().await?;
        let envelope = TaskEnvelope::new(kind, payload, self.max_retries);

        transport.ensure_queue(queue_name).await?;
        transport.send_message(queue_name, &envelope).await?;

        debug!(queue = queue_name, kind = %envelope.kind, "Task published");
        Ok(())
    }
}
