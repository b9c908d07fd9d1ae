//! # Task Consumer
//!
//! Long-lived worker loop that drains a queue, dispatches task handlers,
//! and acknowledges deliveries based on the outcome.
//!
//! ## Delivery decisions
//!
//! - Success: ack (the task is removed permanently, never redelivered).
//! - Malformed payload or unknown kind: nack without requeue, straight to
//!   the dead-letter queue (retrying can never succeed).
//! - Retryable failure (handler error or deadline exceeded): wait an
//!   exponential backoff, republish with an incremented retry count, then
//!   ack the original. Republish happens before the ack so a crash in
//!   between duplicates the task instead of losing it. Once the retry
//!   budget is exhausted, the task is dead-lettered.
//!
//! Handler errors never crash the loop; the consumer logs and moves on to
//! the next delivery.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{Notify, RwLock};
use tracing::{debug, error, info, warn};

use crate::config::ServiceConfig;
use crate::messaging::errors::{MessagingError, MessagingResult};
use crate::messaging::handlers::{HandlerRegistry, TaskError};
use crate::messaging::manager::TransportManager;
use crate::messaging::message::TaskEnvelope;
use crate::messaging::provider::TransportProvider;
use crate::messaging::types::{QueuedMessage, ReceiptHandle};

/// Consumer lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    Stopped,
    Starting,
    Consuming,
    Draining,
}

/// Tuning for a consumer instance
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Queue to consume from
    pub queue_name: String,
    /// Maximum unacknowledged deliveries held at once (1 = strictly sequential)
    pub prefetch: usize,
    /// Idle wait between empty polls
    pub poll_interval: Duration,
    /// How long a claimed delivery stays invisible to other consumers
    pub visibility_timeout: Duration,
    /// Deadline for a single handler execution
    pub handler_timeout: Duration,
    /// Base delay before the first retry; doubles per attempt
    pub retry_backoff: Duration,
    /// Upper bound on the retry delay
    pub retry_backoff_cap: Duration,
}

impl ConsumerConfig {
    /// Build a consumer config for the notifications queue
    pub fn from_service_config(config: &ServiceConfig) -> Self {
        Self {
            queue_name: config.queues.notifications.clone(),
            prefetch: usize::from(config.broker.prefetch_count),
            poll_interval: Duration::from_millis(config.queues.poll_interval_ms),
            visibility_timeout: Duration::from_secs(config.queues.visibility_timeout_seconds),
            handler_timeout: Duration::from_secs(config.queues.handler_timeout_seconds),
            retry_backoff: Duration::from_millis(config.queues.retry_backoff_ms),
            retry_backoff_cap: Duration::from_millis(config.queues.retry_backoff_cap_ms),
        }
    }
}

/// Worker loop over one queue
///
/// State machine: `Stopped -> Starting -> Consuming -> Draining -> Stopped`.
/// With the default prefetch of 1 deliveries are processed one at a time in
/// the order the broker offers them.
pub struct TaskConsumer {
    manager: Arc<TransportManager>,
    registry: HandlerRegistry,
    config: ConsumerConfig,
    state: RwLock<ConsumerState>,
    running: AtomicBool,
    shutdown: Notify,
}

impl std::fmt::Debug for TaskConsumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskConsumer")
            .field("queue", &self.config.queue_name)
            .field("prefetch", &self.config.prefetch)
            .field("registry", &self.registry)
            .finish()
    }
}

impl TaskConsumer {
    /// Create a consumer; `run` starts it
    pub fn new(
        manager: Arc<TransportManager>,
        registry: HandlerRegistry,
        config: ConsumerConfig,
    ) -> Self {
        Self {
            manager,
            registry,
            config,
            state: RwLock::new(ConsumerState::Stopped),
            running: AtomicBool::new(false),
            shutdown: Notify::new(),
        }
    }

    /// Current lifecycle state
    pub async fn state(&self) -> ConsumerState {
        *self.state.read().await
    }

    /// Run the worker loop until `stop` is called
    ///
    /// Waits for the transport to come up if the broker is not reachable
    /// yet, declares the queue, then polls for deliveries. Returns once
    /// the loop has fully drained.
    pub async fn run(&self) -> MessagingResult<()> {
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(MessagingError::internal("consumer is already running"));
        }

        self.set_state(ConsumerState::Starting).await;

        while self.running.load(Ordering::Acquire) {
            match self.manager.transport().await {
                Ok(transport) => match transport.ensure_queue(&self.config.queue_name).await {
                    Ok(()) => break,
                    Err(e) => {
                        warn!(error = %e, queue = %self.config.queue_name, "Queue declaration failed");
                        self.idle_wait().await;
                    }
                },
                Err(_) => {
                    debug!("Transport not ready, waiting");
                    self.idle_wait().await;
                }
            }
        }

        if self.running.load(Ordering::Acquire) {
            self.set_state(ConsumerState::Consuming).await;
            info!(
                queue = %self.config.queue_name,
                prefetch = self.config.prefetch,
                kinds = ?self.registry.kinds(),
                "Task consumer started"
            );
        }

        while self.running.load(Ordering::Acquire) {
            let transport = match self.manager.transport().await {
                Ok(t) => t,
                Err(_) => {
                    self.idle_wait().await;
                    continue;
                }
            };

            let batch: Vec<QueuedMessage<Value>> = match transport
                .receive_messages(
                    &self.config.queue_name,
                    self.config.prefetch,
                    self.config.visibility_timeout,
                )
                .await
            {
                Ok(batch) => batch,
                Err(e) => {
                    warn!(error = %e, queue = %self.config.queue_name, "Receive failed");
                    self.idle_wait().await;
                    continue;
                }
            };

            if batch.is_empty() {
                self.idle_wait().await;
                continue;
            }

            for delivery in batch {
                self.process_delivery(&transport, delivery).await;
            }
        }

        self.set_state(ConsumerState::Stopped).await;
        info!(queue = %self.config.queue_name, "Task consumer stopped");
        Ok(())
    }

    /// Stop the loop, draining the in-flight delivery
    ///
    /// New deliveries are no longer accepted; the current one finishes and
    /// its acknowledgment is sent. Fails with a timeout error when the
    /// drain exceeds the grace period.
    pub async fn stop(&self, grace: Duration) -> MessagingResult<()> {
        if !self.running.load(Ordering::Acquire) {
            return Ok(());
        }

        self.set_state(ConsumerState::Draining).await;
        self.running.store(false, Ordering::Release);
        self.shutdown.notify_waiters();

        tokio::time::timeout(grace, async {
            while self.state().await != ConsumerState::Stopped {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .map_err(|_| MessagingError::timeout("consumer drain", grace.as_secs()))
    }

    async fn set_state(&self, state: ConsumerState) {
        *self.state.write().await = state;
    }

    /// Sleep for the poll interval, waking early on shutdown
    async fn idle_wait(&self) {
        tokio::select! {
            _ = self.shutdown.notified() => {}
            _ = tokio::time::sleep(self.config.poll_interval) => {}
        }
    }

    async fn process_delivery(
        &self,
        transport: &TransportProvider,
        delivery: QueuedMessage<Value>,
    ) {
        let receipt = delivery.receipt_handle.clone();

        let envelope: TaskEnvelope = match serde_json::from_value(delivery.message) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "Malformed task envelope, dead-lettering");
                self.nack(transport, &receipt, false).await;
                return;
            }
        };

        let Some(handler) = self.registry.get(&envelope.kind) else {
            warn!(kind = %envelope.kind, "No handler for task kind, dead-lettering");
            self.nack(transport, &receipt, false).await;
            return;
        };

        let outcome = match tokio::time::timeout(
            self.config.handler_timeout,
            handler.handle(&envelope.payload),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(TaskError::Timeout(self.config.handler_timeout.as_secs())),
        };

        match outcome {
            Ok(()) => {
                if let Err(e) = transport
                    .ack_message(&self.config.queue_name, &receipt)
                    .await
                {
                    error!(error = %e, "Failed to ack completed task");
                } else {
                    debug!(kind = %envelope.kind, "Task completed");
                }
            }
            Err(TaskError::Malformed(reason)) => {
                warn!(kind = %envelope.kind, reason = %reason, "Malformed task, dead-lettering");
                self.nack(transport, &receipt, false).await;
            }
            Err(err) => {
                self.retry_or_dead_letter(transport, &envelope, &receipt, &err)
                    .await;
            }
        }
    }

    async fn retry_or_dead_letter(
        &self,
        transport: &TransportProvider,
        envelope: &TaskEnvelope,
        receipt: &ReceiptHandle,
        err: &TaskError,
    ) {
        let attempt = envelope.metadata.retry_count + 1;

        if envelope.retries_exhausted() {
            warn!(
                kind = %envelope.kind,
                attempts = attempt,
                error = %err,
                "Retry budget exhausted, dead-lettering"
            );
            self.nack(transport, receipt, false).await;
            return;
        }

        let delay = self.retry_delay(envelope.metadata.retry_count);
        warn!(
            kind = %envelope.kind,
            attempt = attempt,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Task failed, scheduling retry"
        );
        tokio::time::sleep(delay).await;

        match transport
            .send_message(&self.config.queue_name, &envelope.next_attempt())
            .await
        {
            Ok(()) => {
                if let Err(e) = transport.ack_message(&self.config.queue_name, receipt).await {
                    error!(error = %e, "Failed to ack original after retry republish");
                }
            }
            Err(e) => {
                // Fall back to broker redelivery so the task is not lost
                error!(error = %e, "Retry republish failed, requeueing original");
                self.nack(transport, receipt, true).await;
            }
        }
    }

    async fn nack(&self, transport: &TransportProvider, receipt: &ReceiptHandle, requeue: bool) {
        if let Err(e) = transport
            .nack_message(&self.config.queue_name, receipt, requeue)
            .await
        {
            error!(error = %e, requeue = requeue, "Failed to nack task");
        }
    }

    fn retry_delay(&self, retry_count: u32) -> Duration {
        let factor = 1u32 << retry_count.min(16);
        self.config
            .retry_backoff
            .saturating_mul(factor)
            .min(self.config.retry_backoff_cap)
    }
}
