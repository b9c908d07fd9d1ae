//! # Task Envelope
//!
//! Wire format for tasks published to the work queue. An envelope is
//! immutable once published; retries republish a copy with an incremented
//! retry count rather than mutating the original delivery.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default retry budget when the producer does not override it
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// A task published to a queue
///
/// `payload` is an opaque JSON object owned by the task handler; the
/// messaging layer never inspects it beyond serialization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskEnvelope {
    /// Task kind, used for handler dispatch (e.g. "notify")
    pub kind: String,

    /// Opaque JSON payload passed through to the handler
    pub payload: serde_json::Value,

    /// When the producer enqueued the task
    pub enqueued_at: DateTime<Utc>,

    /// Delivery metadata
    #[serde(default)]
    pub metadata: TaskMetadata,
}

/// Delivery metadata carried inside the envelope
///
/// `retry_count` counts completed delivery attempts; the consumer
/// republishes with `retry_count + 1` on a retryable failure and routes to
/// the dead-letter queue once the budget is exhausted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskMetadata {
    pub retry_count: u32,
    pub max_retries: u32,
}

impl Default for TaskMetadata {
    fn default() -> Self {
        Self {
            retry_count: 0,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl TaskEnvelope {
    /// Create a new envelope for first delivery
    pub fn new(kind: impl Into<String>, payload: serde_json::Value, max_retries: u32) -> Self {
        Self {
            kind: kind.into(),
            payload,
            enqueued_at: Utc::now(),
            metadata: TaskMetadata {
                retry_count: 0,
                max_retries,
            },
        }
    }

    /// Copy of this envelope for the next delivery attempt
    pub fn next_attempt(&self) -> Self {
        let mut next = self.clone();
        next.metadata.retry_count += 1;
        next
    }

    /// Whether the retry budget is exhausted after the current attempt fails
    pub fn retries_exhausted(&self) -> bool {
        self.metadata.retry_count + 1 >= self.metadata.max_retries
    }
}
