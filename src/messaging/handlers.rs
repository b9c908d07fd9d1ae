//! # Task Handlers
//!
//! Handler trait, failure taxonomy, and the notification handler.
//!
//! Delivery is at-least-once: a handler may see the same task more than
//! once (broker redelivery, retry republish). Handlers must therefore be
//! idempotent or tolerate duplicated side effects; the queue carries no
//! deduplication key.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// How a task execution failed
///
/// The consumer maps each variant to a delivery decision: `Malformed`
/// dead-letters immediately (a retry can never succeed), the others go
/// through the bounded retry path.
#[derive(Error, Debug)]
pub enum TaskError {
    /// The payload is missing required fields or has the wrong shape
    #[error("malformed task payload: {0}")]
    Malformed(String),

    /// The side effect failed; worth retrying
    #[error("task execution failed: {0}")]
    Failed(String),

    /// The handler exceeded its deadline; worth retrying
    #[error("task execution timed out after {0}s")]
    Timeout(u64),
}

/// A task side-effect executor, dispatched by envelope kind
#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// The envelope kind this handler consumes (e.g. "notify")
    fn kind(&self) -> &'static str;

    /// Execute the task's side effect
    async fn handle(&self, payload: &Value) -> Result<(), TaskError>;
}

/// Maps envelope kinds to handlers
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<&'static str, Arc<dyn TaskHandler>>,
}

impl HandlerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its kind; the last registration wins
    pub fn register<H: TaskHandler + 'static>(mut self, handler: H) -> Self {
        self.handlers.insert(handler.kind(), Arc::new(handler));
        self
    }

    /// Resolve a handler for an envelope kind
    pub fn get(&self, kind: &str) -> Option<Arc<dyn TaskHandler>> {
        self.handlers.get(kind).cloned()
    }

    /// Registered kinds, for startup logging
    pub fn kinds(&self) -> Vec<&'static str> {
        self.handlers.keys().copied().collect()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

/// Dispatches notifications for `notify` tasks
///
/// The payload must carry a `to` field (destination address); everything
/// else is passed through opaquely. Dispatch is idempotent from the
/// queue's perspective: sending the same notification twice is accepted.
#[derive(Debug, Default, Clone)]
pub struct NotificationHandler;

impl NotificationHandler {
    /// Create a new notification handler
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TaskHandler for NotificationHandler {
    fn kind(&self) -> &'static str {
        "notify"
    }

    async fn handle(&self, payload: &Value) -> Result<(), TaskError> {
        let to = payload
            .get("to")
            .and_then(Value::as_str)
            .ok_or_else(|| TaskError::Malformed("missing destination field 'to'".to_string()))?;

        info!(to = to, "Notification dispatched");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_notification_handler_dispatches() {
        let handler = NotificationHandler::new();
        let result = handler
            .handle(&json!({"to": "user@example.com", "subject": "hi"}))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_notification_handler_rejects_missing_to() {
        let handler = NotificationHandler::new();
        let result = handler.handle(&json!({"subject": "hi"})).await;
        assert!(matches!(result, Err(TaskError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_notification_handler_rejects_non_string_to() {
        let handler = NotificationHandler::new();
        let result = handler.handle(&json!({"to": 42})).await;
        assert!(matches!(result, Err(TaskError::Malformed(_))));
    }

    #[test]
    fn test_registry_resolves_by_kind() {
        let registry = HandlerRegistry::new().register(NotificationHandler::new());

        assert!(registry.get("notify").is_some());
        assert!(registry.get("unknown").is_none());
        assert_eq!(registry.kinds(), vec!["notify"]);
    }
}
