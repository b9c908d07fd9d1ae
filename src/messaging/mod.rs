//! # Messaging Subsystem
//!
//! Durable task delivery: a provider-agnostic queue transport with a
//! producer that publishes persistent task envelopes and a consumer loop
//! that executes handlers with bounded retries and dead-letter routing.
//!
//! ## Architecture
//!
//! ```text
//! TransportManager              <- connection lifecycle (init/shutdown),
//!   └── TransportProvider          injected, never ambient global state
//!         ├── RabbitMq(RabbitMqTransport)   <- lapin, AMQP 0.9.1
//!         └── InMemory(InMemoryTransport)   <- tests and development
//!
//! TaskProducer  -> publish(queue, kind, payload)     [persistent]
//! TaskConsumer  -> Stopped -> Starting -> Consuming -> Draining -> Stopped
//!                  ack | retry republish | dead-letter
//! ```
//!
//! ## Delivery contract
//!
//! At-least-once: a successful execution is acked exactly once and never
//! redelivered, a failed one is redelivered until the retry budget in the
//! envelope metadata runs out, then dead-lettered. Handlers must be
//! idempotent; there is no deduplication key.

pub mod consumer;
pub mod errors;
pub mod handlers;
pub mod manager;
pub mod message;
mod provider;
pub mod providers;
pub mod producer;
mod traits;
mod types;

pub use consumer::{ConsumerConfig, ConsumerState, TaskConsumer};
pub use errors::{MessagingError, MessagingResult};
pub use handlers::{HandlerRegistry, NotificationHandler, TaskError, TaskHandler};
pub use manager::TransportManager;
pub use message::{TaskEnvelope, TaskMetadata};
pub use provider::TransportProvider;
pub use providers::{InMemoryTransport, RabbitMqTransport};
pub use producer::TaskProducer;
pub use traits::{QueueMessage, QueueTransport};
pub use types::{QueueStats, QueuedMessage, ReceiptHandle};
