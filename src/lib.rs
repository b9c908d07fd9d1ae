#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Storefront Core
//!
//! Core of the storefront backend: a durable work queue that decouples
//! request handling from slow side-effects, and a cache layer kept
//! consistent with the system-of-record across concurrent writers.
//!
//! ## Overview
//!
//! Request handlers publish tasks (e.g. notification dispatch) through
//! the [`messaging`] subsystem and return immediately; an independent
//! worker loop drains the queue with bounded concurrency, retries
//! transient failures with backoff, and dead-letters what cannot succeed.
//! The [`catalog`] subsystem pairs every system-of-record write with a
//! delete-before-return cache invalidation, and serves reads through the
//! [`cache`] layer with TTL-based repopulation.
//!
//! HTTP routing and authentication live outside this crate; they call the
//! service-level operations exposed here.
//!
//! ## Module Organization
//!
//! - [`messaging`] - queue transport, task producer, consumer loop, handlers
//! - [`cache`] - key/value cache providers (Redis, Moka, NoOp)
//! - [`catalog`] - product store, invalidation coordinator, service glue
//! - [`config`] - layered configuration with validation
//! - [`error`] - crate-level error aggregation
//! - [`logging`] - tracing initialization
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use storefront_core::config::ServiceConfig;
//! use storefront_core::messaging::{TaskProducer, TransportManager};
//!
//! # async fn example() -> storefront_core::Result<()> {
//! let config = ServiceConfig::from_env();
//! let manager = Arc::new(TransportManager::new(config.broker.clone()));
//! manager.init().await;
//!
//! let producer = TaskProducer::new(Arc::clone(&manager), config.queues.max_retries);
//! producer
//!     .publish(
//!         &config.queues.notifications,
//!         "notify",
//!         serde_json::json!({"to": "user@example.com"}),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod messaging;

pub use error::{Result, ServiceError};
