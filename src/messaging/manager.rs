//! # Transport Manager
//!
//! Explicit connection lifecycle for the queue transport. The manager is
//! created once at startup and injected into the producer, consumer, and
//! service components; there is no ambient global connection state.
//!
//! Broker unavailability is treated as transient: `init` keeps redialing
//! in the background with a fixed backoff instead of failing the process.
//! Until the first dial succeeds, queue operations fail with
//! `NotInitialized`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::BrokerConfig;
use crate::messaging::errors::{MessagingError, MessagingResult};
use crate::messaging::provider::TransportProvider;
use crate::messaging::providers::RabbitMqTransport;

/// Owns the broker connection and hands out shared transport handles
#[derive(Debug)]
pub struct TransportManager {
    config: BrokerConfig,
    transport: RwLock<Option<Arc<TransportProvider>>>,
}

impl TransportManager {
    /// Create a manager that has not dialed the broker yet
    pub fn new(config: BrokerConfig) -> Self {
        Self {
            config,
            transport: RwLock::new(None),
        }
    }

    /// Create a manager around an already-connected provider
    ///
    /// Used by tests and by deployments that inject the in-memory
    /// transport; `transport()` succeeds immediately.
    pub fn with_provider(provider: TransportProvider) -> Self {
        Self {
            config: BrokerConfig::default(),
            transport: RwLock::new(Some(Arc::new(provider))),
        }
    }

    /// Dial the broker, retrying in the background on failure
    ///
    /// Returns after the first attempt either way. A failed first dial is
    /// not fatal: a background task keeps retrying with a fixed backoff
    /// until the broker accepts, and publishes before that point surface
    /// `NotInitialized` to the caller.
    pub async fn init(self: &Arc<Self>) {
        if let Err(e) = self.connect_once().await {
            let backoff = self.backoff();
            warn!(
                error = %e,
                backoff_seconds = backoff.as_secs(),
                "Broker connection failed, retrying in background"
            );

            let manager = Arc::clone(self);
            tokio::spawn(async move {
                loop {
                    tokio::time::sleep(manager.backoff()).await;
                    match manager.connect_once().await {
                        Ok(()) => break,
                        Err(e) => {
                            warn!(error = %e, "Broker reconnect attempt failed");
                        }
                    }
                }
            });
        }
    }

    /// Get a handle to the connected transport
    ///
    /// Fails with `NotInitialized` when startup has not completed; callers
    /// must not buffer work locally in that case.
    pub async fn transport(&self) -> MessagingResult<Arc<TransportProvider>> {
        let guard = self.transport.read().await;
        guard
            .clone()
            .ok_or_else(|| MessagingError::not_initialized("broker connection not established"))
    }

    /// Whether the manager currently holds a connected transport
    pub async fn is_connected(&self) -> bool {
        self.transport.read().await.is_some()
    }

    /// Close the connection and drop the transport handle
    ///
    /// Subsequent `transport()` calls fail with `NotInitialized`.
    pub async fn shutdown(&self) {
        let transport = { self.transport.write().await.take() };
        if let Some(transport) = transport {
            transport.close().await;
            info!("Queue transport shut down");
        }
    }

    fn backoff(&self) -> Duration {
        Duration::from_secs(u64::from(self.config.reconnect_backoff_seconds))
    }

    async fn connect_once(&self) -> MessagingResult<()> {
        let transport = RabbitMqTransport::connect(&self.config).await?;
        let mut guard = self.transport.write().await;
        *guard = Some(Arc::new(TransportProvider::RabbitMq(transport)));
        info!(provider = "rabbitmq", "Queue transport connected");
        Ok(())
    }
}
