//! Cache provider enum
//!
//! Enum dispatch over cache backends (like `TransportProvider`), avoiding
//! trait object overhead. Construction degrades gracefully: a configured
//! but unreachable backend logs a warning and falls back to NoOp, so cache
//! trouble never blocks startup.

use std::time::Duration;

use tracing::{info, warn};

use super::errors::CacheResult;
use super::providers::NoOpCacheService;
use super::traits::CacheService;
use crate::config::CacheConfig;

#[cfg(feature = "cache-moka")]
use super::providers::MokaCacheService;
#[cfg(feature = "cache-redis")]
use super::providers::RedisCacheService;

/// Cache backend with zero-cost dispatch
#[derive(Debug, Clone)]
pub enum CacheProvider {
    /// Redis cache provider (boxed to reduce enum size)
    #[cfg(feature = "cache-redis")]
    Redis(Box<RedisCacheService>),

    /// Moka in-process cache provider
    #[cfg(feature = "cache-moka")]
    Moka(Box<MokaCacheService>),

    /// No-op cache provider (always miss, always succeed)
    NoOp(NoOpCacheService),
}

impl CacheProvider {
    /// Create a cache provider from configuration with graceful degradation
    pub async fn from_config_graceful(config: &CacheConfig) -> Self {
        if !config.enabled {
            info!("Cache disabled by configuration");
            return Self::NoOp(NoOpCacheService::new());
        }

        match config.backend.as_str() {
            // "dragonfly" speaks the Redis protocol
            "redis" | "dragonfly" => Self::create_redis_backend(config).await,
            "moka" | "memory" | "in-memory" => Self::create_moka_backend(config),
            other => {
                warn!(backend = other, "Unknown cache backend, falling back to NoOp");
                Self::NoOp(NoOpCacheService::new())
            }
        }
    }

    /// A provider that never caches
    pub fn noop() -> Self {
        Self::NoOp(NoOpCacheService::new())
    }

    #[cfg(feature = "cache-redis")]
    async fn create_redis_backend(config: &CacheConfig) -> Self {
        let Some(redis_config) = &config.redis else {
            warn!("Redis backend selected but no redis configuration present, falling back to NoOp");
            return Self::NoOp(NoOpCacheService::new());
        };

        match RedisCacheService::from_config(redis_config).await {
            Ok(service) => {
                info!("Redis cache backend initialized");
                Self::Redis(Box::new(service))
            }
            Err(e) => {
                warn!(error = %e, "Redis unavailable, falling back to NoOp cache");
                Self::NoOp(NoOpCacheService::new())
            }
        }
    }

    #[cfg(not(feature = "cache-redis"))]
    async fn create_redis_backend(_config: &CacheConfig) -> Self {
        warn!("Redis backend selected but the cache-redis feature is disabled, falling back to NoOp");
        Self::NoOp(NoOpCacheService::new())
    }

    #[cfg(feature = "cache-moka")]
    fn create_moka_backend(config: &CacheConfig) -> Self {
        let service =
            MokaCacheService::from_config(&config.moka, Duration::from_secs(config.ttl_seconds));
        info!("Moka cache backend initialized");
        Self::Moka(Box::new(service))
    }

    #[cfg(not(feature = "cache-moka"))]
    fn create_moka_backend(_config: &CacheConfig) -> Self {
        warn!("Moka backend selected but the cache-moka feature is disabled, falling back to NoOp");
        Self::NoOp(NoOpCacheService::new())
    }

    /// Provider name for logging/metrics
    pub fn provider_name(&self) -> &'static str {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.provider_name(),
            #[cfg(feature = "cache-moka")]
            Self::Moka(s) => s.provider_name(),
            Self::NoOp(s) => s.provider_name(),
        }
    }

    /// Whether this provider actually stores entries
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::NoOp(_))
    }

    /// Get a value by key
    pub async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.get(key).await,
            #[cfg(feature = "cache-moka")]
            Self::Moka(s) => s.get(key).await,
            Self::NoOp(s) => s.get(key).await,
        }
    }

    /// Set a value with a TTL
    pub async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.set(key, value, ttl).await,
            #[cfg(feature = "cache-moka")]
            Self::Moka(s) => s.set(key, value, ttl).await,
            Self::NoOp(s) => s.set(key, value, ttl).await,
        }
    }

    /// Delete a key
    pub async fn delete(&self, key: &str) -> CacheResult<()> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.delete(key).await,
            #[cfg(feature = "cache-moka")]
            Self::Moka(s) => s.delete(key).await,
            Self::NoOp(s) => s.delete(key).await,
        }
    }

    /// Health check
    pub async fn health_check(&self) -> CacheResult<bool> {
        match self {
            #[cfg(feature = "cache-redis")]
            Self::Redis(s) => s.health_check().await,
            #[cfg(feature = "cache-moka")]
            Self::Moka(s) => s.health_check().await,
            Self::NoOp(s) => s.health_check().await,
        }
    }
}
