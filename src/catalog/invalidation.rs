//! # Listing Cache
//!
//! Invalidation coordinator for an aggregate collection view. Writers
//! delete the cached view rather than patching it in place; the next
//! reader recomputes from the system-of-record and repopulates with a
//! TTL. This component is the only one that deletes the key on write
//! paths.
//!
//! Two concurrent writers may both invalidate and two concurrent readers
//! may then both recompute and overwrite the entry. The last writer among
//! the readers wins, and the entry still reflects a state computed after
//! the invalidation, so read-after-write consistency holds even though a
//! brief repopulation storm is possible under high concurrency.

use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::CacheProvider;

/// Aggregate cache key for the product listing view
pub const PRODUCTS_LIST_KEY: &str = "products:list";

/// A value read through the cache, tagged with its origin
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<T> {
    pub value: T,
    pub from_cache: bool,
}

/// Read-through cache for one aggregate collection view
#[derive(Debug, Clone)]
pub struct ListingCache {
    cache: CacheProvider,
    key: String,
    ttl: Duration,
}

impl ListingCache {
    /// Create a listing cache over an arbitrary key
    pub fn new(cache: CacheProvider, key: impl Into<String>, ttl: Duration) -> Self {
        Self {
            cache,
            key: key.into(),
            ttl,
        }
    }

    /// Listing cache for the products collection
    pub fn products(cache: CacheProvider, ttl: Duration) -> Self {
        Self::new(cache, PRODUCTS_LIST_KEY, ttl)
    }

    /// The aggregate key this coordinator owns
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Delete the cached view
    ///
    /// Called on every write path before the operation returns success.
    /// A delete failure is logged and swallowed: the store write has
    /// already committed, and an unreachable cache cannot serve the stale
    /// entry either.
    pub async fn invalidate(&self) {
        match self.cache.delete(&self.key).await {
            Ok(()) => debug!(key = %self.key, "Listing cache invalidated"),
            Err(e) => warn!(key = %self.key, error = %e, "Listing cache invalidation failed"),
        }
    }

    /// Read the view through the cache
    ///
    /// On hit, returns the cached value with `from_cache = true`. On miss,
    /// recomputes from the system-of-record, repopulates with the
    /// configured TTL, and returns `from_cache = false`. Cache read errors
    /// and undecodable entries are treated as misses; a repopulation
    /// failure is logged and the recomputed value is still returned, so a
    /// read never fails due to cache unavailability.
    pub async fn get_or_populate<T, E, F, Fut>(&self, recompute: F) -> Result<Cached<T>, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match self.cache.get(&self.key).await {
            Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
                Ok(value) => {
                    return Ok(Cached {
                        value,
                        from_cache: true,
                    });
                }
                Err(e) => {
                    warn!(key = %self.key, error = %e, "Undecodable cache entry, recomputing");
                }
            },
            Ok(None) => {}
            Err(e) => {
                warn!(key = %self.key, error = %e, "Cache read failed, recomputing");
            }
        }

        let value = recompute().await?;

        match serde_json::to_string(&value) {
            Ok(serialized) => {
                if let Err(e) = self.cache.set(&self.key, &serialized, self.ttl).await {
                    warn!(key = %self.key, error = %e, "Cache repopulation failed");
                }
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to serialize view for caching");
            }
        }

        Ok(Cached {
            value,
            from_cache: false,
        })
    }
}
