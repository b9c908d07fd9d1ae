//! Cache providers

#[cfg(feature = "cache-moka")]
mod moka;
mod noop;
#[cfg(feature = "cache-redis")]
mod redis;

#[cfg(feature = "cache-moka")]
pub use moka::MokaCacheService;
pub use noop::NoOpCacheService;
#[cfg(feature = "cache-redis")]
pub use redis::RedisCacheService;
