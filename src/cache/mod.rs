//! # Cache Subsystem
//!
//! Key/value cache with expiration, used as a read-through cache in front
//! of the system-of-record.
//!
//! ## Architecture
//!
//! ```text
//! CacheProvider (enum)            <- Zero-cost dispatch, no vtable
//!   ├── Redis(RedisCacheService)  <- ConnectionManager-based async Redis
//!   ├── Moka(MokaCacheService)    <- In-process, single-instance
//!   └── NoOp(NoOpCacheService)    <- Always-miss, always-succeed fallback
//! ```
//!
//! ## Design Decisions
//!
//! - **Enum dispatch** (like `TransportProvider`): zero vtable overhead
//! - **Graceful degradation**: backend failure at startup falls back to
//!   NoOp and never blocks the process
//! - **Advisory only**: per-operation atomicity, no cross-operation
//!   transactions; the system-of-record stays authoritative

pub mod errors;
pub mod provider;
pub mod providers;
pub mod traits;

pub use errors::{CacheError, CacheResult};
pub use provider::CacheProvider;
pub use providers::NoOpCacheService;
pub use traits::CacheService;

#[cfg(feature = "cache-moka")]
pub use providers::MokaCacheService;
#[cfg(feature = "cache-redis")]
pub use providers::RedisCacheService;
