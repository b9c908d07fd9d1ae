//! # Catalog Subsystem
//!
//! Product operations against the system-of-record, paired with cache
//! invalidation so readers never observe a pre-write listing after a
//! write completes.
//!
//! Control flow: a write goes to the store, deletes the aggregate listing
//! key before returning success, then optionally enqueues a notification
//! task. A read checks the cache, falls back to the store on a miss, and
//! repopulates the cache with a TTL.

pub mod errors;
pub mod invalidation;
pub mod product;
pub mod service;
pub mod store;

pub use errors::{CatalogError, CatalogResult};
pub use invalidation::{Cached, ListingCache, PRODUCTS_LIST_KEY};
pub use product::{NewProduct, Product, ProductPatch};
pub use service::{CatalogService, ProductListing};
pub use store::{CatalogStore, InMemoryCatalogStore};
