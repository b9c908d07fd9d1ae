//! # Catalog Service
//!
//! Service-level product operations invoked by the HTTP layer. Writes go
//! to the system-of-record, invalidate the cached listing before the call
//! returns, and optionally enqueue a notification task. Reads go through
//! the listing cache.

use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use super::errors::CatalogResult;
use super::invalidation::{Cached, ListingCache};
use super::product::{NewProduct, Product, ProductPatch};
use super::store::CatalogStore;
use crate::messaging::TaskProducer;
use uuid::Uuid;

/// Product listing with cache provenance, for response observability
#[derive(Debug, Clone)]
pub struct ProductListing {
    pub products: Vec<Product>,
    pub from_cache: bool,
}

/// Catalog operations over the store, the listing cache, and the producer
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    listing: ListingCache,
    producer: TaskProducer,
    notifications_queue: String,
    /// When set, every committed write enqueues a notification task here
    notification_recipient: Option<String>,
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService")
            .field("listing_key", &self.listing.key())
            .field("notifications_queue", &self.notifications_queue)
            .field("notification_recipient", &self.notification_recipient)
            .finish()
    }
}

impl CatalogService {
    /// Wire up the service from its collaborators
    pub fn new(
        store: Arc<dyn CatalogStore>,
        listing: ListingCache,
        producer: TaskProducer,
        notifications_queue: impl Into<String>,
        notification_recipient: Option<String>,
    ) -> Self {
        Self {
            store,
            listing,
            producer,
            notifications_queue: notifications_queue.into(),
            notification_recipient,
        }
    }

    /// Create a product
    ///
    /// Invalidates the listing cache before returning, then enqueues the
    /// notification task. An enqueue failure surfaces to the caller even
    /// though the store write has committed; the producer is decoupled
    /// from task completion either way.
    pub async fn create_product(&self, new: NewProduct) -> CatalogResult<Product> {
        let product = self.store.insert(new.into_product()).await?;
        self.listing.invalidate().await;
        self.notify("product_created", &product).await?;

        debug!(product_id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    /// Update a product
    pub async fn update_product(&self, id: Uuid, patch: ProductPatch) -> CatalogResult<Product> {
        let product = self.store.update(id, patch).await?;
        self.listing.invalidate().await;
        self.notify("product_updated", &product).await?;

        debug!(product_id = %product.id, "Product updated");
        Ok(product)
    }

    /// Delete a product
    pub async fn delete_product(&self, id: Uuid) -> CatalogResult<()> {
        self.store.remove(id).await?;
        self.listing.invalidate().await;

        if let Some(to) = &self.notification_recipient {
            self.producer
                .publish(
                    &self.notifications_queue,
                    "notify",
                    json!({ "to": to, "event": "product_deleted", "product_id": id }),
                )
                .await?;
        }

        debug!(product_id = %id, "Product deleted");
        Ok(())
    }

    /// List products, read through the cache
    ///
    /// On miss, the listing is recomputed from the system-of-record and
    /// cached with the configured TTL; `from_cache` reports where the
    /// response came from.
    pub async fn list_products(&self) -> CatalogResult<ProductListing> {
        let store = Arc::clone(&self.store);
        let Cached { value, from_cache } = self
            .listing
            .get_or_populate(move || async move { store.list().await })
            .await?;

        Ok(ProductListing {
            products: value,
            from_cache,
        })
    }

    async fn notify(&self, event: &str, product: &Product) -> CatalogResult<()> {
        let Some(to) = &self.notification_recipient else {
            return Ok(());
        };

        self.producer
            .publish(
                &self.notifications_queue,
                "notify",
                json!({
                    "to": to,
                    "event": event,
                    "product_id": product.id,
                    "name": product.name,
                }),
            )
            .await?;
        Ok(())
    }
}
