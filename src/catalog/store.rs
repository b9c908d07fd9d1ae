//! # Catalog Store
//!
//! Seam to the system-of-record. The store is authoritative; the cache is
//! a derived view of it. Deployments back this trait with their real
//! database; the in-memory implementation serves tests and development.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::errors::{CatalogError, CatalogResult};
use super::product::{Product, ProductPatch};

/// System-of-record operations for the product collection
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Persist a new product
    async fn insert(&self, product: Product) -> CatalogResult<Product>;

    /// Apply a patch to an existing product
    async fn update(&self, id: Uuid, patch: ProductPatch) -> CatalogResult<Product>;

    /// Remove a product
    async fn remove(&self, id: Uuid) -> CatalogResult<()>;

    /// All products, ordered by name
    async fn list(&self) -> CatalogResult<Vec<Product>>;
}

/// In-memory system-of-record for tests and development
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    products: RwLock<HashMap<Uuid, Product>>,
}

impl InMemoryCatalogStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn insert(&self, product: Product) -> CatalogResult<Product> {
        let mut products = self.products.write().await;
        products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update(&self, id: Uuid, patch: ProductPatch) -> CatalogResult<Product> {
        let mut products = self.products.write().await;
        let product = products.get_mut(&id).ok_or(CatalogError::NotFound(id))?;
        patch.apply(product);
        Ok(product.clone())
    }

    async fn remove(&self, id: Uuid) -> CatalogResult<()> {
        let mut products = self.products.write().await;
        products.remove(&id).ok_or(CatalogError::NotFound(id))?;
        Ok(())
    }

    async fn list(&self) -> CatalogResult<Vec<Product>> {
        let products = self.products.read().await;
        let mut listing: Vec<Product> = products.values().cloned().collect();
        listing.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::product::NewProduct;

    fn widget(name: &str) -> Product {
        NewProduct {
            name: name.to_string(),
            price: 1.0,
            quantity: 1,
            description: None,
        }
        .into_product()
    }

    #[tokio::test]
    async fn test_insert_and_list_sorted() {
        let store = InMemoryCatalogStore::new();
        store.insert(widget("zeta")).await.unwrap();
        store.insert(widget("alpha")).await.unwrap();

        let listing = store.list().await.unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].name, "alpha");
        assert_eq!(listing[1].name, "zeta");
    }

    #[tokio::test]
    async fn test_update_missing_product_is_not_found() {
        let store = InMemoryCatalogStore::new();
        let result = store.update(Uuid::new_v4(), ProductPatch::default()).await;
        assert!(matches!(result, Err(CatalogError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_remove_deletes_product() {
        let store = InMemoryCatalogStore::new();
        let product = store.insert(widget("widget")).await.unwrap();

        store.remove(product.id).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());

        let result = store.remove(product.id).await;
        assert!(matches!(result, Err(CatalogError::NotFound(_))));
    }
}
