//! Cache-consistency scenarios: read-through population, delete-before-
//! return invalidation, and read-after-write visibility across the
//! catalog service.

#![cfg(feature = "cache-moka")]

use std::sync::Arc;
use std::time::Duration;

use storefront_core::cache::{CacheProvider, MokaCacheService};
use storefront_core::catalog::{
    CatalogService, InMemoryCatalogStore, ListingCache, NewProduct, ProductPatch,
    PRODUCTS_LIST_KEY,
};
use storefront_core::messaging::{InMemoryTransport, TaskProducer, TransportManager, TransportProvider};

const QUEUE: &str = "email_queue";

struct Harness {
    service: CatalogService,
    cache: CacheProvider,
    manager: Arc<TransportManager>,
}

fn harness(recipient: Option<String>) -> Harness {
    let cache = CacheProvider::Moka(Box::new(MokaCacheService::new(
        100,
        Duration::from_secs(3600),
    )));
    let manager = Arc::new(TransportManager::with_provider(TransportProvider::InMemory(
        InMemoryTransport::new(),
    )));

    let service = CatalogService::new(
        Arc::new(InMemoryCatalogStore::new()),
        ListingCache::products(cache.clone(), Duration::from_secs(3600)),
        TaskProducer::new(Arc::clone(&manager), 3),
        QUEUE,
        recipient,
    );

    Harness {
        service,
        cache,
        manager,
    }
}

fn widget(name: &str, quantity: u32) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        price: 9.99,
        quantity,
        description: None,
    }
}

#[tokio::test]
async fn miss_recomputes_and_populates_with_ttl() {
    let h = harness(None);
    h.service.create_product(widget("widget", 1)).await.unwrap();

    // Miss: recomputed from the store and cached
    let first = h.service.list_products().await.unwrap();
    assert!(!first.from_cache);
    assert_eq!(first.products.len(), 1);
    assert!(h.cache.get(PRODUCTS_LIST_KEY).await.unwrap().is_some());

    // Hit within TTL: served from cache
    let second = h.service.list_products().await.unwrap();
    assert!(second.from_cache);
    assert_eq!(second.products, first.products);
}

#[tokio::test]
async fn create_deletes_listing_before_returning() {
    let h = harness(None);
    h.service.create_product(widget("first", 1)).await.unwrap();

    // Warm the cache
    let _ = h.service.list_products().await.unwrap();
    assert!(h.cache.get(PRODUCTS_LIST_KEY).await.unwrap().is_some());

    // By the time create returns, the aggregate key is gone
    h.service.create_product(widget("second", 1)).await.unwrap();
    assert!(h.cache.get(PRODUCTS_LIST_KEY).await.unwrap().is_none());

    // The next read repopulates
    let listing = h.service.list_products().await.unwrap();
    assert!(!listing.from_cache);
    assert_eq!(listing.products.len(), 2);
    assert!(h.cache.get(PRODUCTS_LIST_KEY).await.unwrap().is_some());
}

#[tokio::test]
async fn read_after_write_never_observes_pre_write_listing() {
    let h = harness(None);
    let product = h.service.create_product(widget("widget", 1)).await.unwrap();

    // Cache the pre-write view
    let before = h.service.list_products().await.unwrap();
    assert_eq!(before.products[0].quantity, 1);

    // Write completes, then a read starts: it must see the new state
    h.service
        .update_product(
            product.id,
            ProductPatch {
                quantity: Some(42),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let after = h.service.list_products().await.unwrap();
    assert_eq!(after.products[0].quantity, 42);
}

#[tokio::test]
async fn concurrent_readers_after_write_see_post_write_state() {
    let h = harness(None);
    let service = Arc::new(h.service);
    let product = service.create_product(widget("widget", 1)).await.unwrap();

    let _ = service.list_products().await.unwrap();
    service
        .update_product(
            product.id,
            ProductPatch {
                quantity: Some(7),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    // A repopulation storm is acceptable; a stale value is not
    let mut readers = Vec::new();
    for _ in 0..8 {
        let service = Arc::clone(&service);
        readers.push(tokio::spawn(
            async move { service.list_products().await.unwrap() },
        ));
    }

    for reader in readers {
        let listing = reader.await.unwrap();
        assert_eq!(listing.products[0].quantity, 7);
    }
}

#[tokio::test]
async fn disabled_cache_never_serves_from_cache() {
    let manager = Arc::new(TransportManager::with_provider(TransportProvider::InMemory(
        InMemoryTransport::new(),
    )));
    let service = CatalogService::new(
        Arc::new(InMemoryCatalogStore::new()),
        ListingCache::products(CacheProvider::noop(), Duration::from_secs(3600)),
        TaskProducer::new(manager, 3),
        QUEUE,
        None,
    );

    service.create_product(widget("widget", 1)).await.unwrap();

    for _ in 0..2 {
        let listing = service.list_products().await.unwrap();
        assert!(!listing.from_cache);
        assert_eq!(listing.products.len(), 1);
    }
}

#[tokio::test]
async fn write_path_enqueues_notification_after_invalidation() {
    let h = harness(Some("ops@example.com".to_string()));

    h.service.create_product(widget("widget", 1)).await.unwrap();

    let transport = h.manager.transport().await.unwrap();
    assert_eq!(transport.queue_stats(QUEUE).await.unwrap().message_count, 1);
    assert!(h.cache.get(PRODUCTS_LIST_KEY).await.unwrap().is_none());
}
