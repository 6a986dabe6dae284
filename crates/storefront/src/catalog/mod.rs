//! Product catalog backed by an external inventory API.
//!
//! # Architecture
//!
//! - The upstream API is only consulted when the local product store is empty
//! - Whatever it returns is written to the store once and served from there
//! - There is no expiry; `shop-cli seed` clears the store to force a refetch
//!
//! Concurrent first requests are collapsed into a single upstream fetch.

mod conversions;
mod fake_store;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, instrument};

use corner_shop_core::{NewProduct, Product};

use crate::db::{ProductStore, RepositoryError};

pub use fake_store::FakeStoreClient;

/// Errors that can occur when talking to the inventory API.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-success status.
    #[error("inventory API returned HTTP {0}")]
    Status(reqwest::StatusCode),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A record could not be turned into a product.
    #[error("invalid product record: {0}")]
    InvalidRecord(String),
}

/// Source of products for an empty store.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch the upstream product list.
    async fn fetch_products(&self) -> Result<Vec<NewProduct>, CatalogError>;
}

/// Errors from [`InventoryLoader::get_products`].
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The store was empty and the upstream fetch failed.
    #[error("Inventory service unavailable.")]
    Unavailable(#[source] CatalogError),

    #[error(transparent)]
    Store(#[from] RepositoryError),
}

/// Fill-on-empty cache in front of a [`CatalogSource`].
#[derive(Clone)]
pub struct InventoryLoader {
    inner: Arc<InventoryLoaderInner>,
}

struct InventoryLoaderInner {
    store: Arc<dyn ProductStore>,
    source: Arc<dyn CatalogSource>,
    fill: Mutex<()>,
}

impl InventoryLoader {
    #[must_use]
    pub fn new(store: Arc<dyn ProductStore>, source: Arc<dyn CatalogSource>) -> Self {
        Self {
            inner: Arc::new(InventoryLoaderInner {
                store,
                source,
                fill: Mutex::new(()),
            }),
        }
    }

    /// Cached products, filling the store from upstream when it is empty.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Unavailable` when the store is empty and the
    /// upstream fetch fails. Nothing is written in that case.
    #[instrument(skip(self))]
    pub async fn get_products(&self) -> Result<Vec<Product>, InventoryError> {
        let cached = self.inner.store.list_products().await?;
        if !cached.is_empty() {
            info!(count = cached.len(), "Serving products from cache");
            return Ok(cached);
        }

        let _guard = self.inner.fill.lock().await;

        // Another request may have filled the store while we waited.
        let cached = self.inner.store.list_products().await?;
        if !cached.is_empty() {
            info!(count = cached.len(), "Serving products from cache");
            return Ok(cached);
        }

        info!("Product cache empty, fetching from inventory API");
        let fetched = self.inner.source.fetch_products().await.map_err(|e| {
            error!(error = %e, "Could not connect to external inventory source");
            InventoryError::Unavailable(e)
        })?;

        let requested = fetched.len();
        let inserted = self.inner.store.insert_products(fetched).await?;
        info!(count = inserted.len(), "Cached products from inventory API");

        if inserted.len() < requested {
            // Some rows were already present; return the store's view.
            return Ok(self.inner.store.list_products().await?);
        }
        Ok(inserted)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use rust_decimal::Decimal;

    use super::*;
    use crate::db::MemoryStore;

    struct StubSource {
        calls: AtomicUsize,
        fail: bool,
        delay: Duration,
    }

    impl StubSource {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
                delay: Duration::ZERO,
            }
        }
    }

    #[async_trait]
    impl CatalogSource for StubSource {
        async fn fetch_products(&self) -> Result<Vec<NewProduct>, CatalogError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.fail {
                return Err(CatalogError::InvalidRecord("boom".to_string()));
            }
            Ok((1..=3)
                .map(|i| NewProduct {
                    name: format!("Item {i}"),
                    price: Decimal::new(i * 100, 2),
                    description: String::new(),
                    image: String::new(),
                    external_id: Some(i),
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn test_fills_once_then_serves_cache() {
        let store = Arc::new(MemoryStore::new());
        let source = Arc::new(StubSource::new(false));
        let loader = InventoryLoader::new(store, source.clone());

        let first = loader.get_products().await.unwrap();
        let second = loader.get_products().await.unwrap();

        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_leaves_store_empty() {
        let store = Arc::new(MemoryStore::new());
        let loader = InventoryLoader::new(store.clone(), Arc::new(StubSource::new(true)));

        let err = loader.get_products().await.unwrap_err();
        assert!(matches!(err, InventoryError::Unavailable(_)));
        assert!(store.list_products().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_fills_fetch_once() {
        let store = Arc::new(MemoryStore::new());
        let source = Arc::new(StubSource {
            delay: Duration::from_millis(20),
            ..StubSource::new(false)
        });
        let loader = InventoryLoader::new(store.clone(), source.clone());

        let (a, b) = tokio::join!(loader.get_products(), loader.get_products());

        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.list_products().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_does_not_fetch_when_store_is_seeded() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_products(vec![NewProduct {
                name: "Local".to_string(),
                price: Decimal::ONE,
                description: String::new(),
                image: String::new(),
                external_id: None,
            }])
            .await
            .unwrap();
        let source = Arc::new(StubSource::new(true));
        let loader = InventoryLoader::new(store, source.clone());

        let products = loader.get_products().await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }
}
