//! Application state shared across handlers.

use std::sync::Arc;

use tokio::sync::Mutex;

use corner_shop_core::UserId;

use crate::catalog::{CatalogSource, InventoryLoader};
use crate::db::{ProductStore, RepositoryError, Store};
use crate::services::CartService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the store and the services built on it.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn Store>,
    inventory: InventoryLoader,
    carts: CartService,
    default_user: Mutex<Option<UserId>>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `store` - Persistence backend
    /// * `catalog` - Upstream product source used to fill an empty store
    #[must_use]
    pub fn new(store: Arc<dyn Store>, catalog: Arc<dyn CatalogSource>) -> Self {
        let products: Arc<dyn ProductStore> = store.clone();
        Self {
            inner: Arc::new(AppStateInner {
                inventory: InventoryLoader::new(products, catalog),
                carts: CartService::new(store.clone()),
                store,
                default_user: Mutex::new(None),
            }),
        }
    }

    /// Get a reference to the persistence backend.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.inner.store
    }

    /// Get a reference to the product cache loader.
    #[must_use]
    pub fn inventory(&self) -> &InventoryLoader {
        &self.inner.inventory
    }

    /// Get a reference to the cart service.
    #[must_use]
    pub fn carts(&self) -> &CartService {
        &self.inner.carts
    }

    /// The synthetic user that requests without a user id act as.
    ///
    /// The remembered id is checked against the store on every call. Once
    /// the user is gone (the shop was reseeded) the oldest user is looked up
    /// again.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the lookup fails; the next call retries.
    pub async fn default_user_id(&self) -> Result<UserId, RepositoryError> {
        let store = &self.inner.store;
        let mut cached = self.inner.default_user.lock().await;

        if let Some(id) = *cached
            && store.find_user(id).await?.is_some()
        {
            return Ok(id);
        }

        let user = store.default_user().await?;
        if cached.is_some() {
            tracing::info!(user_id = %user.id, "Default user changed");
        }
        *cached = Some(user.id);
        Ok(user.id)
    }
}
