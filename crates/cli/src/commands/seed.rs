//! Reset the shop to a known state.
//!
//! Clears the product cache and every user (carts go with their users),
//! then creates the synthetic default user. With `--fetch`, the product
//! cache is refilled from the inventory API straight away instead of on the
//! first `GET /api/products`.

use std::sync::Arc;

use tracing::info;

use corner_shop_storefront::catalog::{FakeStoreClient, InventoryLoader};
use corner_shop_storefront::config::StorefrontConfig;
use corner_shop_storefront::db::{self, PgStore, ProductStore, UserStore};

/// Clear products and users, then create the default user.
///
/// # Errors
///
/// Returns an error if the configuration is incomplete, the database is
/// unreachable, or (with `fetch`) the inventory API cannot be reached.
pub async fn run(fetch: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = StorefrontConfig::from_env()?;
    let pool = db::create_pool(&config.database_url).await?;
    let store = Arc::new(PgStore::new(pool));

    let products = store.clear_products().await?;
    info!(count = products, "Cleared cached products");

    let users = store.clear_users().await?;
    info!(count = users, "Cleared users and their carts");

    let user = store.default_user().await?;
    info!(user_id = %user.id, "Created mock user");

    if fetch {
        let client = FakeStoreClient::new(&config.catalog)?;
        let loader = InventoryLoader::new(store, Arc::new(client));
        let products = loader.get_products().await?;
        info!(count = products.len(), "Cached products from inventory API");
    }

    Ok(())
}
