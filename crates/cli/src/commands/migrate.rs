//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! shop-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Storefront migrations live in `crates/storefront/migrations/` and are
//! embedded into the binary at compile time.

use tracing::info;

use corner_shop_storefront::config::StorefrontConfig;
use corner_shop_storefront::db;

/// Run storefront database migrations.
///
/// # Errors
///
/// Returns an error if the configuration is incomplete, the database is
/// unreachable, or a migration fails.
pub async fn storefront() -> Result<(), Box<dyn std::error::Error>> {
    let config = StorefrontConfig::from_env()?;

    info!("Connecting to storefront database...");
    let pool = db::create_pool(&config.database_url).await?;

    info!("Running storefront migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    info!("Storefront migrations complete!");
    Ok(())
}
