//! Persistence for products, carts and users.
//!
//! # Database: `PostgreSQL`, schema `shop`
//!
//! ## Tables
//!
//! - `users` - Shoppers (one synthetic default user plus any supplied ids)
//! - `products` - Local cache of the upstream catalog, unique on `external_id`
//! - `carts` - One cart per user, with an optimistic `version` counter
//! - `cart_items` - Ordered cart lines
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p corner-shop-cli -- migrate
//! ```
//!
//! # Backends
//!
//! The services only see the [`Store`] trait. [`PgStore`] is the production
//! backend; [`MemoryStore`] keeps everything in process and backs the test
//! suites.

mod carts;
pub mod memory;
mod products;
mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use corner_shop_core::{Cart, NewProduct, Product, ProductId, User, UserId};

pub use memory::MemoryStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation or lost optimistic update.
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Cached product catalog.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// All cached products in insertion order.
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError>;

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Insert products, assigning fresh ids.
    ///
    /// Products whose `external_id` is already cached are skipped; only the
    /// rows actually inserted are returned.
    async fn insert_products(
        &self,
        products: Vec<NewProduct>,
    ) -> Result<Vec<Product>, RepositoryError>;

    /// Delete every product, returning how many were removed.
    async fn clear_products(&self) -> Result<u64, RepositoryError>;
}

/// One cart per user, products resolved on read.
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn find_cart(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError>;

    /// Create an empty cart for a user.
    ///
    /// If a cart already exists for the user, that cart is returned.
    async fn create_cart(&self, user_id: UserId) -> Result<Cart, RepositoryError>;

    /// Persist the cart's lines and timestamp.
    ///
    /// The write only succeeds if the stored version still equals
    /// `cart.version`; the returned cart carries the bumped version.
    ///
    /// # Errors
    ///
    /// `RepositoryError::Conflict` when another writer saved first,
    /// `RepositoryError::NotFound` when the cart does not exist.
    async fn save_cart(&self, cart: &Cart) -> Result<Cart, RepositoryError>;
}

/// Shoppers.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Fetch a user, creating it on first sight.
    async fn ensure_user(&self, id: UserId) -> Result<User, RepositoryError>;

    /// The oldest user, created when none exists.
    async fn default_user(&self) -> Result<User, RepositoryError>;

    /// Delete every user (and through them, every cart).
    async fn clear_users(&self) -> Result<u64, RepositoryError>;
}

/// Everything the storefront persists.
#[async_trait]
pub trait Store: ProductStore + CartStore + UserStore {
    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// `PostgreSQL` implementation of [`Store`].
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Map a unique-constraint violation to `RepositoryError::Conflict`.
fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
