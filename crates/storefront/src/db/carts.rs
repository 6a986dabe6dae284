//! Carts in `PostgreSQL`.
//!
//! A cart row carries the owner, timestamp and version; its lines live in
//! `cart_items` and are rewritten wholesale on every save, inside the same
//! transaction as the version check.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};
use tracing::instrument;
use uuid::Uuid;

use corner_shop_core::{Cart, CartId, CartItem, Product, ProductId, UserId};

use super::{CartStore, PgStore, RepositoryError};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: Uuid,
    user_id: Uuid,
    updated_at: DateTime<Utc>,
    version: i64,
}

/// A cart line joined with its product.
#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    qty: i32,
    product_id: Uuid,
    name: String,
    price: Decimal,
    description: String,
    image: String,
    external_id: Option<i64>,
}

impl TryFrom<CartLineRow> for CartItem {
    type Error = RepositoryError;

    fn try_from(row: CartLineRow) -> Result<Self, Self::Error> {
        let qty = u32::try_from(row.qty)
            .ok()
            .filter(|qty| *qty >= 1)
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "invalid quantity {} for product {}",
                    row.qty, row.product_id
                ))
            })?;

        Ok(Self {
            product: Product {
                id: ProductId::new(row.product_id),
                name: row.name,
                price: row.price,
                description: row.description,
                image: row.image,
                external_id: row.external_id,
            },
            qty,
        })
    }
}

impl PgStore {
    async fn load_lines(&self, cart_id: Uuid) -> Result<Vec<CartItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT ci.qty, p.id AS product_id, p.name, p.price, p.description,
                   p.image, p.external_id
            FROM shop.cart_items ci
            JOIN shop.products p ON p.id = ci.product_id
            WHERE ci.cart_id = $1
            ORDER BY ci.position
            ",
        )
        .bind(cart_id)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(CartItem::try_from).collect()
    }

    async fn hydrate(&self, row: CartRow) -> Result<Cart, RepositoryError> {
        let items = self.load_lines(row.id).await?;
        Ok(Cart {
            id: CartId::new(row.id),
            user_id: UserId::new(row.user_id),
            items,
            updated_at: row.updated_at,
            version: row.version,
        })
    }
}

async fn write_lines(
    tx: &mut Transaction<'_, Postgres>,
    cart: &Cart,
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM shop.cart_items WHERE cart_id = $1")
        .bind(cart.id)
        .execute(&mut **tx)
        .await?;

    for (position, item) in cart.items.iter().enumerate() {
        let qty = i32::try_from(item.qty).map_err(|_| {
            RepositoryError::DataCorruption(format!("quantity {} out of range", item.qty))
        })?;
        let position = i32::try_from(position).map_err(|_| {
            RepositoryError::DataCorruption(format!("cart {} has too many lines", cart.id))
        })?;

        sqlx::query(
            r"
            INSERT INTO shop.cart_items (cart_id, product_id, qty, position)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(cart.id)
        .bind(item.product.id)
        .bind(qty)
        .bind(position)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::Conflict(format!(
                    "product {} is no longer in the catalog",
                    item.product.id
                ));
            }
            RepositoryError::Database(e)
        })?;
    }

    Ok(())
}

#[async_trait]
impl CartStore for PgStore {
    async fn find_cart(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            r"
            SELECT id, user_id, updated_at, version
            FROM shop.carts
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn create_cart(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let created = sqlx::query_as::<_, CartRow>(
            r"
            INSERT INTO shop.carts (id, user_id, updated_at, version)
            VALUES ($1, $2, now(), 0)
            ON CONFLICT (user_id) DO NOTHING
            RETURNING id, user_id, updated_at, version
            ",
        )
        .bind(CartId::generate())
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;

        if let Some(row) = created {
            return self.hydrate(row).await;
        }

        // Lost the race against a concurrent create for the same user.
        self.find_cart(user_id).await?.ok_or(RepositoryError::NotFound)
    }

    #[instrument(skip(self, cart), fields(cart_id = %cart.id, version = cart.version))]
    async fn save_cart(&self, cart: &Cart) -> Result<Cart, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let version: Option<(i64,)> = sqlx::query_as(
            r"
            UPDATE shop.carts
            SET updated_at = $1, version = version + 1
            WHERE id = $2 AND version = $3
            RETURNING version
            ",
        )
        .bind(cart.updated_at)
        .bind(cart.id)
        .bind(cart.version)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((version,)) = version else {
            let exists: (bool,) =
                sqlx::query_as("SELECT EXISTS(SELECT 1 FROM shop.carts WHERE id = $1)")
                    .bind(cart.id)
                    .fetch_one(&mut *tx)
                    .await?;
            return Err(if exists.0 {
                RepositoryError::Conflict(format!("cart {} was modified concurrently", cart.id))
            } else {
                RepositoryError::NotFound
            });
        };

        write_lines(&mut tx, cart).await?;
        tx.commit().await?;

        Ok(Cart {
            version,
            ..cart.clone()
        })
    }
}
