//! Product catalog cache in `PostgreSQL`.

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{debug, instrument};
use uuid::Uuid;

use corner_shop_core::{NewProduct, Product, ProductId};

use super::{PgStore, ProductStore, RepositoryError};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    price: Decimal,
    description: String,
    image: String,
    external_id: Option<i64>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        if row.price.is_sign_negative() {
            return Err(RepositoryError::DataCorruption(format!(
                "negative price for product {}",
                row.id
            )));
        }

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            price: row.price,
            description: row.description,
            image: row.image,
            external_id: row.external_id,
        })
    }
}

#[async_trait]
impl ProductStore for PgStore {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, price, description, image, external_id
            FROM shop.products
            ORDER BY seq
            ",
        )
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, price, description, image, external_id
            FROM shop.products
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        row.map(Product::try_from).transpose()
    }

    #[instrument(skip(self, products), fields(count = products.len()))]
    async fn insert_products(
        &self,
        products: Vec<NewProduct>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let mut tx = self.pool().begin().await?;
        let mut inserted = Vec::with_capacity(products.len());

        for product in products {
            let row = sqlx::query_as::<_, ProductRow>(
                r"
                INSERT INTO shop.products (id, name, price, description, image, external_id)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (external_id) DO NOTHING
                RETURNING id, name, price, description, image, external_id
                ",
            )
            .bind(ProductId::generate())
            .bind(&product.name)
            .bind(product.price)
            .bind(&product.description)
            .bind(&product.image)
            .bind(product.external_id)
            .fetch_optional(&mut *tx)
            .await?;

            match row {
                Some(row) => inserted.push(Product::try_from(row)?),
                None => debug!(external_id = ?product.external_id, "Skipped already cached product"),
            }
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn clear_products(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.products")
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }
}
