//! In-process store for tests and local development.
//!
//! Mirrors the `PostgreSQL` behaviour the services rely on: unique
//! `external_id`, one cart per user, compare-and-swap on the cart version,
//! and cart lines that disappear with their product.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use corner_shop_core::{
    Cart, CartId, CartItem, NewProduct, Product, ProductId, User, UserId,
};

use super::{CartStore, ProductStore, RepositoryError, Store, UserStore};

/// Cart as persisted: lines reference products by id.
#[derive(Debug, Clone)]
struct StoredCart {
    id: CartId,
    updated_at: chrono::DateTime<Utc>,
    version: i64,
    lines: Vec<(ProductId, u32)>,
}

#[derive(Debug, Default)]
struct Tables {
    products: Vec<Product>,
    carts: HashMap<UserId, StoredCart>,
    users: Vec<User>,
}

impl Tables {
    fn resolve(&self, user_id: UserId, stored: &StoredCart) -> Cart {
        let items = stored
            .lines
            .iter()
            .filter_map(|(product_id, qty)| {
                self.products
                    .iter()
                    .find(|p| p.id == *product_id)
                    .map(|product| CartItem {
                        product: product.clone(),
                        qty: *qty,
                    })
            })
            .collect();

        Cart {
            id: stored.id,
            user_id,
            items,
            updated_at: stored.updated_at,
            version: stored.version,
        }
    }
}

/// `HashMap`-backed [`Store`]. Clone-friendly via `Arc`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(self.tables.lock().await.products.clone())
    }

    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.products.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_products(
        &self,
        products: Vec<NewProduct>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let mut tables = self.tables.lock().await;
        let mut inserted = Vec::with_capacity(products.len());

        for product in products {
            let duplicate = product.external_id.is_some()
                && tables
                    .products
                    .iter()
                    .any(|p| p.external_id == product.external_id);
            if duplicate {
                continue;
            }

            let product = product.with_id(ProductId::generate());
            tables.products.push(product.clone());
            inserted.push(product);
        }

        Ok(inserted)
    }

    async fn clear_products(&self) -> Result<u64, RepositoryError> {
        let mut tables = self.tables.lock().await;
        let removed = tables.products.len() as u64;
        tables.products.clear();
        // cart_items reference products with ON DELETE CASCADE
        for cart in tables.carts.values_mut() {
            cart.lines.clear();
        }
        Ok(removed)
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn find_cart(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .carts
            .get(&user_id)
            .map(|stored| tables.resolve(user_id, stored)))
    }

    async fn create_cart(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if !tables.users.iter().any(|u| u.id == user_id) {
            return Err(RepositoryError::Conflict(format!("user {user_id} does not exist")));
        }

        let stored = tables
            .carts
            .entry(user_id)
            .or_insert_with(|| StoredCart {
                id: CartId::generate(),
                updated_at: Utc::now(),
                version: 0,
                lines: Vec::new(),
            })
            .clone();

        Ok(tables.resolve(user_id, &stored))
    }

    async fn save_cart(&self, cart: &Cart) -> Result<Cart, RepositoryError> {
        let mut tables = self.tables.lock().await;

        if let Some(item) = cart
            .items
            .iter()
            .find(|item| !tables.products.iter().any(|p| p.id == item.product.id))
        {
            return Err(RepositoryError::Conflict(format!(
                "product {} is no longer in the catalog",
                item.product.id
            )));
        }

        let stored = tables
            .carts
            .get_mut(&cart.user_id)
            .filter(|stored| stored.id == cart.id)
            .ok_or(RepositoryError::NotFound)?;

        if stored.version != cart.version {
            return Err(RepositoryError::Conflict(format!(
                "cart {} was modified concurrently",
                cart.id
            )));
        }

        stored.version += 1;
        stored.updated_at = cart.updated_at;
        stored.lines = cart
            .items
            .iter()
            .map(|item| (item.product.id, item.qty))
            .collect();

        let stored = stored.clone();
        Ok(tables.resolve(cart.user_id, &stored))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn ensure_user(&self, id: UserId) -> Result<User, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if let Some(user) = tables.users.iter().find(|u| u.id == id) {
            return Ok(user.clone());
        }

        let user = User {
            id,
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn default_user(&self) -> Result<User, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if let Some(user) = tables.users.first() {
            return Ok(user.clone());
        }

        let user = User {
            id: UserId::generate(),
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn clear_users(&self) -> Result<u64, RepositoryError> {
        let mut tables = self.tables.lock().await;
        let removed = tables.users.len() as u64;
        tables.users.clear();
        tables.carts.clear();
        Ok(removed)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn new_product(name: &str, external_id: Option<i64>) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            price: Decimal::new(1_000, 2),
            description: String::new(),
            image: String::new(),
            external_id,
        }
    }

    #[tokio::test]
    async fn test_insert_skips_duplicate_external_ids() {
        let store = MemoryStore::new();
        let first = store
            .insert_products(vec![new_product("A", Some(1)), new_product("B", Some(2))])
            .await
            .unwrap();
        let second = store
            .insert_products(vec![new_product("A again", Some(1)), new_product("C", Some(3))])
            .await
            .unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].name, "C");

        let names: Vec<_> = store
            .list_products()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, ["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_create_cart_is_idempotent() {
        let store = MemoryStore::new();
        let user = store.default_user().await.unwrap();

        let first = store.create_cart(user.id).await.unwrap();
        let second = store.create_cart(user.id).await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_create_cart_requires_user() {
        let store = MemoryStore::new();
        let err = store.create_cart(UserId::generate()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_save_bumps_version_and_rejects_stale_writes() {
        let store = MemoryStore::new();
        let user = store.default_user().await.unwrap();
        let product = store
            .insert_products(vec![new_product("A", None)])
            .await
            .unwrap()
            .remove(0);

        let mut cart = store.create_cart(user.id).await.unwrap();
        let stale = cart.clone();
        cart.add(product, 2).unwrap();

        let saved = store.save_cart(&cart).await.unwrap();
        assert_eq!(saved.version, cart.version + 1);
        assert_eq!(saved.items[0].qty, 2);

        let err = store.save_cart(&stale).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert_eq!(store.find_cart(user.id).await.unwrap().unwrap().items.len(), 1);
    }

    #[tokio::test]
    async fn test_clearing_products_empties_carts() {
        let store = MemoryStore::new();
        let user = store.default_user().await.unwrap();
        let product = store
            .insert_products(vec![new_product("A", Some(1))])
            .await
            .unwrap()
            .remove(0);

        let mut cart = store.create_cart(user.id).await.unwrap();
        cart.add(product, 1).unwrap();
        store.save_cart(&cart).await.unwrap();

        assert_eq!(store.clear_products().await.unwrap(), 1);
        let cart = store.find_cart(user.id).await.unwrap().unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_default_user_is_stable() {
        let store = MemoryStore::new();
        let first = store.default_user().await.unwrap();
        let second = store.default_user().await.unwrap();
        assert_eq!(first.id, second.id);

        store.clear_users().await.unwrap();
        let third = store.default_user().await.unwrap();
        assert_ne!(first.id, third.id);
    }
}
