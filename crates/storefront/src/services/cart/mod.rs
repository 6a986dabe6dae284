//! Cart service.
//!
//! Every operation names the owning user explicitly. Mutations for one user
//! run one at a time behind [`UserLocks`], and the save itself is a
//! compare-and-swap on the cart version, so a write that slips past the lock
//! (another process, an evicted lock) fails with `CartError::Conflict`
//! instead of overwriting.

mod error;
mod locks;

pub use error::CartError;
pub use locks::UserLocks;

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument};

use corner_shop_core::{Cart, LineChange, ProductId, Receipt, TransactionId, UserId};

use crate::db::Store;

/// A cart together with its current total.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub cart: Cart,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

impl From<Cart> for CartView {
    fn from(cart: Cart) -> Self {
        let total = cart.total();
        Self { cart, total }
    }
}

/// Cart operations over a [`Store`].
#[derive(Clone)]
pub struct CartService {
    inner: Arc<CartServiceInner>,
}

struct CartServiceInner {
    store: Arc<dyn Store>,
    locks: UserLocks,
}

impl CartService {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            inner: Arc::new(CartServiceInner {
                store,
                locks: UserLocks::new(),
            }),
        }
    }

    /// The user's cart, created empty on first access.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the store fails.
    pub async fn get_or_create_cart(&self, user_id: UserId) -> Result<Cart, CartError> {
        let store = &self.inner.store;
        if let Some(cart) = store.find_cart(user_id).await? {
            return Ok(cart);
        }

        store.ensure_user(user_id).await?;
        Ok(store.create_cart(user_id).await?)
    }

    /// The user's cart with its total.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the store fails.
    pub async fn view(&self, user_id: UserId) -> Result<CartView, CartError> {
        Ok(self.get_or_create_cart(user_id).await?.into())
    }

    /// Add `qty` units of a product, merging with an existing line.
    ///
    /// # Errors
    ///
    /// - `CartError::ProductNotFound` if the product is not in the catalog
    /// - `CartError::Validation` if `qty` is zero or the line would grow too large
    /// - `CartError::Conflict` if the cart changed underneath us
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        qty: u32,
    ) -> Result<CartView, CartError> {
        let _guard = self.inner.locks.acquire(user_id).await;
        self.add_locked(user_id, product_id, qty).await
    }

    /// Change a line's quantity by `delta`.
    ///
    /// A positive delta behaves like [`Self::add_item`]. A negative delta
    /// requires an existing line and removes it once the quantity would
    /// drop to zero or below.
    ///
    /// # Errors
    ///
    /// - `CartError::Validation` if `delta` is zero or too large
    /// - `CartError::ItemNotInCart` when decreasing a product not in the cart
    /// - `CartError::ProductNotFound` when increasing an unknown product
    #[instrument(skip(self))]
    pub async fn adjust_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        delta: i64,
    ) -> Result<CartView, CartError> {
        if delta == 0 {
            return Err(CartError::Validation(
                "Quantity change cannot be zero.".to_string(),
            ));
        }

        let _guard = self.inner.locks.acquire(user_id).await;

        if delta > 0 {
            let qty = u32::try_from(delta)
                .map_err(|_| CartError::Validation(format!("Quantity {delta} is too large.")))?;
            return self.add_locked(user_id, product_id, qty).await;
        }

        let by = u32::try_from(delta.unsigned_abs()).unwrap_or(u32::MAX);
        let mut cart = self.get_or_create_cart(user_id).await?;
        let change = cart.decrease(product_id, by)?;
        cart.touch(Utc::now());

        let saved = self.inner.store.save_cart(&cart).await?;
        info!(cart_id = %saved.id, ?change, "Decreased cart line");
        Ok(saved.into())
    }

    /// Remove a product's line entirely.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ItemNotInCart` if the product has no line; the
    /// cart is not written in that case.
    #[instrument(skip(self))]
    pub async fn remove_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<CartView, CartError> {
        let _guard = self.inner.locks.acquire(user_id).await;

        let mut cart = self.get_or_create_cart(user_id).await?;
        cart.remove(product_id)
            .ok_or(CartError::ItemNotInCart(product_id))?;
        cart.touch(Utc::now());

        let saved = self.inner.store.save_cart(&cart).await?;
        info!(cart_id = %saved.id, "Removed cart line");
        Ok(saved.into())
    }

    /// Complete a mock purchase and empty the cart.
    ///
    /// No payment is taken and stock is not decremented. The receipt is
    /// logged and returned, never stored.
    ///
    /// # Errors
    ///
    /// - `CartError::Validation` if the name or email is blank
    /// - `CartError::EmptyCart` if there is nothing to buy
    #[instrument(skip(self, name, email))]
    pub async fn checkout(
        &self,
        user_id: UserId,
        name: &str,
        email: &str,
    ) -> Result<Receipt, CartError> {
        let (name, email) = (name.trim(), email.trim());
        if name.is_empty() || email.is_empty() {
            return Err(CartError::Validation(
                "Checkout requires a valid name and email address.".to_string(),
            ));
        }

        let _guard = self.inner.locks.acquire(user_id).await;

        let mut cart = self.get_or_create_cart(user_id).await?;
        if cart.is_empty() {
            return Err(CartError::EmptyCart);
        }

        let now = Utc::now();
        let receipt = Receipt::for_cart(
            &cart,
            name.to_string(),
            email.to_string(),
            TransactionId::generate(),
            now,
        );

        cart.clear();
        cart.touch(now);
        self.inner.store.save_cart(&cart).await?;

        info!(
            transaction_id = %receipt.transaction_id,
            cart_id = %cart.id,
            lines = receipt.items_purchased.len(),
            final_total = %receipt.final_total,
            receipt = %serde_json::to_string(&receipt).unwrap_or_default(),
            "Mock purchase completed"
        );

        Ok(receipt)
    }

    async fn add_locked(
        &self,
        user_id: UserId,
        product_id: ProductId,
        qty: u32,
    ) -> Result<CartView, CartError> {
        let store = &self.inner.store;
        let product = store
            .find_product(product_id)
            .await?
            .ok_or(CartError::ProductNotFound(product_id))?;

        let mut cart = self.get_or_create_cart(user_id).await?;
        let change = cart.add(product, qty)?;
        cart.touch(Utc::now());

        let saved = store.save_cart(&cart).await?;
        match change {
            LineChange::Added { qty } => info!(cart_id = %saved.id, %product_id, qty, "Added cart line"),
            LineChange::Updated { qty } => info!(cart_id = %saved.id, %product_id, qty, "Updated cart line"),
            LineChange::Removed => {}
        }
        Ok(saved.into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use corner_shop_core::{NewProduct, Product, RECEIPT_STATUS};

    use super::*;
    use crate::db::{MemoryStore, ProductStore};

    async fn setup() -> (CartService, Arc<MemoryStore>, Vec<Product>) {
        let store = Arc::new(MemoryStore::new());
        let products = store
            .insert_products(vec![
                NewProduct {
                    name: "A".to_string(),
                    price: Decimal::new(1_000, 2),
                    description: String::new(),
                    image: String::new(),
                    external_id: Some(1),
                },
                NewProduct {
                    name: "B".to_string(),
                    price: Decimal::new(550, 2),
                    description: String::new(),
                    image: String::new(),
                    external_id: Some(2),
                },
            ])
            .await
            .unwrap();
        (CartService::new(store.clone()), store, products)
    }

    #[tokio::test]
    async fn test_new_user_gets_empty_cart() {
        let (service, _, _) = setup().await;
        let view = service.view(UserId::generate()).await.unwrap();
        assert!(view.cart.is_empty());
        assert_eq!(view.total, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_add_twice_accumulates() {
        let (service, _, products) = setup().await;
        let user = UserId::generate();

        service.add_item(user, products[0].id, 1).await.unwrap();
        let view = service.add_item(user, products[0].id, 2).await.unwrap();

        assert_eq!(view.cart.items.len(), 1);
        assert_eq!(view.cart.items[0].qty, 3);
    }

    #[tokio::test]
    async fn test_large_quantities_accumulate() {
        let (service, _, products) = setup().await;
        let user = UserId::generate();

        service.add_item(user, products[0].id, 6_000).await.unwrap();
        let view = service.add_item(user, products[0].id, 6_000).await.unwrap();

        assert_eq!(view.cart.items[0].qty, 12_000);
        assert_eq!(view.total, Decimal::new(120_000, 0));
    }

    #[tokio::test]
    async fn test_total_example() {
        let (service, _, products) = setup().await;
        let user = UserId::generate();

        service.add_item(user, products[0].id, 2).await.unwrap();
        let view = service.add_item(user, products[1].id, 1).await.unwrap();

        assert_eq!(view.total, Decimal::new(2_550, 2));
    }

    #[tokio::test]
    async fn test_add_unknown_product() {
        let (service, _, _) = setup().await;
        let err = service
            .add_item(UserId::generate(), ProductId::generate(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::ProductNotFound(_)));
    }

    #[tokio::test]
    async fn test_negative_adjust_past_one_removes_line() {
        let (service, _, products) = setup().await;
        let user = UserId::generate();
        service.add_item(user, products[0].id, 1).await.unwrap();
        service.add_item(user, products[1].id, 2).await.unwrap();

        let view = service.adjust_quantity(user, products[0].id, -5).await.unwrap();
        assert_eq!(view.cart.items.len(), 1);
        assert_eq!(view.cart.items[0].product.id, products[1].id);

        let view = service.adjust_quantity(user, products[1].id, -1).await.unwrap();
        assert_eq!(view.cart.items[0].qty, 1);
    }

    #[tokio::test]
    async fn test_adjust_zero_and_missing_line() {
        let (service, _, products) = setup().await;
        let user = UserId::generate();

        assert!(matches!(
            service.adjust_quantity(user, products[0].id, 0).await,
            Err(CartError::Validation(_))
        ));
        assert!(matches!(
            service.adjust_quantity(user, products[0].id, -1).await,
            Err(CartError::ItemNotInCart(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_absent_product_leaves_cart_unchanged() {
        let (service, _, products) = setup().await;
        let user = UserId::generate();
        service.add_item(user, products[0].id, 1).await.unwrap();
        let before = service.get_or_create_cart(user).await.unwrap();

        let err = service.remove_item(user, products[1].id).await.unwrap_err();
        assert!(matches!(err, CartError::ItemNotInCart(_)));
        assert_eq!(service.get_or_create_cart(user).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_checkout_empty_cart_is_rejected() {
        let (service, _, _) = setup().await;
        let user = UserId::generate();
        let before = service.get_or_create_cart(user).await.unwrap();

        let err = service
            .checkout(user, "Ada", "ada@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::EmptyCart));
        assert_eq!(service.get_or_create_cart(user).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_checkout_validates_input_before_touching_cart() {
        let (service, _, products) = setup().await;
        let user = UserId::generate();
        service.add_item(user, products[0].id, 1).await.unwrap();

        assert!(matches!(
            service.checkout(user, "   ", "ada@example.com").await,
            Err(CartError::Validation(_))
        ));
        assert!(matches!(
            service.checkout(user, "Ada", " ").await,
            Err(CartError::Validation(_))
        ));
        assert_eq!(service.view(user).await.unwrap().cart.items.len(), 1);
    }

    #[tokio::test]
    async fn test_checkout_empties_cart() {
        let (service, _, products) = setup().await;
        let user = UserId::generate();
        service.add_item(user, products[0].id, 2).await.unwrap();
        service.add_item(user, products[1].id, 1).await.unwrap();

        let receipt = service
            .checkout(user, " Ada ", "ada@example.com")
            .await
            .unwrap();
        assert_eq!(receipt.customer_name, "Ada");
        assert_eq!(receipt.final_total, Decimal::new(2_550, 2));
        assert_eq!(receipt.items_purchased.len(), 2);
        assert_eq!(receipt.status, RECEIPT_STATUS);

        let view = service.view(user).await.unwrap();
        assert!(view.cart.is_empty());
        assert_eq!(view.total, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_checkout_accepts_any_non_blank_email() {
        let (service, _, products) = setup().await;
        let user = UserId::generate();
        service.add_item(user, products[0].id, 1).await.unwrap();

        let receipt = service.checkout(user, "Ada", " ada ").await.unwrap();
        assert_eq!(receipt.customer_email, "ada");
        assert!(service.view(user).await.unwrap().cart.is_empty());
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let (service, _, products) = setup().await;
        let alice = UserId::generate();
        let bob = UserId::generate();

        service.add_item(alice, products[0].id, 1).await.unwrap();

        assert!(service.view(bob).await.unwrap().cart.is_empty());
        assert_eq!(service.view(alice).await.unwrap().cart.items.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_adds_are_not_lost() {
        let (service, _, products) = setup().await;
        let user = UserId::generate();
        service.get_or_create_cart(user).await.unwrap();

        let tasks: Vec<_> = (0..10)
            .map(|_| {
                let service = service.clone();
                let product_id = products[0].id;
                tokio::spawn(async move { service.add_item(user, product_id, 1).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let view = service.view(user).await.unwrap();
        assert_eq!(view.cart.items[0].qty, 10);
    }

    #[tokio::test]
    async fn test_reseed_drops_stale_lines() {
        let (service, store, products) = setup().await;
        let user = UserId::generate();
        service.add_item(user, products[0].id, 1).await.unwrap();

        store.clear_products().await.unwrap();

        let view = service.view(user).await.unwrap();
        assert!(view.cart.is_empty());
    }
}
