//! Shopping cart and its line arithmetic.
//!
//! A cart holds at most one line per product. Every line has a quantity of
//! at least one; an operation that would take a line to zero removes it.
//! Totals are computed from the current product price on every call, so a
//! price change in the catalog is reflected the next time the cart is read.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::catalog::Product;
use super::id::{CartId, ProductId, UserId};
use super::money::line_total;

/// Upper bound for the quantity of a single line: the largest value the
/// `INTEGER` quantity column can hold.
pub const MAX_LINE_QUANTITY: u32 = 2_147_483_647;

/// Errors from mutating cart lines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartLineError {
    #[error("quantity must be at least 1")]
    ZeroQuantity,

    #[error("quantity for a single product cannot exceed {max}")]
    QuantityTooLarge { max: u32 },

    #[error("product {0} is not in the cart")]
    NotInCart(ProductId),
}

/// What happened to a line after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineChange {
    /// A new line was appended.
    Added { qty: u32 },
    /// An existing line changed quantity.
    Updated { qty: u32 },
    /// The line dropped to zero and was removed.
    Removed,
}

/// One product line in a cart, with the product resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: Product,
    pub qty: u32,
}

impl CartItem {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        line_total(self.product.price, self.qty)
    }
}

/// A user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: CartId,
    /// Owning user. Unique across carts.
    #[serde(rename = "user")]
    pub user_id: UserId,
    /// Lines in insertion order.
    pub items: Vec<CartItem>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency counter, bumped by every successful save.
    pub version: i64,
}

impl Cart {
    /// Create an empty cart for a user.
    #[must_use]
    pub fn new(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: CartId::generate(),
            user_id,
            items: Vec::new(),
            updated_at: now,
            version: 0,
        }
    }

    /// Sum of `price × qty` over all lines, at full precision.
    ///
    /// Saturates at `Decimal::MAX` instead of overflowing.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items
            .iter()
            .fold(Decimal::ZERO, |sum, item| sum.saturating_add(item.line_total()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Find the line for a product.
    #[must_use]
    pub fn item(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product.id == product_id)
    }

    /// Add `qty` units of a product, merging with an existing line.
    ///
    /// The line's product data is refreshed with the one passed in.
    ///
    /// # Errors
    ///
    /// Returns `ZeroQuantity` for `qty == 0` and `QuantityTooLarge` when the
    /// merged quantity would exceed [`MAX_LINE_QUANTITY`]. The cart is left
    /// untouched on error.
    pub fn add(&mut self, product: Product, qty: u32) -> Result<LineChange, CartLineError> {
        if qty == 0 {
            return Err(CartLineError::ZeroQuantity);
        }

        if let Some(item) = self
            .items
            .iter_mut()
            .find(|item| item.product.id == product.id)
        {
            let merged = item
                .qty
                .checked_add(qty)
                .filter(|merged| *merged <= MAX_LINE_QUANTITY)
                .ok_or(CartLineError::QuantityTooLarge {
                    max: MAX_LINE_QUANTITY,
                })?;
            item.qty = merged;
            item.product = product;
            return Ok(LineChange::Updated { qty: merged });
        }

        if qty > MAX_LINE_QUANTITY {
            return Err(CartLineError::QuantityTooLarge {
                max: MAX_LINE_QUANTITY,
            });
        }
        self.items.push(CartItem { product, qty });
        Ok(LineChange::Added { qty })
    }

    /// Take `by` units off a product's line, removing the line when it
    /// would reach zero.
    ///
    /// # Errors
    ///
    /// Returns `ZeroQuantity` for `by == 0` and `NotInCart` when the product
    /// has no line.
    pub fn decrease(&mut self, product_id: ProductId, by: u32) -> Result<LineChange, CartLineError> {
        if by == 0 {
            return Err(CartLineError::ZeroQuantity);
        }

        let index = self
            .items
            .iter()
            .position(|item| item.product.id == product_id)
            .ok_or(CartLineError::NotInCart(product_id))?;

        match self.items.get_mut(index) {
            Some(item) if item.qty > by => {
                item.qty -= by;
                Ok(LineChange::Updated { qty: item.qty })
            }
            _ => {
                self.items.remove(index);
                Ok(LineChange::Removed)
            }
        }
    }

    /// Remove a product's line entirely.
    pub fn remove(&mut self, product_id: ProductId) -> Option<CartItem> {
        let index = self
            .items
            .iter()
            .position(|item| item.product.id == product_id)?;
        Some(self.items.remove(index))
    }

    /// Empty the cart, returning the removed lines.
    pub fn clear(&mut self) -> Vec<CartItem> {
        std::mem::take(&mut self.items)
    }

    /// Record a modification time.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}
