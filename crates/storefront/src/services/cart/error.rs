//! Cart service error types.

use thiserror::Error;

use corner_shop_core::{CartLineError, ProductId};

use crate::db::RepositoryError;

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Product does not exist in the catalog.
    #[error("Product not found")]
    ProductNotFound(ProductId),

    /// Product has no line in the cart.
    #[error("Item not found in cart.")]
    ItemNotInCart(ProductId),

    /// Checkout attempted with nothing in the cart.
    #[error("Cannot checkout an empty cart.")]
    EmptyCart,

    /// Request data failed validation.
    #[error("{0}")]
    Validation(String),

    /// Another request changed the cart first.
    #[error("cart was modified concurrently, please retry")]
    Conflict,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for CartError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::Conflict(_) => Self::Conflict,
            other => Self::Repository(other),
        }
    }
}

impl From<CartLineError> for CartError {
    fn from(e: CartLineError) -> Self {
        match e {
            CartLineError::NotInCart(id) => Self::ItemNotInCart(id),
            other => Self::Validation(other.to_string()),
        }
    }
}
