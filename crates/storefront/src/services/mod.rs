//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `cart` - Per-user cart operations and mock checkout

pub mod cart;

pub use cart::{CartError, CartService, CartView};
