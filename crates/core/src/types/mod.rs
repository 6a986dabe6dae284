//! Core types for Corner Shop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod catalog;
pub mod id;
pub mod money;
pub mod receipt;
pub mod user;

pub use cart::{Cart, CartItem, CartLineError, LineChange, MAX_LINE_QUANTITY};
pub use catalog::{NewProduct, Product};
pub use id::*;
pub use money::round_to_cents;
pub use receipt::{RECEIPT_STATUS, Receipt, ReceiptLine};
pub use user::User;
