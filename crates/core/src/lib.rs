//! Corner Shop Core - Shared domain types.
//!
//! This crate provides the types used by every Corner Shop component:
//! - `storefront` - JSON API serving the catalog and the shopping cart
//! - `cli` - Migrations and reseeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure domain logic - no I/O, no
//! database access, no HTTP clients. Cart arithmetic lives here so it can be
//! tested without a store.
//!
//! # Modules
//!
//! - [`types`] - Typed identifiers, money helpers, catalog, cart and receipt types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
