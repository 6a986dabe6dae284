//! Corner Shop storefront library.
//!
//! This crate provides the catalog and cart API as a library, allowing it
//! to be tested against the in-memory store and reused by the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
