//! Integration tests for Corner Shop.
//!
//! These run against a live storefront and are ignored by default.
//!
//! # Running Tests
//!
//! ```bash
//! # Prepare the database and start the server
//! cargo run -p corner-shop-cli -- migrate
//! cargo run -p corner-shop-storefront
//!
//! # Run integration tests
//! cargo test -p corner-shop-integration-tests -- --ignored
//! ```
//!
//! `STOREFRONT_BASE_URL` points the tests at another server
//! (default: <http://localhost:5000>).

use reqwest::{Client, RequestBuilder};
use uuid::Uuid;

/// Base URL for the storefront API (configurable via environment).
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:5000".to_string())
}

/// A shopper with a fresh id, so tests never share a cart.
pub struct Shopper {
    pub id: Uuid,
    client: Client,
    base_url: String,
}

impl Shopper {
    /// Create a shopper that has never been seen by the server.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            client: Client::new(),
            base_url: storefront_base_url(),
        }
    }

    /// Full URL for an API path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// GET as this shopper.
    #[must_use]
    pub fn get(&self, path: &str) -> RequestBuilder {
        self.with_user(self.client.get(self.url(path)))
    }

    /// POST as this shopper.
    #[must_use]
    pub fn post(&self, path: &str) -> RequestBuilder {
        self.with_user(self.client.post(self.url(path)))
    }

    /// PATCH as this shopper.
    #[must_use]
    pub fn patch(&self, path: &str) -> RequestBuilder {
        self.with_user(self.client.patch(self.url(path)))
    }

    /// DELETE as this shopper.
    #[must_use]
    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.with_user(self.client.delete(self.url(path)))
    }

    fn with_user(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("x-user-id", self.id.to_string())
    }
}

impl Default for Shopper {
    fn default() -> Self {
        Self::new()
    }
}
