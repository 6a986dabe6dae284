//! HTTP client for the Fake Store inventory API.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, instrument};
use url::Url;

use corner_shop_core::NewProduct;

use super::conversions::{ExternalProduct, convert_product};
use super::{CatalogError, CatalogSource};
use crate::config::CatalogConfig;

/// Client for `GET {base}/products?limit={n}`.
#[derive(Clone)]
pub struct FakeStoreClient {
    inner: Arc<FakeStoreClientInner>,
}

struct FakeStoreClientInner {
    client: reqwest::Client,
    endpoint: Url,
}

impl FakeStoreClient {
    /// Create a new inventory API client.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Http` if the HTTP client cannot be built.
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(FakeStoreClientInner {
                client,
                endpoint: products_endpoint(&config.base_url, config.product_limit),
            }),
        })
    }

    /// The fully built request URL.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }
}

fn products_endpoint(base_url: &Url, limit: u32) -> Url {
    let mut endpoint = base_url.clone();
    if let Ok(mut segments) = endpoint.path_segments_mut() {
        segments.pop_if_empty().push("products");
    }
    endpoint
        .query_pairs_mut()
        .clear()
        .append_pair("limit", &limit.to_string());
    endpoint
}

#[async_trait]
impl CatalogSource for FakeStoreClient {
    #[instrument(skip(self), fields(endpoint = %self.inner.endpoint))]
    async fn fetch_products(&self) -> Result<Vec<NewProduct>, CatalogError> {
        let response = self
            .inner
            .client
            .get(self.inner.endpoint.clone())
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Inventory API returned non-success status"
            );
            return Err(CatalogError::Status(status));
        }

        let records: Vec<ExternalProduct> = serde_json::from_str(&body).map_err(|e| {
            error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse inventory API response"
            );
            CatalogError::Parse(e)
        })?;

        debug!(count = records.len(), "Fetched products from inventory API");
        records.into_iter().map(convert_product).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn config(base: &str) -> CatalogConfig {
        CatalogConfig {
            base_url: Url::parse(base).unwrap(),
            product_limit: 10,
            timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn test_endpoint_from_bare_host() {
        let client = FakeStoreClient::new(&config("https://fakestoreapi.com")).unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "https://fakestoreapi.com/products?limit=10"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = FakeStoreClient::new(&config("http://localhost:8080/mock/")).unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "http://localhost:8080/mock/products?limit=10"
        );
    }
}
