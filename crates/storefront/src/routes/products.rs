//! Product route handlers.

use axum::{Json, extract::State};
use tracing::instrument;

use corner_shop_core::Product;

use crate::error::Result;
use crate::state::AppState;

/// List the catalog.
///
/// Served from the local cache; the first request against an empty cache
/// pulls the catalog from the inventory API.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = state.inventory().get_products().await?;
    Ok(Json(products))
}
