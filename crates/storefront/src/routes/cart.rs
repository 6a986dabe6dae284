//! Cart route handlers.
//!
//! All handlers act on the shopper resolved by [`CurrentUser`]. Identifiers
//! in bodies and paths are parsed before any store access so a malformed id
//! is always a 400.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use corner_shop_core::{ProductId, Receipt};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::CurrentUser;
use crate::routes::ApiJson;
use crate::services::CartView;
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Body of `POST /api/cart`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    #[serde(default)]
    pub product_id: String,
    #[serde(default = "default_qty")]
    pub qty: i64,
}

const fn default_qty() -> i64 {
    1
}

/// Body of `PATCH /api/cart/{id}`.
#[derive(Debug, Deserialize)]
pub struct AdjustRequest {
    pub delta: i64,
}

/// Body of `POST /api/cart/checkout`.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// Response of `DELETE /api/cart/{id}`.
#[derive(Debug, Serialize)]
pub struct RemovedResponse {
    #[serde(flatten)]
    pub view: CartView,
    pub message: String,
}

fn parse_product_id(raw: &str, message: &str) -> Result<ProductId> {
    ProductId::parse(raw).map_err(|_| AppError::BadRequest(message.to_string()))
}

// =============================================================================
// Handlers
// =============================================================================

/// Show the cart and its total.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<CartView>> {
    Ok(Json(state.carts().view(user_id).await?))
}

/// Add a product to the cart.
///
/// `qty` defaults to 1. A negative `qty` takes units off an existing line,
/// removing it when it would reach zero.
#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiJson(body): ApiJson<AddItemRequest>,
) -> Result<Json<CartView>> {
    let product_id = parse_product_id(&body.product_id, "Invalid productId")?;

    let view = match body.qty {
        0 => return Err(AppError::BadRequest("Quantity cannot be zero.".to_string())),
        qty if qty > 0 => {
            let qty = u32::try_from(qty)
                .map_err(|_| AppError::BadRequest(format!("Quantity {qty} is too large.")))?;
            state.carts().add_item(user_id, product_id, qty).await?
        }
        delta => state.carts().adjust_quantity(user_id, product_id, delta).await?,
    };

    let product = product_id.to_string();
    add_breadcrumb("cart", "Changed cart", Some(&[("product_id", product.as_str())]));
    Ok(Json(view))
}

/// Change a line's quantity by a signed delta.
#[instrument(skip(state))]
pub async fn adjust(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<AdjustRequest>,
) -> Result<Json<CartView>> {
    let product_id = parse_product_id(&id, "Invalid product ID format.")?;
    let view = state
        .carts()
        .adjust_quantity(user_id, product_id, body.delta)
        .await?;
    Ok(Json(view))
}

/// Remove a product's line from the cart.
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<RemovedResponse>> {
    let product_id = parse_product_id(&id, "Invalid product ID format.")?;
    let view = state.carts().remove_item(user_id, product_id).await?;

    Ok(Json(RemovedResponse {
        view,
        message: format!("Item with ID {product_id} has been removed from the cart."),
    }))
}

/// Complete a mock purchase.
#[instrument(skip(state, body))]
pub async fn checkout(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ApiJson(body): ApiJson<CheckoutRequest>,
) -> Result<Json<Receipt>> {
    let receipt = state
        .carts()
        .checkout(user_id, &body.name, &body.email)
        .await?;

    let transaction = receipt.transaction_id.to_string();
    add_breadcrumb(
        "checkout",
        "Completed mock purchase",
        Some(&[("transaction_id", transaction.as_str())]),
    );
    Ok(Json(receipt))
}
