//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health              - Liveness check
//! GET    /health/ready        - Readiness check (store reachable)
//!
//! # Products
//! GET    /api/products        - Cached catalog, filled from upstream when empty
//!
//! # Cart (shopper from `x-user-id`, else the default user)
//! GET    /api/cart            - Cart with total
//! POST   /api/cart            - Add (or, with a negative qty, reduce) a product
//! PATCH  /api/cart/{id}       - Change a line's quantity by a delta
//! DELETE /api/cart/{id}       - Remove a line
//! POST   /api/cart/checkout   - Mock purchase, returns a receipt
//! ```

pub mod cart;
pub mod products;

use std::time::Duration;

use axum::{
    Router,
    extract::{FromRequest, State, rejection::JsonRejection},
    http::{Request, Response, StatusCode},
    middleware,
    routing::{get, patch, post},
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::error::AppError;
use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// JSON body extractor whose rejections use the API error shape.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new().route("/", get(products::index))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).post(cart::add))
        .route("/checkout", post(cart::checkout))
        .route("/{id}", patch(cart::adjust).delete(cart::remove))
}

/// Create all `/api` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
}

/// Build the application router with health checks, request ids and tracing.
///
/// Transport concerns that depend on deployment (CORS, Sentry) are layered
/// on by the binary.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", api_routes())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(|response: &Response<_>, latency: Duration, span: &Span| {
                    span.record("status", response.status().as_u16());
                    span.record(
                        "latency_ms",
                        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    );
                    DefaultOnResponse::default().on_response(response, latency, span);
                }),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
