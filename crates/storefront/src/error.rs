//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Every error body has the shape `{ "message": "..." }`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::catalog::InventoryError;
use crate::db::RepositoryError;
use crate::services::CartError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Product catalog could not be loaded.
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<&'static str>,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Cart(err) => match err {
                CartError::ProductNotFound(_) | CartError::ItemNotInCart(_) => {
                    StatusCode::NOT_FOUND
                }
                CartError::EmptyCart | CartError::Validation(_) => StatusCode::BAD_REQUEST,
                CartError::Conflict => StatusCode::CONFLICT,
                CartError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Inventory(err) => match err {
                InventoryError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                InventoryError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    // Don't expose internal error details to clients
    fn body(&self) -> ErrorBody {
        let message = match self {
            Self::Database(_)
            | Self::Cart(CartError::Repository(_))
            | Self::Inventory(InventoryError::Store(_)) => "Internal server error".to_string(),
            Self::Cart(err) => err.to_string(),
            Self::Inventory(err) => err.to_string(),
            Self::BadRequest(msg) => msg.clone(),
        };

        let detail = matches!(self, Self::Inventory(InventoryError::Unavailable(_)))
            .then_some("Could not connect to external inventory source.");

        ErrorBody { message, detail }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }

        (status, Json(self.body())).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use corner_shop_core::ProductId;

    use super::*;
    use crate::catalog::CatalogError;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    async fn get_body(err: AppError) -> serde_json::Value {
        let response = err.into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(RepositoryError::DataCorruption("test".to_string()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(CartError::ItemNotInCart(ProductId::generate()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(get_status(CartError::EmptyCart.into()), StatusCode::BAD_REQUEST);
        assert_eq!(get_status(CartError::Conflict.into()), StatusCode::CONFLICT);
        assert_eq!(
            get_status(
                InventoryError::Unavailable(CatalogError::InvalidRecord("x".to_string())).into()
            ),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn test_body_is_json_message() {
        let body = get_body(AppError::BadRequest("Invalid productId".to_string())).await;
        assert_eq!(body, serde_json::json!({ "message": "Invalid productId" }));
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let body = get_body(AppError::Database(RepositoryError::DataCorruption(
            "secret table state".to_string(),
        )))
        .await;
        assert_eq!(body["message"], "Internal server error");
    }

    #[tokio::test]
    async fn test_inventory_unavailable_body() {
        let body = get_body(
            InventoryError::Unavailable(CatalogError::InvalidRecord("x".to_string())).into(),
        )
        .await;
        assert_eq!(body["message"], "Inventory service unavailable.");
        assert_eq!(
            body["detail"],
            "Could not connect to external inventory source."
        );
    }
}
