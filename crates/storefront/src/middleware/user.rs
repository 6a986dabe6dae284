//! Shopper resolution.
//!
//! There is no authentication. A request may name its shopper with the
//! `x-user-id` header; without it, the request acts as the synthetic default
//! user.

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::Span;

use corner_shop_core::UserId;

use crate::error::{AppError, set_sentry_user};
use crate::state::AppState;

/// The HTTP header name for the shopper id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Extractor for the shopper a request acts on behalf of.
///
/// Rejects with 400 when the header is present but not a UUID.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(State(state): State<AppState>, CurrentUser(user_id): CurrentUser) {
///     let cart = state.carts().view(user_id).await?;
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub UserId);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = match parts.headers.get(USER_ID_HEADER) {
            Some(value) => {
                let value = value
                    .to_str()
                    .map_err(|_| AppError::BadRequest("Invalid user ID format.".to_string()))?;
                UserId::parse(value)
                    .map_err(|_| AppError::BadRequest("Invalid user ID format.".to_string()))?
            }
            None => state.default_user_id().await?,
        };

        Span::current().record("user_id", tracing::field::display(user_id));
        set_sentry_user(&user_id);

        Ok(Self(user_id))
    }
}
