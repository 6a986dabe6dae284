//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. CORS (single frontend origin)
//! 3. `TraceLayer` (request tracing)
//! 4. Request ID (add unique ID to each request)
//!
//! Shopper resolution is an extractor, [`CurrentUser`], rather than a layer.

pub mod request_id;
pub mod user;

pub use request_id::request_id_middleware;
pub use user::{CurrentUser, USER_ID_HEADER};
