//! Request ID middleware for request tracing and correlation.
//!
//! An `x-request-id` supplied by a proxy is kept when it looks sane (short,
//! visible ASCII); otherwise a UUID v4 is generated. The id is recorded on
//! the request span, tagged in Sentry and echoed back on the response.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_REQUEST_ID_LEN: usize = 128;

fn incoming_request_id(request: &Request) -> Option<String> {
    let value = request.headers().get(REQUEST_ID_HEADER)?.to_str().ok()?;
    let value = value.trim();
    let acceptable = !value.is_empty()
        && value.len() <= MAX_REQUEST_ID_LEN
        && value.chars().all(|c| c.is_ascii_graphic());
    acceptable.then(|| value.to_string())
}

/// Middleware that ensures every request has a request ID.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id =
        incoming_request_id(&request).unwrap_or_else(|| Uuid::new_v4().to_string());

    Span::current().record("request_id", request_id.as_str());

    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{Router, body::Body, middleware, routing::get};
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(middleware::from_fn(request_id_middleware))
    }

    async fn response_id(header: Option<&str>) -> String {
        let mut request = axum::http::Request::builder().uri("/");
        if let Some(value) = header {
            request = request.header(REQUEST_ID_HEADER, value);
        }
        let response = app()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        response
            .headers()
            .get(REQUEST_ID_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_generates_uuid_when_absent() {
        let id = response_id(None).await;
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[tokio::test]
    async fn test_keeps_upstream_id() {
        assert_eq!(response_id(Some("cf-ray-8a1b2c")).await, "cf-ray-8a1b2c");
    }

    #[tokio::test]
    async fn test_replaces_oversized_id() {
        let long = "a".repeat(MAX_REQUEST_ID_LEN + 1);
        let id = response_id(Some(&long)).await;
        assert!(Uuid::parse_str(&id).is_ok());
    }
}
