//! Request correlation and response hardening middleware

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Tag every response with the caller's request id, or a fresh one
pub async fn request_id(request: Request, next: Next) -> Response {
    let request_id = extract_or_generate_request_id(request.headers());
    debug!("Processing request: {}", request_id);

    let mut response = next.run(request).await;

    if response.status().is_client_error() {
        warn!("Client error for request {}: {}", request_id, response.status());
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }

    response
}

/// Request ID extraction and generation
fn extract_or_generate_request_id(headers: &HeaderMap) -> String {
    for name in ["x-trace-id", REQUEST_ID_HEADER] {
        if let Some(id) = headers.get(name).and_then(|v| v.to_str().ok()) {
            if !id.is_empty() {
                return id.to_string();
            }
        }
    }

    Uuid::new_v4().to_string()
}

/// Adds security-related headers to all responses
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "referrer-policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    response
}
