// src/logging_middleware.rs
//! Middleware for logging request and response bodies in debug mode

use axum::body::{to_bytes, Bytes};
use axum::{body::Body, extract::Request, http::StatusCode, middleware::Next, response::Response};
use tracing::debug;

/// Bodies above this size are passed through unlogged; base64 image payloads
/// and served media files would otherwise flood the debug log.
const MAX_LOGGED_BODY: usize = 16 * 1024;

/// Middleware to log request and response bodies in debug mode
pub async fn log_request_response(request: Request, next: Next) -> Result<Response, StatusCode> {
    let (parts, body) = request.into_parts();

    // Read request body
    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if let Some(body_str) = loggable_body(&bytes) {
        debug!(
            method = %parts.method,
            uri = %parts.uri,
            request_body = %pretty_json(body_str),
            "📥 Request"
        );
    }

    // Reconstruct request
    let request = Request::from_parts(parts, Body::from(bytes));

    // Call next middleware/handler
    let response = next.run(request).await;

    // Read response body
    let (parts, body) = response.into_parts();
    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if let Some(body_str) = loggable_body(&bytes) {
        debug!(
            status = %parts.status,
            response_body = %pretty_json(body_str),
            "📤 Response"
        );
    }

    // Reconstruct response
    let response = Response::from_parts(parts, Body::from(bytes));

    Ok(response)
}

/// Small UTF-8 bodies only; binary and oversized payloads are skipped.
fn loggable_body(bytes: &Bytes) -> Option<&str> {
    if bytes.is_empty() || bytes.len() > MAX_LOGGED_BODY {
        return None;
    }
    std::str::from_utf8(bytes).ok()
}

/// Pretty-print when the body parses as JSON, otherwise log it verbatim.
fn pretty_json(body_str: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body_str) {
        Ok(json) => serde_json::to_string_pretty(&json).unwrap_or_else(|_| body_str.to_string()),
        Err(_) => body_str.to_string(),
    }
}
