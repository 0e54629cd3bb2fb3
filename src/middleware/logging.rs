use axum::{
    body::{to_bytes, Body, HttpBody},
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Instant;

const MAX_BODY_BYTES: usize = 1024 * 1024;
const MAX_LOGGED_CHARS: usize = 2000;

/// Middleware that logs request and response bodies, tagged with the
/// `x-request-id` set by the request-id layer.
///
/// Only bodies with a known size under `MAX_BODY_BYTES` are buffered; larger
/// or streaming bodies pass through untouched and unlogged.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let request = if bufferable(request.body()) {
        let (parts, body) = request.into_parts();
        let bytes = match to_bytes(body, MAX_BODY_BYTES).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(request_id = %request_id, "Failed to read request body: {}", e);
                return (StatusCode::BAD_REQUEST, "Failed to read request body").into_response();
            }
        };

        tracing::info!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            body = %truncate_body(&String::from_utf8_lossy(&bytes), MAX_LOGGED_CHARS),
            "→ Request"
        );

        Request::from_parts(parts, Body::from(bytes))
    } else {
        tracing::info!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            body = %unlogged(request.body()),
            "→ Request"
        );
        request
    };

    let response = next.run(request).await;
    let status = response.status();

    if !bufferable(response.body()) {
        tracing::info!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            latency_ms = %start.elapsed().as_millis(),
            body = %unlogged(response.body()),
            "← Response"
        );
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(request_id = %request_id, "Failed to read response body: {}", e);
            return (StatusCode::BAD_GATEWAY, "Failed to read response body").into_response();
        }
    };

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %status.as_u16(),
        latency_ms = %start.elapsed().as_millis(),
        body = %truncate_body(&String::from_utf8_lossy(&bytes), MAX_LOGGED_CHARS),
        "← Response"
    );

    Response::from_parts(parts, Body::from(bytes))
}

fn bufferable(body: &Body) -> bool {
    body.size_hint()
        .upper()
        .is_some_and(|len| len <= MAX_BODY_BYTES as u64)
}

fn unlogged(body: &Body) -> String {
    match body.size_hint().exact() {
        Some(len) => format!("[not logged, {} bytes]", len),
        None => "[not logged, streaming]".to_string(),
    }
}

/// Truncate body for logging on a char boundary, noting the original size
fn truncate_body(body: &str, max_chars: usize) -> String {
    let body = body.trim();
    match body.char_indices().nth(max_chars) {
        None => body.to_string(),
        Some((cut, _)) => format!(
            "{}...[truncated, {} bytes total]",
            &body[..cut],
            body.len()
        ),
    }
}
