use axum::body::to_bytes;
use axum::body::Body;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::shared::format::format_number;

/// Logs every HTTP request: method, path, status, duration and response size.
///
/// The body is buffered to learn its real size, so streamed responses are
/// fully read before being handed on.
pub async fn request_logger(req: Request<Body>, next: Next) -> Response {
    let start = std::time::Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();

    let response = next.run(req).await;
    let (parts, body) = response.into_parts();

    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!(
                method = %method,
                path = uri.path(),
                status = parts.status.as_u16(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "response body could not be read: {}",
                e
            );
            return Response::from_parts(parts, Body::default());
        }
    };

    let elapsed_ms = start.elapsed().as_millis() as u64;
    let size = format_number(bytes.len());
    if parts.status.is_server_error() {
        tracing::warn!(method = %method, path = uri.path(), status = parts.status.as_u16(), elapsed_ms, size = %size, "request");
    } else {
        tracing::info!(method = %method, path = uri.path(), status = parts.status.as_u16(), elapsed_ms, size = %size, "request");
    }

    Response::from_parts(parts, Body::from(bytes))
}
