//! Logging middleware
//!
//! One structured line per request, plus the layer that stamps the request
//! path onto error envelopes.

use std::time::Instant;

use axum::body::Body;
use axum::extract::Request;
use axum::http::header::CONTENT_LENGTH;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{error, info, warn};

use crate::utils::errors::ErrorBody;

/// Log method, path, status and latency for every request
pub async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status();
    let latency_ms = started.elapsed().as_millis() as u64;

    if status.is_server_error() {
        warn!(method = %method, path = %path, status = status.as_u16(), latency_ms = latency_ms, "Request completed");
    } else {
        info!(method = %method, path = %path, status = status.as_u16(), latency_ms = latency_ms, "Request completed");
    }

    response
}

/// Fill the `path` field of error responses produced by `AscesaError`
pub async fn error_path(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let mut response = next.run(req).await;

    let Some(mut body) = response.extensions_mut().remove::<ErrorBody>() else {
        return response;
    };
    body.path = Some(path);

    match serde_json::to_vec(&body) {
        Ok(bytes) => {
            response.headers_mut().remove(CONTENT_LENGTH);
            *response.body_mut() = Body::from(bytes);
        }
        Err(e) => {
            error!(error = %e, "Failed to serialize error body");
        }
    }

    response
}
