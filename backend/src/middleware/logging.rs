use axum::{
    body::{to_bytes, Body, Bytes},
    http::{header::CONTENT_LENGTH, Request, StatusCode},
    middleware::Next,
    response::Response,
    Error as AxumError,
};
use std::time::Instant;

use crate::middleware::request_id::RequestId;

const MAX_BUFFERED_BODY_BYTES: usize = 64 * 1024;
const MAX_LOGGED_BODY_BYTES: usize = 2048;

/// What gets logged for a failed request.
struct FailedRequest {
    status: StatusCode,
    method: String,
    uri: String,
    request_id: Option<String>,
    latency_ms: u64,
}

impl FailedRequest {
    fn log(&self, body_preview: &str) {
        let request_id = self.request_id.as_deref().unwrap_or("-");
        if self.status.is_server_error() {
            tracing::error!(
                status = self.status.as_u16(),
                method = %self.method,
                uri = %self.uri,
                request_id,
                latency_ms = self.latency_ms,
                body = body_preview,
                "Request failed"
            );
        } else {
            tracing::warn!(
                status = self.status.as_u16(),
                method = %self.method,
                uri = %self.uri,
                request_id,
                latency_ms = self.latency_ms,
                body = body_preview,
                "Request rejected"
            );
        }
    }

    fn log_unreadable(&self, err: &AxumError) {
        tracing::warn!(
            status = self.status.as_u16(),
            method = %self.method,
            uri = %self.uri,
            error = ?err,
            "Failed to read error response body"
        );
    }
}

/// Logs 4xx/5xx responses together with a preview of the error body.
///
/// Redirects and successful pages pass through untouched.
pub async fn log_error_responses(req: Request<Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let uri = req.uri().to_string();
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone());
    let start = Instant::now();

    let response = next.run(req).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let failed = FailedRequest {
        status,
        method,
        uri,
        request_id,
        latency_ms: start.elapsed().as_millis() as u64,
    };
    let (mut parts, body) = response.into_parts();
    match buffer_body(body).await {
        Ok((bytes, preview)) => {
            failed.log(&preview);
            Response::from_parts(parts, Body::from(bytes))
        }
        Err(err) => {
            failed.log_unreadable(&err);
            parts.headers.remove(CONTENT_LENGTH);
            Response::from_parts(parts, Body::empty())
        }
    }
}

async fn buffer_body(body: Body) -> Result<(Bytes, String), AxumError> {
    let bytes = to_bytes(body, MAX_BUFFERED_BODY_BYTES).await?;
    Ok((bytes.clone(), preview(&bytes)))
}

fn preview(bytes: &Bytes) -> String {
    if bytes.len() <= MAX_LOGGED_BODY_BYTES {
        return String::from_utf8_lossy(bytes).into_owned();
    }
    format!(
        "{}... (truncated, {} bytes total)",
        String::from_utf8_lossy(&bytes[..MAX_LOGGED_BODY_BYTES]),
        bytes.len()
    )
}
