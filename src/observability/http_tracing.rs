//! # HTTP Request Tracing Middleware
//!
//! Axum middleware that wraps each request in a tracing span and records
//! request counters and latency histograms for Prometheus.

use axum::{extract::Request, middleware::Next, response::Response};
use metrics::{counter, histogram};
use std::time::Instant;
use tracing::Instrument;

/// Axum middleware that creates a tracing span for each HTTP request.
///
/// The span carries the method, path, and a generated request id; the
/// response status is recorded once the handler completes, along with
/// Prometheus request metrics.
pub async fn trace_http_requests(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let span = tracing::info_span!(
        "http_request",
        method = %method,
        path = %path,
        request_id = %uuid::Uuid::new_v4(),
        status = tracing::field::Empty,
    );

    let response = async move { next.run(request).await }.instrument(span.clone()).await;

    let status_code = response.status().as_u16();
    let elapsed = start.elapsed();
    span.record("status", status_code);

    if status_code >= 500 {
        tracing::warn!(
            parent: &span,
            status = status_code,
            elapsed_ms = elapsed.as_millis() as u64,
            "Request completed with server error"
        );
    } else {
        tracing::debug!(
            parent: &span,
            status = status_code,
            elapsed_ms = elapsed.as_millis() as u64,
            "Request completed"
        );
    }

    let labels = [
        ("method", method),
        ("path", normalize_path_for_metrics(&path)),
        ("status", status_code.to_string()),
    ];
    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels[..2]).record(elapsed.as_secs_f64());

    response
}

/// Normalize path for metrics to avoid high cardinality.
///
/// Replaces UUID and numeric path segments with `:id` so dynamic routes do not
/// explode the Prometheus label space.
fn normalize_path_for_metrics(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            let is_uuid = segment.len() == 36
                && segment.chars().all(|c| c.is_ascii_hexdigit() || c == '-');
            let is_numeric = !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit());
            if is_uuid || is_numeric {
                ":id"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
