//! HTTP request metrics exported in Prometheus text format.

use axum::extract::{MatchedPath, Request};
use axum::http::header::CONTENT_TYPE;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use metrics::Label;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;
use tracing::{info, warn};

pub const REQUESTS_TOTAL: &str = "http_requests_total";
pub const REQUEST_DURATION: &str = "http_request_duration_seconds";

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the global recorder once and returns the render handle.
pub fn init_metrics() -> &'static PrometheusHandle {
    HANDLE.get_or_init(|| {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        match metrics::set_global_recorder(recorder) {
            Ok(()) => info!("Prometheus recorder installed"),
            Err(e) => warn!("Failed to install Prometheus recorder: {}", e),
        }
        metrics::describe_counter!(REQUESTS_TOTAL, "HTTP requests handled, by method, route and status");
        metrics::describe_histogram!(REQUEST_DURATION, "HTTP request latency in seconds");
        handle
    })
}

/// Records one counter increment and one latency sample per request.
pub async fn track_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    let labels = vec![
        Label::new("method", method),
        Label::new("route", route),
        Label::new("status", status),
    ];
    metrics::counter!(REQUESTS_TOTAL, labels.clone()).increment(1);
    metrics::histogram!(REQUEST_DURATION, labels).record(start.elapsed().as_secs_f64());
    response
}

pub async fn prometheus() -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        init_metrics().render(),
    )
}
