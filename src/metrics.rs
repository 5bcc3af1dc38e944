/// Metrics and telemetry for the catalog gateway
///
/// Provides Prometheus-compatible metrics for monitoring:
/// - HTTP request counts and latencies
/// - Image uploads, deletions and transforms
/// - Catalog upstream calls
/// - Errors by kind

use axum::{
    extract::{MatchedPath, Request},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder,
    HistogramVec, IntCounter, IntCounterVec, TextEncoder,
};
use std::time::Instant;

lazy_static! {
    // ========== HTTP Metrics ==========

    /// Total HTTP requests by method, route, and status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .expect("http_requests_total registers once");

    /// HTTP request duration in seconds
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request latencies in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("http_request_duration_seconds registers once");

    // ========== Image Metrics ==========

    /// Images written by upload endpoint field (`image`, `images`)
    pub static ref IMAGES_UPLOADED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "images_uploaded_total",
        "Total number of images stored",
        &["field"]
    )
    .expect("images_uploaded_total registers once");

    /// Bytes written by uploads
    pub static ref IMAGE_UPLOAD_BYTES_TOTAL: IntCounter = register_int_counter!(
        "image_upload_bytes_total",
        "Total bytes of uploaded images"
    )
    .expect("image_upload_bytes_total registers once");

    /// Images deleted through the registry
    pub static ref IMAGES_DELETED_TOTAL: IntCounter = register_int_counter!(
        "images_deleted_total",
        "Total number of images deleted"
    )
    .expect("images_deleted_total registers once");

    /// Transform runs by output format and outcome
    pub static ref IMAGES_PROCESSED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "images_processed_total",
        "Total number of image transforms",
        &["format", "status"]
    )
    .expect("images_processed_total registers once");

    // ========== Catalog Metrics ==========

    /// Catalog upstream calls by method and upstream status (or "error")
    pub static ref CATALOG_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "catalog_requests_total",
        "Total number of requests relayed to the catalog upstream",
        &["method", "status"]
    )
    .expect("catalog_requests_total registers once");

    // ========== Error Metrics ==========

    /// Errors returned to clients by kind
    pub static ref ERRORS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "errors_total",
        "Total number of error responses",
        &["error_type"]
    )
    .expect("errors_total registers once");
}

/// Render all metrics in Prometheus text format
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// `GET /metrics` handler
pub async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        render_metrics(),
    )
}

/// Middleware recording request count and latency per matched route
pub async fn track_http(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    // Route template keeps label cardinality bounded
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "fallback".to_string());

    let response = next.run(req).await;

    record_http_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );

    response
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration);
}

/// Record a stored upload
pub fn record_image_upload(field: &str, bytes: u64) {
    IMAGES_UPLOADED_TOTAL.with_label_values(&[field]).inc();
    IMAGE_UPLOAD_BYTES_TOTAL.inc_by(bytes);
}

/// Record a deletion
pub fn record_image_delete() {
    IMAGES_DELETED_TOTAL.inc();
}

/// Record a transform
pub fn record_image_processed(format: &str, status: &str) {
    IMAGES_PROCESSED_TOTAL
        .with_label_values(&[format, status])
        .inc();
}

/// Record a catalog relay
pub fn record_catalog_request(method: &str, status: &str) {
    CATALOG_REQUESTS_TOTAL
        .with_label_values(&[method, status])
        .inc();
}

/// Record an error
pub fn record_error(error_type: &str) {
    ERRORS_TOTAL.with_label_values(&[error_type]).inc();
}
