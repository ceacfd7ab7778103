use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all service metrics
const PREFIX: &str = "audio_fetch";

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0, 120.0, 600.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Conversion Metrics
    pub static ref CONVERSIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_conversions_total"), "Conversion attempts by input kind and outcome"),
        &["kind", "outcome"]
    ).expect("Failed to create conversions_total metric");

    pub static ref CONVERSION_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_conversion_duration_seconds"),
            "Wall-clock time of a single conversion attempt"
        )
        .buckets(vec![0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        &["kind"]
    ).expect("Failed to create conversion_duration_seconds metric");

    // Reaper Metrics
    pub static ref ARTIFACTS_REAPED_TOTAL: Counter = Counter::new(
        format!("{PREFIX}_artifacts_reaped_total"),
        "Artifacts deleted after exceeding their time to live"
    ).expect("Failed to create artifacts_reaped_total metric");

    pub static ref REAPER_ERRORS_TOTAL: Counter = Counter::new(
        format!("{PREFIX}_reaper_errors_total"),
        "Artifacts the reaper failed to inspect or delete"
    ).expect("Failed to create reaper_errors_total metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Ignore errors if already registered (for tests)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(CONVERSIONS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(CONVERSION_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(ARTIFACTS_REAPED_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(REAPER_ERRORS_TOTAL.clone()));

    tracing::info!("Metrics system initialized successfully");
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

/// Record a finished conversion attempt. `outcome` is `success` or a failure kind.
pub fn record_conversion(kind: &str, outcome: &str, duration: Duration) {
    CONVERSIONS_TOTAL.with_label_values(&[kind, outcome]).inc();

    CONVERSION_DURATION_SECONDS
        .with_label_values(&[kind])
        .observe(duration.as_secs_f64());
}

/// Record the result of one reaper sweep
pub fn record_sweep(deleted: usize, errors: usize) {
    ARTIFACTS_REAPED_TOTAL.inc_by(deleted as f64);
    REAPER_ERRORS_TOTAL.inc_by(errors as f64);
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_default();
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
