//! Prometheus metrics for relay-service.
//!
//! Provides HTTP and upstream chat-completion metrics for observability.

use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

// HTTP metrics
pub static HTTP_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static HTTP_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();

// Upstream metrics
pub static UPSTREAM_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static UPSTREAM_LATENCY_SECONDS: OnceLock<HistogramVec> = OnceLock::new();

/// Initialize all metrics. Must be called once at startup.
pub fn init_metrics() {
    if REGISTRY.get().is_some() {
        return;
    }

    let registry = Registry::new();

    let http_requests_total = IntCounterVec::new(
        Opts::new("relay_http_requests_total", "Total number of HTTP requests"),
        &["method", "path", "status"],
    )
    .expect("Failed to create relay_http_requests_total metric");

    let http_request_duration = HistogramVec::new(
        HistogramOpts::new(
            "relay_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["method", "path"],
    )
    .expect("Failed to create relay_http_request_duration_seconds metric");

    // outcome: ok, not_configured, unavailable, upstream_error, invalid_response
    let upstream_requests = IntCounterVec::new(
        Opts::new(
            "relay_upstream_requests_total",
            "Total chat-completion calls by outcome",
        ),
        &["operation", "outcome"],
    )
    .expect("Failed to create relay_upstream_requests_total metric");

    let upstream_latency = HistogramVec::new(
        HistogramOpts::new(
            "relay_upstream_latency_seconds",
            "Chat-completion API latency in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]),
        &["operation", "model"],
    )
    .expect("Failed to create relay_upstream_latency_seconds metric");

    registry
        .register(Box::new(http_requests_total.clone()))
        .expect("Failed to register relay_http_requests_total");
    registry
        .register(Box::new(http_request_duration.clone()))
        .expect("Failed to register relay_http_request_duration_seconds");
    registry
        .register(Box::new(upstream_requests.clone()))
        .expect("Failed to register relay_upstream_requests_total");
    registry
        .register(Box::new(upstream_latency.clone()))
        .expect("Failed to register relay_upstream_latency_seconds");

    let _ = REGISTRY.set(registry);
    let _ = HTTP_REQUESTS_TOTAL.set(http_requests_total);
    let _ = HTTP_REQUEST_DURATION_SECONDS.set(http_request_duration);
    let _ = UPSTREAM_REQUESTS_TOTAL.set(upstream_requests);
    let _ = UPSTREAM_LATENCY_SECONDS.set(upstream_latency);

    tracing::info!("Prometheus metrics initialized");
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match REGISTRY.get() {
        Some(r) => r,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    let metric_families = registry.gather();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return format!("# Failed to encode metrics: {}\n", e);
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to convert metrics to UTF-8");
            format!("# Failed to convert metrics to UTF-8: {}\n", e)
        }
    }
}

/// Record a completed HTTP request.
pub fn record_http_request(method: &str, path: &str, status: &str, duration_secs: f64) {
    if let Some(counter) = HTTP_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[method, path, status]).inc();
    }
    if let Some(histogram) = HTTP_REQUEST_DURATION_SECONDS.get() {
        histogram
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }
}

/// Record the outcome of one chat-completion call.
pub fn record_upstream_request(operation: &str, outcome: &str) {
    if let Some(counter) = UPSTREAM_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[operation, outcome]).inc();
    }
}

/// Record chat-completion latency.
pub fn record_upstream_latency(operation: &str, model: &str, duration_secs: f64) {
    if let Some(histogram) = UPSTREAM_LATENCY_SECONDS.get() {
        histogram
            .with_label_values(&[operation, model])
            .observe(duration_secs);
    }
}
