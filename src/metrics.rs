//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("socialhub_http_requests_total", "Total number of HTTP requests"),
        &["method", "endpoint", "status"]
    ).expect("metric can be created");
    pub static ref HTTP_REQUEST_DURATION_SECONDS: prometheus::HistogramVec = prometheus::HistogramVec::new(
        HistogramOpts::new(
            "socialhub_http_request_duration_seconds",
            "HTTP request duration in seconds"
        ).buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["method", "endpoint"]
    ).expect("metric can be created");

    // Interaction Metrics
    pub static ref REGISTRATIONS_TOTAL: IntCounter = IntCounter::new(
        "socialhub_registrations_total",
        "Total number of user registrations"
    ).expect("metric can be created");
    pub static ref FOLLOWS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("socialhub_follows_total", "Follow graph mutations"),
        &["action"]
    ).expect("metric can be created");
    pub static ref LIKES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("socialhub_likes_total", "Like requests by outcome"),
        &["outcome"]
    ).expect("metric can be created");
    pub static ref NOTIFICATIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("socialhub_notifications_total", "Notifications emitted"),
        &["verb"]
    ).expect("metric can be created");
    pub static ref POSTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("socialhub_posts_total", "Post lifecycle events"),
        &["action"]
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("socialhub_errors_total", "Total number of error responses"),
        &["error_type"]
    ).expect("metric can be created");
}

/// Initialize metrics registry.
///
/// Must be called once at startup; instruments still count when
/// unregistered, they are just not exported.
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .expect("HTTP_REQUESTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))
        .expect("HTTP_REQUEST_DURATION_SECONDS can be registered");
    REGISTRY
        .register(Box::new(REGISTRATIONS_TOTAL.clone()))
        .expect("REGISTRATIONS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(FOLLOWS_TOTAL.clone()))
        .expect("FOLLOWS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(LIKES_TOTAL.clone()))
        .expect("LIKES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(NOTIFICATIONS_TOTAL.clone()))
        .expect("NOTIFICATIONS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(POSTS_TOTAL.clone()))
        .expect("POSTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(ERRORS_TOTAL.clone()))
        .expect("ERRORS_TOTAL can be registered");

    tracing::info!("Metrics registry initialized");
}
