//! Prometheus metrics for the Accord server.
//!
//! Tracks script compilation, stub traffic and wire-test outcomes.
use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge, register_histogram_vec, CounterVec, Encoder, Gauge,
    HistogramVec, TextEncoder,
};

lazy_static! {
    /// Contract script compilations
    pub static ref SCRIPT_COMPILATIONS_TOTAL: CounterVec = register_counter_vec!(
        "accord_script_compilations_total",
        "Total number of contract scripts compiled",
        &["result"]  // result: ok|error
    )
    .unwrap();

    /// Requests served by wirestubs
    pub static ref STUB_REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "accord_stub_requests_total",
        "Total number of requests received by wirestubs",
        &["outcome"]  // outcome: matched|unmatched|error
    )
    .unwrap();

    /// Running wirestubs
    pub static ref WIRESTUBS_ACTIVE: Gauge = register_gauge!(
        "accord_wirestubs_active",
        "Number of wirestub listeners currently running"
    )
    .unwrap();

    /// Wire-test requests sent to servers under test
    pub static ref WIRETEST_REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "accord_wiretest_requests_total",
        "Total number of contract requests replayed against servers",
        &["outcome"]  // outcome: passed|failed
    )
    .unwrap();

    /// Wire-test request latency
    pub static ref WIRETEST_DURATION_MS: HistogramVec = register_histogram_vec!(
        "accord_wiretest_duration_ms",
        "Round-trip time of replayed contract requests in milliseconds",
        &["outcome"],
        vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0]
    )
    .unwrap();
}

/// Collect and return all metrics in Prometheus text format
pub fn collect_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

pub fn record_compilation(result: &str) {
    SCRIPT_COMPILATIONS_TOTAL.with_label_values(&[result]).inc();
}

pub fn record_stub_request(outcome: &str) {
    STUB_REQUESTS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn wirestub_started() {
    WIRESTUBS_ACTIVE.inc();
}

pub fn wirestub_stopped() {
    WIRESTUBS_ACTIVE.dec();
}

/// Helper to record one replayed contract request
pub fn record_wiretest_request(outcome: &str, duration_ms: f64) {
    WIRETEST_REQUESTS_TOTAL.with_label_values(&[outcome]).inc();
    WIRETEST_DURATION_MS
        .with_label_values(&[outcome])
        .observe(duration_ms);
}
