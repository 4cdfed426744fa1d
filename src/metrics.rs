//! Prometheus metrics for the record service.
//!
//! This module provides metrics for:
//! - Store load/save latency
//! - HTTP request latency per route
//! - Patient mutations (created, updated, deleted)
//! - Rejected requests by error kind

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::debug;

// === Metric Name Constants ===

/// Store load latency metric name.
pub const METRIC_STORE_LOAD_LATENCY: &str = "store_load_latency_ms";
/// Store save latency metric name.
pub const METRIC_STORE_SAVE_LATENCY: &str = "store_save_latency_ms";
/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";
/// Patients created counter metric name.
pub const METRIC_PATIENTS_CREATED: &str = "patients_created_total";
/// Patients updated counter metric name.
pub const METRIC_PATIENTS_UPDATED: &str = "patients_updated_total";
/// Patients deleted counter metric name.
pub const METRIC_PATIENTS_DELETED: &str = "patients_deleted_total";
/// Rejected requests counter metric name.
pub const METRIC_REQUESTS_REJECTED: &str = "requests_rejected_total";

/// Install the global Prometheus recorder and return its render handle.
pub fn install_prometheus() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Initialize all metric descriptions.
/// Call this once at startup, after the recorder is installed.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_STORE_LOAD_LATENCY,
        "Time to read and parse the patient file in milliseconds"
    );
    describe_histogram!(
        METRIC_STORE_SAVE_LATENCY,
        "Time to serialize and replace the patient file in milliseconds"
    );
    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "HTTP request latency in milliseconds"
    );

    describe_counter!(METRIC_PATIENTS_CREATED, "Total number of patients created");
    describe_counter!(METRIC_PATIENTS_UPDATED, "Total number of patients updated");
    describe_counter!(METRIC_PATIENTS_DELETED, "Total number of patients deleted");
    describe_counter!(
        METRIC_REQUESTS_REJECTED,
        "Total number of requests rejected, by error kind"
    );

    debug!("Metrics initialized");
}

/// Record HTTP request latency.
pub fn record_http_latency(start: Instant, endpoint: &str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_HTTP_REQUEST_LATENCY, "endpoint" => endpoint.to_string()).record(latency_ms);
}

/// Increment patients created counter.
pub fn inc_patients_created() {
    counter!(METRIC_PATIENTS_CREATED).increment(1);
}

/// Increment patients updated counter.
pub fn inc_patients_updated() {
    counter!(METRIC_PATIENTS_UPDATED).increment(1);
}

/// Increment patients deleted counter.
pub fn inc_patients_deleted() {
    counter!(METRIC_PATIENTS_DELETED).increment(1);
}

/// Increment rejected requests counter.
pub fn inc_requests_rejected(kind: &'static str) {
    counter!(METRIC_REQUESTS_REJECTED, "kind" => kind).increment(1);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric.
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        histogram!(self.metric_name).record(self.elapsed_ms());
    }
}

/// Create a latency timer for store loads.
pub fn timer_store_load() -> LatencyTimer {
    LatencyTimer::new(METRIC_STORE_LOAD_LATENCY)
}

/// Create a latency timer for store saves.
pub fn timer_store_save() -> LatencyTimer {
    LatencyTimer::new(METRIC_STORE_SAVE_LATENCY)
}
