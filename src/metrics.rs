// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for vmzone
//!
//! - HTTP request metrics (count, duration, status codes)
//! - Zone update metrics (changed, unchanged, rejected)
//! - Zone file write results
//! - Current SOA serial and record count

use lazy_static::lazy_static;
use prometheus::{
    opts, register_counter_vec, register_gauge, register_histogram_vec, CounterVec, Encoder, Gauge,
    HistogramVec, TextEncoder,
};

lazy_static! {
    /// HTTP request counter by method, route, and status code
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        opts!(
            "vmzone_http_requests_total",
            "Total number of HTTP requests processed"
        ),
        &["method", "route", "status"]
    )
    .expect("Failed to create HTTP_REQUESTS_TOTAL metric");

    /// HTTP request duration histogram
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "vmzone_http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "route"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
    )
    .expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric");

    /// Zone update counter by operation and result
    pub static ref ZONE_UPDATES_TOTAL: CounterVec = register_counter_vec!(
        opts!(
            "vmzone_zone_updates_total",
            "Total number of VM zone updates"
        ),
        &["operation", "result"]
    )
    .expect("Failed to create ZONE_UPDATES_TOTAL metric");

    /// Zone file write counter by result
    pub static ref ZONE_WRITES_TOTAL: CounterVec = register_counter_vec!(
        opts!(
            "vmzone_zone_writes_total",
            "Total number of zone file writes"
        ),
        &["result"]
    )
    .expect("Failed to create ZONE_WRITES_TOTAL metric");

    /// Current SOA serial
    pub static ref ZONE_SERIAL: Gauge = register_gauge!(
        opts!(
            "vmzone_zone_serial",
            "Current SOA serial of the VM zone"
        )
    )
    .expect("Failed to create ZONE_SERIAL metric");

    /// Current number of A records
    pub static ref ZONE_RECORDS: Gauge = register_gauge!(
        opts!(
            "vmzone_zone_records",
            "Number of A records in the VM zone"
        )
    )
    .expect("Failed to create ZONE_RECORDS metric");

    /// Application info metric
    pub static ref APP_INFO: CounterVec = register_counter_vec!(
        opts!(
            "vmzone_app_info",
            "Application information"
        ),
        &["version"]
    )
    .expect("Failed to create APP_INFO metric");
}

/// Initialize metrics with application info
pub fn init_metrics() {
    APP_INFO
        .with_label_values(&[env!("CARGO_PKG_VERSION")])
        .inc();
}

/// Generate metrics output in Prometheus format
pub fn gather_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Record an HTTP request
pub fn record_http_request(method: &str, route: &str, status: u16, duration: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, route, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, route])
        .observe(duration);
}

/// Record a zone update
///
/// `result` is one of `changed`, `unchanged` or `error`.
pub fn record_zone_update(operation: &str, result: &str) {
    ZONE_UPDATES_TOTAL
        .with_label_values(&[operation, result])
        .inc();
}

/// Record a zone file write
pub fn record_zone_write(success: bool) {
    let result = if success { "success" } else { "error" };
    ZONE_WRITES_TOTAL.with_label_values(&[result]).inc();
}

/// Publish the current serial and record count
pub fn update_zone_state(serial: u64, records: usize) {
    ZONE_SERIAL.set(serial as f64);
    ZONE_RECORDS.set(records as f64);
}
