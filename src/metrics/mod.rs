//! Prometheus metrics for monitoring
//!
//! Exposes metrics for:
//! - Transaction building and broadcast
//! - Batch confirmation outcomes and latency
//! - Decoded revert reasons
//!
//! Everything is registered in the default prometheus registry; embedders
//! serve [`gather`] from whatever endpoint they already run.

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram, register_int_counter, CounterVec, Encoder,
    Histogram, IntCounter, TextEncoder,
};
use std::time::Duration;

lazy_static! {
    // Transaction metrics
    pub static ref TX_BUILT: IntCounter = register_int_counter!(
        "tx_lifecycle_transactions_built_total",
        "Total transactions built and signed"
    ).unwrap();

    pub static ref TX_SUBMITTED: IntCounter = register_int_counter!(
        "tx_lifecycle_transactions_submitted_total",
        "Total transactions broadcast"
    ).unwrap();

    pub static ref TX_SUBMISSION_FAILED: IntCounter = register_int_counter!(
        "tx_lifecycle_transactions_submission_failed_total",
        "Total transactions rejected at broadcast"
    ).unwrap();

    // Confirmation metrics
    pub static ref TX_CONFIRMED: IntCounter = register_int_counter!(
        "tx_lifecycle_transactions_confirmed_total",
        "Total transactions confirmed by a pool"
    ).unwrap();

    pub static ref TX_CONFIRMATION_FAILED: CounterVec = register_counter_vec!(
        "tx_lifecycle_confirmation_failures_total",
        "Total confirmation failures by reason",
        &["reason"]
    ).unwrap();

    pub static ref TX_CONFIRMATION_LATENCY: Histogram = register_histogram!(
        "tx_lifecycle_confirmation_latency_seconds",
        "Time spent waiting for a single receipt",
        vec![0.5, 1.0, 2.5, 5.0, 10.0, 15.0, 30.0, 60.0, 120.0]
    ).unwrap();

    // Revert metrics
    pub static ref REVERTS_DECODED: CounterVec = register_counter_vec!(
        "tx_lifecycle_reverts_decoded_total",
        "Total reverts decoded by failure name",
        &["name"]
    ).unwrap();
}

/// Render every registered metric in the text exposition format
pub fn gather() -> prometheus::Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

// Helper functions to record metrics

pub fn record_tx_built() {
    TX_BUILT.inc();
}

pub fn record_tx_submitted() {
    TX_SUBMITTED.inc();
}

pub fn record_tx_submission_failed() {
    TX_SUBMISSION_FAILED.inc();
}

pub fn record_tx_confirmed(latency: Duration) {
    TX_CONFIRMED.inc();
    TX_CONFIRMATION_LATENCY.observe(latency.as_secs_f64());
}

pub fn record_tx_confirmation_failed(reason: &str) {
    TX_CONFIRMATION_FAILED.with_label_values(&[reason]).inc();
}

pub fn record_revert_decoded(name: &str) {
    REVERTS_DECODED.with_label_values(&[name]).inc();
}
