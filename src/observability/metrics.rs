//! Metrics collection.
//!
//! # Metrics
//! - `chain_api_requests_total` (counter): outbound calls by method, outcome, host
//! - `chain_api_request_duration_seconds` (histogram): outbound call latency
//! - `chain_api_retries_total` (counter): retried attempts by method
//! - `account_sync_total` (counter): syncs by family and outcome
//! - `account_sync_duration_seconds` (histogram): sync latency by family
//! - `broadcast_total` (counter): broadcasts by family and outcome
//!
//! Recording goes through the `metrics` facade; the embedding host decides
//! whether an exporter is installed. Without one every call is a no-op.

use std::time::Instant;

/// Record a finished outbound request.
pub fn record_request(method: &str, outcome: &str, host: &str, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("outcome", outcome.to_string()),
        ("host", host.to_string()),
    ];
    metrics::counter!("chain_api_requests_total", &labels).increment(1);
    metrics::histogram!("chain_api_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

/// Record a retried attempt.
pub fn record_retry(method: &str) {
    metrics::counter!("chain_api_retries_total", "method" => method.to_string()).increment(1);
}

/// Record a completed account sync.
pub fn record_sync(family: &str, outcome: &str, start: Instant) {
    metrics::counter!(
        "account_sync_total",
        "family" => family.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
    metrics::histogram!("account_sync_duration_seconds", "family" => family.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record a broadcast attempt.
pub fn record_broadcast(family: &str, outcome: &str) {
    metrics::counter!(
        "broadcast_total",
        "family" => family.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}
