//! Fetch metrics.
//!
//! Recorded through the global `metrics` recorder; install one with
//! [`composable_fetch_runtime::metrics::MetricsServer`] and call
//! [`describe_fetch_metrics`] to get help text in the scrape output.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

/// Register descriptions for every fetch metric.
pub fn describe_fetch_metrics() {
    describe_counter!(
        "fetch_activations_total",
        "Fetch activations started because the inputs changed"
    );
    describe_counter!(
        "fetch_completions_total",
        "Fetch activations that dispatched an outcome, labelled by outcome"
    );
    describe_counter!(
        "fetch_stale_suppressed_total",
        "Outcomes of superseded activations that were dropped"
    );
    describe_histogram!(
        "fetch_request_duration_seconds",
        "Time from activation to dispatched outcome"
    );
}

pub(crate) struct FetchMetrics;

impl FetchMetrics {
    pub(crate) fn record_activation() {
        counter!("fetch_activations_total").increment(1);
    }

    pub(crate) fn record_completion(outcome: &'static str, duration: Duration) {
        counter!("fetch_completions_total", "outcome" => outcome).increment(1);
        histogram!("fetch_request_duration_seconds").record(duration.as_secs_f64());
    }

    pub(crate) fn record_stale_suppressed() {
        counter!("fetch_stale_suppressed_total").increment(1);
    }
}
