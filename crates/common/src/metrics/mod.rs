//! Metrics and observability utilities
//!
//! Provides Prometheus-style counters with standardized naming
//! conventions for panel operations, store calls, and orphaned
//! resources.

use metrics::{counter, describe_counter, Unit};

/// Metrics prefix for all portal metrics
pub const METRICS_PREFIX: &str = "portal";

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_panel_operations_total", METRICS_PREFIX),
        Unit::Count,
        "Total panel operations by panel, operation and outcome"
    );

    describe_counter!(
        format!("{}_store_calls_total", METRICS_PREFIX),
        Unit::Count,
        "Total calls to the external store collaborators"
    );

    describe_counter!(
        format!("{}_orphan_resources_total", METRICS_PREFIX),
        Unit::Count,
        "Binaries whose metadata operation diverged, left unreconciled"
    );

    describe_counter!(
        format!("{}_placeholder_responses_total", METRICS_PREFIX),
        Unit::Count,
        "Public responses served from the built-in placeholder set"
    );
}

/// Record one panel operation outcome
pub fn record_panel_op(panel: &'static str, op: &'static str, outcome: &'static str) {
    counter!(
        format!("{}_panel_operations_total", METRICS_PREFIX),
        "panel" => panel,
        "op" => op,
        "outcome" => outcome,
    )
    .increment(1);
}

/// Record one orphaned binary
pub fn record_orphan(collection: &'static str) {
    counter!(
        format!("{}_orphan_resources_total", METRICS_PREFIX),
        "collection" => collection,
    )
    .increment(1);
}

/// Record one public response served from placeholder data
pub fn record_placeholder(collection: &'static str) {
    counter!(
        format!("{}_placeholder_responses_total", METRICS_PREFIX),
        "collection" => collection,
    )
    .increment(1);
}
