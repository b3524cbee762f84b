// core/src/metrics.rs
//! Prometheus-tellere for beregning og spørringer (default-registeret).

use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

use crate::types::MetricKind;

pub static BEST_AVERAGES_COMPUTED: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "powercurve_best_averages_computed_total",
        "Number of best-average sets computed and persisted",
        &["metric"]
    )
    .expect("Failed to register powercurve_best_averages_computed_total metric")
});

pub static ACTIVITIES_SKIPPED: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "powercurve_activities_skipped_total",
        "Number of activities skipped during recompute",
        &["metric", "reason"]
    )
    .expect("Failed to register powercurve_activities_skipped_total metric")
});

pub static RECOMPUTE_BATCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "powercurve_recompute_batches_total",
        "Number of recompute batches processed",
        &["mode"]
    )
    .expect("Failed to register powercurve_recompute_batches_total metric")
});

pub static CURVE_QUERIES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "powercurve_curve_queries_total",
        "Number of best-curve aggregations",
        &["metric"]
    )
    .expect("Failed to register powercurve_curve_queries_total metric")
});

pub fn record_computed(metric: MetricKind) {
    BEST_AVERAGES_COMPUTED
        .with_label_values(&[metric.as_str()])
        .inc();
}

pub fn record_skipped(metric: MetricKind, reason: &str) {
    ACTIVITIES_SKIPPED
        .with_label_values(&[metric.as_str(), reason])
        .inc();
}

pub fn record_batch(force: bool) {
    let mode = if force { "force" } else { "incremental" };
    RECOMPUTE_BATCHES.with_label_values(&[mode]).inc();
}

pub fn record_curve_query(metric: MetricKind) {
    CURVE_QUERIES.with_label_values(&[metric.as_str()]).inc();
}

/// Tekstformat for scraping. Tom streng hvis koding feiler.
pub fn gather_text() -> String {
    let encoder = TextEncoder::new();
    let families = prometheus::gather();
    let mut buf = Vec::new();
    if let Err(e) = encoder.encode(&families, &mut buf) {
        log::warn!("kunne ikke kode metrics: {e}");
        return String::new();
    }
    String::from_utf8(buf).unwrap_or_default()
}
