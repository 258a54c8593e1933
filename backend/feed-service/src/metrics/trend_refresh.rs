//! Trend Refresh Metrics
//!
//! Prometheus metrics for the trend aggregation background job

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge_vec, HistogramVec,
    IntCounterVec, IntGaugeVec,
};
use std::time::Duration;

static REFRESH_RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "trend_refresh_runs_total",
        "Total trend refresh runs per period (success/partial/skipped/error)",
        &["period", "status"]
    )
    .expect("Failed to register trend refresh runs metric")
});

static REFRESH_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "trend_refresh_duration_seconds",
        "Duration of trend refresh runs",
        &["period"],
        vec![0.01, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 300.0]
    )
    .expect("Failed to register trend refresh duration metric")
});

static LISTS_AGGREGATED: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "trend_refresh_lists_aggregated",
        "Published lists read by the last refresh run",
        &["period"]
    )
    .expect("Failed to register trend refresh lists metric")
});

static AGGREGATE_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "trend_refresh_aggregate_failures_total",
        "Individual aggregate failures (subjects/tags/items)",
        &["period", "aggregate"]
    )
    .expect("Failed to register trend refresh aggregate failures metric")
});

/// Record a refresh run result (success/partial/skipped/error)
pub fn record_run(period: &str, status: &str) {
    REFRESH_RUNS_TOTAL.with_label_values(&[period, status]).inc();
}

/// Record run duration for a period
pub fn record_duration(period: &str, duration: Duration) {
    REFRESH_DURATION_SECONDS
        .with_label_values(&[period])
        .observe(duration.as_secs_f64());
}

/// Set lists read by the current run
pub fn set_lists_aggregated(period: &str, count: i64) {
    LISTS_AGGREGATED.with_label_values(&[period]).set(count);
}

/// Record one failed aggregate within a run
pub fn record_aggregate_failure(period: &str, aggregate: &str) {
    AGGREGATE_FAILURES_TOTAL
        .with_label_values(&[period, aggregate])
        .inc();
}
