//! Trend Refresh Background Job
//!
//! Runs the trend aggregation on a schedule (daily by default), once per
//! period per cycle. A per-period store lock makes an overlapping run from
//! another instance skip its cycle; a run never mutates earlier snapshots
//! and readers pick the newest calculation_date, so even a skipped lock
//! cannot corrupt a read.
//!
//! Aggregate failures inside a run are partial by design: the remaining
//! aggregates still commit, and the failure shows up in logs and metrics.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;

use crate::metrics::trend_refresh as metrics;
use crate::models::TrendPeriod;
use crate::services::TrendAggregator;

const PERIODS: [TrendPeriod; 2] = [TrendPeriod::Weekly, TrendPeriod::Monthly];

pub async fn start_trend_refresh(aggregator: Arc<TrendAggregator>, interval: Duration) {
    tracing::info!(
        interval_secs = interval.as_secs(),
        "Starting trend refresh background job"
    );

    loop {
        sleep(interval).await;

        for period in PERIODS {
            let run_start = Instant::now();

            match aggregator.run(period, chrono::Utc::now()).await {
                Ok(None) => {
                    metrics::record_run(period.as_str(), "skipped");
                    tracing::info!(
                        period = %period,
                        "Trend refresh skipped, another run in progress"
                    );
                }
                Ok(Some(report)) => {
                    metrics::set_lists_aggregated(period.as_str(), report.lists_seen as i64);
                    for aggregate in report.failed_aggregates() {
                        metrics::record_aggregate_failure(period.as_str(), aggregate);
                    }

                    if report.is_partial_failure() {
                        metrics::record_run(period.as_str(), "partial");
                        tracing::warn!(
                            period = %period,
                            failed = ?report.failed_aggregates(),
                            lists = report.lists_seen,
                            "Trend refresh completed with partial failures"
                        );
                    } else {
                        metrics::record_run(period.as_str(), "success");
                        tracing::info!(
                            period = %period,
                            lists = report.lists_seen,
                            duration_ms = run_start.elapsed().as_millis(),
                            "Trend refresh completed"
                        );
                    }
                }
                Err(e) => {
                    metrics::record_run(period.as_str(), "error");
                    tracing::error!(
                        period = %period,
                        error = %e,
                        "Trend refresh failed before aggregation"
                    );
                }
            }

            metrics::record_duration(period.as_str(), run_start.elapsed());
        }
    }
}
