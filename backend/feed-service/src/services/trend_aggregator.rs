/// Trend Aggregator
///
/// Scheduled batch reduction of published ranking lists into immutable
/// per-period snapshots: subject counts, tag counts, and cross-list item
/// scores. A per-period store lock serializes runs, and each run writes a
/// fresh batch under its own calculation date that readers pick by maximum
/// calculation_date, so even a lock that fails open cannot corrupt a read.
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::db::TrendStore;
use crate::error::Result;
use crate::models::{ItemScore, RankingListRow, SubjectCount, TagCount, TrendPeriod};

/// Per-aggregate outcome: rows written, or why the aggregate failed.
pub type AggregateOutcome = std::result::Result<usize, String>;

/// Report for one period's run. The three aggregates are independent units
/// of work; one failing never aborts the siblings.
#[derive(Debug)]
pub struct TrendRunReport {
    pub period: TrendPeriod,
    pub calculated_at: DateTime<Utc>,
    pub lists_seen: usize,
    pub subjects: AggregateOutcome,
    pub tags: AggregateOutcome,
    pub items: AggregateOutcome,
}

impl TrendRunReport {
    pub fn failed_aggregates(&self) -> Vec<&'static str> {
        let mut failed = Vec::new();
        if self.subjects.is_err() {
            failed.push("subjects");
        }
        if self.tags.is_err() {
            failed.push("tags");
        }
        if self.items.is_err() {
            failed.push("items");
        }
        failed
    }

    pub fn is_partial_failure(&self) -> bool {
        !self.failed_aggregates().is_empty()
    }
}

pub struct TrendAggregator {
    store: Arc<dyn TrendStore>,
}

impl TrendAggregator {
    pub fn new(store: Arc<dyn TrendStore>) -> Self {
        Self { store }
    }

    /// Compute and persist all three aggregates for one period.
    ///
    /// Returns `None` when another run holds the period's lock. Fails
    /// outright only when the lock or input read fails; snapshot write
    /// failures are captured per aggregate in the report.
    pub async fn run(
        &self,
        period: TrendPeriod,
        now: DateTime<Utc>,
    ) -> Result<Option<TrendRunReport>> {
        if !self.store.try_lock_run(period).await? {
            info!(period = %period, "Another trend run holds the lock, skipping");
            return Ok(None);
        }

        let report = self.run_locked(period, now).await;
        if let Err(e) = self.store.unlock_run(period).await {
            warn!(period = %period, error = %e, "Failed to release trend run lock");
        }
        report.map(Some)
    }

    async fn run_locked(&self, period: TrendPeriod, now: DateTime<Utc>) -> Result<TrendRunReport> {
        let cutoff = now - Duration::days(period.window_days());
        let lists = self.store.published_lists_since(cutoff).await?;

        info!(
            period = %period,
            lists = lists.len(),
            cutoff = %cutoff,
            "Running trend aggregation"
        );

        let subject_rows = subject_counts(&lists);
        let tag_rows = tag_counts(&lists);
        let item_rows = item_scores(&lists);

        let (subjects, tags, items) = futures::join!(
            async {
                self.store
                    .write_subject_snapshot(period, now, &subject_rows)
                    .await
                    .map(|_| subject_rows.len())
                    .map_err(|e| e.to_string())
            },
            async {
                self.store
                    .write_tag_snapshot(period, now, &tag_rows)
                    .await
                    .map(|_| tag_rows.len())
                    .map_err(|e| e.to_string())
            },
            async {
                self.store
                    .write_item_score_snapshot(period, now, &item_rows)
                    .await
                    .map(|_| item_rows.len())
                    .map_err(|e| e.to_string())
            },
        );

        let report = TrendRunReport {
            period,
            calculated_at: now,
            lists_seen: lists.len(),
            subjects,
            tags,
            items,
        };

        for (aggregate, err) in [
            ("subjects", report.subjects.as_ref().err()),
            ("tags", report.tags.as_ref().err()),
            ("items", report.items.as_ref().err()),
        ] {
            if let Some(err) = err {
                error!(period = %period, aggregate, error = %err, "Trend aggregate failed");
            }
        }

        Ok(report)
    }
}

/// Lists per subject, ordered by count descending, subject ascending on ties.
pub fn subject_counts(lists: &[RankingListRow]) -> Vec<SubjectCount> {
    let mut counts: HashMap<&str, i64> = HashMap::new();
    for list in lists {
        *counts.entry(list.subject.as_str()).or_default() += 1;
    }

    let mut rows: Vec<SubjectCount> = counts
        .into_iter()
        .map(|(subject, count)| SubjectCount {
            subject: subject.to_string(),
            count,
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.subject.cmp(&b.subject)));
    rows
}

/// Lists per tag, same ordering rule as subjects.
pub fn tag_counts(lists: &[RankingListRow]) -> Vec<TagCount> {
    let mut counts: HashMap<&str, i64> = HashMap::new();
    for list in lists {
        for tag in &list.tags {
            *counts.entry(tag.as_str()).or_default() += 1;
        }
    }

    let mut rows: Vec<TagCount> = counts
        .into_iter()
        .map(|(tag, count)| TagCount {
            tag: tag.to_string(),
            count,
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    rows
}

/// Cross-list scores per (subject, item): Borda points where position k in a
/// list of size n earns n - k + 1, and the mean rank across occurrences.
///
/// Scores are deliberately not normalized for list size; an item in a
/// 20-item list outweighs the same item in a 3-item list. Ordered by Borda
/// score descending, item name ascending on ties.
pub fn item_scores(lists: &[RankingListRow]) -> Vec<ItemScore> {
    struct Acc {
        borda: i64,
        rank_sum: i64,
        appearances: i64,
    }

    let mut scores: HashMap<(String, String), Acc> = HashMap::new();
    for list in lists {
        let size = list.items.len() as i64;
        for item in &list.items {
            let acc = scores
                .entry((list.subject.clone(), item.item_name.clone()))
                .or_insert(Acc {
                    borda: 0,
                    rank_sum: 0,
                    appearances: 0,
                });
            acc.borda += size - item.rank as i64 + 1;
            acc.rank_sum += item.rank as i64;
            acc.appearances += 1;
        }
    }

    let mut rows: Vec<ItemScore> = scores
        .into_iter()
        .map(|((subject, item_name), acc)| ItemScore {
            subject,
            item_name,
            borda_score: acc.borda,
            average_rank: acc.rank_sum as f64 / acc.appearances as f64,
            appearances: acc.appearances,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.borda_score
            .cmp(&a.borda_score)
            .then_with(|| a.item_name.cmp(&b.item_name))
    });
    rows
}
