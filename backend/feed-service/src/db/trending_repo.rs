/// Trending Repository
///
/// Snapshot writes and latest-run reads for the trend aggregation system.
/// Snapshot rows are write-once: a new run inserts a fresh batch under its
/// own calculation_date and readers filter to the maximum calculation_date
/// per period, so two runs can never interleave within one read.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::pool::PoolConnection;
use sqlx::{PgPool, Postgres};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

use crate::db::TrendStore;
use crate::error::Result;
use crate::models::{
    ItemScore, RankingItemRow, RankingListRow, Sentiment, SubjectCount, TagCount, TrendEntry,
    TrendKind, TrendPeriod,
};

/// Advisory-lock keyspace for trend runs; the second key is the period.
const RUN_LOCK_CLASS: i32 = 0x7243;

fn run_lock_key(period: TrendPeriod) -> i32 {
    match period {
        TrendPeriod::Weekly => 1,
        TrendPeriod::Monthly => 2,
    }
}

pub struct TrendingRepo {
    pool: PgPool,
    // Advisory locks are session-scoped, so the connection that took one
    // must stay checked out until the unlock runs on it.
    run_locks: Mutex<HashMap<TrendPeriod, PoolConnection<Postgres>>>,
}

impl TrendingRepo {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            run_locks: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl TrendStore for TrendingRepo {
    async fn try_lock_run(&self, period: TrendPeriod) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        let locked: bool = sqlx::query_scalar("SELECT pg_try_advisory_lock($1, $2)")
            .bind(RUN_LOCK_CLASS)
            .bind(run_lock_key(period))
            .fetch_one(&mut *conn)
            .await?;

        if locked {
            self.run_locks
                .lock()
                .expect("Run lock registry poisoned")
                .insert(period, conn);
        }
        Ok(locked)
    }

    async fn unlock_run(&self, period: TrendPeriod) -> Result<()> {
        let conn = self
            .run_locks
            .lock()
            .expect("Run lock registry poisoned")
            .remove(&period);
        let Some(mut conn) = conn else {
            return Ok(());
        };

        let released: bool = sqlx::query_scalar("SELECT pg_advisory_unlock($1, $2)")
            .bind(RUN_LOCK_CLASS)
            .bind(run_lock_key(period))
            .fetch_one(&mut *conn)
            .await?;
        if !released {
            warn!(period = %period, "Run lock was not held by this session");
        }
        Ok(())
    }

    async fn published_lists_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<RankingListRow>> {
        let lists: Vec<(
            Uuid,
            Uuid,
            String,
            String,
            Option<String>,
            Vec<String>,
            i64,
            DateTime<Utc>,
            DateTime<Utc>,
        )> = sqlx::query_as(
            r#"
            SELECT id, author_id, subject, sentiment, description, tags, like_count, created_at, updated_at
            FROM ranking_lists
            WHERE status = 'PUBLISHED' AND deleted_at IS NULL AND created_at >= $1
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        if lists.is_empty() {
            return Ok(Vec::new());
        }

        let list_ids: Vec<Uuid> = lists.iter().map(|l| l.0).collect();
        let item_rows: Vec<(Uuid, i32, String, Option<String>, Option<String>)> = sqlx::query_as(
            r#"
            SELECT list_id, rank, item_name, item_description, image_key
            FROM ranking_list_items
            WHERE list_id = ANY($1)
            ORDER BY list_id, rank ASC
            "#,
        )
        .bind(&list_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut items_by_list: HashMap<Uuid, Vec<RankingItemRow>> = HashMap::new();
        for (list_id, rank, item_name, item_description, image_key) in item_rows {
            items_by_list.entry(list_id).or_default().push(RankingItemRow {
                rank,
                item_name,
                item_description,
                image_key,
            });
        }

        Ok(lists
            .into_iter()
            .map(
                |(id, author_id, subject, sentiment, description, tags, like_count, created_at, updated_at)| {
                    RankingListRow {
                        id,
                        author_id,
                        subject,
                        sentiment: Sentiment::parse(&sentiment).unwrap_or(Sentiment::Like),
                        description,
                        tags,
                        like_count,
                        items: items_by_list.remove(&id).unwrap_or_default(),
                        created_at,
                        updated_at,
                    }
                },
            )
            .collect())
    }

    async fn write_subject_snapshot(
        &self,
        period: TrendPeriod,
        calculated_at: DateTime<Utc>,
        rows: &[SubjectCount],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for (position, row) in rows.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO trending_subjects (period, calculation_date, position, subject, list_count)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(period.as_str())
            .bind(calculated_at)
            .bind(position as i32)
            .bind(&row.subject)
            .bind(row.count)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn write_tag_snapshot(
        &self,
        period: TrendPeriod,
        calculated_at: DateTime<Utc>,
        rows: &[TagCount],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for (position, row) in rows.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO trending_tags (period, calculation_date, position, tag_name, list_count)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(period.as_str())
            .bind(calculated_at)
            .bind(position as i32)
            .bind(&row.tag)
            .bind(row.count)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn write_item_score_snapshot(
        &self,
        period: TrendPeriod,
        calculated_at: DateTime<Utc>,
        rows: &[ItemScore],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for (position, row) in rows.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO trending_item_scores
                    (period, calculation_date, position, subject, item_name, borda_score, average_rank, appearances)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(period.as_str())
            .bind(calculated_at)
            .bind(position as i32)
            .bind(&row.subject)
            .bind(&row.item_name)
            .bind(row.borda_score)
            .bind(row.average_rank)
            .bind(row.appearances)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn latest_trends(
        &self,
        period: TrendPeriod,
        kind: TrendKind,
        limit: i64,
    ) -> Result<Vec<TrendEntry>> {
        let sql = match kind {
            TrendKind::Subject => {
                r#"
                SELECT subject AS key, list_count::FLOAT8 AS metric
                FROM trending_subjects
                WHERE period = $1
                  AND calculation_date = (
                      SELECT MAX(calculation_date) FROM trending_subjects WHERE period = $1
                  )
                ORDER BY position ASC
                LIMIT $2
                "#
            }
            TrendKind::Tag => {
                r#"
                SELECT tag_name AS key, list_count::FLOAT8 AS metric
                FROM trending_tags
                WHERE period = $1
                  AND calculation_date = (
                      SELECT MAX(calculation_date) FROM trending_tags WHERE period = $1
                  )
                ORDER BY position ASC
                LIMIT $2
                "#
            }
            // The item-ranking view surfaces the Borda variant.
            TrendKind::Item => {
                r#"
                SELECT item_name AS key, borda_score::FLOAT8 AS metric
                FROM trending_item_scores
                WHERE period = $1
                  AND calculation_date = (
                      SELECT MAX(calculation_date) FROM trending_item_scores WHERE period = $1
                  )
                ORDER BY position ASC
                LIMIT $2
                "#
            }
        };

        let rows: Vec<(String, f64)> = sqlx::query_as(sql)
            .bind(period.as_str())
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(key, metric)| TrendEntry { key, metric })
            .collect())
    }
}
