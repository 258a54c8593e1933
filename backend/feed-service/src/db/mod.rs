/// Store access for the feed subsystem.
///
/// The relational store is an external collaborator; these traits are the
/// seam the composer and aggregator work against. Postgres implementations
/// live alongside them, in-memory implementations live in the tests.
pub mod comment_repo;
pub mod content_store;
pub mod suggestion_repo;
pub mod trending_repo;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    CursorPos, FeedItemRow, FeedScope, ItemScore, PostRow, RankingListRow, SubjectCount, TagCount,
    TrendEntry, TrendKind, TrendPeriod, UserRow,
};

pub use comment_repo::CommentRepo;
pub use content_store::PgContentStore;
pub use suggestion_repo::SuggestionRepo;
pub use trending_repo::TrendingRepo;

/// Ordered, filterable reads over the content graph.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Feed items matching `scope`, strictly after `after` in the
    /// (created_at DESC, id DESC) ordering, at most `limit` rows.
    async fn feed_page(
        &self,
        scope: &FeedScope,
        after: Option<&CursorPos>,
        limit: i64,
    ) -> Result<Vec<FeedItemRow>>;

    /// Ordering position of a feed item, if it still exists.
    async fn cursor_position(&self, id: Uuid) -> Result<Option<CursorPos>>;

    async fn feed_item(&self, id: Uuid) -> Result<Option<FeedItemRow>>;

    async fn user(&self, id: Uuid) -> Result<Option<UserRow>>;

    async fn post(&self, id: Uuid) -> Result<Option<PostRow>>;

    /// Ranking list with its ordered items.
    async fn ranking_list(&self, id: Uuid) -> Result<Option<RankingListRow>>;
}

/// Reads and snapshot writes for trend aggregation.
#[async_trait]
pub trait TrendStore: Send + Sync {
    /// Try to take the per-period run lock. Returns false when another run
    /// already holds it.
    async fn try_lock_run(&self, period: TrendPeriod) -> Result<bool>;

    /// Release the per-period run lock. Releasing a lock this store does not
    /// hold is a no-op.
    async fn unlock_run(&self, period: TrendPeriod) -> Result<()>;

    /// PUBLISHED ranking lists created at or after `cutoff`, items included.
    async fn published_lists_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<RankingListRow>>;

    /// Write one snapshot batch. Rows are tagged with `calculated_at` and
    /// never updated afterwards.
    async fn write_subject_snapshot(
        &self,
        period: TrendPeriod,
        calculated_at: DateTime<Utc>,
        rows: &[SubjectCount],
    ) -> Result<()>;

    async fn write_tag_snapshot(
        &self,
        period: TrendPeriod,
        calculated_at: DateTime<Utc>,
        rows: &[TagCount],
    ) -> Result<()>;

    async fn write_item_score_snapshot(
        &self,
        period: TrendPeriod,
        calculated_at: DateTime<Utc>,
        rows: &[ItemScore],
    ) -> Result<()>;

    /// Ranked entries from the latest calculation_date for the period only;
    /// rows from different runs are never mixed.
    async fn latest_trends(
        &self,
        period: TrendPeriod,
        kind: TrendKind,
        limit: i64,
    ) -> Result<Vec<TrendEntry>>;
}
