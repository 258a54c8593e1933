/// Postgres-backed content graph reads
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::ContentStore;
use crate::error::{AppError, Result};
use crate::models::{
    CursorPos, FeedItemRow, FeedItemType, FeedScope, PostRow, RankingItemRow, RankingListRow,
    Sentiment, UserRow,
};

type FeedItemTuple = (
    Uuid,                          // id
    Uuid,                          // user_id
    String,                        // item_type
    DateTime<Utc>,                 // created_at
    Option<Uuid>,                  // post_id
    Option<Uuid>,                  // ranking_list_id
    Option<Uuid>,                  // retweet_of_id
    Option<Uuid>,                  // quoted_item_id
    Option<String>,                // quote_text
);

/// Dropping a row here would shrink a page below what the limit arithmetic
/// expects, so an unrecognized type is an invariant violation, not a skip.
fn from_tuple(row: FeedItemTuple) -> Result<FeedItemRow> {
    let (id, user_id, item_type, created_at, post_id, ranking_list_id, retweet_of_id, quoted_item_id, quote_text) =
        row;
    let item_type = FeedItemType::parse(&item_type).ok_or_else(|| {
        AppError::Internal(format!("Unknown item type '{}' on feed item {}", item_type, id))
    })?;
    Ok(FeedItemRow {
        id,
        user_id,
        item_type,
        created_at,
        post_id,
        ranking_list_id,
        retweet_of_id,
        quoted_item_id,
        quote_text,
    })
}

const FEED_ITEM_COLUMNS: &str = "id, user_id, item_type, created_at, post_id, ranking_list_id, retweet_of_id, quoted_item_id, quote_text";

// Page queries only count rows this reader can represent; rows written by a
// newer schema must not eat into the limit.
const KNOWN_ITEM_TYPES: &str = "('POST', 'RANKING_UPDATE', 'RETWEET', 'QUOTE_RETWEET')";

pub struct PgContentStore {
    pool: PgPool,
}

impl PgContentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentStore for PgContentStore {
    async fn feed_page(
        &self,
        scope: &FeedScope,
        after: Option<&CursorPos>,
        limit: i64,
    ) -> Result<Vec<FeedItemRow>> {
        let (after_created_at, after_id) = match after {
            Some(pos) => (Some(pos.created_at), Some(pos.id)),
            None => (None, None),
        };

        let rows: Vec<FeedItemTuple> = match scope {
            FeedScope::Home { viewer } => {
                sqlx::query_as(&format!(
                    r#"
                    SELECT {FEED_ITEM_COLUMNS}
                    FROM feed_items
                    WHERE user_id IN (SELECT followee_id FROM follows WHERE follower_id = $1)
                      AND item_type IN {KNOWN_ITEM_TYPES}
                      AND ($2::TIMESTAMPTZ IS NULL OR (created_at, id) < ($2, $3))
                    ORDER BY created_at DESC, id DESC
                    LIMIT $4
                    "#
                ))
                .bind(viewer)
                .bind(after_created_at)
                .bind(after_id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            FeedScope::Profile { user } => {
                sqlx::query_as(&format!(
                    r#"
                    SELECT {FEED_ITEM_COLUMNS}
                    FROM feed_items
                    WHERE user_id = $1
                      AND item_type IN {KNOWN_ITEM_TYPES}
                      AND ($2::TIMESTAMPTZ IS NULL OR (created_at, id) < ($2, $3))
                    ORDER BY created_at DESC, id DESC
                    LIMIT $4
                    "#
                ))
                .bind(user)
                .bind(after_created_at)
                .bind(after_id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(from_tuple).collect()
    }

    async fn cursor_position(&self, id: Uuid) -> Result<Option<CursorPos>> {
        let row: Option<(DateTime<Utc>, Uuid)> =
            sqlx::query_as("SELECT created_at, id FROM feed_items WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(created_at, id)| CursorPos { created_at, id }))
    }

    async fn feed_item(&self, id: Uuid) -> Result<Option<FeedItemRow>> {
        let row: Option<FeedItemTuple> = sqlx::query_as(&format!(
            "SELECT {FEED_ITEM_COLUMNS} FROM feed_items WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(from_tuple).transpose()
    }

    async fn user(&self, id: Uuid) -> Result<Option<UserRow>> {
        let row: Option<(Uuid, String, String, Option<String>)> =
            sqlx::query_as("SELECT id, username, name, avatar_key FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(id, username, name, avatar_key)| UserRow {
            id,
            username,
            name,
            avatar_key,
        }))
    }

    async fn post(&self, id: Uuid) -> Result<Option<PostRow>> {
        let row: Option<(Uuid, Uuid, String, Option<String>, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT id, author_id, content, image_key, created_at
            FROM posts
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, author_id, content, image_key, created_at)| PostRow {
            id,
            author_id,
            content,
            image_key,
            created_at,
        }))
    }

    async fn ranking_list(&self, id: Uuid) -> Result<Option<RankingListRow>> {
        let list: Option<(
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
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some((id, author_id, subject, sentiment, description, tags, like_count, created_at, updated_at)) =
            list
        else {
            return Ok(None);
        };

        let sentiment = Sentiment::parse(&sentiment).unwrap_or(Sentiment::Like);

        let items: Vec<(i32, String, Option<String>, Option<String>)> = sqlx::query_as(
            r#"
            SELECT rank, item_name, item_description, image_key
            FROM ranking_list_items
            WHERE list_id = $1
            ORDER BY rank ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(RankingListRow {
            id,
            author_id,
            subject,
            sentiment,
            description,
            tags,
            like_count,
            items: items
                .into_iter()
                .map(|(rank, item_name, item_description, image_key)| RankingItemRow {
                    rank,
                    item_name,
                    item_description,
                    image_key,
                })
                .collect(),
            created_at,
            updated_at,
        }))
    }
}
