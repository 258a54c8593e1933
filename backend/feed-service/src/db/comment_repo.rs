/// Comment repository - comments are scoped to a ranking list
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::CommentRow;

pub struct CommentRepo {
    pool: PgPool,
}

impl CommentRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_exists(&self, list_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM ranking_lists WHERE id = $1 AND deleted_at IS NULL)",
        )
        .bind(list_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    pub async fn create_comment(
        &self,
        list_id: Uuid,
        user_id: Uuid,
        content: &str,
    ) -> Result<CommentRow> {
        let row: (Uuid, Uuid, Uuid, String, chrono::DateTime<chrono::Utc>) = sqlx::query_as(
            r#"
            INSERT INTO list_comments (list_id, user_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, list_id, user_id, content, created_at
            "#,
        )
        .bind(list_id)
        .bind(user_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        Ok(CommentRow {
            id: row.0,
            list_id: row.1,
            user_id: row.2,
            content: row.3,
            created_at: row.4,
        })
    }

    pub async fn list_comments(
        &self,
        list_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CommentRow>> {
        let rows: Vec<(Uuid, Uuid, Uuid, String, chrono::DateTime<chrono::Utc>)> = sqlx::query_as(
            r#"
            SELECT id, list_id, user_id, content, created_at
            FROM list_comments
            WHERE list_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(list_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, list_id, user_id, content, created_at)| CommentRow {
                id,
                list_id,
                user_id,
                content,
                created_at,
            })
            .collect())
    }

    /// Delete a comment the caller owns. Returns the number of rows removed;
    /// zero covers both "no such comment" and "not the owner".
    pub async fn delete_owned(
        &self,
        list_id: Uuid,
        comment_id: Uuid,
        user_id: Uuid,
    ) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM list_comments WHERE id = $1 AND list_id = $2 AND user_id = $3",
        )
        .bind(comment_id)
        .bind(list_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
