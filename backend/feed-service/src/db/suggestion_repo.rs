/// Suggestion lookup - case-insensitive prefix match over distinct subjects
/// and item names from published lists, capped result size.
use sqlx::PgPool;

use crate::error::Result;

pub struct SuggestionRepo {
    pool: PgPool,
}

impl SuggestionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn suggest(&self, prefix: &str, limit: i64) -> Result<Vec<String>> {
        let pattern = format!("{}%", escape_like(prefix));

        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT DISTINCT subject AS name
            FROM ranking_lists
            WHERE status = 'PUBLISHED' AND deleted_at IS NULL AND subject ILIKE $1
            UNION
            SELECT DISTINCT i.item_name AS name
            FROM ranking_list_items i
            JOIN ranking_lists l ON l.id = i.list_id
            WHERE l.status = 'PUBLISHED' AND l.deleted_at IS NULL AND i.item_name ILIKE $1
            ORDER BY 1 ASC
            LIMIT $2
            "#,
        )
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }
}

/// Escape LIKE metacharacters so user input matches literally.
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_like_metacharacters() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("plain"), "plain");
    }
}
