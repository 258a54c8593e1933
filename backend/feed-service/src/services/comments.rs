/// Comment service - comments scoped to a ranking list.
///
/// Deletion collapses "no such comment" and "not the owner" into one
/// not-found response so callers cannot probe for existence.
use uuid::Uuid;

use crate::db::CommentRepo;
use crate::error::{AppError, Result};
use crate::models::CommentRow;

const MAX_COMMENT_LEN: usize = 500;

pub struct CommentService {
    repo: CommentRepo,
}

impl CommentService {
    pub fn new(repo: CommentRepo) -> Self {
        Self { repo }
    }

    pub async fn create(&self, list_id: Uuid, user_id: Uuid, content: &str) -> Result<CommentRow> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation("Comment must not be empty".into()));
        }
        if content.chars().count() > MAX_COMMENT_LEN {
            return Err(AppError::Validation(format!(
                "Comment exceeds {} characters",
                MAX_COMMENT_LEN
            )));
        }

        if !self.repo.list_exists(list_id).await? {
            return Err(AppError::NotFound("Ranking list not found".into()));
        }

        self.repo.create_comment(list_id, user_id, content).await
    }

    pub async fn list(&self, list_id: Uuid, limit: i64, offset: i64) -> Result<Vec<CommentRow>> {
        if !self.repo.list_exists(list_id).await? {
            return Err(AppError::NotFound("Ranking list not found".into()));
        }

        self.repo
            .list_comments(list_id, limit.clamp(1, 100), offset.max(0))
            .await
    }

    pub async fn delete(&self, list_id: Uuid, comment_id: Uuid, user_id: Uuid) -> Result<()> {
        let removed = self.repo.delete_owned(list_id, comment_id, user_id).await?;
        if removed == 0 {
            return Err(AppError::NotFound("Comment not found".into()));
        }
        Ok(())
    }
}
