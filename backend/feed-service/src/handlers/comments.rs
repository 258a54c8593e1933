use actix_web::{delete, get, post, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::Result;
use crate::handlers::viewer_id;
use crate::services::CommentService;

#[derive(Debug, Deserialize)]
pub struct CreateCommentBody {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ListCommentsQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

pub struct CommentHandlerState {
    pub comments: Arc<CommentService>,
}

#[post("/lists/{list_id}/comments")]
pub async fn create_comment(
    path: web::Path<Uuid>,
    body: web::Json<CreateCommentBody>,
    http_req: HttpRequest,
    state: web::Data<CommentHandlerState>,
) -> Result<HttpResponse> {
    let user = viewer_id(&http_req)?;
    let comment = state
        .comments
        .create(path.into_inner(), user, &body.content)
        .await?;

    Ok(HttpResponse::Created().json(comment))
}

#[get("/lists/{list_id}/comments")]
pub async fn list_comments(
    path: web::Path<Uuid>,
    query: web::Query<ListCommentsQuery>,
    state: web::Data<CommentHandlerState>,
) -> Result<HttpResponse> {
    let comments = state
        .comments
        .list(path.into_inner(), query.limit, query.offset)
        .await?;

    Ok(HttpResponse::Ok().json(comments))
}

#[delete("/lists/{list_id}/comments/{comment_id}")]
pub async fn delete_comment(
    path: web::Path<(Uuid, Uuid)>,
    http_req: HttpRequest,
    state: web::Data<CommentHandlerState>,
) -> Result<HttpResponse> {
    let user = viewer_id(&http_req)?;
    let (list_id, comment_id) = path.into_inner();

    state.comments.delete(list_id, comment_id, user).await?;

    Ok(HttpResponse::NoContent().finish())
}
