use actix_web::{get, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::handlers::viewer_id;
use crate::models::FeedScope;
use crate::services::FeedComposer;

#[derive(Debug, Deserialize)]
pub struct FeedQueryParams {
    #[serde(default = "default_limit")]
    pub limit: u32,
    pub cursor: Option<Uuid>,
}

fn default_limit() -> u32 {
    20
}

pub struct FeedHandlerState {
    pub composer: Arc<FeedComposer>,
}

/// Home timeline: items authored by users the viewer follows.
#[get("/feed")]
pub async fn get_home_feed(
    query: web::Query<FeedQueryParams>,
    http_req: HttpRequest,
    state: web::Data<FeedHandlerState>,
) -> Result<HttpResponse> {
    let viewer = viewer_id(&http_req)?;

    debug!(
        viewer = %viewer,
        limit = query.limit,
        cursor = ?query.cursor,
        "Fetching home feed"
    );

    let page = state
        .composer
        .fetch_feed(FeedScope::Home { viewer }, query.cursor, query.limit)
        .await?;

    Ok(HttpResponse::Ok().json(page))
}

/// Profile timeline: items authored by one user.
#[get("/users/{user_id}/feed")]
pub async fn get_profile_feed(
    path: web::Path<Uuid>,
    query: web::Query<FeedQueryParams>,
    state: web::Data<FeedHandlerState>,
) -> Result<HttpResponse> {
    let user = path.into_inner();

    let page = state
        .composer
        .fetch_feed(FeedScope::Profile { user }, query.cursor, query.limit)
        .await?;

    Ok(HttpResponse::Ok().json(page))
}
