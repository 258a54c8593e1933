use actix_web::{get, web, HttpResponse};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{TrendKind, TrendPeriod};
use crate::services::TrendService;

#[derive(Debug, Deserialize)]
pub struct TrendQueryParams {
    pub period: String,
    pub kind: String,
    pub limit: Option<i64>,
}

pub struct TrendHandlerState {
    pub trends: Arc<TrendService>,
}

/// Ranked trend entries from the latest snapshot for the requested period.
#[get("/trending")]
pub async fn get_trending(
    query: web::Query<TrendQueryParams>,
    state: web::Data<TrendHandlerState>,
) -> Result<HttpResponse> {
    let period = TrendPeriod::parse(&query.period).ok_or_else(|| {
        AppError::BadRequest("Invalid period. Must be 'weekly' or 'monthly'".to_string())
    })?;
    let kind = TrendKind::parse(&query.kind).ok_or_else(|| {
        AppError::BadRequest("Invalid kind. Must be 'subject', 'tag' or 'item'".to_string())
    })?;

    let response = state.trends.get_trends(period, kind, query.limit).await?;

    Ok(HttpResponse::Ok().json(response))
}
