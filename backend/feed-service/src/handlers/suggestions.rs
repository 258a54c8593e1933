use actix_web::{get, web, HttpResponse};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::Result;
use crate::services::SuggestionService;

#[derive(Debug, Deserialize)]
pub struct SuggestionQuery {
    pub q: String,
    pub limit: Option<i64>,
}

pub struct SuggestionHandlerState {
    pub suggestions: Arc<SuggestionService>,
}

/// Case-insensitive prefix lookup over distinct subjects and item names.
#[get("/suggestions")]
pub async fn get_suggestions(
    query: web::Query<SuggestionQuery>,
    state: web::Data<SuggestionHandlerState>,
) -> Result<HttpResponse> {
    let names = state.suggestions.suggest(&query.q, query.limit).await?;

    Ok(HttpResponse::Ok().json(names))
}
