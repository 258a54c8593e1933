/// Trend read service
///
/// Serves ranked trend entries from the latest snapshot for a period, with
/// an optional short-lived Redis response cache in front of the store.
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::db::TrendStore;
use crate::error::{AppError, Result};
use crate::models::{TrendEntry, TrendKind, TrendPeriod};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendResponse {
    pub period: TrendPeriod,
    pub kind: TrendKind,
    pub entries: Vec<TrendEntry>,
    pub count: usize,
    pub fetched_at: chrono::DateTime<chrono::Utc>,
}

pub struct TrendService {
    store: Arc<dyn TrendStore>,
    redis: Option<ConnectionManager>,
    cache_ttl_secs: u64,
    max_entries: i64,
}

impl TrendService {
    pub fn new(
        store: Arc<dyn TrendStore>,
        redis: Option<ConnectionManager>,
        cache_ttl_secs: u64,
        max_entries: i64,
    ) -> Self {
        Self {
            store,
            redis,
            cache_ttl_secs,
            max_entries,
        }
    }

    pub async fn get_trends(
        &self,
        period: TrendPeriod,
        kind: TrendKind,
        limit: Option<i64>,
    ) -> Result<TrendResponse> {
        let limit = limit.unwrap_or(self.max_entries).clamp(1, self.max_entries);
        let cache_key = format!("rankline:trends:{}:{}:{}", period, kind, limit);

        if let Some(redis) = &self.redis {
            if let Ok(cached) = self.get_from_cache(redis, &cache_key).await {
                debug!("Trend cache hit: {}", cache_key);
                return Ok(cached);
            }
        }

        let entries = self.store.latest_trends(period, kind, limit).await?;

        let response = TrendResponse {
            period,
            kind,
            count: entries.len(),
            entries,
            fetched_at: chrono::Utc::now(),
        };

        if let Some(redis) = &self.redis {
            if let Err(e) = self.cache_response(redis, &cache_key, &response).await {
                warn!("Failed to cache trend response: {}", e);
            }
        }

        Ok(response)
    }

    async fn get_from_cache(
        &self,
        redis: &ConnectionManager,
        key: &str,
    ) -> Result<TrendResponse> {
        let mut conn = redis.clone();
        let cached: Option<String> = conn.get(key).await.map_err(|e| {
            error!("Redis GET failed: {}", e);
            AppError::Cache("Cache read failed".to_string())
        })?;

        match cached {
            Some(json) => serde_json::from_str(&json).map_err(|e| {
                error!("Failed to deserialize cached trends: {}", e);
                AppError::Cache("Cache deserialization failed".to_string())
            }),
            None => Err(AppError::NotFound("Cache miss".to_string())),
        }
    }

    async fn cache_response(
        &self,
        redis: &ConnectionManager,
        key: &str,
        response: &TrendResponse,
    ) -> Result<()> {
        let mut conn = redis.clone();
        let json = serde_json::to_string(response)?;

        conn.set_ex::<_, _, ()>(key, json, self.cache_ttl_secs)
            .await
            .map_err(|e| {
                error!("Redis SET failed: {}", e);
                AppError::Cache("Cache write failed".to_string())
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_format() {
        let key = format!(
            "rankline:trends:{}:{}:{}",
            TrendPeriod::Weekly,
            TrendKind::Subject,
            50
        );
        assert_eq!(key, "rankline:trends:weekly:subject:50");
    }
}
