use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub media: MediaConfig,
    pub trends: TrendConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RedisConfig {
    /// Optional; trend responses are served straight from Postgres when unset.
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    pub signing_secret: String,
    pub cdn_domain: String,
    /// TTL for URLs embedded in feed responses.
    pub feed_url_ttl_secs: u32,
    /// TTL for URLs handed out while editing (short-lived previews).
    pub preview_url_ttl_secs: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendConfig {
    pub refresh_interval_secs: u64,
    pub cache_ttl_secs: u64,
    pub max_entries: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Config {
            app: AppConfig {
                env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                port: std::env::var("APP_PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()?,
                log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")?,
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()?,
            },
            redis: RedisConfig {
                url: std::env::var("REDIS_URL").ok(),
            },
            media: MediaConfig {
                signing_secret: std::env::var("MEDIA_SIGNING_SECRET")?,
                cdn_domain: std::env::var("MEDIA_CDN_DOMAIN")
                    .unwrap_or_else(|_| "cdn.rankline.dev".to_string()),
                feed_url_ttl_secs: std::env::var("MEDIA_FEED_URL_TTL_SECS")
                    .unwrap_or_else(|_| "86400".to_string())
                    .parse()?,
                preview_url_ttl_secs: std::env::var("MEDIA_PREVIEW_URL_TTL_SECS")
                    .unwrap_or_else(|_| "300".to_string())
                    .parse()?,
            },
            trends: TrendConfig {
                refresh_interval_secs: std::env::var("TREND_REFRESH_INTERVAL_SECS")
                    .unwrap_or_else(|_| "86400".to_string())
                    .parse()?,
                cache_ttl_secs: std::env::var("TREND_CACHE_TTL_SECS")
                    .unwrap_or_else(|_| "300".to_string())
                    .parse()?,
                max_entries: std::env::var("TREND_MAX_ENTRIES")
                    .unwrap_or_else(|_| "100".to_string())
                    .parse()?,
            },
        })
    }
}
