use actix_web::{web, App, HttpResponse, HttpServer};
use redis::aio::ConnectionManager;
use sqlx::postgres::PgPoolOptions;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feed_service::config::Config;
use feed_service::db::{CommentRepo, PgContentStore, SuggestionRepo, TrendingRepo};
use feed_service::handlers::{
    create_comment, delete_comment, get_home_feed, get_profile_feed, get_suggestions,
    get_trending, list_comments, CommentHandlerState, FeedHandlerState, SuggestionHandlerState,
    TrendHandlerState,
};
use feed_service::jobs::trend_refresh::start_trend_refresh;
use feed_service::services::{
    CommentService, FeedComposer, MediaBroker, SuggestionService, TrendAggregator, TrendService,
    UrlSigner,
};

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "feed-service",
    }))
}

async fn metrics_endpoint() -> actix_web::Result<HttpResponse> {
    use prometheus::Encoder;

    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|e| {
            tracing::error!("Failed to encode metrics: {}", e);
            actix_web::error::ErrorInternalServerError("metrics encoding error")
        })?;

    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(buffer))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_target(true),
        )
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting feed-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let pool = match PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Database connection failed: {}", e);
            eprintln!("ERROR: Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    let redis = match &config.redis.url {
        Some(url) => match redis::Client::open(url.as_str()) {
            Ok(client) => match ConnectionManager::new(client).await {
                Ok(cm) => {
                    tracing::info!("Redis connected");
                    Some(cm)
                }
                Err(e) => {
                    tracing::warn!("Redis unavailable, trend cache disabled: {}", e);
                    None
                }
            },
            Err(e) => {
                tracing::warn!("Invalid Redis URL, trend cache disabled: {}", e);
                None
            }
        },
        None => None,
    };

    let signer = UrlSigner::new(
        config.media.signing_secret.clone(),
        config.media.cdn_domain.clone(),
    );
    let broker = Arc::new(MediaBroker::new(
        Arc::new(signer),
        config.media.feed_url_ttl_secs,
        config.media.preview_url_ttl_secs,
    ));

    let content_store = Arc::new(PgContentStore::new(pool.clone()));
    let trend_store = Arc::new(TrendingRepo::new(pool.clone()));

    let composer = Arc::new(FeedComposer::new(content_store, broker));
    let aggregator = Arc::new(TrendAggregator::new(trend_store.clone()));
    let trends = Arc::new(TrendService::new(
        trend_store,
        redis,
        config.trends.cache_ttl_secs,
        config.trends.max_entries,
    ));
    let comments = Arc::new(CommentService::new(CommentRepo::new(pool.clone())));
    let suggestions = Arc::new(SuggestionService::new(SuggestionRepo::new(pool.clone())));

    tokio::spawn(start_trend_refresh(
        aggregator,
        Duration::from_secs(config.trends.refresh_interval_secs),
    ));

    let feed_state = web::Data::new(FeedHandlerState { composer });
    let trend_state = web::Data::new(TrendHandlerState { trends });
    let comment_state = web::Data::new(CommentHandlerState { comments });
    let suggestion_state = web::Data::new(SuggestionHandlerState { suggestions });

    let port = config.app.port;
    tracing::info!("Listening on 0.0.0.0:{}", port);

    HttpServer::new(move || {
        App::new()
            .app_data(feed_state.clone())
            .app_data(trend_state.clone())
            .app_data(comment_state.clone())
            .app_data(suggestion_state.clone())
            .route("/health", web::get().to(health))
            .route("/metrics", web::get().to(metrics_endpoint))
            .service(get_home_feed)
            .service(get_profile_feed)
            .service(get_trending)
            .service(create_comment)
            .service(list_comments)
            .service(delete_comment)
            .service(get_suggestions)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
