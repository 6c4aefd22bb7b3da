pub mod cache;
pub mod config;
pub mod controllers;
pub mod database;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod services;

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

// Shared state for the whole application
#[derive(Clone)]
pub struct AppState {
    pub db: database::Database,
    pub cache: cache::CacheService,
    pub config: config::Config,
}

impl AppState {
    /// Connects to Postgres, migrates, seeds, and attaches Redis when configured.
    pub async fn new(config: config::Config) -> anyhow::Result<Arc<Self>> {
        let db = database::Database::new(&config.database.url, config.database.pool_size).await?;
        info!("Database connected");

        db.run_migrations().await?;

        if config.features.seed_on_startup {
            services::seed::seed_if_empty(&db).await?;
        }

        let cache = match &config.redis {
            Some(redis_config) => match cache::CacheService::connect(&redis_config.url, redis_config.ttl_seconds).await {
                Ok(cache) => cache,
                Err(e) => {
                    warn!("Redis unavailable, running without event cache: {:?}", e);
                    cache::CacheService::disabled()
                }
            },
            None => cache::CacheService::disabled(),
        };

        Ok(Arc::new(Self { db, cache, config }))
    }
}

/// Full HTTP application: routes, CORS and request tracing.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = middleware::cors_layer(&state.config.cors);

    Router::new()
        .merge(controllers::routes(state.clone()))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
