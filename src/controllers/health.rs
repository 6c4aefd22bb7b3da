use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .route("/", get(status))
        .route("/health", get(|| async { "OK" }))
}

async fn status() -> Json<Value> {
    Json(json!({
        "status": "online",
        "message": "The Dev-Event application is running"
    }))
}
