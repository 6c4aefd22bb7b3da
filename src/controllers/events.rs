use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use std::sync::Arc;
use validator::Validate;

use crate::error::{is_unique_violation, ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath};
use crate::models::{Event, EventInput};
use crate::AppState;

pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let reads = Router::new()
        .route("/events", get(list_events))
        .route("/events/{slug}", get(get_event));

    let mut writes = Router::new()
        .route("/events", post(create_event))
        .route("/events/{slug}", put(update_event).delete(delete_event));

    if state.config.features.protect_event_writes {
        writes = writes.route_layer(middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::require_auth,
        ));
    }

    reads.merge(writes)
}

fn slug_conflict(err: sqlx::Error, slug: &str) -> ApiError {
    if is_unique_violation(&err) {
        ApiError::Conflict(format!("An event with slug '{slug}' already exists"))
    } else {
        ApiError::from(err)
    }
}

// GET /events
pub async fn list_events(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let generation = state.cache.generation().await;
    if let Some(generation) = generation {
        if let Some(events) = state.cache.get_events(generation).await {
            return Ok(([("X-Cache", "HIT")], Json(events)));
        }
    }

    let events = Event::list(&state.db.pool).await?;
    if let Some(generation) = generation {
        state.cache.set_events(generation, &events).await;
    }

    Ok(([("X-Cache", "MISS")], Json(events)))
}

// GET /events/{slug}
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    ApiPath(slug): ApiPath<String>,
) -> ApiResult<impl IntoResponse> {
    let generation = state.cache.generation().await;
    if let Some(generation) = generation {
        if let Some(event) = state.cache.get_event(generation, &slug).await {
            return Ok(([("X-Cache", "HIT")], Json(event)));
        }
    }

    let event = Event::find_by_slug(&slug, &state.db.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Event", &slug))?;
    if let Some(generation) = generation {
        state.cache.set_event(generation, &event).await;
    }

    Ok(([("X-Cache", "MISS")], Json(event)))
}

// POST /events
pub async fn create_event(
    State(state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<EventInput>,
) -> ApiResult<impl IntoResponse> {
    input.validate()?;

    let event = Event::insert(&input, &state.db.pool)
        .await
        .map_err(|e| slug_conflict(e, &input.slug))?;

    state.cache.invalidate_events().await;
    tracing::info!(event_id = event.id, slug = %event.slug, "Event created");

    Ok((StatusCode::CREATED, Json(event)))
}

// PUT /events/{slug}
pub async fn update_event(
    State(state): State<Arc<AppState>>,
    ApiPath(slug): ApiPath<String>,
    ApiJson(input): ApiJson<EventInput>,
) -> ApiResult<Json<Event>> {
    input.validate()?;

    let event = Event::update_by_slug(&slug, &input, &state.db.pool)
        .await
        .map_err(|e| slug_conflict(e, &input.slug))?
        .ok_or_else(|| ApiError::not_found("Event", &slug))?;

    state.cache.invalidate_events().await;
    tracing::info!(event_id = event.id, slug = %event.slug, "Event updated");

    Ok(Json(event))
}

// DELETE /events/{slug}
pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    ApiPath(slug): ApiPath<String>,
) -> ApiResult<StatusCode> {
    if !Event::delete_by_slug(&slug, &state.db.pool).await? {
        return Err(ApiError::not_found("Event", &slug));
    }

    state.cache.invalidate_events().await;
    tracing::info!(slug = %slug, "Event deleted");

    Ok(StatusCode::NO_CONTENT)
}
