use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use std::sync::Arc;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::AuthUser;
use crate::models::{Booking, CreateBookingRequest};
use crate::services::booking::BookingService;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", get(list_bookings).post(create_booking))
        .route("/bookings/{id}", delete(cancel_booking))
}

// GET /bookings
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<Json<Vec<Booking>>> {
    let bookings = BookingService::new(&state.db, &state.cache)
        .list(user.user_id)
        .await?;
    Ok(Json(bookings))
}

// POST /bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ApiJson(req): ApiJson<CreateBookingRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()?;

    let booking = BookingService::new(&state.db, &state.cache)
        .create(user.user_id, &req.event_slug, req.user_name)
        .await?;

    Ok((StatusCode::CREATED, Json(booking)))
}

// DELETE /bookings/{id}
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    if id <= 0 {
        return Err(ApiError::BadRequest("booking id must be > 0".to_string()));
    }

    BookingService::new(&state.db, &state.cache)
        .cancel(user.user_id, id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
