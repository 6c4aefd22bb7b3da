use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::ApiResult;
use crate::extract::{ApiForm, ApiJson};
use crate::middleware::AuthUser;
use crate::models::{Credentials, PublicUser};
use crate::services::auth::{self, TokenResponse};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth", post(register))
        .route("/auth/", post(register))
        .route("/auth/token", post(login))
        .route("/auth/me", get(me))
}

/// OAuth2 password-grant form; `username` carries the email.
#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    pub username: String,
    pub password: String,
}

// POST /auth
pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> ApiResult<impl IntoResponse> {
    let user = auth::register(&state.db, &state.config.auth, credentials).await?;
    Ok((StatusCode::CREATED, Json(PublicUser::from(&user))))
}

// POST /auth/token
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiForm(form): ApiForm<PasswordForm>,
) -> ApiResult<Json<TokenResponse>> {
    let token = auth::login(&state.db, &state.config.auth, &form.username, &form.password).await?;
    Ok(Json(token))
}

// GET /auth/me
pub async fn me(user: AuthUser) -> Json<PublicUser> {
    Json(PublicUser {
        id: user.user_id,
        email: user.email,
    })
}
