use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::warn;

use crate::config::CorsConfig;
use crate::error::ApiError;
use crate::services::auth::decode_token;
use crate::AppState;

/// Caller identity taken from a valid `Authorization: Bearer <jwt>` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
    pub email: String,
}

impl AuthUser {
    fn from_parts(parts: &Parts, secret: &str) -> Result<Self, ApiError> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

        let token = bearer_token(auth_header)
            .ok_or_else(|| ApiError::Unauthorized("Expected a bearer token".to_string()))?;

        let claims = decode_token(token, secret)
            .map_err(|_| ApiError::Unauthorized("Could not validate credentials".to_string()))?;

        let user_id = claims
            .user_id()
            .ok_or_else(|| ApiError::Unauthorized("Could not validate credentials".to_string()))?;

        Ok(AuthUser {
            user_id,
            email: claims.email,
        })
    }
}

// Scheme name is case-insensitive
fn bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }
        AuthUser::from_parts(parts, &state.config.auth.jwt_secret)
    }
}

/// Route layer for endpoints that need a caller but do not use its identity.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (mut parts, body) = request.into_parts();
    let user = AuthUser::from_parts(&parts, &state.config.auth.jwt_secret)?;
    parts.extensions.insert(user);
    Ok(next.run(Request::from_parts(parts, body)).await)
}

pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
