use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::info;
use validator::Validate;

use crate::config::AuthConfig;
use crate::database::Database;
use crate::error::{is_unique_violation, ApiError, ApiResult};
use crate::models::{user::normalize_email, Credentials, User};

const INVALID_CREDENTIALS: &str = "Incorrect email or password";

/// Hash checked when the email is unknown, so both login failures cost one bcrypt verify.
static DUMMY_HASH: OnceCell<String> = OnceCell::const_new();

async fn dummy_hash(cost: u32) -> ApiResult<&'static str> {
    DUMMY_HASH
        .get_or_try_init(|| hash_password("not-a-real-password".to_string(), cost))
        .await
        .map(String::as_str)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        TokenResponse {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

// bcrypt is deliberately slow, keep it off the async workers
pub async fn hash_password(password: String, cost: u32) -> ApiResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| ApiError::Internal(format!("hashing task failed: {e}")))?
        .map_err(ApiError::from)
}

pub async fn verify_password(password: String, hash: String) -> ApiResult<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| ApiError::Internal(format!("verify task failed: {e}")))?
        .map_err(ApiError::from)
}

pub fn issue_token(user: &User, config: &AuthConfig) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        iat: now.timestamp(),
        exp: (now + Duration::hours(config.jwt_expires_in_hours)).timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
}

pub async fn register(db: &Database, config: &AuthConfig, credentials: Credentials) -> ApiResult<User> {
    let credentials = Credentials {
        email: normalize_email(&credentials.email),
        password: credentials.password,
    };
    credentials.validate()?;

    if User::find_by_email(&credentials.email, &db.pool).await?.is_some() {
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }

    let password_hash = hash_password(credentials.password, config.bcrypt_cost).await?;

    let user = User::insert(&credentials.email, &password_hash, &db.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Conflict("Email already registered".to_string())
            } else {
                ApiError::from(e)
            }
        })?;

    info!(user_id = user.id, "Registered new user");
    Ok(user)
}

/// Same error for unknown email and wrong password.
pub async fn login(db: &Database, config: &AuthConfig, email: &str, password: &str) -> ApiResult<TokenResponse> {
    let Some(user) = User::find_by_email(&normalize_email(email), &db.pool).await? else {
        let hash = dummy_hash(config.bcrypt_cost).await?;
        verify_password(password.to_string(), hash.to_string()).await?;
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    if !verify_password(password.to_string(), user.password_hash.clone()).await? {
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let token = issue_token(&user, config)?;
    info!(user_id = user.id, "User logged in");
    Ok(TokenResponse::bearer(token))
}
