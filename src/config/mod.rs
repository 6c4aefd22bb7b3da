use std::env;
use std::str::FromStr;
use thiserror::Error;

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173,http://127.0.0.1:5173";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(String),
    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: String, value: String },
}

// Top-level container for every settings section
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub redis: Option<RedisConfig>,
    pub auth: AuthConfig,
    pub cors: CorsConfig,
    pub features: FeatureFlags,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

/// Present only when `REDIS_URL` is set; without it event reads go straight to Postgres.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
    pub ttl_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expires_in_hours: i64,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FeatureFlags {
    pub seed_on_startup: bool,
    pub protect_event_writes: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, so tests can feed a map instead of the process env.
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let redis = match get("REDIS_URL").filter(|url| !url.trim().is_empty()) {
            Some(url) => Some(RedisConfig {
                url,
                ttl_seconds: parse_or(&get, "CACHE_TTL_SECONDS", 300)?,
            }),
            None => None,
        };

        let bcrypt_cost: u32 = parse_or(&get, "BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST".to_string(),
                value: bcrypt_cost.to_string(),
            });
        }

        Ok(Config {
            app: AppConfig {
                host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&get, "PORT", 8000)?,
                environment: get("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
                rust_log: get("RUST_LOG")
                    .unwrap_or_else(|| "dev_events=debug,tower_http=debug".to_string()),
                log_format: parse_or(&get, "LOG_FORMAT", LogFormat::Pretty)?,
            },
            database: DatabaseConfig {
                url: database_url(&get)?,
                pool_size: parse_or(&get, "DB_POOL_SIZE", 5)?,
            },
            redis,
            auth: AuthConfig {
                jwt_secret: require(&get, "JWT_SECRET")?,
                jwt_expires_in_hours: parse_or(&get, "JWT_EXPIRES_IN_HOURS", 24)?,
                bcrypt_cost,
            },
            cors: CorsConfig {
                allowed_origins: split_list(
                    &get("CORS_ORIGINS").unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string()),
                ),
            },
            features: FeatureFlags {
                seed_on_startup: parse_or(&get, "SEED_ON_STARTUP", true)?,
                protect_event_writes: parse_or(&get, "PROTECT_EVENT_WRITES", false)?,
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.app.host, self.app.port)
    }
}

// DATABASE_URL wins; otherwise assemble it from the discrete DB_* variables.
fn database_url<F>(get: &F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = get("DATABASE_URL").filter(|url| !url.trim().is_empty()) {
        return Ok(url);
    }

    let user = require(get, "DB_USER").map_err(|_| ConfigError::Missing("DATABASE_URL".to_string()))?;
    let password = require(get, "DB_PASSWORD")?;
    let host = require(get, "DB_HOST")?;
    let port: u16 = parse_or(get, "DB_PORT", 5432)?;
    let name = require(get, "DB_NAME")?;

    Ok(format!(
        "postgres://{user}:{password}@{host}:{port}/{name}?sslmode=require"
    ))
}

fn require<F>(get: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    get(key)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ConfigError::Missing(key.to_string()))
}

fn parse_or<F, T>(get: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            key: key.to_string(),
            value: raw,
        }),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
