use redis::{aio::MultiplexedConnection, Client};
use tracing::info;

pub mod events;

/// Best-effort event cache. With no Redis configured every lookup is a miss and writes are no-ops.
#[derive(Clone)]
pub struct CacheService {
    conn: Option<MultiplexedConnection>,
    ttl_seconds: u64,
}

impl CacheService {
    /// Opens a multiplexed connection and checks it answers `PING`.
    pub async fn connect(redis_url: &str, ttl_seconds: u64) -> redis::RedisResult<Self> {
        let client = Client::open(redis_url)?;
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;

        info!("Event cache enabled (ttl {}s)", ttl_seconds);
        Ok(Self {
            conn: Some(conn),
            ttl_seconds,
        })
    }

    pub fn disabled() -> Self {
        Self {
            conn: None,
            ttl_seconds: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.conn.is_some()
    }
}
