//! Event entries are stored under a generation number. Readers fetch the
//! generation before querying Postgres; every write bumps it after commit,
//! so a snapshot read before the write can only land under a generation
//! nobody reads any more.

use crate::cache::CacheService;
use crate::models::Event;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

const GENERATION_KEY: &str = "events:gen";

pub fn events_key(generation: u64) -> String {
    format!("events:v{}:all", generation)
}

pub fn event_key(generation: u64, slug: &str) -> String {
    format!("events:v{}:slug:{}", generation, slug)
}

impl CacheService {
    /// `None` when the cache is disabled or unreachable; callers then skip caching entirely.
    pub async fn generation(&self) -> Option<u64> {
        let mut conn = self.conn.as_ref()?.clone();

        let result: redis::RedisResult<Option<u64>> = conn.get(GENERATION_KEY).await;
        match result {
            Ok(generation) => Some(generation.unwrap_or(0)),
            Err(e) => {
                warn!("Cache generation read failed: {:?}", e);
                None
            }
        }
    }

    pub async fn get_events(&self, generation: u64) -> Option<Vec<Event>> {
        self.get_json(&events_key(generation)).await
    }

    pub async fn set_events(&self, generation: u64, events: &[Event]) {
        self.set_json(&events_key(generation), events).await;
    }

    pub async fn get_event(&self, generation: u64, slug: &str) -> Option<Event> {
        self.get_json(&event_key(generation, slug)).await
    }

    pub async fn set_event(&self, generation: u64, event: &Event) {
        self.set_json(&event_key(generation, &event.slug), event).await;
    }

    /// Retires every cached event entry. Call after the write has committed.
    pub async fn invalidate_events(&self) {
        let Some(conn) = &self.conn else { return };
        let mut conn = conn.clone();

        let result: redis::RedisResult<u64> = conn.incr(GENERATION_KEY, 1).await;
        match result {
            Ok(generation) => debug!("Event cache moved to generation {}", generation),
            Err(e) => warn!("Failed to invalidate event cache: {:?}", e),
        }
    }

    // === Raw JSON access ===
    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut conn = self.conn.as_ref()?.clone();

        let result: redis::RedisResult<Option<String>> = conn.get(key).await;
        let data = match result {
            Ok(data) => data,
            Err(e) => {
                warn!("Cache read failed for {}: {:?}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&data?) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Discarding unreadable cache entry {}: {}", key, e);
                None
            }
        }
    }

    async fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let Some(conn) = &self.conn else { return };

        let data = match serde_json::to_string(value) {
            Ok(data) => data,
            Err(e) => {
                warn!("Failed to serialize cache entry {}: {}", key, e);
                return;
            }
        };

        let mut conn = conn.clone();
        let result: redis::RedisResult<()> = conn.set_ex(key, data, self.ttl_seconds).await;
        if let Err(e) = result {
            warn!("Cache write failed for {}: {:?}", key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_carry_the_generation() {
        assert_eq!(event_key(3, "react-conf-2026"), "events:v3:slug:react-conf-2026");
        assert_eq!(events_key(3), "events:v3:all");
        assert_ne!(event_key(3, "a"), event_key(4, "a"));
        assert_ne!(events_key(3), events_key(4));
    }

    #[tokio::test]
    async fn disabled_cache_has_no_generation_and_always_misses() {
        let cache = CacheService::disabled();
        assert!(!cache.is_enabled());
        assert!(cache.generation().await.is_none());
        assert!(cache.get_events(0).await.is_none());
        assert!(cache.get_event(0, "anything").await.is_none());
        cache.set_events(0, &[]).await;
        cache.invalidate_events().await;
        assert!(cache.get_events(0).await.is_none());
    }
}
