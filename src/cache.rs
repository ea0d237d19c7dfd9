use std::time::Duration;

use axum::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use tracing::{debug, warn};

/// Best-effort read-through cache.
///
/// The interface is infallible on purpose: a cache outage must degrade to
/// direct store reads, never fail the surrounding request. Implementations
/// log and swallow their own errors.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn put(&self, key: &str, value: &str, ttl: Duration);
    async fn invalidate(&self, key: &str);
}

/// Redis-backed cache on a `ConnectionManager` (auto-reconnecting).
#[derive(Clone)]
pub struct RedisCache {
    manager: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(url)?;
        let manager = client.get_connection_manager().await?;
        Ok(Self { manager })
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Option<String> {
        let mut conn = self.manager.clone();
        match conn.get::<_, Option<String>>(key).await {
            Ok(Some(val)) => {
                debug!(key, "cache hit");
                Some(val)
            }
            Ok(None) => {
                debug!(key, "cache miss");
                None
            }
            Err(e) => {
                warn!(key, error = %e, "cache get failed; falling through to store");
                None
            }
        }
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) {
        let mut conn = self.manager.clone();
        if let Err(e) = conn
            .set_ex::<_, _, ()>(key, value, ttl.as_secs())
            .await
        {
            warn!(key, error = %e, "cache set failed");
        }
    }

    async fn invalidate(&self, key: &str) {
        let mut conn = self.manager.clone();
        if let Err(e) = conn.del::<_, ()>(key).await {
            warn!(key, error = %e, "cache delete failed");
        }
    }
}

/// Used when no REDIS_URL is configured (or in tests): every lookup misses.
#[derive(Clone, Copy, Default)]
pub struct NoopCache;

#[async_trait]
impl Cache for NoopCache {
    async fn get(&self, _key: &str) -> Option<String> {
        None
    }

    async fn put(&self, _key: &str, _value: &str, _ttl: Duration) {}

    async fn invalidate(&self, _key: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_cache_always_misses() {
        let cache = NoopCache;
        cache.put("k", "v", Duration::from_secs(60)).await;
        assert!(cache.get("k").await.is_none());
    }
}
