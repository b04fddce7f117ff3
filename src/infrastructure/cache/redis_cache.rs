//! Redis-backed cache implementation.

use super::service::{BestEffortCache, CacheError, CacheResult};
use crate::domain::entities::ShortLink;
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Redis cache holding JSON-serialized records.
///
/// Uses a multiplexed `ConnectionManager` shared by all callers. Every command
/// is bounded by `op_timeout`; errors and timeouts are logged and degrade to a
/// miss or a no-op.
pub struct RedisCache {
    client: ConnectionManager,
    op_timeout: Duration,
    key_prefix: String,
}

impl RedisCache {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Arguments
    ///
    /// - `redis_url` - Redis connection string (e.g., `"redis://localhost:6379"`)
    /// - `op_timeout` - deadline applied to every cache command
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is invalid, the connection cannot
    /// be established, or the PING health check fails.
    pub async fn connect(redis_url: &str, op_timeout: Duration) -> CacheResult<Self> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = timeout(op_timeout * 2, ConnectionManager::new(client))
            .await
            .map_err(|_| CacheError::ConnectionError("Timed out connecting to Redis".to_string()))?
            .map_err(|e| {
                CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
            })?;

        let mut test_conn = manager.clone();
        timeout(op_timeout, test_conn.ping::<()>())
            .await
            .map_err(|_| CacheError::ConnectionError("Redis PING timed out".to_string()))?
            .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        info!("✓ Connected to Redis");

        Ok(Self {
            client: manager,
            op_timeout,
            key_prefix: "link:".to_string(),
        })
    }

    /// Constructs the full Redis key with namespace prefix.
    fn build_key(&self, slug: &str) -> String {
        format!("{}{}", self.key_prefix, slug)
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, String>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        bounded(self.op_timeout, fut).await
    }
}

/// Runs a command under the cache deadline, flattening timeout into an error string.
async fn bounded<T, F>(op_timeout: Duration, fut: F) -> Result<T, String>
where
    F: Future<Output = redis::RedisResult<T>>,
{
    match timeout(op_timeout, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!("timed out after {:?}", op_timeout)),
    }
}

/// Decodes a cached payload; anything unreadable is logged and treated as a miss.
fn decode_entry(slug: &str, payload: &str) -> Option<ShortLink> {
    match serde_json::from_str::<ShortLink>(payload) {
        Ok(link) => {
            debug!(slug, target = %link.target, "Cache HIT");
            Some(link)
        }
        Err(e) => {
            warn!(slug, error = %e, "Undecodable cache entry");
            None
        }
    }
}

#[async_trait]
impl BestEffortCache for RedisCache {
    async fn get(&self, slug: &str) -> Option<ShortLink> {
        let key = self.build_key(slug);
        let mut conn = self.client.clone();

        let payload = match self.bounded(conn.get::<_, Option<String>>(&key)).await {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                debug!(slug, "Cache MISS");
                return None;
            }
            Err(e) => {
                warn!(slug, error = %e, "Redis GET failed");
                return None;
            }
        };

        decode_entry(slug, &payload)
    }

    async fn set(&self, link: &ShortLink, ttl: Duration) {
        let payload = match serde_json::to_string(link) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(slug = %link.slug, error = %e, "Failed to encode cache entry");
                return;
            }
        };

        let key = self.build_key(&link.slug);
        let mut conn = self.client.clone();
        let ttl_seconds = ttl.as_secs().max(1);

        match self
            .bounded(conn.set_ex::<_, _, ()>(&key, payload, ttl_seconds))
            .await
        {
            Ok(()) => debug!(slug = %link.slug, ttl_seconds, "Cache SET"),
            Err(e) => warn!(slug = %link.slug, error = %e, "Redis SET failed"),
        }
    }

    async fn delete(&self, slug: &str) {
        let key = self.build_key(slug);
        let mut conn = self.client.clone();

        match self.bounded(conn.del::<_, i32>(&key)).await {
            Ok(deleted) => {
                if deleted > 0 {
                    debug!(slug, "Cache DELETE");
                }
            }
            Err(e) => warn!(slug, error = %e, "Redis DEL failed"),
        }
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        self.bounded(conn.ping::<()>()).await.is_ok()
    }
}
