//! No-op cache implementation for disabled caching.

use super::service::BestEffortCache;
use crate::domain::entities::ShortLink;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// A cache that stores nothing and always misses.
///
/// Used when Redis is not configured or could not be reached at startup.
pub struct NullCache;

impl NullCache {
    /// Creates a new NullCache instance.
    pub fn new() -> Self {
        debug!("Using NullCache (caching disabled)");
        Self
    }
}

impl Default for NullCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BestEffortCache for NullCache {
    async fn get(&self, _slug: &str) -> Option<ShortLink> {
        None
    }

    async fn set(&self, _link: &ShortLink, _ttl: Duration) {}

    async fn delete(&self, _slug: &str) {}

    async fn health_check(&self) -> bool {
        true
    }
}
