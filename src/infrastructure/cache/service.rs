//! Cache trait and error types.

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

use crate::domain::entities::ShortLink;

/// Errors raised while setting up a cache backend.
///
/// Once a cache is running, its failures never leave the adapter.
#[derive(Debug)]
pub enum CacheError {
    ConnectionError(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ConnectionError(e) => write!(f, "Cache connection error: {}", e),
        }
    }
}

impl std::error::Error for CacheError {}

/// Result type for cache setup.
pub type CacheResult<T> = Result<T, CacheError>;

/// Best-effort copy of short link records.
///
/// The cache is never authoritative and may be disabled, empty or failing;
/// the service must behave the same in all three cases. None of these methods
/// can fail: implementations log their own errors and degrade to a miss or a
/// no-op.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache with TTL
/// - [`crate::infrastructure::cache::NullCache`] - No-op implementation for disabled caching
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BestEffortCache: Send + Sync {
    /// Looks up a record by slug.
    ///
    /// `None` on a miss, a backend error or an undecodable entry.
    async fn get(&self, slug: &str) -> Option<ShortLink>;

    /// Stores a copy of a record for `ttl`.
    async fn set(&self, link: &ShortLink, ttl: Duration);

    /// Drops the cached copy of a record, if any.
    async fn delete(&self, slug: &str);

    /// Checks if the cache backend is healthy.
    async fn health_check(&self) -> bool;
}
