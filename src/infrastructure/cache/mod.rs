//! Caching layer for fast slug lookups.
//!
//! Provides a [`BestEffortCache`] trait with two implementations:
//! - [`RedisCache`] - Production Redis-backed cache
//! - [`NullCache`] - No-op implementation for disabled caching

mod null_cache;
mod redis_cache;
mod service;

pub use null_cache::NullCache;
pub use redis_cache::RedisCache;
pub use service::{BestEffortCache, CacheError, CacheResult};

#[cfg(test)]
pub use service::MockBestEffortCache;
