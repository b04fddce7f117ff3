//! Short link lifecycle across the durable store and the cache.
//!
//! The store is the system of record; the cache is a best-effort copy.
//!
//! - **Create** writes the store first and the cache second, so a cache hit
//!   always implies the record is durable.
//! - **Read** probes the cache, falls back to the store and backfills. Hits
//!   are always counted in the store, so cached copies may lag on `hits`.
//! - **Update** rewrites target and creation time in the store, then
//!   overwrites the cached copy. The hit count is kept.
//! - **Delete** drops the cached copy, then deletes from the store; only the
//!   store decides whether the slug existed.
//!
//! Every store call is bounded by `store_timeout`. Write sequences run on a
//! spawned task the caller awaits, so a cancelled request still finishes its
//! store write and the matching cache write.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde_json::json;
use tokio::time::timeout;
use tracing::{debug, error, warn};

use crate::domain::allocator::SlugAllocator;
use crate::domain::entities::{ShortLink, now_unix};
use crate::domain::repositories::{DurableStore, StoreError};
use crate::error::AppError;
use crate::infrastructure::cache::BestEffortCache;
use crate::utils::base62;
use crate::utils::target_url::validate_target;

/// Store and cache handles shared by request tasks and write tasks.
#[derive(Clone)]
struct Backends {
    store: Arc<dyn DurableStore>,
    cache: Arc<dyn BestEffortCache>,
    cache_ttl: Duration,
    store_timeout: Duration,
}

impl Backends {
    /// Runs a store call under the store deadline.
    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        match timeout(self.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(
                u64::try_from(self.store_timeout.as_millis()).unwrap_or(u64::MAX),
            )),
        }
    }

    /// Counts a hit in the store. Failures are logged and absorbed.
    async fn record_hit(&self, slug: &str) {
        if let Err(e) = self.bounded(self.store.increment_hits(slug)).await {
            counter!("slug_hit_increment_failures_total").increment(1);
            warn!(slug, error = %e, "Failed to increment hits");
        }
    }

    /// Store insert, then cache write.
    async fn insert_link(self, link: ShortLink) -> Result<ShortLink, AppError> {
        if let Err(e) = self.bounded(self.store.insert(link.clone())).await {
            error!(slug = %link.slug, error = %e, "Failed to create short link");
            return Err(AppError::from(e));
        }

        self.cache.set(&link, self.cache_ttl).await;
        debug!(slug = %link.slug, target = %link.target, "Created short link");

        Ok(link)
    }

    /// Existence check, store rewrite, then cache overwrite.
    async fn retarget_link(self, slug: String, target: String) -> Result<ShortLink, AppError> {
        let current = self
            .bounded(self.store.find_by_slug(&slug))
            .await?
            .ok_or_else(|| link_not_found(&slug))?;

        let updated = ShortLink::new(slug, target, now_unix(), current.hits);
        self.bounded(
            self.store
                .update_target(&updated.slug, &updated.target, updated.created_at),
        )
        .await
        .inspect_err(|e| error!(slug = %updated.slug, error = %e, "Failed to update short link"))?;

        self.cache.set(&updated, self.cache_ttl).await;
        debug!(slug = %updated.slug, target = %updated.target, "Updated short link");

        Ok(updated)
    }

    /// Cache invalidation, then store delete.
    async fn remove_link(self, slug: String) -> Result<(), AppError> {
        self.cache.delete(&slug).await;

        let deleted = self
            .bounded(self.store.delete(&slug))
            .await
            .inspect_err(|e| error!(slug = %slug, error = %e, "Failed to delete short link"))?;

        if !deleted {
            return Err(link_not_found(&slug));
        }

        // A read racing the delete may have backfilled the cache in between.
        self.cache.delete(&slug).await;
        debug!(slug = %slug, "Deleted short link");

        Ok(())
    }
}

/// Awaits a write sequence on its own task so it outlives a cancelled caller.
async fn run_detached<T, F>(write: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, AppError>> + Send + 'static,
{
    tokio::spawn(write).await.map_err(|e| {
        error!(error = %e, "Write task failed");
        AppError::internal("Write task failed", json!({}))
    })?
}

fn link_not_found(slug: &str) -> AppError {
    AppError::not_found("Short URL not found.", json!({ "slug": slug }))
}

fn invalid_target(target: &str, reason: impl ToString) -> AppError {
    AppError::bad_request(
        "Invalid URL for shortening.",
        json!({ "target": target, "reason": reason.to_string() }),
    )
}

/// Coordinates slug allocation, the durable store and the cache.
pub struct LinkService {
    allocator: Arc<SlugAllocator>,
    backends: Backends,
}

impl LinkService {
    /// Creates a new link service.
    ///
    /// - `cache_ttl` - expiry of every cache entry written
    /// - `store_timeout` - deadline of every store call
    pub fn new(
        allocator: Arc<SlugAllocator>,
        store: Arc<dyn DurableStore>,
        cache: Arc<dyn BestEffortCache>,
        cache_ttl: Duration,
        store_timeout: Duration,
    ) -> Self {
        Self {
            allocator,
            backends: Backends {
                store,
                cache,
                cache_ttl,
                store_timeout,
            },
        }
    }

    /// Shortens `target` under a freshly allocated slug.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the target is not an absolute
    /// http(s) URL, [`AppError::ServiceUnavailable`] if no slug can be
    /// allocated or the store write fails. A failing cache never fails a create.
    pub async fn create(&self, target: &str) -> Result<ShortLink, AppError> {
        let target_url = validate_target(target).map_err(|e| invalid_target(target, e))?;

        let id = self.allocator.acquire().await.map_err(|e| {
            error!(error = %e, "Slug allocation failed");
            AppError::from(e)
        })?;
        let link = ShortLink::fresh(base62::encode(id), target_url);

        run_detached(self.backends.clone().insert_link(link)).await
    }

    /// Resolves a slug and counts the hit.
    ///
    /// The returned record may carry a hit count that lags the store.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the slug is unknown. Store failures on
    /// this path are indistinguishable from absence and also yield NotFound.
    pub async fn resolve(&self, slug: &str) -> Result<ShortLink, AppError> {
        let backends = &self.backends;

        if let Some(link) = backends.cache.get(slug).await {
            counter!("slug_cache_hits_total").increment(1);
            backends.record_hit(slug).await;
            return Ok(link);
        }
        counter!("slug_cache_misses_total").increment(1);

        let found = match backends.bounded(backends.store.find_by_slug(slug)).await {
            Ok(found) => found,
            Err(e) => {
                error!(slug, error = %e, "Store lookup failed");
                None
            }
        };

        let Some(link) = found else {
            debug!(slug, "Short link not found");
            return Err(link_not_found(slug));
        };

        backends.record_hit(slug).await;
        backends.cache.set(&link, backends.cache_ttl).await;

        Ok(link)
    }

    /// Points an existing slug at a new target.
    ///
    /// The creation time is refreshed; the hit count is kept.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for a bad target, [`AppError::NotFound`]
    /// if the slug is unknown, [`AppError::ServiceUnavailable`] on store failure.
    pub async fn update(&self, slug: &str, target: &str) -> Result<ShortLink, AppError> {
        let target_url = validate_target(target).map_err(|e| invalid_target(target, e))?;

        run_detached(
            self.backends
                .clone()
                .retarget_link(slug.to_string(), target_url),
        )
        .await
    }

    /// Deletes a slug.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the store holds no such slug, even when
    /// a cached copy existed; [`AppError::ServiceUnavailable`] on store failure.
    pub async fn delete(&self, slug: &str) -> Result<(), AppError> {
        run_detached(self.backends.clone().remove_link(slug.to_string())).await
    }

    /// Lists every record in the store.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ServiceUnavailable`] on store failure.
    pub async fn list_all(&self) -> Result<Vec<ShortLink>, AppError> {
        let backends = &self.backends;
        backends
            .bounded(backends.store.list_all())
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to list short links");
                AppError::from(e)
            })
    }

    /// Reports whether the store is reachable within its deadline.
    pub async fn store_healthy(&self) -> bool {
        timeout(self.backends.store_timeout, self.backends.store.health_check())
            .await
            .unwrap_or(false)
    }

    /// Reports whether the cache backend answers.
    pub async fn cache_healthy(&self) -> bool {
        self.backends.cache.health_check().await
    }
}
