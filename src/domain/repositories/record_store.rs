//! Repository trait for the durable short link store.

use crate::domain::entities::ShortLink;
use async_trait::async_trait;

/// Errors reported by a [`DurableStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The call did not finish within its deadline.
    #[error("store call timed out after {0}ms")]
    Timeout(u64),

    /// The store refused the write (constraint or check violation).
    #[error("store constraint violated: {0}")]
    Constraint(String),

    /// A value does not fit the store's column type.
    #[error("value out of storable range: {0}")]
    OutOfRange(&'static str),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Authoritative store for short link records.
///
/// Every record the cache holds must already be durable here. Failures are
/// always reported; callers decide whether to surface or absorb them.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgRecordStore`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemoryRecordStore`] - process-local implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Inserts a new record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Constraint`] if the record violates a store constraint,
    /// [`StoreError::Database`] on connection or write failures.
    async fn insert(&self, link: ShortLink) -> Result<(), StoreError>;

    /// Finds a record by slug.
    ///
    /// When duplicates exist, the most recently created one wins.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<ShortLink>, StoreError>;

    /// Replaces the target and creation time of a record.
    ///
    /// Succeeds without effect when the slug is absent; callers must not assume
    /// the record exists afterwards.
    async fn update_target(
        &self,
        slug: &str,
        target: &str,
        created_at: u64,
    ) -> Result<(), StoreError>;

    /// Adds one to the hit counter of a record.
    async fn increment_hits(&self, slug: &str) -> Result<(), StoreError>;

    /// Deletes a record.
    ///
    /// Returns `Ok(true)` if something was deleted, `Ok(false)` if the slug was absent.
    async fn delete(&self, slug: &str) -> Result<bool, StoreError>;

    /// Lists every stored record.
    async fn list_all(&self) -> Result<Vec<ShortLink>, StoreError>;

    /// Checks whether the store is reachable.
    async fn health_check(&self) -> bool;
}
