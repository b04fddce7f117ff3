//! Process-local implementation of the durable store.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::entities::ShortLink;
use crate::domain::repositories::{DurableStore, StoreError};

/// In-memory store for development and tests.
///
/// Keeps rows in insertion order and, like the PostgreSQL store, allows
/// duplicate slugs, resolving them to the most recently created row.
/// Nothing survives a restart.
#[derive(Default)]
pub struct MemoryRecordStore {
    rows: RwLock<Vec<ShortLink>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `links`.
    pub fn with_links(links: Vec<ShortLink>) -> Self {
        Self {
            rows: RwLock::new(links),
        }
    }
}

/// Index of the row representing `slug`: highest `created_at`, latest insert on ties.
fn latest_index(rows: &[ShortLink], slug: &str) -> Option<usize> {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| row.slug == slug)
        .max_by_key(|(i, row)| (row.created_at, *i))
        .map(|(i, _)| i)
}

#[async_trait]
impl DurableStore for MemoryRecordStore {
    async fn insert(&self, link: ShortLink) -> Result<(), StoreError> {
        if link.slug.is_empty() || link.target.is_empty() {
            return Err(StoreError::Constraint(
                "slug and target must be non-empty".to_string(),
            ));
        }

        self.rows.write().await.push(link);
        Ok(())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<ShortLink>, StoreError> {
        let rows = self.rows.read().await;
        Ok(latest_index(&rows, slug).map(|i| rows[i].clone()))
    }

    async fn update_target(
        &self,
        slug: &str,
        target: &str,
        created_at: u64,
    ) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;
        if let Some(i) = latest_index(&rows, slug) {
            rows[i].target = target.to_string();
            rows[i].created_at = created_at;
        }
        Ok(())
    }

    async fn increment_hits(&self, slug: &str) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;
        if let Some(i) = latest_index(&rows, slug) {
            rows[i].hits = rows[i].hits.saturating_add(1);
        }
        Ok(())
    }

    async fn delete(&self, slug: &str) -> Result<bool, StoreError> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|row| row.slug != slug);
        Ok(rows.len() < before)
    }

    async fn list_all(&self) -> Result<Vec<ShortLink>, StoreError> {
        Ok(self.rows.read().await.clone())
    }

    async fn health_check(&self) -> bool {
        true
    }
}
