//! PostgreSQL implementation of the durable store.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::error::ErrorKind;
use std::sync::Arc;
use tracing::debug;

use crate::domain::entities::ShortLink;
use crate::domain::repositories::{DurableStore, StoreError};

/// Row shape of the `short_links` table.
#[derive(Debug, sqlx::FromRow)]
struct ShortLinkRow {
    slug: String,
    target: String,
    created_at: i64,
    hits: i64,
}

impl TryFrom<ShortLinkRow> for ShortLink {
    type Error = StoreError;

    fn try_from(row: ShortLinkRow) -> Result<Self, Self::Error> {
        Ok(ShortLink::new(
            row.slug,
            row.target,
            u64::try_from(row.created_at).map_err(|_| StoreError::OutOfRange("created_at"))?,
            u64::try_from(row.hits).map_err(|_| StoreError::OutOfRange("hits"))?,
        ))
    }
}

fn to_column(value: u64, field: &'static str) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::OutOfRange(field))
}

/// Separates constraint violations from connectivity failures on writes.
fn map_write_error(e: sqlx::Error) -> StoreError {
    if let Some(db) = e.as_database_error() {
        match db.kind() {
            ErrorKind::UniqueViolation
            | ErrorKind::NotNullViolation
            | ErrorKind::CheckViolation
            | ErrorKind::ForeignKeyViolation => {
                return StoreError::Constraint(db.message().to_string());
            }
            _ => {}
        }
    }

    StoreError::Database(e)
}

/// Updates touch only the row that represents a slug: the most recently created one.
const UPDATE_TARGET: &str = r#"
    UPDATE short_links SET target = $2, created_at = $3
    WHERE id = (
        SELECT id FROM short_links WHERE slug = $1 ORDER BY created_at DESC, id DESC LIMIT 1
    )
"#;

const INCREMENT_HITS: &str = r#"
    UPDATE short_links SET hits = hits + 1
    WHERE id = (
        SELECT id FROM short_links WHERE slug = $1 ORDER BY created_at DESC, id DESC LIMIT 1
    )
"#;

/// PostgreSQL store for short link records.
///
/// Uses bound parameters for every query; the pool is shared by all callers.
pub struct PgRecordStore {
    pool: Arc<PgPool>,
}

impl PgRecordStore {
    /// Creates a new store with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DurableStore for PgRecordStore {
    async fn insert(&self, link: ShortLink) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO short_links (slug, target, created_at, hits) VALUES ($1, $2, $3, $4)",
        )
        .bind(&link.slug)
        .bind(&link.target)
        .bind(to_column(link.created_at, "created_at")?)
        .bind(to_column(link.hits, "hits")?)
        .execute(self.pool.as_ref())
        .await
        .map_err(map_write_error)?;

        debug!(slug = %link.slug, target = %link.target, "Inserted short link");
        Ok(())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<ShortLink>, StoreError> {
        let row = sqlx::query_as::<_, ShortLinkRow>(
            r#"
            SELECT slug, target, created_at, hits
            FROM short_links
            WHERE slug = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(slug)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(ShortLink::try_from).transpose()
    }

    async fn update_target(
        &self,
        slug: &str,
        target: &str,
        created_at: u64,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(UPDATE_TARGET)
            .bind(slug)
            .bind(target)
            .bind(to_column(created_at, "created_at")?)
            .execute(self.pool.as_ref())
            .await
            .map_err(map_write_error)?;

        debug!(slug, rows = result.rows_affected(), "Updated short link target");
        Ok(())
    }

    async fn increment_hits(&self, slug: &str) -> Result<(), StoreError> {
        sqlx::query(INCREMENT_HITS)
            .bind(slug)
            .execute(self.pool.as_ref())
            .await
            .map_err(map_write_error)?;

        Ok(())
    }

    async fn delete(&self, slug: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM short_links WHERE slug = $1")
            .bind(slug)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_all(&self) -> Result<Vec<ShortLink>, StoreError> {
        let rows = sqlx::query_as::<_, ShortLinkRow>(
            "SELECT slug, target, created_at, hits FROM short_links ORDER BY id",
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.into_iter().map(ShortLink::try_from).collect()
    }

    async fn health_check(&self) -> bool {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(self.pool.as_ref())
            .await
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_conversion() {
        let row = ShortLinkRow {
            slug: "AB12".to_string(),
            target: "https://example.com".to_string(),
            created_at: 1_700_000_000,
            hits: 5,
        };

        let link = ShortLink::try_from(row).unwrap();
        assert_eq!(link.slug, "AB12");
        assert_eq!(link.hits, 5);
    }

    #[test]
    fn test_row_conversion_rejects_negative_hits() {
        let row = ShortLinkRow {
            slug: "AB12".to_string(),
            target: "https://example.com".to_string(),
            created_at: 0,
            hits: -1,
        };

        assert!(matches!(
            ShortLink::try_from(row),
            Err(StoreError::OutOfRange("hits"))
        ));
    }

    #[test]
    fn test_to_column_rejects_overflow() {
        assert!(to_column(u64::MAX, "hits").is_err());
        assert_eq!(to_column(42, "hits").unwrap(), 42);
    }
}
