//! ShortLink entity representing a slug → target URL mapping.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A shortened URL record.
///
/// `slug` is the natural key: assigned once at creation and never changed.
/// `hits` only grows, and is mutated independently of `target`/`created_at`.
///
/// The same JSON shape is used for the cache payload and the API response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortLink {
    pub slug: String,
    pub target: String,
    /// Unix seconds.
    #[serde(rename = "created")]
    pub created_at: u64,
    pub hits: u64,
}

impl ShortLink {
    /// Creates a new ShortLink instance.
    pub fn new(slug: String, target: String, created_at: u64, hits: u64) -> Self {
        Self {
            slug,
            target,
            created_at,
            hits,
        }
    }

    /// Builds a freshly created record: stamped with the current time and one hit.
    pub fn fresh(slug: String, target: String) -> Self {
        Self::new(slug, target, now_unix(), 1)
    }
}

/// Current wall-clock time in unix seconds.
pub fn now_unix() -> u64 {
    // Clocks before 1970 collapse to zero rather than wrapping.
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}
