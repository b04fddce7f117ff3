//! Sources of fresh counter ranges for the slug allocator.

use async_trait::async_trait;
use tracing::debug;

use crate::domain::allocator::{AllocatorError, CounterRange};

/// First counter value handed out by [`FixedRangeAuthority::default`].
pub const DEFAULT_RANGE_START: u64 = 1_000_000;

/// Width of each range granted by [`FixedRangeAuthority::default`].
pub const DEFAULT_RANGE_SIZE: u64 = 1_000_000;

/// Grants non-overlapping counter ranges to an allocator.
///
/// `after` is the end of the range the caller is giving up. A grant must
/// start at or above it so a refill never re-issues values already covered
/// by the previous range.
///
/// Multi-instance deployments replace the fixed authority with a lease
/// service (a strongly consistent KV store with conditional writes) behind
/// this trait; the allocator does not change.
#[async_trait]
pub trait RangeAuthority: Send + Sync {
    /// Returns a fresh range `[current, end)` with `0 < current < end`.
    ///
    /// # Errors
    ///
    /// Returns [`AllocatorError::RangeAuthority`] if no range can be granted.
    async fn next_range(&self, after: u64) -> Result<CounterRange, AllocatorError>;
}

/// Single-process authority granting fixed-width blocks from a constant base.
///
/// Only safe for one allocator instance. After a crash (no persisted range)
/// it starts from the base again.
#[derive(Debug, Clone)]
pub struct FixedRangeAuthority {
    start: u64,
    size: u64,
}

impl FixedRangeAuthority {
    /// Creates an authority granting `size`-wide blocks starting at `start`.
    ///
    /// `start` is clamped to 1 so the allocator never issues zero.
    pub fn new(start: u64, size: u64) -> Self {
        Self {
            start: start.max(1),
            size: size.max(1),
        }
    }
}

impl Default for FixedRangeAuthority {
    fn default() -> Self {
        Self::new(DEFAULT_RANGE_START, DEFAULT_RANGE_SIZE)
    }
}

#[async_trait]
impl RangeAuthority for FixedRangeAuthority {
    async fn next_range(&self, after: u64) -> Result<CounterRange, AllocatorError> {
        let current = self.start.max(after);
        let end = current.checked_add(self.size).ok_or_else(|| {
            AllocatorError::RangeAuthority(format!("counter space exhausted at {}", current))
        })?;

        debug!(current, end, "Granted new counter range");

        Ok(CounterRange { current, end })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_range() {
        let authority = FixedRangeAuthority::default();
        let range = authority.next_range(0).await.unwrap();

        assert_eq!(range.current, 1_000_000);
        assert_eq!(range.end, 2_000_000);
    }

    #[tokio::test]
    async fn test_range_starts_after_previous_end() {
        let authority = FixedRangeAuthority::default();
        let range = authority.next_range(2_000_000).await.unwrap();

        assert_eq!(range.current, 2_000_000);
        assert_eq!(range.end, 3_000_000);
    }

    #[tokio::test]
    async fn test_exhausted_counter_space() {
        let authority = FixedRangeAuthority::new(1, 10);
        let result = authority.next_range(u64::MAX - 5).await;

        assert!(matches!(result, Err(AllocatorError::RangeAuthority(_))));
    }

    #[test]
    fn test_zero_start_is_clamped() {
        let authority = FixedRangeAuthority::new(0, 0);
        assert_eq!(authority.start, 1);
        assert_eq!(authority.size, 1);
    }
}
