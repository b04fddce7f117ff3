//! Counter-range slug allocator.
//!
//! The allocator owns one contiguous range of integers and a cursor into it.
//! Every [`SlugAllocator::acquire`] hands out the next unused integer; when
//! the range runs dry it is refilled from a [`RangeAuthority`] while the lock
//! is held, so concurrent callers queue behind the refill instead of racing it.
//!
//! # Persistence
//!
//! On graceful shutdown the unused tail is written to a range file
//! ([`SlugAllocator::save`]). On startup [`SlugAllocator::load`] reads it and
//! deletes it before the range is installed, so a crash at any later point
//! can never reload the same range twice. A crash forfeits the tail.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::domain::range_authority::RangeAuthority;
use crate::domain::range_file;

/// Errors raised by the allocator and its persistence.
#[derive(Debug, thiserror::Error)]
pub enum AllocatorError {
    /// No fresh range could be obtained; the in-flight create must fail.
    #[error("range authority unavailable: {0}")]
    RangeAuthority(String),

    /// The persisted range file exists but does not hold a valid range.
    #[error("malformed range file {}: {reason}", path.display())]
    MalformedRange { path: PathBuf, reason: String },

    #[error("range file I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Unissued capacity `[current, end)` owned by one allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterRange {
    pub current: u64,
    pub end: u64,
}

impl CounterRange {
    pub fn new(current: u64, end: u64) -> Self {
        Self { current, end }
    }

    /// Number of values left to issue.
    pub fn remaining(&self) -> u64 {
        self.end.saturating_sub(self.current)
    }

    pub fn is_exhausted(&self) -> bool {
        self.current >= self.end
    }
}

/// Hands out process-unique integers for slug encoding.
///
/// Owned by the composition root and shared through `Arc`.
pub struct SlugAllocator {
    range: Mutex<CounterRange>,
    authority: Arc<dyn RangeAuthority>,
}

impl SlugAllocator {
    /// Creates an allocator with an empty range; the first acquire refills.
    pub fn new(authority: Arc<dyn RangeAuthority>) -> Self {
        Self::with_range(authority, CounterRange::default())
    }

    /// Creates an allocator starting from an existing range.
    pub fn with_range(authority: Arc<dyn RangeAuthority>, range: CounterRange) -> Self {
        Self {
            range: Mutex::new(range),
            authority,
        }
    }

    /// Returns a value never returned before by this allocator.
    ///
    /// # Errors
    ///
    /// Returns [`AllocatorError::RangeAuthority`] if the range is exhausted and
    /// the authority cannot grant a new one. Nothing is retried.
    pub async fn acquire(&self) -> Result<u64, AllocatorError> {
        let mut range = self.range.lock().await;

        if !range.is_exhausted() {
            let value = range.current;
            range.current += 1;
            return Ok(value);
        }

        let fresh = self.authority.next_range(range.end).await?;
        if fresh.current == 0 || fresh.is_exhausted() || fresh.current < range.end {
            return Err(AllocatorError::RangeAuthority(format!(
                "authority granted unusable range {}..{} after {}",
                fresh.current, fresh.end, range.end
            )));
        }

        metrics::counter!("slug_range_refills_total").increment(1);
        info!(
            current = fresh.current,
            end = fresh.end,
            "Refilled counter range"
        );

        *range = CounterRange::new(fresh.current + 1, fresh.end);
        Ok(fresh.current)
    }

    /// Snapshot of the current range.
    pub async fn range(&self) -> CounterRange {
        *self.range.lock().await
    }

    /// Loads a persisted range, deletes the file, then installs the range.
    ///
    /// # Errors
    ///
    /// Returns [`AllocatorError::MalformedRange`] for unparsable content (the
    /// file is left in place for the operator) and [`AllocatorError::Io`] if
    /// the file cannot be read or removed.
    pub async fn load(&self, path: &Path) -> Result<CounterRange, AllocatorError> {
        let loaded = range_file::take(path).await?;
        *self.range.lock().await = loaded;

        info!(
            current = loaded.current,
            end = loaded.end,
            path = %path.display(),
            "Loaded counter range from file"
        );

        Ok(loaded)
    }

    /// Writes the unused tail of the range to `path`.
    ///
    /// Must run after new allocations have stopped.
    pub async fn save(&self, path: &Path) -> Result<CounterRange, AllocatorError> {
        let range = *self.range.lock().await;
        range_file::write(path, range).await?;

        debug!(
            current = range.current,
            end = range.end,
            path = %path.display(),
            "Saved counter range to file"
        );

        Ok(range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::range_authority::FixedRangeAuthority;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Authority that counts grants and can be switched off.
    struct CountingAuthority {
        inner: FixedRangeAuthority,
        calls: AtomicUsize,
        reachable: bool,
    }

    impl CountingAuthority {
        fn new(start: u64, size: u64) -> Self {
            Self {
                inner: FixedRangeAuthority::new(start, size),
                calls: AtomicUsize::new(0),
                reachable: true,
            }
        }

        fn unreachable() -> Self {
            Self {
                reachable: false,
                ..Self::new(1, 1)
            }
        }
    }

    #[async_trait]
    impl RangeAuthority for CountingAuthority {
        async fn next_range(&self, after: u64) -> Result<CounterRange, AllocatorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.reachable {
                return Err(AllocatorError::RangeAuthority("unreachable".to_string()));
            }
            self.inner.next_range(after).await
        }
    }

    #[tokio::test]
    async fn test_first_acquire_refills_from_authority() {
        let allocator = SlugAllocator::new(Arc::new(FixedRangeAuthority::default()));

        assert_eq!(allocator.acquire().await.unwrap(), 1_000_000);
        assert_eq!(allocator.acquire().await.unwrap(), 1_000_001);
        assert_eq!(
            allocator.range().await,
            CounterRange::new(1_000_002, 2_000_000)
        );
    }

    #[tokio::test]
    async fn test_acquire_from_existing_range() {
        let allocator = SlugAllocator::with_range(
            Arc::new(FixedRangeAuthority::default()),
            CounterRange::new(100, 200),
        );

        assert_eq!(allocator.acquire().await.unwrap(), 100);
        assert_eq!(allocator.acquire().await.unwrap(), 101);
    }

    #[tokio::test]
    async fn test_exhausted_range_refills_exactly_once() {
        let authority = Arc::new(CountingAuthority::new(1_000, 100));
        let allocator = SlugAllocator::with_range(authority.clone(), CounterRange::new(500, 500));

        assert_eq!(allocator.acquire().await.unwrap(), 1_000);
        assert_eq!(allocator.acquire().await.unwrap(), 1_001);
        assert_eq!(authority.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refill_never_goes_below_previous_end() {
        let authority = Arc::new(CountingAuthority::new(1, 10));
        let allocator = SlugAllocator::with_range(authority, CounterRange::new(5, 8));

        let values: Vec<u64> = vec![
            allocator.acquire().await.unwrap(),
            allocator.acquire().await.unwrap(),
            allocator.acquire().await.unwrap(),
            allocator.acquire().await.unwrap(),
        ];

        assert_eq!(values, vec![5, 6, 7, 8]);
    }

    #[tokio::test]
    async fn test_unreachable_authority_is_reported() {
        let allocator = SlugAllocator::new(Arc::new(CountingAuthority::unreachable()));

        let result = allocator.acquire().await;
        assert!(matches!(result, Err(AllocatorError::RangeAuthority(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_acquire_is_unique() {
        let allocator = Arc::new(SlugAllocator::new(Arc::new(FixedRangeAuthority::default())));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let allocator = allocator.clone();
            handles.push(tokio::spawn(async move {
                let mut values = Vec::with_capacity(250);
                for _ in 0..250 {
                    values.push(allocator.acquire().await.unwrap());
                }
                values
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            for value in handle.await.unwrap() {
                assert!(seen.insert(value), "duplicate value {}", value);
            }
        }
        assert_eq!(seen.len(), 4_000);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_refill_at_boundary() {
        let authority = Arc::new(CountingAuthority::new(1_000, 1_000));
        let allocator = Arc::new(SlugAllocator::with_range(
            authority.clone(),
            CounterRange::new(10, 10),
        ));

        let mut handles = Vec::new();
        for _ in 0..32 {
            let allocator = allocator.clone();
            handles.push(tokio::spawn(async move { allocator.acquire().await.unwrap() }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            assert!(seen.insert(handle.await.unwrap()));
        }

        assert_eq!(authority.calls.load(Ordering::SeqCst), 1);
        assert!(seen.contains(&1_000));
        assert_eq!(seen.len(), 32);
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counter_range.dat");

        let saved = SlugAllocator::with_range(
            Arc::new(FixedRangeAuthority::default()),
            CounterRange::new(100, 200),
        );
        saved.save(&path).await.unwrap();

        let restored = SlugAllocator::new(Arc::new(FixedRangeAuthority::default()));
        let loaded = restored.load(&path).await.unwrap();

        assert_eq!(loaded, CounterRange::new(100, 200));
        assert!(!path.exists());
        assert_eq!(restored.acquire().await.unwrap(), 100);
        assert_eq!(restored.acquire().await.unwrap(), 101);
    }

    #[tokio::test]
    async fn test_load_malformed_keeps_range_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counter_range.dat");
        std::fs::write(&path, "garbage").unwrap();

        let allocator = SlugAllocator::new(Arc::new(FixedRangeAuthority::default()));
        let result = allocator.load(&path).await;

        assert!(matches!(result, Err(AllocatorError::MalformedRange { .. })));
        assert_eq!(allocator.range().await, CounterRange::default());
        assert!(path.exists());
    }

    #[test]
    fn test_counter_range_remaining() {
        assert_eq!(CounterRange::new(100, 200).remaining(), 100);
        assert_eq!(CounterRange::new(200, 200).remaining(), 0);
        assert!(CounterRange::new(200, 200).is_exhausted());
        assert!(!CounterRange::new(199, 200).is_exhausted());
    }
}
