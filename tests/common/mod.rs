#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::TestServer;
use slug_shortener::application::services::LinkService;
use slug_shortener::domain::allocator::SlugAllocator;
use slug_shortener::domain::entities::ShortLink;
use slug_shortener::domain::range_authority::FixedRangeAuthority;
use slug_shortener::domain::repositories::{DurableStore, StoreError};
use slug_shortener::infrastructure::cache::BestEffortCache;
use slug_shortener::infrastructure::persistence::MemoryRecordStore;
use slug_shortener::routes::router;
use slug_shortener::state::AppState;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const CACHE_TTL: Duration = Duration::from_secs(3600);
pub const STORE_TIMEOUT: Duration = Duration::from_millis(200);
pub const MAX_SLUG_LEN: usize = 7;

/// In-memory cache whose reads and writes can be switched off mid-test.
#[derive(Default)]
pub struct SwitchableCache {
    entries: Mutex<HashMap<String, ShortLink>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl SwitchableCache {
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn peek(&self, slug: &str) -> Option<ShortLink> {
        self.entries.lock().unwrap().get(slug).cloned()
    }

    pub fn put(&self, link: ShortLink) {
        self.entries.lock().unwrap().insert(link.slug.clone(), link);
    }
}

#[async_trait]
impl BestEffortCache for SwitchableCache {
    async fn get(&self, slug: &str) -> Option<ShortLink> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return None;
        }
        self.peek(slug)
    }

    async fn set(&self, link: &ShortLink, _ttl: Duration) {
        if !self.fail_writes.load(Ordering::SeqCst) {
            self.put(link.clone());
        }
    }

    async fn delete(&self, slug: &str) {
        if !self.fail_writes.load(Ordering::SeqCst) {
            self.entries.lock().unwrap().remove(slug);
        }
    }

    async fn health_check(&self) -> bool {
        !self.fail_reads.load(Ordering::SeqCst) && !self.fail_writes.load(Ordering::SeqCst)
    }
}

/// Store that never answers, for exercising store deadlines.
pub struct StalledStore;

impl StalledStore {
    async fn stall<T>() -> Result<T, StoreError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Err(StoreError::Constraint("unreachable".to_string()))
    }
}

#[async_trait]
impl DurableStore for StalledStore {
    async fn insert(&self, _link: ShortLink) -> Result<(), StoreError> {
        Self::stall().await
    }

    async fn find_by_slug(&self, _slug: &str) -> Result<Option<ShortLink>, StoreError> {
        Self::stall().await
    }

    async fn update_target(
        &self,
        _slug: &str,
        _target: &str,
        _created_at: u64,
    ) -> Result<(), StoreError> {
        Self::stall().await
    }

    async fn increment_hits(&self, _slug: &str) -> Result<(), StoreError> {
        Self::stall().await
    }

    async fn delete(&self, _slug: &str) -> Result<bool, StoreError> {
        Self::stall().await
    }

    async fn list_all(&self) -> Result<Vec<ShortLink>, StoreError> {
        Self::stall().await
    }

    async fn health_check(&self) -> bool {
        Self::stall::<()>().await.is_ok()
    }
}

/// A wired application plus handles on its collaborators.
pub struct TestApp<S> {
    pub state: AppState,
    pub store: Arc<S>,
    pub cache: Arc<SwitchableCache>,
    pub allocator: Arc<SlugAllocator>,
}

impl<S> TestApp<S> {
    pub fn server(&self) -> TestServer {
        TestServer::new(router(self.state.clone())).unwrap()
    }
}

pub fn create_test_app_with_store<S>(store: Arc<S>) -> TestApp<S>
where
    S: DurableStore + 'static,
{
    let cache = Arc::new(SwitchableCache::default());
    let allocator = Arc::new(SlugAllocator::new(Arc::new(FixedRangeAuthority::default())));

    let link_service = Arc::new(LinkService::new(
        allocator.clone(),
        store.clone(),
        cache.clone(),
        CACHE_TTL,
        STORE_TIMEOUT,
    ));

    TestApp {
        state: AppState::new(link_service, MAX_SLUG_LEN),
        store,
        cache,
        allocator,
    }
}

pub fn create_test_app() -> TestApp<MemoryRecordStore> {
    create_test_app_with_store(Arc::new(MemoryRecordStore::new()))
}

pub fn create_test_app_with_links(links: Vec<ShortLink>) -> TestApp<MemoryRecordStore> {
    create_test_app_with_store(Arc::new(MemoryRecordStore::with_links(links)))
}

pub fn link(slug: &str, target: &str, hits: u64) -> ShortLink {
    ShortLink::new(slug.to_string(), target.to_string(), 1_700_000_000, hits)
}

pub async fn stored_hits<S: DurableStore>(store: &S, slug: &str) -> u64 {
    store.find_by_slug(slug).await.unwrap().unwrap().hits
}
