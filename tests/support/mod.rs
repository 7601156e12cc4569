//! In-memory doubles shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use time::OffsetDateTime;
use time::macros::datetime;
use tokio::sync::Notify;

use postcache::application::posts::PostService;
use postcache::application::repos::{
    CreatePostParams, PostsRepo, PostsWriteRepo, RepoError, StoreHealth,
};
use postcache::cache::{CacheBackend, CacheConfig, CacheError, MemoryBackend, PostListCache};
use postcache::domain::posts::ListProjection;
use postcache::infra::http::{HttpState, build_router};
use postcache_api_types::{Post, PostListItem, PostSummary};

const BASE_TIME: OffsetDateTime = datetime!(2024-01-01 00:00 UTC);

/// Posts kept in a vector, listed newest first like the Postgres adapter.
#[derive(Default)]
pub struct FakeStore {
    posts: Mutex<Vec<Post>>,
    pub list_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub fail_list: AtomicBool,
    pub fail_create: AtomicBool,
    pub unhealthy: AtomicBool,
    /// When set, the next list call snapshots its rows, signals `list_entered`
    /// and waits for `list_release` before returning.
    pub hold_next_list: AtomicBool,
    pub list_entered: Notify,
    pub list_release: Notify,
}

impl FakeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Seed a post with an explicit creation time offset, in seconds.
    pub fn seed(&self, title: &str, created_offset_secs: i64) -> Post {
        let mut posts = self.posts.lock().unwrap();
        let post = Post {
            id: posts.len() as i64 + 1,
            title: title.to_string(),
            body: None,
            created_at: BASE_TIME + time::Duration::seconds(created_offset_secs),
        };
        posts.push(post.clone());
        post
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    fn rows(&self, projection: ListProjection) -> Vec<PostListItem> {
        let mut posts = self.posts.lock().unwrap().clone();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        posts
            .into_iter()
            .map(|post| match projection {
                ListProjection::Summary => PostListItem::Summary(PostSummary::from(post)),
                ListProjection::Full => PostListItem::Full(post),
            })
            .collect()
    }
}

#[async_trait]
impl PostsRepo for FakeStore {
    async fn list_posts(&self, projection: ListProjection) -> Result<Vec<PostListItem>, RepoError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(RepoError::Unavailable("connection refused".to_string()));
        }

        let rows = self.rows(projection);
        if self.hold_next_list.swap(false, Ordering::SeqCst) {
            self.list_entered.notify_one();
            self.list_release.notified().await;
        }
        Ok(rows)
    }
}

#[async_trait]
impl PostsWriteRepo for FakeStore {
    async fn create_post(&self, params: CreatePostParams) -> Result<Post, RepoError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(RepoError::Unavailable("connection refused".to_string()));
        }

        let mut posts = self.posts.lock().unwrap();
        let id = posts.len() as i64 + 1;
        let post = Post {
            id,
            title: params.title,
            body: params.body,
            created_at: BASE_TIME + time::Duration::hours(1) + time::Duration::seconds(id),
        };
        posts.push(post.clone());
        Ok(post)
    }
}

#[async_trait]
impl StoreHealth for FakeStore {
    async fn health_check(&self) -> Result<(), RepoError> {
        if self.unhealthy.load(Ordering::SeqCst) {
            Err(RepoError::Timeout)
        } else {
            Ok(())
        }
    }
}

/// A backend whose every call fails, as when Redis is down.
#[derive(Default)]
pub struct DownBackend {
    pub calls: AtomicUsize,
}

#[async_trait]
impl CacheBackend for DownBackend {
    fn name(&self) -> &'static str {
        "down"
    }

    async fn get(&self, _key: &str) -> Result<Option<Bytes>, CacheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _value: Bytes, _ttl: Duration) -> Result<(), CacheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Unavailable("connection refused".to_string()))
    }
}

/// A backend that never answers within any reasonable timeout.
#[derive(Default)]
pub struct HangingBackend;

#[async_trait]
impl CacheBackend for HangingBackend {
    fn name(&self) -> &'static str {
        "hanging"
    }

    async fn get(&self, _key: &str) -> Result<Option<Bytes>, CacheError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: Bytes, _ttl: Duration) -> Result<(), CacheError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }
}

pub fn service_with(
    store: &Arc<FakeStore>,
    backend: Arc<dyn CacheBackend>,
    config: &CacheConfig,
) -> PostService {
    let cache = Arc::new(PostListCache::new(backend, config));
    PostService::new(store.clone(), store.clone(), cache)
}

pub fn memory_service(store: &Arc<FakeStore>) -> (PostService, Arc<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::new());
    let service = service_with(store, backend.clone(), &CacheConfig::default());
    (service, backend)
}

pub fn router_with(store: &Arc<FakeStore>, backend: Arc<dyn CacheBackend>) -> axum::Router {
    let service = service_with(store, backend, &CacheConfig::default());
    build_router(HttpState::new(Arc::new(service), store.clone()))
}
