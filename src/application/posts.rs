//! Cache-aside reads and invalidating writes for the posts collection.

use std::sync::Arc;

use metrics::histogram;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, warn};

use postcache_api_types::{Post, PostListItem};

use crate::application::repos::{CreatePostParams, PostsRepo, PostsWriteRepo, RepoError};
use crate::cache::{CacheLookup, PopulateOutcome, PostListCache};
use crate::domain::error::DomainError;
use crate::domain::posts::NewPost;

pub(crate) const METRIC_STORE_LIST_MS: &str = "postcache_store_list_ms";

#[derive(Debug, Error)]
pub enum PostServiceError {
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error("post store unavailable: {0}")]
    StoreUnavailable(#[from] RepoError),
    #[error("create task did not complete: {0}")]
    Interrupted(String),
}

#[derive(Clone)]
pub struct PostService {
    reader: Arc<dyn PostsRepo>,
    writer: Arc<dyn PostsWriteRepo>,
    cache: Arc<PostListCache>,
}

impl PostService {
    pub fn new(
        reader: Arc<dyn PostsRepo>,
        writer: Arc<dyn PostsWriteRepo>,
        cache: Arc<PostListCache>,
    ) -> Self {
        Self {
            reader,
            writer,
            cache,
        }
    }

    pub fn cache(&self) -> &PostListCache {
        &self.cache
    }

    /// Return the listing, from the cache when it holds one.
    ///
    /// Cache failures degrade to a store read. A store failure leaves the
    /// cache as it was.
    pub async fn get_posts(&self) -> Result<Vec<PostListItem>, PostServiceError> {
        if let CacheLookup::Hit(items) = self.cache.lookup().await {
            return Ok(items);
        }

        let observed = self.cache.epoch();
        let started = Instant::now();
        let items = self.reader.list_posts(self.cache.projection()).await?;
        histogram!(METRIC_STORE_LIST_MS).record(started.elapsed().as_secs_f64() * 1000.0);

        // Populate failures are already logged and counted by the cache.
        if let Ok(PopulateOutcome::Stored) = self.cache.populate(observed, &items).await {
            debug!(key = %self.cache.key(), items = items.len(), "post list cached");
        }

        Ok(items)
    }

    /// Validate, insert, then drop the cached listing.
    ///
    /// Insert and invalidation run on their own task, so a caller that goes
    /// away mid-request cannot leave a committed post with a live listing.
    pub async fn create_post(
        &self,
        title: Option<String>,
        body: Option<String>,
    ) -> Result<Post, PostServiceError> {
        let (title, body) = NewPost::new(title, body)?.into_parts();

        let writer = Arc::clone(&self.writer);
        let cache = Arc::clone(&self.cache);
        let task = tokio::spawn(async move {
            let post = writer.create_post(CreatePostParams { title, body }).await?;

            if let Err(err) = cache.invalidate().await {
                warn!(
                    target = "postcache::application::posts",
                    post_id = post.id,
                    error = %err,
                    "post list invalidation failed; listing may be stale until the TTL expires"
                );
            }

            Ok::<_, RepoError>(post)
        });

        match task.await {
            Ok(result) => Ok(result?),
            Err(err) => Err(PostServiceError::Interrupted(err.to_string())),
        }
    }
}
