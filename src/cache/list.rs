//! The cached post listing.
//!
//! One key, one serialized listing. Reads go straight to the backend; populate
//! and invalidate are serialized through `gate` and ordered by `epoch`.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use bytes::Bytes;
use metrics::counter;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use postcache_api_types::PostListItem;

use crate::domain::posts::ListProjection;

use super::backend::{CacheBackend, CacheError, CacheLookup};
use super::config::CacheConfig;

pub(crate) const METRIC_CACHE_HIT: &str = "postcache_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS: &str = "postcache_cache_miss_total";
pub(crate) const METRIC_CACHE_BACKEND_ERROR: &str = "postcache_cache_backend_error_total";
pub(crate) const METRIC_CACHE_INVALIDATE: &str = "postcache_cache_invalidate_total";
pub(crate) const METRIC_CACHE_INVALIDATE_FAILED: &str = "postcache_cache_invalidate_failed_total";
pub(crate) const METRIC_CACHE_POPULATE_SKIPPED: &str = "postcache_cache_populate_skipped_total";

/// Invalidation counter value observed by a miss.
pub type Epoch = u64;

/// Result of [`PostListCache::populate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopulateOutcome {
    Stored,
    /// An invalidation ran after the miss; the fetched listing may predate it.
    SkippedStale,
}

pub struct PostListCache {
    backend: Arc<dyn CacheBackend>,
    key: String,
    ttl: Duration,
    projection: ListProjection,
    op_timeout: Duration,
    epoch: AtomicU64,
    gate: Mutex<()>,
}

impl PostListCache {
    pub fn new(backend: Arc<dyn CacheBackend>, config: &CacheConfig) -> Self {
        Self {
            backend,
            key: config.list_key(),
            ttl: config.ttl,
            projection: config.projection,
            op_timeout: config.op_timeout,
            epoch: AtomicU64::new(0),
            gate: Mutex::new(()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn projection(&self) -> ListProjection {
        self.projection
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Snapshot the invalidation epoch. Take it before querying the store.
    pub fn epoch(&self) -> Epoch {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Read the listing. An undecodable value counts as a backend error.
    pub async fn lookup(&self) -> CacheLookup<Vec<PostListItem>> {
        let raw = CacheLookup::from(self.bounded("get", self.backend.get(&self.key)).await);

        match raw {
            CacheLookup::Hit(bytes) => match decode(&bytes) {
                Ok(items) => {
                    counter!(METRIC_CACHE_HIT).increment(1);
                    debug!(key = %self.key, items = items.len(), outcome = "hit", "post list cache");
                    CacheLookup::Hit(items)
                }
                Err(err) => {
                    self.record_backend_error("decode", &err);
                    CacheLookup::BackendError(err)
                }
            },
            CacheLookup::Miss => {
                counter!(METRIC_CACHE_MISS).increment(1);
                debug!(key = %self.key, outcome = "miss", "post list cache");
                CacheLookup::Miss
            }
            CacheLookup::BackendError(err) => {
                self.record_backend_error("get", &err);
                CacheLookup::BackendError(err)
            }
        }
    }

    /// Store `items` unless an invalidation ran since `observed` was taken.
    pub async fn populate(
        &self,
        observed: Epoch,
        items: &[PostListItem],
    ) -> Result<PopulateOutcome, CacheError> {
        let value = encode(items)?;

        let _gate = self.gate.lock().await;
        if self.epoch.load(Ordering::SeqCst) != observed {
            counter!(METRIC_CACHE_POPULATE_SKIPPED).increment(1);
            debug!(
                key = %self.key,
                observed,
                "skipping populate: listing was invalidated while it was fetched"
            );
            return Ok(PopulateOutcome::SkippedStale);
        }

        self.bounded("set", self.backend.set(&self.key, value, self.ttl))
            .await
            .inspect_err(|err| self.record_backend_error("set", err))?;
        Ok(PopulateOutcome::Stored)
    }

    /// Drop the listing.
    ///
    /// The epoch advances even when the backend call fails, so in-flight
    /// misses in this process still refrain from writing their snapshot.
    pub async fn invalidate(&self) -> Result<(), CacheError> {
        let _gate = self.gate.lock().await;
        self.epoch.fetch_add(1, Ordering::SeqCst);
        counter!(METRIC_CACHE_INVALIDATE).increment(1);

        self.bounded("delete", self.backend.delete(&self.key))
            .await
            .inspect_err(|err| {
                counter!(METRIC_CACHE_INVALIDATE_FAILED).increment(1);
                self.record_backend_error("delete", err);
            })
    }

    async fn bounded<T>(
        &self,
        op: &'static str,
        call: impl Future<Output = Result<T, CacheError>>,
    ) -> Result<T, CacheError> {
        match tokio::time::timeout(self.op_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout {
                op,
                after: self.op_timeout,
            }),
        }
    }

    fn record_backend_error(&self, op: &'static str, err: &CacheError) {
        counter!(METRIC_CACHE_BACKEND_ERROR, "op" => op, "kind" => err.kind()).increment(1);
        warn!(
            target = "postcache::cache",
            backend = self.backend.name(),
            key = %self.key,
            op,
            error = %err,
            "cache backend error; continuing without cache"
        );
    }
}

fn encode(items: &[PostListItem]) -> Result<Bytes, CacheError> {
    serde_json::to_vec(items)
        .map(Bytes::from)
        .map_err(|err| CacheError::Codec(err.to_string()))
}

fn decode(bytes: &Bytes) -> Result<Vec<PostListItem>, CacheError> {
    serde_json::from_slice(bytes).map_err(|err| CacheError::Codec(err.to_string()))
}
