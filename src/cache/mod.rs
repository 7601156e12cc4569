//! Post-list cache.
//!
//! A cache-aside layer over a single key holding the serialized `GET /posts`
//! listing:
//!
//! - **Backends** (`memory`, `redis`, `none`) implement [`CacheBackend`].
//! - **[`PostListCache`]** owns the key, the TTL and the invalidation epoch.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! backend = "memory"   # memory | redis | none
//! redis_url = "redis://127.0.0.1:6379/"
//! ttl_seconds = 30
//! projection = "summary"
//! ```

mod backend;
mod config;
mod list;
mod memory;
mod null;
mod redis_cache;

pub use backend::{CacheBackend, CacheError, CacheLookup, build_backend};
pub use self::config::{
    CacheBackendKind, CacheConfig, DEFAULT_KEY_PREFIX, DEFAULT_OP_TIMEOUT_MS, DEFAULT_TTL_SECONDS,
};
pub use list::{Epoch, PopulateOutcome, PostListCache};
pub use memory::MemoryBackend;
pub use null::NullBackend;
pub use redis_cache::RedisBackend;

pub(crate) use list::{
    METRIC_CACHE_BACKEND_ERROR, METRIC_CACHE_HIT, METRIC_CACHE_INVALIDATE,
    METRIC_CACHE_INVALIDATE_FAILED, METRIC_CACHE_MISS, METRIC_CACHE_POPULATE_SKIPPED,
};
