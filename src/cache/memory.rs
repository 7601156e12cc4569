//! In-process cache backend.

use std::{
    collections::HashMap,
    sync::{LockResult, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::time::Instant;
use tracing::warn;

use super::backend::{CacheBackend, CacheError};

struct Entry {
    value: Bytes,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Process-local backend.
///
/// Value and deadline live in one `Entry` replaced under a single write lock,
/// so readers never see a value paired with another value's deadline.
/// Expired entries are removed lazily by the lookup that notices them.
#[derive(Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_entries(
        &self,
        op: &'static str,
        key: &str,
    ) -> RwLockReadGuard<'_, HashMap<String, Entry>> {
        recover(self.entries.read(), op, key)
    }

    fn write_entries(
        &self,
        op: &'static str,
        key: &str,
    ) -> RwLockWriteGuard<'_, HashMap<String, Entry>> {
        recover(self.entries.write(), op, key)
    }

    fn get_sync(&self, key: &str) -> Option<Bytes> {
        let now = Instant::now();
        let expired_at = {
            let entries = self.read_entries("get", key);
            match entries.get(key) {
                Some(entry) if entry.is_live(now) => return Some(entry.value.clone()),
                Some(entry) => entry.expires_at,
                None => return None,
            }
        };

        // Only drop the entry we saw expire; a concurrent `set` may have
        // replaced it in between.
        let mut entries = self.write_entries("expire", key);
        if entries
            .get(key)
            .is_some_and(|entry| entry.expires_at == expired_at)
        {
            entries.remove(key);
        }
        None
    }

    /// Number of stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.read_entries("len", "*").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Entries are replaced whole, so a map poisoned mid-operation is still
/// consistent and its guard can be reused.
fn recover<G>(result: LockResult<G>, op: &'static str, key: &str) -> G {
    result.unwrap_or_else(|poisoned| {
        warn!(
            target: "postcache::cache::memory",
            op,
            key,
            "cache entry map was poisoned; continuing with its contents"
        );
        poisoned.into_inner()
    })
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        Ok(self.get_sync(key))
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.write_entries("set", key).insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.write_entries("delete", key).remove(key);
        Ok(())
    }
}
