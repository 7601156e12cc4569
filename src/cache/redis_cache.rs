//! Redis cache backend.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use redis::{Client, RedisError, aio::ConnectionManager};
use tokio::sync::OnceCell;
use tracing::info;

use super::backend::{CacheBackend, CacheError};

/// Backend talking to a Redis server.
///
/// The connection is established on first use and reused afterwards; a failed
/// attempt is retried by the next call. `ConnectionManager` reconnects on its
/// own once established.
pub struct RedisBackend {
    client: Client,
    connection: OnceCell<ConnectionManager>,
}

impl RedisBackend {
    /// Parse `url` without connecting.
    pub fn open(url: &str) -> Result<Self, CacheError> {
        let client = Client::open(url)
            .map_err(|err| CacheError::Configuration(format!("invalid redis url: {err}")))?;
        Ok(Self {
            client,
            connection: OnceCell::new(),
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, CacheError> {
        self.connection
            .get_or_try_init(|| async {
                let manager = self
                    .client
                    .get_connection_manager()
                    .await
                    .map_err(map_redis_error)?;
                info!(target = "postcache::cache::redis", "Connected to redis");
                Ok::<_, CacheError>(manager)
            })
            .await
            .cloned()
    }
}

fn map_redis_error(err: RedisError) -> CacheError {
    if err.is_io_error()
        || err.is_connection_refusal()
        || err.is_connection_dropped()
        || err.is_timeout()
    {
        CacheError::Unavailable(err.to_string())
    } else {
        CacheError::Backend(err.to_string())
    }
}

fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[async_trait]
impl CacheBackend for RedisBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        let mut conn = self.connection().await?;
        let value: Option<Vec<u8>> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;
        Ok(value.map(Bytes::from))
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value.as_ref())
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let _: i64 = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_is_sent_in_milliseconds() {
        assert_eq!(ttl_millis(Duration::from_secs(30)), 30_000);
        assert_eq!(ttl_millis(Duration::ZERO), 1);
    }

    #[test]
    fn open_rejects_malformed_url() {
        let err = RedisBackend::open("not a url").err().expect("invalid url");
        assert_eq!(err.kind(), "configuration");
    }

    #[test]
    fn open_does_not_connect() {
        let backend = RedisBackend::open("redis://127.0.0.1:1/").expect("valid url");
        assert_eq!(backend.name(), "redis");
        assert!(backend.connection.get().is_none());
    }
}
