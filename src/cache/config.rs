//! Cache configuration.
//!
//! Controls the post-list cache via the `[cache]` table of `postcache.toml`.

use std::time::Duration;

use serde::Deserialize;

use crate::domain::posts::ListProjection;

pub const DEFAULT_TTL_SECONDS: u64 = 30;
pub const DEFAULT_KEY_PREFIX: &str = "posts:all";
pub const DEFAULT_OP_TIMEOUT_MS: u64 = 250;

/// Which cache backend holds the post listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackendKind {
    /// In-process map; the default.
    #[default]
    Memory,
    /// Shared Redis server.
    Redis,
    /// Caching disabled: every read is a miss.
    None,
}

impl CacheBackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheBackendKind::Memory => "memory",
            CacheBackendKind::Redis => "redis",
            CacheBackendKind::None => "none",
        }
    }
}

impl std::str::FromStr for CacheBackendKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            "none" | "disabled" | "off" => Ok(Self::None),
            other => Err(format!(
                "unknown cache backend `{other}` (expected `memory`, `redis` or `none`)"
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub backend: CacheBackendKind,
    /// Required when `backend` is `Redis`.
    pub redis_url: Option<String>,
    /// Lifetime of a populated listing.
    pub ttl: Duration,
    pub key_prefix: String,
    pub projection: ListProjection,
    /// Upper bound for a single backend call.
    pub op_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::Memory,
            redis_url: None,
            ttl: Duration::from_secs(DEFAULT_TTL_SECONDS),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            projection: ListProjection::Summary,
            op_timeout: Duration::from_millis(DEFAULT_OP_TIMEOUT_MS),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            backend: settings.backend,
            redis_url: settings.redis_url.clone(),
            ttl: settings.ttl,
            key_prefix: settings.key_prefix.clone(),
            projection: settings.projection,
            op_timeout: settings.op_timeout,
        }
    }
}

impl CacheConfig {
    pub fn is_enabled(&self) -> bool {
        self.backend != CacheBackendKind::None
    }

    /// The single key holding the listing. The projection is part of the key
    /// so a configuration change never serves the other shape.
    pub fn list_key(&self) -> String {
        format!("{}:{}", self.key_prefix, self.projection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert_eq!(config.backend, CacheBackendKind::Memory);
        assert_eq!(config.ttl, Duration::from_secs(30));
        assert_eq!(config.projection, ListProjection::Summary);
        assert_eq!(config.op_timeout, Duration::from_millis(250));
        assert!(config.is_enabled());
    }

    #[test]
    fn list_key_includes_projection() {
        let config = CacheConfig {
            projection: ListProjection::Full,
            ..Default::default()
        };
        assert_eq!(config.list_key(), "posts:all:full");
        assert_eq!(CacheConfig::default().list_key(), "posts:all:summary");
    }

    #[test]
    fn none_backend_disables_cache() {
        let config = CacheConfig {
            backend: CacheBackendKind::None,
            ..Default::default()
        };
        assert!(!config.is_enabled());
    }

    #[test]
    fn backend_kind_parses_aliases() {
        assert_eq!(
            "Redis".parse::<CacheBackendKind>().expect("parse"),
            CacheBackendKind::Redis
        );
        assert_eq!(
            "disabled".parse::<CacheBackendKind>().expect("parse"),
            CacheBackendKind::None
        );
        assert!("memcached".parse::<CacheBackendKind>().is_err());
    }
}
