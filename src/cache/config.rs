//! Cache configuration.
//!
//! Selects the cache backend via the `[cache]` table of `tavola.toml`.

use serde::Deserialize;

/// Which store holds cached payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    /// Caching switched off; every read goes to the store.
    Disabled,
    /// In-process map, lost on restart.
    #[default]
    Memory,
    /// Shared Redis instance.
    Redis,
}

/// Cache configuration from `tavola.toml`.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Connection URL, required by the Redis backend.
    pub redis_url: Option<String>,
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            backend: settings.backend,
            redis_url: settings.redis_url.clone(),
        }
    }
}

impl CacheConfig {
    pub fn is_enabled(&self) -> bool {
        self.backend != CacheBackend::Disabled
    }
}
