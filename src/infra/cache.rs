//! Cache backend bootstrap.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::cache::{CacheBackend, CacheConfig, EntityCache, MemoryCacheStore, RedisCacheStore};

use super::error::InfraError;

const REDIS_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Build the entity cache selected by `config`; `None` when caching is off
/// or the Redis backend cannot be reached. The service then reads straight
/// from the store.
pub async fn build_entity_cache(config: &CacheConfig) -> Result<Option<EntityCache>, InfraError> {
    build_with_timeout(config, REDIS_CONNECT_TIMEOUT).await
}

async fn build_with_timeout(
    config: &CacheConfig,
    connect_timeout: Duration,
) -> Result<Option<EntityCache>, InfraError> {
    let cache = match config.backend {
        CacheBackend::Disabled => None,
        CacheBackend::Memory => Some(EntityCache::new(Arc::new(MemoryCacheStore::new()))),
        CacheBackend::Redis => {
            let url = config.redis_url.as_deref().ok_or_else(|| {
                InfraError::configuration("cache.redis_url is required for the redis backend")
            })?;
            match tokio::time::timeout(connect_timeout, RedisCacheStore::connect(url)).await {
                Ok(Ok(store)) => Some(EntityCache::new(Arc::new(store))),
                Ok(Err(err)) => {
                    warn!(
                        target = "tavola::infra::cache",
                        error = %err,
                        "Redis unavailable; serving without a cache"
                    );
                    return Ok(None);
                }
                Err(_) => {
                    warn!(
                        target = "tavola::infra::cache",
                        timeout_ms = connect_timeout.as_millis() as u64,
                        "Redis connect timed out; serving without a cache"
                    );
                    return Ok(None);
                }
            }
        }
    };

    info!(
        target = "tavola::infra::cache",
        backend = ?config.backend,
        "Entity cache configured"
    );
    Ok(cache)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_backend_yields_no_cache() {
        let config = CacheConfig {
            backend: CacheBackend::Disabled,
            redis_url: None,
        };
        assert!(build_entity_cache(&config).await.expect("ok").is_none());
    }

    #[tokio::test]
    async fn redis_without_url_is_a_configuration_error() {
        let config = CacheConfig {
            backend: CacheBackend::Redis,
            redis_url: None,
        };
        let err = build_entity_cache(&config).await.err().expect("error");
        assert!(matches!(err, InfraError::Configuration { .. }));
    }

    #[tokio::test]
    async fn unreachable_redis_degrades_to_no_cache() {
        let config = CacheConfig {
            backend: CacheBackend::Redis,
            redis_url: Some("redis://127.0.0.1:1".to_string()),
        };
        let cache = build_with_timeout(&config, Duration::from_millis(300))
            .await
            .expect("startup continues");
        assert!(cache.is_none());
    }
}
