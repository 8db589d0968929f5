//! Redis-backed cache store.

use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};

use super::keys::KeyPattern;
use super::store::{CacheError, CacheStore};

/// Shared Redis connection; clones share one multiplexed connection.
#[derive(Clone)]
pub struct RedisCacheStore {
    connection: ConnectionManager,
}

impl RedisCacheStore {
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = Client::open(url).map_err(CacheError::unavailable)?;
        let connection = client
            .get_connection_manager()
            .await
            .map_err(CacheError::unavailable)?;
        Ok(Self { connection })
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection.clone();
        conn.get(key).await.map_err(CacheError::unavailable)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        conn.set(key, value).await.map_err(CacheError::unavailable)
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection.clone();
        conn.hget(key, field)
            .await
            .map_err(CacheError::unavailable)
    }

    async fn hset(&self, key: &str, field: &str, value: String) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        conn.hset(key, field, value)
            .await
            .map_err(CacheError::unavailable)
    }

    async fn delete_matching(&self, pattern: &KeyPattern) -> Result<u64, CacheError> {
        let mut conn = self.connection.clone();
        let keys: Vec<String> = conn
            .keys(pattern.as_str())
            .await
            .map_err(CacheError::unavailable)?;
        if keys.is_empty() {
            return Ok(0);
        }
        conn.del(keys).await.map_err(CacheError::unavailable)
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
