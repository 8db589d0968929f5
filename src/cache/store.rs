//! Cache storage backends.
//!
//! `CacheStore` is the capability the rest of the crate relies on: string
//! values, hash fields, and bulk delete by key pattern. Values are opaque
//! strings; typing happens one level up in `EntityCache`.

use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;

use super::keys::KeyPattern;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache key `{key}` holds a value of another type")]
    WrongType { key: String },
    #[error("cache payload could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CacheError {
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::Unavailable(err.to_string())
    }
}

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String) -> Result<(), CacheError>;

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, CacheError>;

    async fn hset(&self, key: &str, field: &str, value: String) -> Result<(), CacheError>;

    /// Delete every key matching `pattern`, returning how many were removed.
    async fn delete_matching(&self, pattern: &KeyPattern) -> Result<u64, CacheError>;

    /// Short backend label for logs and metrics.
    fn backend(&self) -> &'static str;
}

#[derive(Debug, Clone)]
enum Entry {
    Value(String),
    Hash(HashMap<String, String>),
}

/// In-process backend keyed like the distributed one.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: DashMap<String, Entry>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys, counting a list hash once. Inspection only.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        match self.entries.get(key).as_deref() {
            None => Ok(None),
            Some(Entry::Value(value)) => Ok(Some(value.clone())),
            Some(Entry::Hash(_)) => Err(CacheError::WrongType {
                key: key.to_string(),
            }),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        self.entries.insert(key.to_string(), Entry::Value(value));
        Ok(())
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, CacheError> {
        match self.entries.get(key).as_deref() {
            None => Ok(None),
            Some(Entry::Hash(fields)) => Ok(fields.get(field).cloned()),
            Some(Entry::Value(_)) => Err(CacheError::WrongType {
                key: key.to_string(),
            }),
        }
    }

    async fn hset(&self, key: &str, field: &str, value: String) -> Result<(), CacheError> {
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::Hash(HashMap::new()));
        match entry.value_mut() {
            Entry::Hash(fields) => {
                fields.insert(field.to_string(), value);
                Ok(())
            }
            Entry::Value(_) => Err(CacheError::WrongType {
                key: key.to_string(),
            }),
        }
    }

    async fn delete_matching(&self, pattern: &KeyPattern) -> Result<u64, CacheError> {
        let matching: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| pattern.matches(entry.key()))
            .map(|entry| entry.key().clone())
            .collect();

        let mut removed = 0;
        for key in matching {
            if self.entries.remove(&key).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn strings_and_hashes_round_trip() {
        let store = MemoryCacheStore::new();
        store.set("a::", "menu".to_string()).await.unwrap();
        store
            .hset("list:menu", "", "[]".to_string())
            .await
            .unwrap();

        assert_eq!(store.get("a::").await.unwrap().as_deref(), Some("menu"));
        assert_eq!(
            store.hget("list:menu", "").await.unwrap().as_deref(),
            Some("[]")
        );
        assert_eq!(store.hget("list:menu", "other").await.unwrap(), None);
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn mixing_types_on_one_key_is_an_error() {
        let store = MemoryCacheStore::new();
        store.set("k", "v".to_string()).await.unwrap();

        let err = store.hset("k", "f", "v".to_string()).await.unwrap_err();
        assert!(matches!(err, CacheError::WrongType { .. }));
        assert!(matches!(
            store.hget("k", "f").await,
            Err(CacheError::WrongType { .. })
        ));
    }

    #[tokio::test]
    async fn delete_matching_removes_only_matches() {
        let store = MemoryCacheStore::new();
        for key in ["m1::", "m1:s1:", "m1:s1:d1", "m2::", "list:menu"] {
            store.set(key, key.to_string()).await.unwrap();
        }

        let removed = store
            .delete_matching(&KeyPattern::new("m1:*"))
            .await
            .unwrap();

        assert_eq!(removed, 3);
        assert!(store.contains_key("m2::"));
        assert!(store.contains_key("list:menu"));
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn delete_without_matches_is_a_no_op() {
        let store = MemoryCacheStore::new();
        store.set("m1::", "x".to_string()).await.unwrap();

        let removed = store
            .delete_matching(&KeyPattern::new("list:*"))
            .await
            .unwrap();

        assert_eq!(removed, 0);
        assert_eq!(store.len(), 1);
    }
}
