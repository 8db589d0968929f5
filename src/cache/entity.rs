//! Typed access to the cache store.
//!
//! Every backend failure is logged and swallowed: a failed read is a miss and
//! a failed write or eviction is a no-op. Callers never see a `CacheError`.

use std::sync::Arc;

use futures::future::join_all;
use metrics::counter;
use serde::{Serialize, de::DeserializeOwned};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::types::EntityKind;

use super::keys::{KeyPattern, Lineage, ListScope, list_key};
use super::planner::InvalidationPlan;
use super::store::{CacheError, CacheStore};

const SOURCE: &str = "cache::entity";

#[derive(Clone)]
pub struct EntityCache {
    store: Arc<dyn CacheStore>,
}

impl EntityCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    pub async fn get_list<T: DeserializeOwned>(&self, scope: &ListScope) -> Option<Vec<T>> {
        let key = list_key(scope.kind());
        let field = scope.field();
        let raw = self.store.hget(&key, &field).await;
        self.decode(scope.kind(), &key, raw)
    }

    pub async fn put_list<T: Serialize>(&self, scope: &ListScope, items: &[T]) {
        let key = list_key(scope.kind());
        let result = match serde_json::to_string(items) {
            Ok(payload) => self.store.hset(&key, &scope.field(), payload).await,
            Err(err) => Err(CacheError::from(err)),
        };
        self.absorb("put_list", &key, result);
    }

    pub async fn get_one<T: DeserializeOwned>(&self, lineage: &Lineage) -> Option<T> {
        let key = lineage.key();
        let raw = self.store.get(&key).await;
        self.decode(lineage.kind(), &key, raw)
    }

    pub async fn put_one<T: Serialize>(&self, lineage: &Lineage, value: &T) {
        let key = lineage.key();
        let result = match serde_json::to_string(value) {
            Ok(payload) => self.store.set(&key, payload).await,
            Err(err) => Err(CacheError::from(err)),
        };
        self.absorb("put_one", &key, result);
    }

    /// Delete every key matching `pattern`.
    pub async fn invalidate(&self, pattern: &KeyPattern) {
        match self.store.delete_matching(pattern).await {
            Ok(removed) => {
                debug!(
                    target = "tavola::cache",
                    pattern = %pattern,
                    removed,
                    "Cache keys invalidated"
                );
            }
            Err(err) => self.report("invalidate", pattern.as_str(), &err),
        }
    }

    /// Evict every pattern of `plan` concurrently.
    pub async fn apply(&self, plan: &InvalidationPlan) {
        join_all(plan.patterns().map(|pattern| self.invalidate(pattern))).await;
    }

    /// Store a freshly read list without holding up the caller.
    pub fn populate_list<T>(&self, scope: ListScope, items: Vec<T>) -> JoinHandle<()>
    where
        T: Serialize + Send + Sync + 'static,
    {
        let cache = self.clone();
        tokio::spawn(async move { cache.put_list(&scope, &items).await })
    }

    /// Store a freshly read entity without holding up the caller.
    pub fn populate_one<T>(&self, lineage: Lineage, value: T) -> JoinHandle<()>
    where
        T: Serialize + Send + Sync + 'static,
    {
        let cache = self.clone();
        tokio::spawn(async move { cache.put_one(&lineage, &value).await })
    }

    fn decode<T: DeserializeOwned>(
        &self,
        kind: EntityKind,
        key: &str,
        raw: Result<Option<String>, CacheError>,
    ) -> Option<T> {
        let backend = self.store.backend();
        let decoded = raw.and_then(|payload| {
            payload
                .map(|text| serde_json::from_str::<T>(&text).map_err(CacheError::from))
                .transpose()
        });
        match decoded {
            Ok(Some(value)) => {
                counter!("tavola_cache_hit_total", "kind" => kind.as_str(), "backend" => backend)
                    .increment(1);
                Some(value)
            }
            Ok(None) => {
                counter!("tavola_cache_miss_total", "kind" => kind.as_str(), "backend" => backend)
                    .increment(1);
                None
            }
            Err(err) => {
                self.report("get", key, &err);
                None
            }
        }
    }

    fn absorb(&self, op: &'static str, key: &str, result: Result<(), CacheError>) {
        if let Err(err) = result {
            self.report(op, key, &err);
        }
    }

    fn report(&self, op: &'static str, key: &str, err: &CacheError) {
        let backend = self.store.backend();
        counter!("tavola_cache_error_total", "op" => op, "backend" => backend).increment(1);
        warn!(
            target = "tavola::cache",
            source = SOURCE,
            op,
            key,
            backend,
            error = %err,
            "Cache operation failed; falling back to the store"
        );
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use uuid::Uuid;

    use super::*;
    use crate::cache::planner::Change;
    use crate::cache::store::MemoryCacheStore;
    use crate::domain::entities::{DishView, MenuView};

    struct BrokenStore;

    #[async_trait]
    impl CacheStore for BrokenStore {
        async fn get(&self, _: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
        async fn set(&self, _: &str, _: String) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
        async fn hget(&self, _: &str, _: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
        async fn hset(&self, _: &str, _: &str, _: String) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
        async fn delete_matching(&self, _: &KeyPattern) -> Result<u64, CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
        fn backend(&self) -> &'static str {
            "broken"
        }
    }

    fn menu(id: Uuid) -> MenuView {
        MenuView {
            id,
            title: "Lunch".into(),
            description: "desc".into(),
            submenus_count: 0,
            dishes_count: 0,
        }
    }

    #[tokio::test]
    async fn lists_are_scoped_by_parent() {
        let cache = EntityCache::new(Arc::new(MemoryCacheStore::new()));
        let (m1, m2) = (Uuid::new_v4(), Uuid::new_v4());
        let dish = DishView {
            id: Uuid::new_v4(),
            title: "Soup".into(),
            description: String::new(),
            price: "4.50".into(),
        };
        let s = Uuid::new_v4();
        let scope = ListScope::Submenu {
            menu_id: m1,
            submenu_id: s,
        };

        cache.put_list(&scope, &[dish.clone()]).await;

        let hit: Option<Vec<DishView>> = cache.get_list(&scope).await;
        assert_eq!(hit, Some(vec![dish]));
        let other: Option<Vec<DishView>> = cache
            .get_list(&ListScope::Submenu {
                menu_id: m2,
                submenu_id: s,
            })
            .await;
        assert_eq!(other, None);
    }

    #[tokio::test]
    async fn applying_a_plan_evicts_entity_and_lists() {
        let cache = EntityCache::new(Arc::new(MemoryCacheStore::new()));
        let id = Uuid::new_v4();
        let lineage = Lineage::menu(id);

        cache.put_one(&lineage, &menu(id)).await;
        cache.put_list(&ListScope::AllMenus, &[menu(id)]).await;

        cache
            .apply(&InvalidationPlan::for_change(Change::Deleted, &lineage))
            .await;

        assert_eq!(cache.get_one::<MenuView>(&lineage).await, None);
        assert_eq!(
            cache.get_list::<MenuView>(&ListScope::AllMenus).await,
            None
        );
    }

    #[tokio::test]
    async fn corrupt_payload_reads_as_miss() {
        let store = Arc::new(MemoryCacheStore::new());
        let id = Uuid::new_v4();
        let lineage = Lineage::menu(id);
        store.set(&lineage.key(), "not json".into()).await.unwrap();

        let cache = EntityCache::new(store);
        assert_eq!(cache.get_one::<MenuView>(&lineage).await, None);
    }

    #[tokio::test]
    async fn backend_failures_are_absorbed() {
        let cache = EntityCache::new(Arc::new(BrokenStore));
        let id = Uuid::new_v4();
        let lineage = Lineage::menu(id);

        cache.put_one(&lineage, &menu(id)).await;
        cache.invalidate(&KeyPattern::all_lists()).await;
        assert_eq!(cache.get_one::<MenuView>(&lineage).await, None);
        cache
            .populate_list(ListScope::AllMenus, vec![menu(id)])
            .await
            .expect("population task completes");
    }

    #[tokio::test]
    async fn background_population_lands_in_store() {
        let cache = EntityCache::new(Arc::new(MemoryCacheStore::new()));
        let id = Uuid::new_v4();
        let lineage = Lineage::menu(id);

        cache
            .populate_one(lineage, menu(id))
            .await
            .expect("population task completes");

        assert_eq!(cache.get_one::<MenuView>(&lineage).await, Some(menu(id)));
    }
}
