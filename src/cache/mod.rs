//! Tavola cache layer.
//!
//! Rendered menus, submenus and dishes, and the lists of each, are cached under
//! keys derived from the entity's lineage (see [`keys`]). Every catalog
//! mutation produces an [`InvalidationPlan`] that evicts the payloads it made
//! stale. The cache is never authoritative: backend failures degrade to store
//! reads.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! backend = "redis"        # "memory" (default), "redis" or "disabled"
//! redis_url = "redis://127.0.0.1:6379"
//! ```

mod config;
mod entity;
pub mod keys;
pub(crate) mod lock;
mod planner;
mod redis_store;
mod store;

pub use config::{CacheBackend, CacheConfig};
pub use entity::EntityCache;
pub use keys::{KeyPattern, Lineage, ListScope, list_key};
pub use planner::{Change, InvalidationPlan};
pub use redis_store::RedisCacheStore;
pub use store::{CacheError, CacheStore, MemoryCacheStore};
