use std::sync::Arc;

use crate::application::catalog::CatalogService;
use crate::infra::db::PostgresRepositories;

#[derive(Clone)]
pub struct ApiState {
    pub catalog: Arc<CatalogService>,
    /// Pinged by `/health`; absent when the catalog runs on another store.
    pub db: Option<Arc<PostgresRepositories>>,
}
