//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::{
    DishRecord, DishView, MenuRecord, MenuView, SubmenuRecord, SubmenuView,
};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("parent record missing for foreign key `{constraint}`")]
    MissingParent { constraint: String },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreateMenuParams {
    pub id: Uuid,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct UpdateMenuParams {
    pub id: Uuid,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct CreateSubmenuParams {
    pub id: Uuid,
    pub menu_id: Uuid,
    pub title: String,
    pub description: String,
}

/// Full replacement of a submenu row; `menu_id` may move it to another menu.
#[derive(Debug, Clone)]
pub struct UpdateSubmenuParams {
    pub id: Uuid,
    pub menu_id: Uuid,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct CreateDishParams {
    pub id: Uuid,
    pub submenu_id: Uuid,
    pub title: String,
    pub description: String,
    pub price: String,
}

/// Full replacement of a dish row; `submenu_id` may move it to another submenu.
#[derive(Debug, Clone)]
pub struct UpdateDishParams {
    pub id: Uuid,
    pub submenu_id: Uuid,
    pub title: String,
    pub description: String,
    pub price: String,
}

/// Read side of the catalog.
///
/// Scoped lookups (`find_submenu`, `find_dish`, `list_*`) only return rows
/// whose stored ancestry matches every id supplied.
#[async_trait]
pub trait CatalogRepo: Send + Sync {
    async fn list_menus(&self) -> Result<Vec<MenuView>, RepoError>;

    async fn find_menu(&self, menu_id: Uuid) -> Result<Option<MenuView>, RepoError>;

    async fn list_submenus(&self, menu_id: Uuid) -> Result<Vec<SubmenuView>, RepoError>;

    async fn find_submenu(
        &self,
        menu_id: Uuid,
        submenu_id: Uuid,
    ) -> Result<Option<SubmenuView>, RepoError>;

    async fn list_dishes(
        &self,
        menu_id: Uuid,
        submenu_id: Uuid,
    ) -> Result<Vec<DishView>, RepoError>;

    async fn find_dish(
        &self,
        menu_id: Uuid,
        submenu_id: Uuid,
        dish_id: Uuid,
    ) -> Result<Option<DishView>, RepoError>;

    async fn all_menus(&self) -> Result<Vec<MenuRecord>, RepoError>;

    async fn all_submenus(&self) -> Result<Vec<SubmenuRecord>, RepoError>;

    async fn all_dishes(&self) -> Result<Vec<DishRecord>, RepoError>;
}

/// Write side of the catalog. Every call is its own atomic unit; deletes
/// cascade to descendants. Updates and deletes of a missing id return
/// [`RepoError::NotFound`].
#[async_trait]
pub trait CatalogWriteRepo: Send + Sync {
    async fn create_menu(&self, params: CreateMenuParams) -> Result<MenuRecord, RepoError>;

    async fn update_menu(&self, params: UpdateMenuParams) -> Result<MenuRecord, RepoError>;

    async fn delete_menu(&self, id: Uuid) -> Result<(), RepoError>;

    async fn create_submenu(
        &self,
        params: CreateSubmenuParams,
    ) -> Result<SubmenuRecord, RepoError>;

    async fn update_submenu(
        &self,
        params: UpdateSubmenuParams,
    ) -> Result<SubmenuRecord, RepoError>;

    async fn delete_submenu(&self, id: Uuid) -> Result<(), RepoError>;

    async fn create_dish(&self, params: CreateDishParams) -> Result<DishRecord, RepoError>;

    async fn update_dish(&self, params: UpdateDishParams) -> Result<DishRecord, RepoError>;

    async fn delete_dish(&self, id: Uuid) -> Result<(), RepoError>;
}
