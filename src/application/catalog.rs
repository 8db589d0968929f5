//! Catalog use cases behind the HTTP API.
//!
//! Reads go through the entity cache when one is configured; misses fall back
//! to the store and repopulate the cache in the background. Writes go to the
//! store first and then evict whatever the change made stale. Dish prices are
//! discounted on the way out, after the cache, so cached payloads always hold
//! stored prices.

use std::future::Future;
use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use uuid::Uuid;

use crate::application::discount::DiscountOverlay;
use crate::application::repos::{
    CatalogRepo, CatalogWriteRepo, CreateDishParams, CreateMenuParams, CreateSubmenuParams,
    RepoError, UpdateDishParams, UpdateMenuParams, UpdateSubmenuParams,
};
use crate::cache::{Change, EntityCache, InvalidationPlan, Lineage, ListScope};
use crate::domain::entities::{
    DishContent, DishView, MenuView, SectionContent, SubmenuView,
};
use crate::domain::error::DomainError;
use crate::domain::types::EntityKind;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl CatalogError {
    fn not_found(kind: EntityKind, id: Uuid) -> Self {
        Self::Domain(DomainError::not_found(kind, id))
    }
}

#[derive(Clone)]
pub struct CatalogService {
    reader: Arc<dyn CatalogRepo>,
    writer: Arc<dyn CatalogWriteRepo>,
    cache: Option<EntityCache>,
    discounts: Arc<DiscountOverlay>,
}

impl CatalogService {
    pub fn new(
        reader: Arc<dyn CatalogRepo>,
        writer: Arc<dyn CatalogWriteRepo>,
        discounts: Arc<DiscountOverlay>,
    ) -> Self {
        Self {
            reader,
            writer,
            cache: None,
            discounts,
        }
    }

    pub fn with_cache_opt(mut self, cache: Option<EntityCache>) -> Self {
        self.cache = cache;
        self
    }

    // ---- menus ----

    pub async fn list_menus(&self) -> Result<Vec<MenuView>, CatalogError> {
        self.read_list(ListScope::AllMenus, || self.reader.list_menus())
            .await
    }

    pub async fn get_menu(&self, menu_id: Uuid) -> Result<MenuView, CatalogError> {
        self.read_one(Lineage::menu(menu_id), || self.reader.find_menu(menu_id))
            .await?
            .ok_or_else(|| CatalogError::not_found(EntityKind::Menu, menu_id))
    }

    pub async fn create_menu(&self, content: SectionContent) -> Result<MenuView, CatalogError> {
        let record = self
            .writer
            .create_menu(CreateMenuParams {
                id: Uuid::new_v4(),
                title: content.title,
                description: content.description,
            })
            .await?;
        self.evict(Change::Created, Lineage::menu(record.id)).await;
        Ok(MenuView {
            id: record.id,
            title: record.title,
            description: record.description,
            submenus_count: 0,
            dishes_count: 0,
        })
    }

    pub async fn update_menu(
        &self,
        menu_id: Uuid,
        content: SectionContent,
    ) -> Result<MenuView, CatalogError> {
        self.writer
            .update_menu(UpdateMenuParams {
                id: menu_id,
                title: content.title,
                description: content.description,
            })
            .await
            .map_err(missing_as(EntityKind::Menu, menu_id))?;
        self.evict(Change::Updated, Lineage::menu(menu_id)).await;
        self.reader
            .find_menu(menu_id)
            .await?
            .ok_or_else(|| CatalogError::not_found(EntityKind::Menu, menu_id))
    }

    pub async fn delete_menu(&self, menu_id: Uuid) -> Result<(), CatalogError> {
        self.writer
            .delete_menu(menu_id)
            .await
            .map_err(missing_as(EntityKind::Menu, menu_id))?;
        self.evict(Change::Deleted, Lineage::menu(menu_id)).await;
        Ok(())
    }

    // ---- submenus ----

    /// Submenus of `menu_id`; empty when the menu does not exist.
    pub async fn list_submenus(&self, menu_id: Uuid) -> Result<Vec<SubmenuView>, CatalogError> {
        self.read_list(ListScope::Menu(menu_id), || {
            self.reader.list_submenus(menu_id)
        })
        .await
    }

    pub async fn get_submenu(
        &self,
        menu_id: Uuid,
        submenu_id: Uuid,
    ) -> Result<SubmenuView, CatalogError> {
        self.read_one(Lineage::submenu(menu_id, submenu_id), || {
            self.reader.find_submenu(menu_id, submenu_id)
        })
        .await?
        .ok_or_else(|| CatalogError::not_found(EntityKind::Submenu, submenu_id))
    }

    pub async fn create_submenu(
        &self,
        menu_id: Uuid,
        content: SectionContent,
    ) -> Result<SubmenuView, CatalogError> {
        if self.reader.find_menu(menu_id).await?.is_none() {
            return Err(CatalogError::not_found(EntityKind::Menu, menu_id));
        }
        let record = self
            .writer
            .create_submenu(CreateSubmenuParams {
                id: Uuid::new_v4(),
                menu_id,
                title: content.title,
                description: content.description,
            })
            .await
            .map_err(orphaned_as(EntityKind::Menu, menu_id))?;
        self.evict(Change::Created, Lineage::submenu(menu_id, record.id))
            .await;
        Ok(SubmenuView {
            id: record.id,
            title: record.title,
            description: record.description,
            dishes_count: 0,
        })
    }

    pub async fn update_submenu(
        &self,
        menu_id: Uuid,
        submenu_id: Uuid,
        content: SectionContent,
    ) -> Result<SubmenuView, CatalogError> {
        self.require_submenu(menu_id, submenu_id).await?;
        self.writer
            .update_submenu(UpdateSubmenuParams {
                id: submenu_id,
                menu_id,
                title: content.title,
                description: content.description,
            })
            .await
            .map_err(missing_as(EntityKind::Submenu, submenu_id))?;
        self.evict(Change::Updated, Lineage::submenu(menu_id, submenu_id))
            .await;
        self.reader
            .find_submenu(menu_id, submenu_id)
            .await?
            .ok_or_else(|| CatalogError::not_found(EntityKind::Submenu, submenu_id))
    }

    pub async fn delete_submenu(&self, menu_id: Uuid, submenu_id: Uuid) -> Result<(), CatalogError> {
        self.require_submenu(menu_id, submenu_id).await?;
        self.writer
            .delete_submenu(submenu_id)
            .await
            .map_err(missing_as(EntityKind::Submenu, submenu_id))?;
        self.evict(Change::Deleted, Lineage::submenu(menu_id, submenu_id))
            .await;
        Ok(())
    }

    // ---- dishes ----

    /// Dishes of the submenu with discounts applied; empty when the submenu
    /// does not exist under `menu_id`.
    pub async fn list_dishes(
        &self,
        menu_id: Uuid,
        submenu_id: Uuid,
    ) -> Result<Vec<DishView>, CatalogError> {
        let dishes = self
            .read_list(
                ListScope::Submenu {
                    menu_id,
                    submenu_id,
                },
                || self.reader.list_dishes(menu_id, submenu_id),
            )
            .await?;
        Ok(self.discounts.apply_all(dishes))
    }

    pub async fn get_dish(
        &self,
        menu_id: Uuid,
        submenu_id: Uuid,
        dish_id: Uuid,
    ) -> Result<DishView, CatalogError> {
        let dish = self
            .read_one(Lineage::dish(menu_id, submenu_id, dish_id), || {
                self.reader.find_dish(menu_id, submenu_id, dish_id)
            })
            .await?
            .ok_or_else(|| CatalogError::not_found(EntityKind::Dish, dish_id))?;
        Ok(self.discounts.apply(dish))
    }

    pub async fn create_dish(
        &self,
        menu_id: Uuid,
        submenu_id: Uuid,
        content: DishContent,
    ) -> Result<DishView, CatalogError> {
        self.require_submenu(menu_id, submenu_id).await?;
        let record = self
            .writer
            .create_dish(CreateDishParams {
                id: Uuid::new_v4(),
                submenu_id,
                title: content.title,
                description: content.description,
                price: content.price,
            })
            .await
            .map_err(orphaned_as(EntityKind::Submenu, submenu_id))?;
        self.evict(
            Change::Created,
            Lineage::dish(menu_id, submenu_id, record.id),
        )
        .await;
        Ok(self.discounts.apply(DishView::from(record)))
    }

    pub async fn update_dish(
        &self,
        menu_id: Uuid,
        submenu_id: Uuid,
        dish_id: Uuid,
        content: DishContent,
    ) -> Result<DishView, CatalogError> {
        self.require_dish(menu_id, submenu_id, dish_id).await?;
        let record = self
            .writer
            .update_dish(UpdateDishParams {
                id: dish_id,
                submenu_id,
                title: content.title,
                description: content.description,
                price: content.price,
            })
            .await
            .map_err(missing_as(EntityKind::Dish, dish_id))?;
        self.evict(Change::Updated, Lineage::dish(menu_id, submenu_id, dish_id))
            .await;
        Ok(self.discounts.apply(DishView::from(record)))
    }

    pub async fn delete_dish(
        &self,
        menu_id: Uuid,
        submenu_id: Uuid,
        dish_id: Uuid,
    ) -> Result<(), CatalogError> {
        self.require_dish(menu_id, submenu_id, dish_id).await?;
        self.writer
            .delete_dish(dish_id)
            .await
            .map_err(missing_as(EntityKind::Dish, dish_id))?;
        self.evict(Change::Deleted, Lineage::dish(menu_id, submenu_id, dish_id))
            .await;
        Ok(())
    }

    // ---- helpers ----

    async fn require_submenu(&self, menu_id: Uuid, submenu_id: Uuid) -> Result<(), CatalogError> {
        match self.reader.find_submenu(menu_id, submenu_id).await? {
            Some(_) => Ok(()),
            None => Err(CatalogError::not_found(EntityKind::Submenu, submenu_id)),
        }
    }

    async fn require_dish(
        &self,
        menu_id: Uuid,
        submenu_id: Uuid,
        dish_id: Uuid,
    ) -> Result<(), CatalogError> {
        match self.reader.find_dish(menu_id, submenu_id, dish_id).await? {
            Some(_) => Ok(()),
            None => Err(CatalogError::not_found(EntityKind::Dish, dish_id)),
        }
    }

    async fn read_list<T, F, Fut>(&self, scope: ListScope, load: F) -> Result<Vec<T>, CatalogError>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, RepoError>>,
    {
        if let Some(cache) = &self.cache {
            if let Some(items) = cache.get_list(&scope).await {
                return Ok(items);
            }
        }
        let items = load().await?;
        if let Some(cache) = &self.cache {
            cache.populate_list(scope, items.clone());
        }
        Ok(items)
    }

    async fn read_one<T, F, Fut>(&self, lineage: Lineage, load: F) -> Result<Option<T>, CatalogError>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, RepoError>>,
    {
        if let Some(cache) = &self.cache {
            if let Some(item) = cache.get_one(&lineage).await {
                return Ok(Some(item));
            }
        }
        let item = load().await?;
        if let (Some(cache), Some(found)) = (&self.cache, &item) {
            cache.populate_one(lineage, found.clone());
        }
        Ok(item)
    }

    async fn evict(&self, change: Change, lineage: Lineage) {
        if let Some(cache) = &self.cache {
            cache
                .apply(&InvalidationPlan::for_change(change, &lineage))
                .await;
        }
    }
}

fn missing_as(kind: EntityKind, id: Uuid) -> impl FnOnce(RepoError) -> CatalogError {
    move |err| match err {
        RepoError::NotFound => CatalogError::not_found(kind, id),
        other => CatalogError::Repo(other),
    }
}

/// A create whose parent disappeared after the existence check.
fn orphaned_as(kind: EntityKind, parent_id: Uuid) -> impl FnOnce(RepoError) -> CatalogError {
    move |err| match err {
        RepoError::MissingParent { .. } => CatalogError::not_found(kind, parent_id),
        other => CatalogError::Repo(other),
    }
}
