#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use tavola::application::catalog::CatalogService;
use tavola::application::discount::DiscountOverlay;
use tavola::application::repos::{
    CatalogRepo, CatalogWriteRepo, CreateDishParams, CreateMenuParams, CreateSubmenuParams,
    RepoError, UpdateDishParams, UpdateMenuParams, UpdateSubmenuParams,
};
use tavola::application::sync::{Reconciler, Snapshot, SyncService};
use tavola::application::sync::SnapshotSource;
use tavola::application::sync::SnapshotError;
use tavola::cache::{EntityCache, MemoryCacheStore};
use tavola::domain::entities::{
    DishRecord, DishView, MenuRecord, MenuView, SubmenuRecord, SubmenuView,
};

#[derive(Default)]
struct Tables {
    menus: Vec<MenuRecord>,
    submenus: Vec<SubmenuRecord>,
    dishes: Vec<DishRecord>,
}

impl Tables {
    fn submenu_ids(&self, menu_id: Uuid) -> Vec<Uuid> {
        self.submenus
            .iter()
            .filter(|submenu| submenu.menu_id == menu_id)
            .map(|submenu| submenu.id)
            .collect()
    }

    fn dish_count(&self, submenu_id: Uuid) -> i64 {
        self.dishes
            .iter()
            .filter(|dish| dish.submenu_id == submenu_id)
            .count() as i64
    }

    fn menu_view(&self, menu: &MenuRecord) -> MenuView {
        let submenus = self.submenu_ids(menu.id);
        MenuView {
            id: menu.id,
            title: menu.title.clone(),
            description: menu.description.clone(),
            submenus_count: submenus.len() as i64,
            dishes_count: submenus.iter().map(|id| self.dish_count(*id)).sum(),
        }
    }

    fn submenu_view(&self, submenu: &SubmenuRecord) -> SubmenuView {
        SubmenuView {
            id: submenu.id,
            title: submenu.title.clone(),
            description: submenu.description.clone(),
            dishes_count: self.dish_count(submenu.id),
        }
    }

    fn scoped_submenu(&self, menu_id: Uuid, submenu_id: Uuid) -> Option<&SubmenuRecord> {
        self.submenus
            .iter()
            .find(|submenu| submenu.id == submenu_id && submenu.menu_id == menu_id)
    }
}

/// Catalog store held in memory, with cascading deletes, a count of every
/// successful write and an optional one-shot write failure.
#[derive(Default)]
pub struct InMemoryCatalog {
    tables: Mutex<Tables>,
    writes: AtomicUsize,
    fail_after: StdMutex<Option<usize>>,
}

impl InMemoryCatalog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn menu_count(&self) -> usize {
        self.tables.lock().await.menus.len()
    }

    pub async fn dish(&self, id: Uuid) -> Option<DishRecord> {
        self.tables
            .lock()
            .await
            .dishes
            .iter()
            .find(|dish| dish.id == id)
            .cloned()
    }

    /// Let `successes` more writes through, fail the one after, then
    /// behave normally again.
    pub fn fail_after_writes(&self, successes: usize) {
        *self.fail_after.lock().expect("fault lock") = Some(successes);
    }

    fn injected_fault(&self) -> Result<(), RepoError> {
        let mut fail_after = self.fail_after.lock().expect("fault lock");
        match *fail_after {
            Some(0) => {
                *fail_after = None;
                Err(RepoError::Persistence("injected write failure".into()))
            }
            Some(remaining) => {
                *fail_after = Some(remaining - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn wrote(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CatalogRepo for InMemoryCatalog {
    async fn list_menus(&self) -> Result<Vec<MenuView>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables.menus.iter().map(|menu| tables.menu_view(menu)).collect())
    }

    async fn find_menu(&self, menu_id: Uuid) -> Result<Option<MenuView>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .menus
            .iter()
            .find(|menu| menu.id == menu_id)
            .map(|menu| tables.menu_view(menu)))
    }

    async fn list_submenus(&self, menu_id: Uuid) -> Result<Vec<SubmenuView>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .submenus
            .iter()
            .filter(|submenu| submenu.menu_id == menu_id)
            .map(|submenu| tables.submenu_view(submenu))
            .collect())
    }

    async fn find_submenu(
        &self,
        menu_id: Uuid,
        submenu_id: Uuid,
    ) -> Result<Option<SubmenuView>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .scoped_submenu(menu_id, submenu_id)
            .map(|submenu| tables.submenu_view(submenu)))
    }

    async fn list_dishes(
        &self,
        menu_id: Uuid,
        submenu_id: Uuid,
    ) -> Result<Vec<DishView>, RepoError> {
        let tables = self.tables.lock().await;
        if tables.scoped_submenu(menu_id, submenu_id).is_none() {
            return Ok(Vec::new());
        }
        Ok(tables
            .dishes
            .iter()
            .filter(|dish| dish.submenu_id == submenu_id)
            .cloned()
            .map(DishView::from)
            .collect())
    }

    async fn find_dish(
        &self,
        menu_id: Uuid,
        submenu_id: Uuid,
        dish_id: Uuid,
    ) -> Result<Option<DishView>, RepoError> {
        let tables = self.tables.lock().await;
        if tables.scoped_submenu(menu_id, submenu_id).is_none() {
            return Ok(None);
        }
        Ok(tables
            .dishes
            .iter()
            .find(|dish| dish.id == dish_id && dish.submenu_id == submenu_id)
            .cloned()
            .map(DishView::from))
    }

    async fn all_menus(&self) -> Result<Vec<MenuRecord>, RepoError> {
        Ok(self.tables.lock().await.menus.clone())
    }

    async fn all_submenus(&self) -> Result<Vec<SubmenuRecord>, RepoError> {
        Ok(self.tables.lock().await.submenus.clone())
    }

    async fn all_dishes(&self) -> Result<Vec<DishRecord>, RepoError> {
        Ok(self.tables.lock().await.dishes.clone())
    }
}

#[async_trait]
impl CatalogWriteRepo for InMemoryCatalog {
    async fn create_menu(&self, params: CreateMenuParams) -> Result<MenuRecord, RepoError> {
        self.injected_fault()?;
        let mut tables = self.tables.lock().await;
        if tables.menus.iter().any(|menu| menu.id == params.id) {
            return Err(RepoError::Duplicate {
                constraint: "menus_pkey".into(),
            });
        }
        let record = MenuRecord {
            id: params.id,
            title: params.title,
            description: params.description,
        };
        tables.menus.push(record.clone());
        self.wrote();
        Ok(record)
    }

    async fn update_menu(&self, params: UpdateMenuParams) -> Result<MenuRecord, RepoError> {
        self.injected_fault()?;
        let mut tables = self.tables.lock().await;
        let menu = tables
            .menus
            .iter_mut()
            .find(|menu| menu.id == params.id)
            .ok_or(RepoError::NotFound)?;
        menu.title = params.title;
        menu.description = params.description;
        let record = menu.clone();
        self.wrote();
        Ok(record)
    }

    async fn delete_menu(&self, id: Uuid) -> Result<(), RepoError> {
        self.injected_fault()?;
        let mut tables = self.tables.lock().await;
        if !tables.menus.iter().any(|menu| menu.id == id) {
            return Err(RepoError::NotFound);
        }
        let submenus = tables.submenu_ids(id);
        tables.menus.retain(|menu| menu.id != id);
        tables.submenus.retain(|submenu| submenu.menu_id != id);
        tables
            .dishes
            .retain(|dish| !submenus.contains(&dish.submenu_id));
        self.wrote();
        Ok(())
    }

    async fn create_submenu(
        &self,
        params: CreateSubmenuParams,
    ) -> Result<SubmenuRecord, RepoError> {
        self.injected_fault()?;
        let mut tables = self.tables.lock().await;
        if !tables.menus.iter().any(|menu| menu.id == params.menu_id) {
            return Err(RepoError::MissingParent {
                constraint: "submenus_menu_id_fkey".into(),
            });
        }
        let record = SubmenuRecord {
            id: params.id,
            menu_id: params.menu_id,
            title: params.title,
            description: params.description,
        };
        tables.submenus.push(record.clone());
        self.wrote();
        Ok(record)
    }

    async fn update_submenu(
        &self,
        params: UpdateSubmenuParams,
    ) -> Result<SubmenuRecord, RepoError> {
        self.injected_fault()?;
        let mut tables = self.tables.lock().await;
        let submenu = tables
            .submenus
            .iter_mut()
            .find(|submenu| submenu.id == params.id)
            .ok_or(RepoError::NotFound)?;
        submenu.menu_id = params.menu_id;
        submenu.title = params.title;
        submenu.description = params.description;
        let record = submenu.clone();
        self.wrote();
        Ok(record)
    }

    async fn delete_submenu(&self, id: Uuid) -> Result<(), RepoError> {
        self.injected_fault()?;
        let mut tables = self.tables.lock().await;
        if !tables.submenus.iter().any(|submenu| submenu.id == id) {
            return Err(RepoError::NotFound);
        }
        tables.submenus.retain(|submenu| submenu.id != id);
        tables.dishes.retain(|dish| dish.submenu_id != id);
        self.wrote();
        Ok(())
    }

    async fn create_dish(&self, params: CreateDishParams) -> Result<DishRecord, RepoError> {
        self.injected_fault()?;
        let mut tables = self.tables.lock().await;
        if !tables
            .submenus
            .iter()
            .any(|submenu| submenu.id == params.submenu_id)
        {
            return Err(RepoError::MissingParent {
                constraint: "dishes_submenu_id_fkey".into(),
            });
        }
        let record = DishRecord {
            id: params.id,
            submenu_id: params.submenu_id,
            title: params.title,
            description: params.description,
            price: params.price,
        };
        tables.dishes.push(record.clone());
        self.wrote();
        Ok(record)
    }

    async fn update_dish(&self, params: UpdateDishParams) -> Result<DishRecord, RepoError> {
        self.injected_fault()?;
        let mut tables = self.tables.lock().await;
        let dish = tables
            .dishes
            .iter_mut()
            .find(|dish| dish.id == params.id)
            .ok_or(RepoError::NotFound)?;
        dish.submenu_id = params.submenu_id;
        dish.title = params.title;
        dish.description = params.description;
        dish.price = params.price;
        let record = dish.clone();
        self.wrote();
        Ok(record)
    }

    async fn delete_dish(&self, id: Uuid) -> Result<(), RepoError> {
        self.injected_fault()?;
        let mut tables = self.tables.lock().await;
        if !tables.dishes.iter().any(|dish| dish.id == id) {
            return Err(RepoError::NotFound);
        }
        tables.dishes.retain(|dish| dish.id != id);
        self.wrote();
        Ok(())
    }
}

/// Snapshot source whose contents can be swapped between runs.
#[derive(Default)]
pub struct StaticSnapshotSource {
    snapshot: StdMutex<Snapshot>,
}

impl StaticSnapshotSource {
    pub fn new(snapshot: Snapshot) -> Arc<Self> {
        Arc::new(Self {
            snapshot: StdMutex::new(snapshot),
        })
    }

    pub fn set(&self, snapshot: Snapshot) {
        *self.snapshot.lock().expect("snapshot lock") = snapshot;
    }
}

#[async_trait]
impl SnapshotSource for StaticSnapshotSource {
    async fn load(&self) -> Result<Snapshot, SnapshotError> {
        Ok(self.snapshot.lock().expect("snapshot lock").clone())
    }

    fn describe(&self) -> String {
        "static".to_string()
    }
}

/// A catalog service and sync service sharing one store, cache and
/// discount overlay.
pub struct Harness {
    pub store: Arc<InMemoryCatalog>,
    pub cache_store: Arc<MemoryCacheStore>,
    pub source: Arc<StaticSnapshotSource>,
    pub catalog: Arc<CatalogService>,
    pub sync: Arc<SyncService>,
}

impl Harness {
    pub fn new(snapshot: Snapshot) -> Self {
        let store = InMemoryCatalog::new();
        let cache_store = Arc::new(MemoryCacheStore::new());
        let cache = EntityCache::new(cache_store.clone());
        let discounts = Arc::new(DiscountOverlay::new());
        let reader: Arc<dyn CatalogRepo> = store.clone();
        let writer: Arc<dyn CatalogWriteRepo> = store.clone();

        let catalog = CatalogService::new(reader.clone(), writer.clone(), discounts.clone())
            .with_cache_opt(Some(cache.clone()));
        let source = StaticSnapshotSource::new(snapshot);
        let reconciler = Reconciler::new(reader, writer).with_cache_opt(Some(cache));
        let sync = SyncService::new(source.clone(), reconciler, discounts);

        Self {
            store,
            cache_store,
            source,
            catalog: Arc::new(catalog),
            sync: Arc::new(sync),
        }
    }
}

pub const MENU_ID: &str = "3b5d2e8c-8f57-4c9e-9c7f-2f1ed3b0d8a1";
pub const SUBMENU_ID: &str = "9f0c8c55-3a6d-4f5d-8f0e-1b2c3d4e5f60";
pub const DISH_ID: &str = "c1d2e3f4-a5b6-4c7d-8e9f-0a1b2c3d4e5f";

pub fn id(raw: &str) -> Uuid {
    Uuid::parse_str(raw).expect("valid uuid")
}

/// One menu, one submenu, one dish priced 10.00 with a 20% discount.
pub fn single_dish_sheet() -> Snapshot {
    Snapshot::from_text_rows(vec![
        vec![MENU_ID, "Lunch", "Weekday lunch", "", "", "", ""],
        vec!["", SUBMENU_ID, "Soups", "Hot soups", "", "", ""],
        vec!["", "", DISH_ID, "Borscht", "Beet soup", "10.00", "20"],
    ])
}
