//! Diff-and-apply reconciliation of a parsed snapshot against the store.
//!
//! Kinds are processed top-down (menus, submenus, dishes) so every parent a
//! row refers to exists before the row is written. Each mutation commits on
//! its own and is followed by the cache evictions it implies. The first store
//! failure aborts the run; the next run picks up where this one stopped.
//! Stored rows whose sheet row was skipped as malformed are left as they are.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::application::repos::{
    CatalogRepo, CatalogWriteRepo, CreateDishParams, CreateMenuParams, CreateSubmenuParams,
    RepoError, UpdateDishParams, UpdateMenuParams, UpdateSubmenuParams,
};
use crate::cache::{Change, EntityCache, InvalidationPlan, Lineage};
use crate::domain::entities::{DishRecord, MenuRecord, SubmenuRecord};
use crate::domain::types::EntityKind;

use super::snapshot::{
    ParsedSnapshot, SkippedRow, SourceDish, SourceMenu, SourceSubmenu,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindTally {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl KindTally {
    pub fn total(&self) -> usize {
        self.inserted + self.updated + self.deleted
    }
}

/// Outcome of one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub menus: KindTally,
    pub submenus: KindTally,
    pub dishes: KindTally,
    pub skipped: Vec<SkippedRow>,
}

impl ReconcileReport {
    pub fn tally(&self, kind: EntityKind) -> &KindTally {
        match kind {
            EntityKind::Menu => &self.menus,
            EntityKind::Submenu => &self.submenus,
            EntityKind::Dish => &self.dishes,
        }
    }

    /// Store mutations performed.
    pub fn mutations(&self) -> usize {
        self.menus.total() + self.submenus.total() + self.dishes.total()
    }
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("failed to load stored {kind} records")]
    Load {
        kind: EntityKind,
        #[source]
        source: RepoError,
    },
    #[error("failed to {action} {kind} `{id}`")]
    Persistence {
        kind: EntityKind,
        id: Uuid,
        action: &'static str,
        #[source]
        source: RepoError,
    },
}

impl ReconcileError {
    fn load(kind: EntityKind) -> impl FnOnce(RepoError) -> Self {
        move |source| Self::Load { kind, source }
    }

    fn persistence(
        kind: EntityKind,
        id: Uuid,
        action: &'static str,
    ) -> impl FnOnce(RepoError) -> Self {
        move |source| Self::Persistence {
            kind,
            id,
            action,
            source,
        }
    }
}

#[derive(Clone)]
pub struct Reconciler {
    reader: Arc<dyn CatalogRepo>,
    writer: Arc<dyn CatalogWriteRepo>,
    cache: Option<EntityCache>,
}

impl Reconciler {
    pub fn new(reader: Arc<dyn CatalogRepo>, writer: Arc<dyn CatalogWriteRepo>) -> Self {
        Self {
            reader,
            writer,
            cache: None,
        }
    }

    pub fn with_cache_opt(mut self, cache: Option<EntityCache>) -> Self {
        self.cache = cache;
        self
    }

    pub async fn reconcile(
        &self,
        parsed: &ParsedSnapshot,
    ) -> Result<ReconcileReport, ReconcileError> {
        let mut report = ReconcileReport {
            skipped: parsed.skipped.clone(),
            ..Default::default()
        };

        let held = parsed.held_ids();
        self.sync_menus(&parsed.menus, &held, &mut report.menus)
            .await?;
        self.sync_submenus(&parsed.submenus, &held, &mut report.submenus)
            .await?;
        self.sync_dishes(&parsed.dishes, &held, &mut report.dishes)
            .await?;

        Ok(report)
    }

    async fn sync_menus(
        &self,
        rows: &[SourceMenu],
        held: &HashSet<Uuid>,
        tally: &mut KindTally,
    ) -> Result<(), ReconcileError> {
        const KIND: EntityKind = EntityKind::Menu;
        let mut pending = Pending::new(rows, |row| row.id);
        let existing = self
            .reader
            .all_menus()
            .await
            .map_err(ReconcileError::load(KIND))?;

        for record in existing {
            let lineage = Lineage::menu(record.id);
            match pending.take(record.id) {
                None if held.contains(&record.id) => {
                    debug!(
                        target = "tavola::sync",
                        kind = %KIND,
                        id = %record.id,
                        "Keeping row held by a skipped sheet row"
                    );
                }
                None => {
                    tolerate_missing(self.writer.delete_menu(record.id).await)
                        .map_err(ReconcileError::persistence(KIND, record.id, "delete"))?;
                    self.evict(InvalidationPlan::for_change(Change::Deleted, &lineage))
                        .await;
                    tally.deleted += 1;
                }
                Some(row) if menu_differs(&record, row) => {
                    self.writer
                        .update_menu(UpdateMenuParams {
                            id: row.id,
                            title: row.title.clone(),
                            description: row.description.clone(),
                        })
                        .await
                        .map_err(ReconcileError::persistence(KIND, record.id, "update"))?;
                    self.evict(InvalidationPlan::for_change(Change::Updated, &lineage))
                        .await;
                    tally.updated += 1;
                }
                Some(_) => {}
            }
        }

        for row in pending.into_remaining() {
            self.writer
                .create_menu(CreateMenuParams {
                    id: row.id,
                    title: row.title.clone(),
                    description: row.description.clone(),
                })
                .await
                .map_err(ReconcileError::persistence(KIND, row.id, "insert"))?;
            self.evict(InvalidationPlan::for_change(
                Change::Created,
                &Lineage::menu(row.id),
            ))
            .await;
            tally.inserted += 1;
        }

        Ok(())
    }

    async fn sync_submenus(
        &self,
        rows: &[SourceSubmenu],
        held: &HashSet<Uuid>,
        tally: &mut KindTally,
    ) -> Result<(), ReconcileError> {
        const KIND: EntityKind = EntityKind::Submenu;
        let mut pending = Pending::new(rows, |row| row.id);
        let existing = self
            .reader
            .all_submenus()
            .await
            .map_err(ReconcileError::load(KIND))?;

        for record in existing {
            let lineage = Lineage::submenu(record.menu_id, record.id);
            match pending.take(record.id) {
                None if held.contains(&record.id) => {
                    debug!(
                        target = "tavola::sync",
                        kind = %KIND,
                        id = %record.id,
                        "Keeping row held by a skipped sheet row"
                    );
                }
                None => {
                    tolerate_missing(self.writer.delete_submenu(record.id).await)
                        .map_err(ReconcileError::persistence(KIND, record.id, "delete"))?;
                    self.evict(InvalidationPlan::for_change(Change::Deleted, &lineage))
                        .await;
                    tally.deleted += 1;
                }
                Some(row) if submenu_differs(&record, row) => {
                    self.writer
                        .update_submenu(UpdateSubmenuParams {
                            id: row.id,
                            menu_id: row.menu_id,
                            title: row.title.clone(),
                            description: row.description.clone(),
                        })
                        .await
                        .map_err(ReconcileError::persistence(KIND, record.id, "update"))?;
                    let plan = if row.menu_id == record.menu_id {
                        InvalidationPlan::for_change(Change::Updated, &lineage)
                    } else {
                        InvalidationPlan::for_move(
                            &lineage,
                            &Lineage::submenu(row.menu_id, row.id),
                        )
                    };
                    self.evict(plan).await;
                    tally.updated += 1;
                }
                Some(_) => {}
            }
        }

        for row in pending.into_remaining() {
            self.writer
                .create_submenu(CreateSubmenuParams {
                    id: row.id,
                    menu_id: row.menu_id,
                    title: row.title.clone(),
                    description: row.description.clone(),
                })
                .await
                .map_err(ReconcileError::persistence(KIND, row.id, "insert"))?;
            self.evict(InvalidationPlan::for_change(
                Change::Created,
                &Lineage::submenu(row.menu_id, row.id),
            ))
            .await;
            tally.inserted += 1;
        }

        Ok(())
    }

    async fn sync_dishes(
        &self,
        rows: &[SourceDish],
        held: &HashSet<Uuid>,
        tally: &mut KindTally,
    ) -> Result<(), ReconcileError> {
        const KIND: EntityKind = EntityKind::Dish;
        let mut pending = Pending::new(rows, |row| row.id);
        let parents: HashMap<Uuid, Uuid> = self
            .reader
            .all_submenus()
            .await
            .map_err(ReconcileError::load(EntityKind::Submenu))?
            .into_iter()
            .map(|submenu| (submenu.id, submenu.menu_id))
            .collect();
        let existing = self
            .reader
            .all_dishes()
            .await
            .map_err(ReconcileError::load(KIND))?;

        for record in existing {
            match pending.take(record.id) {
                None if held.contains(&record.id) => {
                    debug!(
                        target = "tavola::sync",
                        kind = %KIND,
                        id = %record.id,
                        "Keeping row held by a skipped sheet row"
                    );
                }
                None => {
                    tolerate_missing(self.writer.delete_dish(record.id).await)
                        .map_err(ReconcileError::persistence(KIND, record.id, "delete"))?;
                    self.evict(dish_plan(
                        Change::Deleted,
                        &parents,
                        record.submenu_id,
                        record.id,
                    ))
                    .await;
                    tally.deleted += 1;
                }
                Some(row) if dish_differs(&record, row) => {
                    self.writer
                        .update_dish(UpdateDishParams {
                            id: row.id,
                            submenu_id: row.submenu_id,
                            title: row.title.clone(),
                            description: row.description.clone(),
                            price: row.price.clone(),
                        })
                        .await
                        .map_err(ReconcileError::persistence(KIND, record.id, "update"))?;
                    let plan = if row.submenu_id == record.submenu_id {
                        dish_plan(Change::Updated, &parents, record.submenu_id, record.id)
                    } else {
                        let mut plan =
                            dish_plan(Change::Deleted, &parents, record.submenu_id, record.id);
                        plan.merge(dish_plan(Change::Created, &parents, row.submenu_id, row.id));
                        plan
                    };
                    self.evict(plan).await;
                    tally.updated += 1;
                }
                Some(_) => {}
            }
        }

        for row in pending.into_remaining() {
            self.writer
                .create_dish(CreateDishParams {
                    id: row.id,
                    submenu_id: row.submenu_id,
                    title: row.title.clone(),
                    description: row.description.clone(),
                    price: row.price.clone(),
                })
                .await
                .map_err(ReconcileError::persistence(KIND, row.id, "insert"))?;
            self.evict(dish_plan(Change::Created, &parents, row.submenu_id, row.id))
                .await;
            tally.inserted += 1;
        }

        Ok(())
    }

    async fn evict(&self, plan: InvalidationPlan) {
        debug!(target = "tavola::sync", plan = %plan, "Evicting cache entries");
        if let Some(cache) = &self.cache {
            cache.apply(&plan).await;
        }
    }
}

/// Snapshot rows of one kind awaiting a match. Later duplicates replace
/// earlier ones but keep the earlier position.
struct Pending<'a, T> {
    order: Vec<Uuid>,
    rows: HashMap<Uuid, &'a T>,
}

impl<'a, T> Pending<'a, T> {
    fn new(rows: &'a [T], id_of: fn(&T) -> Uuid) -> Self {
        let mut order = Vec::with_capacity(rows.len());
        let mut by_id = HashMap::with_capacity(rows.len());
        for row in rows {
            let id = id_of(row);
            if by_id.insert(id, row).is_none() {
                order.push(id);
            }
        }
        Self { order, rows: by_id }
    }

    fn take(&mut self, id: Uuid) -> Option<&'a T> {
        self.rows.remove(&id)
    }

    fn into_remaining(mut self) -> Vec<&'a T> {
        self.order
            .iter()
            .filter_map(|id| self.rows.remove(id))
            .collect()
    }
}

/// A delete racing another delete has nothing left to do.
fn tolerate_missing(result: Result<(), RepoError>) -> Result<(), RepoError> {
    match result {
        Err(RepoError::NotFound) => Ok(()),
        other => other,
    }
}

fn dish_plan(
    change: Change,
    parents: &HashMap<Uuid, Uuid>,
    submenu_id: Uuid,
    dish_id: Uuid,
) -> InvalidationPlan {
    match parents.get(&submenu_id) {
        Some(&menu_id) => {
            InvalidationPlan::for_change(change, &Lineage::dish(menu_id, submenu_id, dish_id))
        }
        None => InvalidationPlan::for_unknown_menu(submenu_id),
    }
}

fn menu_differs(record: &MenuRecord, row: &SourceMenu) -> bool {
    record.title != row.title || record.description != row.description
}

fn submenu_differs(record: &SubmenuRecord, row: &SourceSubmenu) -> bool {
    record.menu_id != row.menu_id
        || record.title != row.title
        || record.description != row.description
}

fn dish_differs(record: &DishRecord, row: &SourceDish) -> bool {
    record.submenu_id != row.submenu_id
        || record.title != row.title
        || record.description != row.description
        || record.price != row.price
}
