use uuid::Uuid;

use crate::domain::entities::{
    DishRecord, DishView, MenuRecord, MenuView, SubmenuRecord, SubmenuView,
};

#[derive(sqlx::FromRow)]
pub(super) struct MenuRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
}

impl From<MenuRow> for MenuRecord {
    fn from(row: MenuRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct MenuViewRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub submenus_count: i64,
    pub dishes_count: i64,
}

impl From<MenuViewRow> for MenuView {
    fn from(row: MenuViewRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            submenus_count: row.submenus_count,
            dishes_count: row.dishes_count,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct SubmenuRow {
    pub id: Uuid,
    pub menu_id: Uuid,
    pub title: String,
    pub description: String,
}

impl From<SubmenuRow> for SubmenuRecord {
    fn from(row: SubmenuRow) -> Self {
        Self {
            id: row.id,
            menu_id: row.menu_id,
            title: row.title,
            description: row.description,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct SubmenuViewRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub dishes_count: i64,
}

impl From<SubmenuViewRow> for SubmenuView {
    fn from(row: SubmenuViewRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            dishes_count: row.dishes_count,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct DishRow {
    pub id: Uuid,
    pub submenu_id: Uuid,
    pub title: String,
    pub description: String,
    pub price: String,
}

impl From<DishRow> for DishRecord {
    fn from(row: DishRow) -> Self {
        Self {
            id: row.id,
            submenu_id: row.submenu_id,
            title: row.title,
            description: row.description,
            price: row.price,
        }
    }
}

impl From<DishRow> for DishView {
    fn from(row: DishRow) -> Self {
        DishRecord::from(row).into()
    }
}
