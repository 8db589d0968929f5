use async_trait::async_trait;
use uuid::Uuid;

use crate::application::repos::{CatalogRepo, RepoError};
use crate::domain::entities::{
    DishRecord, DishView, MenuRecord, MenuView, SubmenuRecord, SubmenuView,
};

use super::super::{PostgresRepositories, map_sqlx_error};
use super::types::{DishRow, MenuRow, MenuViewRow, SubmenuRow, SubmenuViewRow};

const MENU_VIEW_SELECT: &str = r#"
    SELECT
        m.id,
        m.title,
        m.description,
        (SELECT COUNT(*) FROM submenus s WHERE s.menu_id = m.id) AS submenus_count,
        (
            SELECT COUNT(*)
            FROM dishes d
            INNER JOIN submenus s ON s.id = d.submenu_id
            WHERE s.menu_id = m.id
        ) AS dishes_count
    FROM menus m
"#;

const SUBMENU_VIEW_SELECT: &str = r#"
    SELECT
        s.id,
        s.title,
        s.description,
        (SELECT COUNT(*) FROM dishes d WHERE d.submenu_id = s.id) AS dishes_count
    FROM submenus s
"#;

const DISH_SELECT: &str = r#"
    SELECT d.id, d.submenu_id, d.title, d.description, d.price
    FROM dishes d
    INNER JOIN submenus s ON s.id = d.submenu_id
"#;

#[async_trait]
impl CatalogRepo for PostgresRepositories {
    async fn list_menus(&self) -> Result<Vec<MenuView>, RepoError> {
        let sql = format!("{MENU_VIEW_SELECT} ORDER BY m.created_at, m.id");
        let rows = sqlx::query_as::<_, MenuViewRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(MenuView::from).collect())
    }

    async fn find_menu(&self, menu_id: Uuid) -> Result<Option<MenuView>, RepoError> {
        let sql = format!("{MENU_VIEW_SELECT} WHERE m.id = $1");
        let row = sqlx::query_as::<_, MenuViewRow>(&sql)
            .bind(menu_id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(MenuView::from))
    }

    async fn list_submenus(&self, menu_id: Uuid) -> Result<Vec<SubmenuView>, RepoError> {
        let sql = format!("{SUBMENU_VIEW_SELECT} WHERE s.menu_id = $1 ORDER BY s.created_at, s.id");
        let rows = sqlx::query_as::<_, SubmenuViewRow>(&sql)
            .bind(menu_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(SubmenuView::from).collect())
    }

    async fn find_submenu(
        &self,
        menu_id: Uuid,
        submenu_id: Uuid,
    ) -> Result<Option<SubmenuView>, RepoError> {
        let sql = format!("{SUBMENU_VIEW_SELECT} WHERE s.id = $1 AND s.menu_id = $2");
        let row = sqlx::query_as::<_, SubmenuViewRow>(&sql)
            .bind(submenu_id)
            .bind(menu_id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(SubmenuView::from))
    }

    async fn list_dishes(
        &self,
        menu_id: Uuid,
        submenu_id: Uuid,
    ) -> Result<Vec<DishView>, RepoError> {
        let sql = format!(
            "{DISH_SELECT} WHERE d.submenu_id = $1 AND s.menu_id = $2 ORDER BY d.created_at, d.id"
        );
        let rows = sqlx::query_as::<_, DishRow>(&sql)
            .bind(submenu_id)
            .bind(menu_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(DishView::from).collect())
    }

    async fn find_dish(
        &self,
        menu_id: Uuid,
        submenu_id: Uuid,
        dish_id: Uuid,
    ) -> Result<Option<DishView>, RepoError> {
        let sql = format!("{DISH_SELECT} WHERE d.id = $1 AND d.submenu_id = $2 AND s.menu_id = $3");
        let row = sqlx::query_as::<_, DishRow>(&sql)
            .bind(dish_id)
            .bind(submenu_id)
            .bind(menu_id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(DishView::from))
    }

    async fn all_menus(&self) -> Result<Vec<MenuRecord>, RepoError> {
        let rows = sqlx::query_as::<_, MenuRow>(
            r#"
            SELECT id, title, description
            FROM menus
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(MenuRecord::from).collect())
    }

    async fn all_submenus(&self) -> Result<Vec<SubmenuRecord>, RepoError> {
        let rows = sqlx::query_as::<_, SubmenuRow>(
            r#"
            SELECT id, menu_id, title, description
            FROM submenus
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(SubmenuRecord::from).collect())
    }

    async fn all_dishes(&self) -> Result<Vec<DishRecord>, RepoError> {
        let rows = sqlx::query_as::<_, DishRow>(
            r#"
            SELECT id, submenu_id, title, description, price
            FROM dishes
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(DishRecord::from).collect())
    }
}
