use async_trait::async_trait;
use uuid::Uuid;

use crate::application::repos::{
    CatalogWriteRepo, CreateDishParams, CreateMenuParams, CreateSubmenuParams, RepoError,
    UpdateDishParams, UpdateMenuParams, UpdateSubmenuParams,
};
use crate::domain::entities::{DishRecord, MenuRecord, SubmenuRecord};

use super::super::{PostgresRepositories, map_sqlx_error};
use super::types::{DishRow, MenuRow, SubmenuRow};

#[async_trait]
impl CatalogWriteRepo for PostgresRepositories {
    async fn create_menu(&self, params: CreateMenuParams) -> Result<MenuRecord, RepoError> {
        let CreateMenuParams {
            id,
            title,
            description,
        } = params;

        let row = sqlx::query_as::<_, MenuRow>(
            r#"
            INSERT INTO menus (id, title, description)
            VALUES ($1, $2, $3)
            RETURNING id, title, description
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(description)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_menu(&self, params: UpdateMenuParams) -> Result<MenuRecord, RepoError> {
        let UpdateMenuParams {
            id,
            title,
            description,
        } = params;

        let row = sqlx::query_as::<_, MenuRow>(
            r#"
            UPDATE menus
            SET title = $2, description = $3
            WHERE id = $1
            RETURNING id, title, description
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(description)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn delete_menu(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM menus WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        expect_one(result.rows_affected())
    }

    async fn create_submenu(
        &self,
        params: CreateSubmenuParams,
    ) -> Result<SubmenuRecord, RepoError> {
        let CreateSubmenuParams {
            id,
            menu_id,
            title,
            description,
        } = params;

        let row = sqlx::query_as::<_, SubmenuRow>(
            r#"
            INSERT INTO submenus (id, menu_id, title, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, menu_id, title, description
            "#,
        )
        .bind(id)
        .bind(menu_id)
        .bind(title)
        .bind(description)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_submenu(
        &self,
        params: UpdateSubmenuParams,
    ) -> Result<SubmenuRecord, RepoError> {
        let UpdateSubmenuParams {
            id,
            menu_id,
            title,
            description,
        } = params;

        let row = sqlx::query_as::<_, SubmenuRow>(
            r#"
            UPDATE submenus
            SET menu_id = $2, title = $3, description = $4
            WHERE id = $1
            RETURNING id, menu_id, title, description
            "#,
        )
        .bind(id)
        .bind(menu_id)
        .bind(title)
        .bind(description)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn delete_submenu(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM submenus WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        expect_one(result.rows_affected())
    }

    async fn create_dish(&self, params: CreateDishParams) -> Result<DishRecord, RepoError> {
        let CreateDishParams {
            id,
            submenu_id,
            title,
            description,
            price,
        } = params;

        let row = sqlx::query_as::<_, DishRow>(
            r#"
            INSERT INTO dishes (id, submenu_id, title, description, price)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, submenu_id, title, description, price
            "#,
        )
        .bind(id)
        .bind(submenu_id)
        .bind(title)
        .bind(description)
        .bind(price)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_dish(&self, params: UpdateDishParams) -> Result<DishRecord, RepoError> {
        let UpdateDishParams {
            id,
            submenu_id,
            title,
            description,
            price,
        } = params;

        let row = sqlx::query_as::<_, DishRow>(
            r#"
            UPDATE dishes
            SET submenu_id = $2, title = $3, description = $4, price = $5
            WHERE id = $1
            RETURNING id, submenu_id, title, description, price
            "#,
        )
        .bind(id)
        .bind(submenu_id)
        .bind(title)
        .bind(description)
        .bind(price)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn delete_dish(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM dishes WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        expect_one(result.rows_affected())
    }
}

fn expect_one(rows_affected: u64) -> Result<(), RepoError> {
    if rows_affected == 0 {
        Err(RepoError::NotFound)
    } else {
        Ok(())
    }
}
