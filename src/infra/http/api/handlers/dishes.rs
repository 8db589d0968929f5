//! Dish handlers. Prices in responses carry any active discount.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::domain::entities::DishContent;
use crate::domain::types::EntityKind;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::{DeleteResponse, DishRequest};
use crate::infra::http::api::state::ApiState;

pub async fn list_dishes(
    State(state): State<ApiState>,
    Path((menu_id, submenu_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let dishes = state.catalog.list_dishes(menu_id, submenu_id).await?;
    Ok(Json(dishes))
}

pub async fn get_dish(
    State(state): State<ApiState>,
    Path((menu_id, submenu_id, dish_id)): Path<(Uuid, Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let dish = state.catalog.get_dish(menu_id, submenu_id, dish_id).await?;
    Ok(Json(dish))
}

pub async fn create_dish(
    State(state): State<ApiState>,
    Path((menu_id, submenu_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<DishRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = DishContent::new(&payload.title, &payload.description, &payload.price)?;
    let dish = state
        .catalog
        .create_dish(menu_id, submenu_id, content)
        .await?;
    Ok((StatusCode::CREATED, Json(dish)))
}

pub async fn update_dish(
    State(state): State<ApiState>,
    Path((menu_id, submenu_id, dish_id)): Path<(Uuid, Uuid, Uuid)>,
    Json(payload): Json<DishRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = DishContent::new(&payload.title, &payload.description, &payload.price)?;
    let dish = state
        .catalog
        .update_dish(menu_id, submenu_id, dish_id, content)
        .await?;
    Ok(Json(dish))
}

pub async fn delete_dish(
    State(state): State<ApiState>,
    Path((menu_id, submenu_id, dish_id)): Path<(Uuid, Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .catalog
        .delete_dish(menu_id, submenu_id, dish_id)
        .await?;
    Ok(Json(DeleteResponse::deleted(EntityKind::Dish)))
}
