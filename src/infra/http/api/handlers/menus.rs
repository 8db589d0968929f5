//! Menu handlers

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::domain::entities::SectionContent;
use crate::domain::types::EntityKind;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::{DeleteResponse, SectionRequest};
use crate::infra::http::api::state::ApiState;

pub async fn list_menus(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let menus = state.catalog.list_menus().await?;
    Ok(Json(menus))
}

pub async fn get_menu(
    State(state): State<ApiState>,
    Path(menu_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let menu = state.catalog.get_menu(menu_id).await?;
    Ok(Json(menu))
}

pub async fn create_menu(
    State(state): State<ApiState>,
    Json(payload): Json<SectionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = SectionContent::new(&payload.title, &payload.description)?;
    let menu = state.catalog.create_menu(content).await?;
    Ok((StatusCode::CREATED, Json(menu)))
}

pub async fn update_menu(
    State(state): State<ApiState>,
    Path(menu_id): Path<Uuid>,
    Json(payload): Json<SectionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = SectionContent::new(&payload.title, &payload.description)?;
    let menu = state.catalog.update_menu(menu_id, content).await?;
    Ok(Json(menu))
}

pub async fn delete_menu(
    State(state): State<ApiState>,
    Path(menu_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.catalog.delete_menu(menu_id).await?;
    Ok(Json(DeleteResponse::deleted(EntityKind::Menu)))
}
