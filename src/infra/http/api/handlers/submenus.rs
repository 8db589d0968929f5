//! Submenu handlers

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

pub async fn list_submenus(
    State(state): State<ApiState>,
    Path(menu_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let submenus = state.catalog.list_submenus(menu_id).await?;
    Ok(Json(submenus))
}

pub async fn get_submenu(
    State(state): State<ApiState>,
    Path((menu_id, submenu_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let submenu = state.catalog.get_submenu(menu_id, submenu_id).await?;
    Ok(Json(submenu))
}

pub async fn create_submenu(
    State(state): State<ApiState>,
    Path(menu_id): Path<Uuid>,
    Json(payload): Json<SectionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = SectionContent::new(&payload.title, &payload.description)?;
    let submenu = state.catalog.create_submenu(menu_id, content).await?;
    Ok((StatusCode::CREATED, Json(submenu)))
}

pub async fn update_submenu(
    State(state): State<ApiState>,
    Path((menu_id, submenu_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<SectionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = SectionContent::new(&payload.title, &payload.description)?;
    let submenu = state
        .catalog
        .update_submenu(menu_id, submenu_id, content)
        .await?;
    Ok(Json(submenu))
}

pub async fn delete_submenu(
    State(state): State<ApiState>,
    Path((menu_id, submenu_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    state.catalog.delete_submenu(menu_id, submenu_id).await?;
    Ok(Json(DeleteResponse::deleted(EntityKind::Submenu)))
}
