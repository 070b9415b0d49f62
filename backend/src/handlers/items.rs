//! HTTP handlers for the item catalogue

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::item::{CreateCategoryInput, CreateItemInput, ItemService, UpdateItemInput};
use crate::AppState;
use shared::models::{Item, ItemCategory};

#[derive(Debug, Default, Deserialize)]
pub struct ListItemsQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

/// List items, active only unless `include_inactive=true`
pub async fn list_items(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListItemsQuery>,
) -> AppResult<Json<Vec<Item>>> {
    current_user.0.require_permission("items", "view")?;
    let service = ItemService::new(state.db);
    let items = service.list(query.include_inactive).await?;
    Ok(Json(items))
}

/// Create an item
pub async fn create_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateItemInput>,
) -> AppResult<(StatusCode, Json<Item>)> {
    current_user.0.require_permission("items", "manage")?;
    let service = ItemService::new(state.db);
    let item = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// List item categories
pub async fn list_categories(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<ItemCategory>>> {
    current_user.0.require_permission("items", "view")?;
    let service = ItemService::new(state.db);
    let categories = service.list_categories().await?;
    Ok(Json(categories))
}

/// Create an item category
pub async fn create_category(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateCategoryInput>,
) -> AppResult<(StatusCode, Json<ItemCategory>)> {
    current_user.0.require_permission("items", "manage")?;
    let service = ItemService::new(state.db);
    let category = service.create_category(input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// Get one item
pub async fn get_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<Item>> {
    current_user.0.require_permission("items", "view")?;
    let service = ItemService::new(state.db);
    let item = service.get(item_id).await?;
    Ok(Json(item))
}

/// Update an item
pub async fn update_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
    Json(input): Json<UpdateItemInput>,
) -> AppResult<Json<Item>> {
    current_user.0.require_permission("items", "manage")?;
    let service = ItemService::new(state.db);
    let item = service.update(item_id, input).await?;
    Ok(Json(item))
}

/// Deactivate an item
pub async fn delete_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    current_user.0.require_permission("items", "manage")?;
    let service = ItemService::new(state.db);
    service.delete(item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
