//! HTTP handlers for locations and their replenishment targets

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::location::{
    CreateLocationInput, LocationService, TargetInput, UpdateLocationInput,
};
use crate::AppState;
use shared::models::{Location, LocationItemTarget};

/// List locations in allocation order
pub async fn list_locations(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Location>>> {
    current_user.0.require_permission("locations", "view")?;
    let service = LocationService::new(state.db);
    let locations = service.list().await?;
    Ok(Json(locations))
}

/// Create a location
pub async fn create_location(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateLocationInput>,
) -> AppResult<(StatusCode, Json<Location>)> {
    current_user.0.require_permission("locations", "manage")?;
    let service = LocationService::new(state.db);
    let location = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(location)))
}

/// Get one location
pub async fn get_location(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(location_id): Path<Uuid>,
) -> AppResult<Json<Location>> {
    current_user.0.require_permission("locations", "view")?;
    let service = LocationService::new(state.db);
    let location = service.get(location_id).await?;
    Ok(Json(location))
}

/// Update a location
pub async fn update_location(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(location_id): Path<Uuid>,
    Json(input): Json<UpdateLocationInput>,
) -> AppResult<Json<Location>> {
    current_user.0.require_permission("locations", "manage")?;
    let service = LocationService::new(state.db);
    let location = service.update(location_id, input).await?;
    Ok(Json(location))
}

/// Get a location's per-item target quantities
pub async fn get_location_targets(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(location_id): Path<Uuid>,
) -> AppResult<Json<Vec<LocationItemTarget>>> {
    current_user.0.require_permission("locations", "view")?;
    let service = LocationService::new(state.db);
    let targets = service.get_targets(location_id).await?;
    Ok(Json(targets))
}

/// Replace a location's per-item target quantities
pub async fn set_location_targets(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(location_id): Path<Uuid>,
    Json(targets): Json<Vec<TargetInput>>,
) -> AppResult<Json<Vec<LocationItemTarget>>> {
    current_user.0.require_permission("locations", "manage")?;
    let service = LocationService::new(state.db);
    let targets = service.set_targets(location_id, targets).await?;
    Ok(Json(targets))
}
