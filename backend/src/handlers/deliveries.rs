//! HTTP handlers for delivery plans

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::delivery::{CreateDeliveryInput, DeliveryService};
use crate::AppState;
use shared::models::DeliveryPlan;

/// List delivery plans, soonest first
pub async fn list_deliveries(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<DeliveryPlan>>> {
    current_user.0.require_permission("deliveries", "view")?;
    let service = DeliveryService::new(state.db);
    let plans = service.list().await?;
    Ok(Json(plans))
}

/// Create a delivery plan
pub async fn create_delivery(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateDeliveryInput>,
) -> AppResult<(StatusCode, Json<DeliveryPlan>)> {
    current_user.0.require_permission("deliveries", "manage")?;
    let service = DeliveryService::new(state.db);
    let plan = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

/// Get one delivery plan
pub async fn get_delivery(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(plan_id): Path<Uuid>,
) -> AppResult<Json<DeliveryPlan>> {
    current_user.0.require_permission("deliveries", "view")?;
    let service = DeliveryService::new(state.db);
    let plan = service.get(plan_id).await?;
    Ok(Json(plan))
}

/// Confirm a draft delivery plan
pub async fn confirm_delivery(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(plan_id): Path<Uuid>,
) -> AppResult<Json<DeliveryPlan>> {
    current_user.0.require_permission("deliveries", "manage")?;
    let service = DeliveryService::new(state.db);
    let plan = service.confirm(plan_id).await?;
    Ok(Json(plan))
}
