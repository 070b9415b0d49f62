//! HTTP handlers for production batches

use axum::{extract::State, http::StatusCode, Json};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::production::{ProductionService, RecordProductionInput};
use crate::AppState;
use shared::models::ProductionBatch;

/// List recent production batches
pub async fn list_productions(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<ProductionBatch>>> {
    current_user.0.require_permission("productions", "view")?;
    let service = ProductionService::new(state.db);
    let batches = service.list_recent().await?;
    Ok(Json(batches))
}

/// Record a production batch
pub async fn record_production(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<RecordProductionInput>,
) -> AppResult<(StatusCode, Json<ProductionBatch>)> {
    current_user.0.require_permission("productions", "manage")?;
    let service = ProductionService::new(state.db);
    let batch = service.record(input).await?;
    Ok((StatusCode::CREATED, Json(batch)))
}
