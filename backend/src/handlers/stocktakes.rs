//! HTTP handlers for stocktake snapshots

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::stocktake::{RecordStocktakeInput, StocktakeService};
use crate::AppState;
use shared::models::Stocktake;

#[derive(Debug, Default, Deserialize)]
pub struct ListStocktakesQuery {
    pub location_id: Option<Uuid>,
}

/// List recent stocktakes, optionally for one location
pub async fn list_stocktakes(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListStocktakesQuery>,
) -> AppResult<Json<Vec<Stocktake>>> {
    current_user.0.require_permission("stocktakes", "view")?;
    let service = StocktakeService::new(state.db);
    let stocktakes = service.list_recent(query.location_id).await?;
    Ok(Json(stocktakes))
}

/// Record a counted snapshot
pub async fn record_stocktake(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<RecordStocktakeInput>,
) -> AppResult<(StatusCode, Json<Stocktake>)> {
    current_user.0.require_permission("stocktakes", "manage")?;
    let service = StocktakeService::new(state.db);
    let stocktake = service.record(current_user.0.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(stocktake)))
}
