//! HTTP handlers for the derived-inventory dashboard and reports

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::inventory::{DashboardResponse, EnsureBaselineOutcome, InventoryService};
use crate::AppState;
use shared::derivation::{BaselineMode, ItemDayMovement};
use shared::types::DateRange;

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub baseline_mode: BaselineMode,
}

#[derive(Debug, Deserialize)]
pub struct ItemHistoryQuery {
    pub item_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct EnsureBaselineResponse {
    pub outcome: EnsureBaselineOutcome,
}

/// Longest range a single dashboard or history query may span
const MAX_RANGE_DAYS: i64 = 366;

/// Resolve `from`/`to` params to a validated range; both default to today
fn resolve_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> AppResult<DateRange> {
    let today = Utc::now().date_naive();
    let start = from.unwrap_or(today);
    let end = to.unwrap_or(today);
    if start > end {
        return Err(AppError::Validation {
            field: "from".to_string(),
            message: "Range start must not be after range end".to_string(),
        });
    }
    let range = DateRange::new(start, end);
    if range.num_days() > MAX_RANGE_DAYS {
        return Err(AppError::Validation {
            field: "to".to_string(),
            message: format!("Date range cannot exceed {} days", MAX_RANGE_DAYS),
        });
    }
    Ok(range)
}

/// Derived-inventory dashboard
pub async fn get_dashboard(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<DashboardQuery>,
) -> AppResult<Json<DashboardResponse>> {
    current_user.0.require_permission("inventory", "view")?;
    let range = resolve_range(query.from, query.to)?;
    let service = InventoryService::new(state.db);
    let dashboard = service.dashboard(range, query.baseline_mode).await?;
    Ok(Json(dashboard))
}

/// Dashboard export as a CSV attachment
pub async fn export_inventory(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<DashboardQuery>,
) -> AppResult<Response> {
    current_user.0.require_permission("inventory", "view")?;
    let range = resolve_range(query.from, query.to)?;
    let service = InventoryService::new(state.db);
    let csv_data = service.export_csv(range, query.baseline_mode).await?;

    let filename = format!("inventory_{}_{}.csv", range.start, range.end);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        csv_data,
    )
        .into_response())
}

/// Per-day movement history for one item
pub async fn get_item_history(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ItemHistoryQuery>,
) -> AppResult<Json<Vec<ItemDayMovement>>> {
    current_user.0.require_permission("inventory", "view")?;
    let item_id = query.item_id.ok_or_else(|| AppError::Validation {
        field: "item_id".to_string(),
        message: "item_id is required".to_string(),
    })?;
    let range = resolve_range(query.from, query.to)?;
    let service = InventoryService::new(state.db);
    let history = service.item_history(item_id, range).await?;
    Ok(Json(history))
}

/// Explicitly ensure a master baseline snapshot exists at the hub
pub async fn ensure_baseline(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<EnsureBaselineResponse>> {
    current_user.0.require_permission("inventory", "manage")?;
    let service = InventoryService::new(state.db);
    let outcome = service.ensure_master_baseline().await?;
    Ok(Json(EnsureBaselineResponse { outcome }))
}
