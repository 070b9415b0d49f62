//! HTTP handlers for purchase orders

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::order::{
    CreateOrderInput, OrderService, ReceiveOrderInput, ReceiveOrderResponse,
};
use crate::AppState;
use shared::models::PurchaseOrder;

/// List purchase orders
pub async fn list_orders(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<PurchaseOrder>>> {
    current_user.0.require_permission("orders", "view")?;
    let service = OrderService::new(state.db);
    let orders = service.list().await?;
    Ok(Json(orders))
}

/// Create a purchase order
pub async fn create_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateOrderInput>,
) -> AppResult<(StatusCode, Json<PurchaseOrder>)> {
    current_user.0.require_permission("orders", "manage")?;
    let service = OrderService::new(state.db);
    let order = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Get one purchase order
pub async fn get_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<PurchaseOrder>> {
    current_user.0.require_permission("orders", "view")?;
    let service = OrderService::new(state.db);
    let order = service.get(order_id).await?;
    Ok(Json(order))
}

/// Mark an order received and schedule deficit deliveries
pub async fn receive_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
    Json(input): Json<ReceiveOrderInput>,
) -> AppResult<Json<ReceiveOrderResponse>> {
    current_user.0.require_permission("orders", "manage")?;
    let service = OrderService::new(state.db);
    let response = service
        .receive(order_id, current_user.0.user_id, input)
        .await?;
    Ok(Json(response))
}
