//! HTTP handlers for wholesale customers

use axum::{extract::State, http::StatusCode, Json};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::customer::{CreateCustomerInput, CustomerService};
use crate::AppState;
use shared::models::WholesaleCustomer;

/// List wholesale customers
pub async fn list_customers(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<WholesaleCustomer>>> {
    current_user.0.require_permission("customers", "view")?;
    let service = CustomerService::new(state.db);
    let customers = service.list().await?;
    Ok(Json(customers))
}

/// Create a wholesale customer
pub async fn create_customer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateCustomerInput>,
) -> AppResult<(StatusCode, Json<WholesaleCustomer>)> {
    current_user.0.require_permission("customers", "manage")?;
    let service = CustomerService::new(state.db);
    let customer = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}
