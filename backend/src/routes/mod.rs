//! Route definitions for the Gelato Operations Platform

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public)
        .nest("/auth", auth_routes())
        // Protected routes - item catalogue
        .nest("/items", item_routes())
        // Protected routes - locations and targets
        .nest("/locations", location_routes())
        // Protected routes - stocktake snapshots
        .nest("/stocktakes", stocktake_routes())
        // Protected routes - derived inventory
        .nest("/inventory", inventory_routes())
        // Protected routes - purchase orders
        .nest("/orders", order_routes())
        // Protected routes - wholesale customers
        .nest("/customers", customer_routes())
        // Protected routes - delivery plans
        .nest("/deliveries", delivery_routes())
        // Protected routes - production batches
        .nest("/productions", production_routes())
}

/// Authentication routes (public)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
}

/// Item catalogue routes (protected)
fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_items).post(handlers::create_item))
        .route(
            "/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/:item_id",
            get(handlers::get_item)
                .put(handlers::update_item)
                .delete(handlers::delete_item),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Wholesale customer routes (protected)
fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_customers).post(handlers::create_customer))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Location routes (protected)
fn location_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_locations).post(handlers::create_location))
        .route(
            "/:location_id",
            get(handlers::get_location).put(handlers::update_location),
        )
        .route(
            "/:location_id/targets",
            get(handlers::get_location_targets).put(handlers::set_location_targets),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Stocktake routes (protected)
fn stocktake_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_stocktakes).post(handlers::record_stocktake))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Derived-inventory routes (protected)
fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/export", get(handlers::export_inventory))
        .route("/item-history", get(handlers::get_item_history))
        .route("/baseline/ensure", post(handlers::ensure_baseline))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Purchase order routes (protected)
fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_orders).post(handlers::create_order))
        .route("/:order_id", get(handlers::get_order))
        .route("/:order_id/receive", post(handlers::receive_order))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Delivery plan routes (protected)
fn delivery_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_deliveries).post(handlers::create_delivery))
        .route("/:plan_id", get(handlers::get_delivery))
        .route("/:plan_id/confirm", post(handlers::confirm_delivery))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Production batch routes (protected)
fn production_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_productions).post(handlers::record_production))
        .route_layer(middleware::from_fn(auth_middleware))
}
