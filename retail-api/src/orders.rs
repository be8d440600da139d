use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use retail_core::{Order, OrderDetails};
use retail_order::{OrderError, OrderSummary, PlaceOrderRequest};
use retail_shared::Page;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/order", post(place_order))
        .route("/order/{id}", get(get_order))
        .route("/orders", get(list_orders))
        .route("/orders/today", get(todays_orders))
        .route("/orders/customer/{customer_id}", get(order_history))
}

/// POST /api/v1/order
/// 201 on success, 400 for unknown references or short stock, 429 while
/// the customer is cooling down.
async fn place_order(
    State(state): State<AppState>,
    payload: Result<Json<PlaceOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderSummary>), AppError> {
    let Json(req) = payload?;
    let summary = state.orders.place_order(req).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// GET /api/v1/order/{id}
async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(state.orders.get_order(&id).await?))
}

async fn list_orders(
    State(state): State<AppState>,
    page: Result<Query<Page>, QueryRejection>,
) -> Result<Json<Vec<OrderDetails>>, AppError> {
    let Query(page) = page?;
    Ok(Json(state.orders.get_all_orders(page).await?))
}

async fn todays_orders(State(state): State<AppState>) -> Result<Json<Vec<OrderDetails>>, AppError> {
    Ok(Json(state.orders.get_todays_orders().await?))
}

/// GET /api/v1/orders/customer/{customer_id}
/// 404 when the customer is unknown.
async fn order_history(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
    page: Result<Query<Page>, QueryRejection>,
) -> Result<Json<Vec<Order>>, AppError> {
    let Query(page) = page?;
    match state.orders.get_order_history(&customer_id, page).await {
        Ok(orders) => Ok(Json(orders)),
        Err(OrderError::CustomerNotFound(id)) => {
            Err(AppError::NotFoundError(format!("Customer not found: {}", id)))
        }
        Err(e) => Err(e.into()),
    }
}
