use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use retail_catalog::RegisterCustomerRequest;
use retail_core::Customer;
use retail_order::{CooldownStatus, OrderError};
use retail_shared::Page;

use crate::error::AppError;
use crate::products::SearchQuery;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customer", post(register_customer))
        .route("/customer/{id}", get(get_customer))
        .route("/customer/{id}/cooldown", get(cooldown_status))
        .route("/customers", get(list_customers))
        .route("/customers/search", get(search_customers))
}

async fn register_customer(
    State(state): State<AppState>,
    payload: Result<Json<RegisterCustomerRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Customer>), AppError> {
    let Json(req) = payload?;
    let customer = state.customers.register(req).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Customer>, AppError> {
    Ok(Json(state.customers.get_customer(&id).await?))
}

/// GET /api/v1/customer/{id}/cooldown
async fn cooldown_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CooldownStatus>, AppError> {
    match state.orders.cooldown_status(&id).await {
        Ok(status) => Ok(Json(status)),
        Err(OrderError::CustomerNotFound(id)) => {
            Err(AppError::NotFoundError(format!("Customer not found: {}", id)))
        }
        Err(e) => Err(e.into()),
    }
}

async fn list_customers(
    State(state): State<AppState>,
    page: Result<Query<Page>, QueryRejection>,
) -> Result<Json<Vec<Customer>>, AppError> {
    let Query(page) = page?;
    Ok(Json(state.customers.list_customers(page).await?))
}

async fn search_customers(
    State(state): State<AppState>,
    search: Result<Query<SearchQuery>, QueryRejection>,
    page: Result<Query<Page>, QueryRejection>,
) -> Result<Json<Vec<Customer>>, AppError> {
    let Query(search) = search?;
    let Query(page) = page?;
    Ok(Json(state.customers.search_customers(&search.name, page).await?))
}
