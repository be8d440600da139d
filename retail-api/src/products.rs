use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use retail_catalog::{CreateProductRequest, UpdateProductRequest};
use retail_core::Product;
use retail_shared::Page;
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LowStockQuery {
    pub threshold: Option<i32>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/product", post(create_product))
        .route("/product/{id}", get(get_product).put(update_product))
        .route("/products", get(list_products))
        .route("/products/search", get(search_products))
        .route("/products/available", get(available_products))
        .route("/products/low-stock", get(low_stock_products))
}

/// POST /api/v1/product
async fn create_product(
    State(state): State<AppState>,
    payload: Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let Json(req) = payload?;
    let product = state.products.create_product(req).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, AppError> {
    Ok(Json(state.products.get_product(&id).await?))
}

/// PUT /api/v1/product/{id}
/// Only the fields present in the body change.
async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateProductRequest>, JsonRejection>,
) -> Result<Json<Product>, AppError> {
    let Json(req) = payload?;
    Ok(Json(state.products.update_product(&id, req).await?))
}

async fn list_products(
    State(state): State<AppState>,
    page: Result<Query<Page>, QueryRejection>,
) -> Result<Json<Vec<Product>>, AppError> {
    let Query(page) = page?;
    Ok(Json(state.products.list_products(page).await?))
}

async fn search_products(
    State(state): State<AppState>,
    search: Result<Query<SearchQuery>, QueryRejection>,
    page: Result<Query<Page>, QueryRejection>,
) -> Result<Json<Vec<Product>>, AppError> {
    let Query(search) = search?;
    let Query(page) = page?;
    Ok(Json(state.products.search_products(&search.name, page).await?))
}

async fn available_products(
    State(state): State<AppState>,
    page: Result<Query<Page>, QueryRejection>,
) -> Result<Json<Vec<Product>>, AppError> {
    let Query(page) = page?;
    Ok(Json(state.products.available_products(page).await?))
}

async fn low_stock_products(
    State(state): State<AppState>,
    query: Result<Query<LowStockQuery>, QueryRejection>,
) -> Result<Json<Vec<Product>>, AppError> {
    let Query(query) = query?;
    let threshold = query.threshold.unwrap_or(state.low_stock_threshold);
    Ok(Json(state.products.low_stock_products(threshold).await?))
}
