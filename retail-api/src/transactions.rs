use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::get,
    Json, Router,
};
use retail_core::BusinessStats;
use retail_order::{
    ComprehensiveStats, CustomerSummary, HistoryQuery, StatsPeriod, TransactionView,
};
use retail_shared::Page;
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub period: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(transaction_history))
        .route("/transactions/stats", get(business_stats))
        .route("/transactions/stats/comprehensive", get(comprehensive_stats))
        .route("/transactions/customer/{customer_id}/summary", get(customer_summary))
}

/// GET /api/v1/transactions
/// Filters: customer_id, product_id, type, start_date + end_date (YYYY-MM-DD).
async fn transaction_history(
    State(state): State<AppState>,
    filters: Result<Query<HistoryQuery>, QueryRejection>,
    page: Result<Query<Page>, QueryRejection>,
) -> Result<Json<Vec<TransactionView>>, AppError> {
    let Query(filters) = filters?;
    let Query(page) = page?;
    Ok(Json(state.reporting.transaction_history(&filters, page).await?))
}

/// GET /api/v1/transactions/stats?period=today|this_week|this_month|all_time
async fn business_stats(
    State(state): State<AppState>,
    query: Result<Query<StatsQuery>, QueryRejection>,
) -> Result<Json<BusinessStats>, AppError> {
    let Query(query) = query?;
    let period = match query.period.as_deref() {
        None | Some("") => StatsPeriod::AllTime,
        Some(p) => p.parse::<StatsPeriod>()?,
    };
    Ok(Json(state.reporting.business_stats(period).await?))
}

async fn comprehensive_stats(State(state): State<AppState>) -> Result<Json<ComprehensiveStats>, AppError> {
    Ok(Json(state.reporting.comprehensive_stats().await?))
}

async fn customer_summary(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> Result<Json<CustomerSummary>, AppError> {
    Ok(Json(state.reporting.customer_summary(&customer_id).await?))
}
