use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use retail_catalog::{CatalogError, CustomerError};
use retail_core::{StoreError, ValidationError};
use retail_order::cooldown::{remaining_minutes, remaining_seconds};
use retail_order::{OrderError, ReportingError};
use serde_json::{json, Map, Value};

#[derive(Debug)]
pub enum AppError {
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    /// 400 with structured detail fields merged into the body
    BusinessRuleError { message: String, details: Map<String, Value> },
    /// 429 with the remaining wait merged into the body
    RateLimitedError { message: String, details: Map<String, Value> },
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

fn details(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, extra) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg, Map::new()),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg, Map::new()),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg, Map::new()),
            AppError::BusinessRuleError { message, details } => (StatusCode::BAD_REQUEST, message, details),
            AppError::RateLimitedError { message, details } => (StatusCode::TOO_MANY_REQUESTS, message, details),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string(), Map::new())
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string(), Map::new())
            }
        };

        let mut body = extra;
        body.insert("error".to_string(), Value::String(error_message));

        (status, Json(Value::Object(body))).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::ValidationError(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::ValidationError(rejection.body_text())
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::ValidationError(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => Self::NotFoundError(err.to_string()),
            StoreError::Duplicate { .. } => Self::ConflictError(err.to_string()),
            other => Self::Anyhow(anyhow::Error::new(other)),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(_) => Self::NotFoundError(err.to_string()),
            CatalogError::Validation(e) => e.into(),
            CatalogError::Store(e) => e.into(),
        }
    }
}

impl From<CustomerError> for AppError {
    fn from(err: CustomerError) -> Self {
        match err {
            CustomerError::NotFound(_) => Self::NotFoundError(err.to_string()),
            CustomerError::EmailTaken => Self::ConflictError(err.to_string()),
            CustomerError::Validation(e) => e.into(),
            CustomerError::Store(e) => e.into(),
        }
    }
}

impl From<ReportingError> for AppError {
    fn from(err: ReportingError) -> Self {
        match err {
            ReportingError::CustomerNotFound(_) => Self::NotFoundError(err.to_string()),
            ReportingError::Validation(e) => e.into(),
            ReportingError::Store(e) => e.into(),
        }
    }
}

/// Placement failures keep their business meaning; lookups of a missing
/// order are 404 and commit failures are server errors.
impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        let message = err.to_string();
        match err {
            OrderError::CustomerNotFound(_) | OrderError::ProductNotFound(_) => Self::BusinessRuleError {
                message,
                details: Map::new(),
            },
            OrderError::InsufficientQuantity { available, requested } => Self::BusinessRuleError {
                message: "Insufficient quantity available".to_string(),
                details: details(json!({
                    "available_quantity": available,
                    "requested_quantity": requested,
                })),
            },
            OrderError::CooldownActive { remaining, .. } => Self::RateLimitedError {
                message: "Customer is in cooldown period".to_string(),
                details: details(json!({
                    "cooldown_remaining_seconds": remaining_seconds(remaining),
                    "cooldown_remaining_minutes": remaining_minutes(remaining),
                })),
            },
            OrderError::InvalidRequest(e) => e.into(),
            OrderError::OrderNotFound(_) => Self::NotFoundError(message),
            OrderError::CommitFailed { step, source } => {
                Self::Anyhow(anyhow::Error::new(source).context(format!("order commit failed at {}", step)))
            }
            OrderError::ValidationFailed(e) => {
                Self::Anyhow(anyhow::Error::new(e).context("order failed validation after input checks"))
            }
            OrderError::Store { step, source } => match source {
                StoreError::NotFound { .. } | StoreError::Duplicate { .. } => source.into(),
                other => Self::Anyhow(anyhow::Error::new(other).context(format!("failed to {}", step))),
            },
        }
    }
}
