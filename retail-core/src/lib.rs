pub mod entities;
pub mod repository;
pub mod unit_of_work;
pub mod validation;

pub use entities::{
    BusinessStats, Customer, CustomerCooldown, CustomerTransactionSummary, Order, OrderDetails,
    Product, ProductSales, TimeRange, Transaction, TransactionType,
};
pub use repository::{
    CooldownRepository, CustomerRepository, OrderRepository, ProductChanges, ProductRepository,
    TransactionFilter, TransactionRepository,
};
pub use unit_of_work::{in_transaction, StoreTransaction, TxHandle, UnitOfWork};
pub use validation::ValidationError;

use chrono::{DateTime, Utc};

/// Errors surfaced by any storage collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A uniqueness constraint rejected the write (colliding ID or e-mail).
    #[error("{entity} already exists: {key}")]
    Duplicate { entity: &'static str, key: String },

    #[error("insufficient quantity: available={available}, requested={requested}")]
    InsufficientQuantity { available: i32, requested: i32 },

    #[error("customer {customer_id} is in cooldown since {last_order_time}")]
    CooldownActive {
        customer_id: String,
        last_order_time: DateTime<Utc>,
    },

    #[error("storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        StoreError::NotFound { entity, id: id.into() }
    }

    pub fn duplicate(entity: &'static str, key: impl Into<String>) -> Self {
        StoreError::Duplicate { entity, key: key.into() }
    }

    pub fn backend<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        StoreError::Backend(err.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
