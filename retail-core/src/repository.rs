use async_trait::async_trait;
use chrono::{DateTime, Utc};
use retail_shared::Page;

use crate::entities::{
    BusinessStats, Customer, CustomerCooldown, CustomerTransactionSummary, Order, OrderDetails,
    Product, ProductSales, TimeRange, Transaction, TransactionType,
};
use crate::StoreResult;

/// Partial product update; `None` leaves the column untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProductChanges {
    pub price: Option<f64>,
    pub quantity: Option<i32>,
}

impl ProductChanges {
    pub fn is_empty(&self) -> bool {
        self.price.is_none() && self.quantity.is_none()
    }
}

/// Repository trait for product data access
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn create_product(&self, product: &Product) -> StoreResult<()>;

    async fn get_product(&self, id: &str) -> StoreResult<Option<Product>>;

    async fn list_products(&self, page: Page) -> StoreResult<Vec<Product>>;

    /// Returns the updated row, or `NotFound`.
    async fn update_product(
        &self,
        id: &str,
        changes: ProductChanges,
        now: DateTime<Utc>,
    ) -> StoreResult<Product>;

    /// Conditional decrement outside any transaction.
    /// Fails with `InsufficientQuantity` when stock is short.
    async fn reduce_quantity(&self, id: &str, amount: i32) -> StoreResult<()>;

    /// Case-insensitive substring match on the name.
    async fn search_products(&self, term: &str, page: Page) -> StoreResult<Vec<Product>>;

    async fn list_available_products(&self, page: Page) -> StoreResult<Vec<Product>>;

    async fn list_low_stock_products(&self, threshold: i32) -> StoreResult<Vec<Product>>;
}

/// Repository trait for customer data access
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Fails with `Duplicate` when the ID or e-mail is taken.
    async fn create_customer(&self, customer: &Customer) -> StoreResult<()>;

    async fn get_customer(&self, id: &str) -> StoreResult<Option<Customer>>;

    async fn get_customer_by_email(&self, email: &str) -> StoreResult<Option<Customer>>;

    async fn list_customers(&self, page: Page) -> StoreResult<Vec<Customer>>;

    /// Case-insensitive substring match on name or e-mail.
    async fn search_customers(&self, term: &str, page: Page) -> StoreResult<Vec<Customer>>;
}

/// Repository trait for the per-customer cooldown record
#[async_trait]
pub trait CooldownRepository: Send + Sync {
    async fn get_cooldown(&self, customer_id: &str) -> StoreResult<Option<CustomerCooldown>>;

    /// Unconditional insert-or-overwrite. Used for seeding and administration.
    async fn upsert_cooldown(&self, customer_id: &str, at: DateTime<Utc>) -> StoreResult<()>;
}

/// Repository trait for order reads. Orders are only written through a unit of work.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn get_order(&self, id: &str) -> StoreResult<Option<Order>>;

    /// Newest first.
    async fn list_orders_by_customer(&self, customer_id: &str, page: Page) -> StoreResult<Vec<Order>>;

    /// Newest first, with customer and product names resolved.
    async fn list_orders_with_details(&self, page: Page) -> StoreResult<Vec<OrderDetails>>;

    /// Orders placed at or after `since`, newest first.
    async fn list_orders_since(&self, since: DateTime<Utc>) -> StoreResult<Vec<OrderDetails>>;
}

/// Selects which slice of the audit trail to read.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionFilter {
    All,
    Customer(String),
    Product(String),
    Kind(TransactionType),
    Range(TimeRange),
}

impl TransactionFilter {
    pub fn matches(&self, txn: &Transaction) -> bool {
        match self {
            TransactionFilter::All => true,
            TransactionFilter::Customer(id) => &txn.customer_id == id,
            TransactionFilter::Product(id) => &txn.product_id == id,
            TransactionFilter::Kind(kind) => txn.kind == *kind,
            TransactionFilter::Range(range) => range.contains(txn.transaction_at),
        }
    }
}

/// Repository trait for the append-only audit trail and the reports built on it
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Append outside any unit of work. Fails with `Duplicate` on a colliding ID.
    async fn append_transaction(&self, txn: &Transaction) -> StoreResult<()>;

    /// Newest first.
    async fn list_transactions(
        &self,
        filter: TransactionFilter,
        page: Page,
    ) -> StoreResult<Vec<Transaction>>;

    async fn business_stats(&self, range: Option<TimeRange>, top_n: usize) -> StoreResult<BusinessStats>;

    async fn top_selling_products(
        &self,
        limit: usize,
        range: Option<TimeRange>,
    ) -> StoreResult<Vec<ProductSales>>;

    async fn customer_summary(&self, customer_id: &str) -> StoreResult<CustomerTransactionSummary>;
}
