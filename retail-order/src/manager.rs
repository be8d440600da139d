use chrono::{DateTime, Duration, Utc};
use retail_catalog::{InventoryChecker, InventoryError};
use retail_core::{
    in_transaction, CooldownRepository, CustomerRepository, Order, OrderDetails, OrderRepository,
    ProductRepository, StoreError, Transaction, UnitOfWork, ValidationError,
};
use retail_shared::{generate_id, EntityPrefix, Page};
use std::fmt;
use std::sync::Arc;

use crate::cooldown::{CooldownPolicy, CooldownStatus};
use crate::models::{OrderSummary, PlaceOrderRequest};
use crate::reporting::start_of_day;

const DEFAULT_PAGE_LIMIT: i64 = 50;

/// Places orders and serves order read paths.
///
/// Placement is a linear sequence: cooldown check, availability check,
/// customer resolution, order construction, then one atomic commit that
/// inserts the order, decrements stock, appends the audit record and
/// claims the customer's cooldown, in that order. The commit re-checks
/// stock and cooldown at the storage layer, so concurrent attempts that
/// slipped past the pre-checks still cannot oversell or double-order.
pub struct OrderManager {
    inventory: InventoryChecker,
    customers: Arc<dyn CustomerRepository>,
    cooldowns: Arc<dyn CooldownRepository>,
    orders: Arc<dyn OrderRepository>,
    uow: Arc<dyn UnitOfWork>,
    policy: CooldownPolicy,
    default_page_limit: i64,
}

impl OrderManager {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        customers: Arc<dyn CustomerRepository>,
        cooldowns: Arc<dyn CooldownRepository>,
        orders: Arc<dyn OrderRepository>,
        uow: Arc<dyn UnitOfWork>,
        policy: CooldownPolicy,
    ) -> Self {
        Self {
            inventory: InventoryChecker::new(products),
            customers,
            cooldowns,
            orders,
            uow,
            policy,
            default_page_limit: DEFAULT_PAGE_LIMIT,
        }
    }

    pub fn with_page_limit(mut self, default_page_limit: i64) -> Self {
        self.default_page_limit = default_page_limit;
        self
    }

    /// Place a single order as one all-or-nothing unit
    pub async fn place_order(&self, req: PlaceOrderRequest) -> Result<OrderSummary, OrderError> {
        req.validate().map_err(OrderError::InvalidRequest)?;
        let now = Utc::now();

        // 1. Cooldown
        let cooldown = self
            .cooldowns
            .get_cooldown(&req.customer_id)
            .await
            .map_err(LookupStep::Cooldown.wrap())?;
        if !self.policy.can_place_order(cooldown.as_ref(), now) {
            let remaining = self.policy.remaining(cooldown.as_ref(), now);
            tracing::warn!(
                customer_id = %req.customer_id,
                remaining_seconds = remaining.num_seconds(),
                "order rejected: cooldown active"
            );
            return Err(OrderError::CooldownActive {
                customer_id: req.customer_id,
                remaining,
            });
        }

        // 2. Availability
        let product = self
            .inventory
            .check_availability(&req.product_id, req.quantity)
            .await
            .map_err(|e| match e {
                InventoryError::NotFound(id) => OrderError::ProductNotFound(id),
                InventoryError::InsufficientInventory { requested, available } => {
                    OrderError::InsufficientQuantity { available, requested }
                }
                InventoryError::Store(source) => OrderError::Store {
                    step: LookupStep::Product,
                    source,
                },
            })
            .inspect_err(|e| tracing::warn!(product_id = %req.product_id, error = %e, "order rejected"))?;

        // 3. Customer
        let customer = self
            .customers
            .get_customer(&req.customer_id)
            .await
            .map_err(LookupStep::Customer.wrap())?
            .ok_or_else(|| OrderError::CustomerNotFound(req.customer_id.clone()))?;

        // 4. Construct
        let order = Order::new(
            generate_id(EntityPrefix::Order),
            &customer.id,
            &product.id,
            req.quantity,
            product.price,
            now,
        )
        .map_err(OrderError::ValidationFailed)?;
        let txn = Transaction::for_order(generate_id(EntityPrefix::Transaction), &order, now);

        // 5. Commit
        let cutoff = self.policy.cutoff(now);
        let staged = order.clone();
        in_transaction(self.uow.as_ref(), move |tx| {
            Box::pin(async move {
                tx.insert_order(&staged)
                    .await
                    .map_err(CommitStep::InsertOrder.wrap())?;
                tx.reduce_quantity(&staged.product_id, staged.quantity)
                    .await
                    .map_err(CommitStep::ReduceQuantity.wrap())?;
                tx.append_transaction(&txn)
                    .await
                    .map_err(CommitStep::AppendTransaction.wrap())?;
                tx.claim_cooldown(&staged.customer_id, now, cutoff)
                    .await
                    .map_err(CommitStep::ClaimCooldown.wrap())?;
                Ok::<_, StepFailure>(())
            })
        })
        .await
        .map_err(|e| self.commit_error(&order.customer_id, now, e))?;

        tracing::info!(
            order_id = %order.id,
            customer_id = %order.customer_id,
            product_id = %order.product_id,
            quantity = order.quantity,
            total_amount = order.total_amount,
            "order placed"
        );
        Ok(OrderSummary::new(&order, &customer, &product))
    }

    /// Storage-layer rechecks keep their business meaning; anything else is a failed commit.
    fn commit_error(&self, customer_id: &str, now: DateTime<Utc>, err: StepFailure) -> OrderError {
        let StepFailure { step, source } = err;
        let mapped = match source {
            StoreError::InsufficientQuantity { available, requested } => {
                OrderError::InsufficientQuantity { available, requested }
            }
            StoreError::CooldownActive { last_order_time, .. } => OrderError::CooldownActive {
                customer_id: customer_id.to_string(),
                remaining: self.policy.remaining_since(last_order_time, now),
            },
            other => {
                tracing::error!(customer_id = %customer_id, step = %step, error = %other, "order commit failed");
                return OrderError::CommitFailed { step, source: other };
            }
        };
        tracing::warn!(customer_id = %customer_id, error = %mapped, "order rejected at commit");
        mapped
    }

    /// A customer's orders, newest first. Unknown customer is an error.
    pub async fn get_order_history(
        &self,
        customer_id: &str,
        page: Page,
    ) -> Result<Vec<Order>, OrderError> {
        self.require_customer(customer_id).await?;
        let page = page.normalized(self.default_page_limit);
        self.orders
            .list_orders_by_customer(customer_id, page)
            .await
            .map_err(LookupStep::Orders.wrap())
    }

    /// All orders, newest first, with display names
    pub async fn get_all_orders(&self, page: Page) -> Result<Vec<OrderDetails>, OrderError> {
        let page = page.normalized(self.default_page_limit);
        self.orders
            .list_orders_with_details(page)
            .await
            .map_err(LookupStep::Orders.wrap())
    }

    pub async fn get_order(&self, id: &str) -> Result<Order, OrderError> {
        self.orders
            .get_order(id)
            .await
            .map_err(LookupStep::Orders.wrap())?
            .ok_or_else(|| OrderError::OrderNotFound(id.to_string()))
    }

    /// Orders placed since UTC midnight
    pub async fn get_todays_orders(&self) -> Result<Vec<OrderDetails>, OrderError> {
        self.orders
            .list_orders_since(start_of_day(Utc::now()))
            .await
            .map_err(LookupStep::Orders.wrap())
    }

    pub async fn cooldown_status(&self, customer_id: &str) -> Result<CooldownStatus, OrderError> {
        self.require_customer(customer_id).await?;
        let cooldown = self
            .cooldowns
            .get_cooldown(customer_id)
            .await
            .map_err(LookupStep::Cooldown.wrap())?;
        Ok(self.policy.status(cooldown.as_ref(), Utc::now()))
    }

    async fn require_customer(&self, customer_id: &str) -> Result<(), OrderError> {
        match self.customers.get_customer(customer_id).await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(OrderError::CustomerNotFound(customer_id.to_string())),
            Err(source) => Err(OrderError::Store {
                step: LookupStep::Customer,
                source,
            }),
        }
    }
}

/// Storage read that failed outside the commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupStep {
    Cooldown,
    Product,
    Customer,
    Orders,
}

impl LookupStep {
    fn wrap(self) -> impl FnOnce(StoreError) -> OrderError {
        move |source| OrderError::Store { step: self, source }
    }
}

impl fmt::Display for LookupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LookupStep::Cooldown => "load cooldown",
            LookupStep::Product => "load product",
            LookupStep::Customer => "load customer",
            LookupStep::Orders => "load orders",
        })
    }
}

/// Write inside the placement commit that failed. `Transaction` covers
/// opening and committing the transaction itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStep {
    Transaction,
    InsertOrder,
    ReduceQuantity,
    AppendTransaction,
    ClaimCooldown,
}

impl CommitStep {
    fn wrap(self) -> impl FnOnce(StoreError) -> StepFailure {
        move |source| StepFailure { step: self, source }
    }
}

impl fmt::Display for CommitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CommitStep::Transaction => "begin/commit transaction",
            CommitStep::InsertOrder => "insert order",
            CommitStep::ReduceQuantity => "reduce quantity",
            CommitStep::AppendTransaction => "append transaction",
            CommitStep::ClaimCooldown => "claim cooldown",
        })
    }
}

struct StepFailure {
    step: CommitStep,
    source: StoreError,
}

impl From<StoreError> for StepFailure {
    fn from(source: StoreError) -> Self {
        StepFailure {
            step: CommitStep::Transaction,
            source,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Customer with ID {0} not found")]
    CustomerNotFound(String),

    #[error("Product with ID {0} not found")]
    ProductNotFound(String),

    #[error("Insufficient quantity: available {available}, requested {requested}")]
    InsufficientQuantity {
        available: i32,
        requested: i32,
    },

    #[error("Customer {customer_id} is in cooldown period")]
    CooldownActive {
        customer_id: String,
        remaining: Duration,
    },

    #[error("Failed to commit order at {step}: {source}")]
    CommitFailed {
        step: CommitStep,
        #[source]
        source: StoreError,
    },

    #[error("Order failed validation: {0}")]
    ValidationFailed(#[source] ValidationError),

    #[error("Invalid order request: {0}")]
    InvalidRequest(#[source] ValidationError),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Failed to {step}: {source}")]
    Store {
        step: LookupStep,
        #[source]
        source: StoreError,
    },
}
