//! In-process backend with the same atomicity guarantees as Postgres.
//!
//! All state sits behind one async mutex. A unit of work takes the lock
//! for its whole lifetime, stages the rows it touches in a write set and
//! applies them on commit. Dropping it without committing (error, panic,
//! cancelled future) releases the lock and leaves the published state
//! untouched. Units of work are therefore serialized, which also makes
//! the conditional decrement and the cooldown claim race-free.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use retail_core::{
    BusinessStats, CooldownRepository, Customer, CustomerCooldown, CustomerRepository,
    CustomerTransactionSummary, Order, OrderDetails, OrderRepository, Product, ProductChanges,
    ProductRepository, ProductSales, StoreError, StoreResult, StoreTransaction, TimeRange,
    Transaction, TransactionFilter, TransactionRepository, TxHandle, UnitOfWork,
};
use retail_shared::Page;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default)]
struct MemoryState {
    products: HashMap<String, Product>,
    customers: HashMap<String, Customer>,
    cooldowns: HashMap<String, CustomerCooldown>,
    orders: HashMap<String, Order>,
    transactions: Vec<Transaction>,
}

impl MemoryState {
    fn reduce_quantity(&mut self, id: &str, amount: i32, now: DateTime<Utc>) -> StoreResult<()> {
        let product = self
            .products
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("product", id))?;
        if product.quantity < amount {
            return Err(StoreError::InsufficientQuantity {
                available: product.quantity,
                requested: amount,
            });
        }
        product.quantity -= amount;
        product.updated_at = now;
        Ok(())
    }

    fn append_transaction(&mut self, txn: &Transaction) -> StoreResult<()> {
        if self.transactions.iter().any(|t| t.id == txn.id) {
            return Err(StoreError::duplicate("transaction", &txn.id));
        }
        self.transactions.push(txn.clone());
        Ok(())
    }

    fn details(&self, order: &Order) -> OrderDetails {
        OrderDetails {
            order: order.clone(),
            customer_name: self.customers.get(&order.customer_id).map(|c| c.name.clone()),
            product_name: self.products.get(&order.product_id).map(|p| p.name.clone()),
        }
    }

    fn orders_newest_first(&self) -> Vec<&Order> {
        let mut orders: Vec<&Order> = self.orders.values().collect();
        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date).then(b.id.cmp(&a.id)));
        orders
    }
}

fn newest_first<T, K: Ord>(items: &mut [T], key: impl Fn(&T) -> K) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Cheap to clone; clones share storage.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductRepository for InMemoryStore {
    async fn create_product(&self, product: &Product) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        if state.products.contains_key(&product.id) {
            return Err(StoreError::duplicate("product", &product.id));
        }
        state.products.insert(product.id.clone(), product.clone());
        Ok(())
    }

    async fn get_product(&self, id: &str) -> StoreResult<Option<Product>> {
        Ok(self.state.lock().await.products.get(id).cloned())
    }

    async fn list_products(&self, page: Page) -> StoreResult<Vec<Product>> {
        let state = self.state.lock().await;
        let mut products: Vec<Product> = state.products.values().cloned().collect();
        newest_first(&mut products, |p| (p.created_at, p.id.clone()));
        Ok(page.slice(products))
    }

    async fn update_product(
        &self,
        id: &str,
        changes: ProductChanges,
        now: DateTime<Utc>,
    ) -> StoreResult<Product> {
        let mut state = self.state.lock().await;
        let product = state
            .products
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("product", id))?;
        if let Some(price) = changes.price {
            product.price = price;
        }
        if let Some(quantity) = changes.quantity {
            product.quantity = quantity;
        }
        product.updated_at = now;
        Ok(product.clone())
    }

    async fn reduce_quantity(&self, id: &str, amount: i32) -> StoreResult<()> {
        self.state.lock().await.reduce_quantity(id, amount, Utc::now())
    }

    async fn search_products(&self, term: &str, page: Page) -> StoreResult<Vec<Product>> {
        let state = self.state.lock().await;
        let mut products: Vec<Product> = state
            .products
            .values()
            .filter(|p| contains_ignore_case(&p.name, term))
            .cloned()
            .collect();
        newest_first(&mut products, |p| (p.created_at, p.id.clone()));
        Ok(page.slice(products))
    }

    async fn list_available_products(&self, page: Page) -> StoreResult<Vec<Product>> {
        let state = self.state.lock().await;
        let mut products: Vec<Product> = state
            .products
            .values()
            .filter(|p| p.quantity > 0)
            .cloned()
            .collect();
        newest_first(&mut products, |p| (p.created_at, p.id.clone()));
        Ok(page.slice(products))
    }

    async fn list_low_stock_products(&self, threshold: i32) -> StoreResult<Vec<Product>> {
        let state = self.state.lock().await;
        let mut products: Vec<Product> = state
            .products
            .values()
            .filter(|p| p.quantity < threshold)
            .cloned()
            .collect();
        products.sort_by(|a, b| a.quantity.cmp(&b.quantity).then(a.id.cmp(&b.id)));
        Ok(products)
    }
}

#[async_trait]
impl CustomerRepository for InMemoryStore {
    async fn create_customer(&self, customer: &Customer) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        if state.customers.contains_key(&customer.id) {
            return Err(StoreError::duplicate("customer", &customer.id));
        }
        if state.customers.values().any(|c| c.email() == customer.email()) {
            return Err(StoreError::duplicate("customer email", customer.email()));
        }
        state.customers.insert(customer.id.clone(), customer.clone());
        Ok(())
    }

    async fn get_customer(&self, id: &str) -> StoreResult<Option<Customer>> {
        Ok(self.state.lock().await.customers.get(id).cloned())
    }

    async fn get_customer_by_email(&self, email: &str) -> StoreResult<Option<Customer>> {
        let state = self.state.lock().await;
        Ok(state.customers.values().find(|c| c.email() == email).cloned())
    }

    async fn list_customers(&self, page: Page) -> StoreResult<Vec<Customer>> {
        let state = self.state.lock().await;
        let mut customers: Vec<Customer> = state.customers.values().cloned().collect();
        newest_first(&mut customers, |c| (c.created_at, c.id.clone()));
        Ok(page.slice(customers))
    }

    async fn search_customers(&self, term: &str, page: Page) -> StoreResult<Vec<Customer>> {
        let state = self.state.lock().await;
        let mut customers: Vec<Customer> = state
            .customers
            .values()
            .filter(|c| contains_ignore_case(&c.name, term) || contains_ignore_case(c.email(), term))
            .cloned()
            .collect();
        newest_first(&mut customers, |c| (c.created_at, c.id.clone()));
        Ok(page.slice(customers))
    }
}

#[async_trait]
impl CooldownRepository for InMemoryStore {
    async fn get_cooldown(&self, customer_id: &str) -> StoreResult<Option<CustomerCooldown>> {
        Ok(self.state.lock().await.cooldowns.get(customer_id).cloned())
    }

    async fn upsert_cooldown(&self, customer_id: &str, at: DateTime<Utc>) -> StoreResult<()> {
        let mut cooldown = CustomerCooldown::new(customer_id, at);
        cooldown.updated_at = Utc::now();
        self.state
            .lock()
            .await
            .cooldowns
            .insert(customer_id.to_string(), cooldown);
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn get_order(&self, id: &str) -> StoreResult<Option<Order>> {
        Ok(self.state.lock().await.orders.get(id).cloned())
    }

    async fn list_orders_by_customer(&self, customer_id: &str, page: Page) -> StoreResult<Vec<Order>> {
        let state = self.state.lock().await;
        let orders = state
            .orders_newest_first()
            .into_iter()
            .filter(|o| o.customer_id == customer_id)
            .cloned();
        Ok(page.slice(orders))
    }

    async fn list_orders_with_details(&self, page: Page) -> StoreResult<Vec<OrderDetails>> {
        let state = self.state.lock().await;
        let details = state
            .orders_newest_first()
            .into_iter()
            .map(|o| state.details(o));
        Ok(page.slice(details))
    }

    async fn list_orders_since(&self, since: DateTime<Utc>) -> StoreResult<Vec<OrderDetails>> {
        let state = self.state.lock().await;
        Ok(state
            .orders_newest_first()
            .into_iter()
            .filter(|o| o.order_date >= since)
            .map(|o| state.details(o))
            .collect())
    }
}

#[async_trait]
impl TransactionRepository for InMemoryStore {
    async fn append_transaction(&self, txn: &Transaction) -> StoreResult<()> {
        self.state.lock().await.append_transaction(txn)
    }

    async fn list_transactions(
        &self,
        filter: TransactionFilter,
        page: Page,
    ) -> StoreResult<Vec<Transaction>> {
        let state = self.state.lock().await;
        let mut matching: Vec<Transaction> = state
            .transactions
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        newest_first(&mut matching, |t| (t.transaction_at, t.id.clone()));
        Ok(page.slice(matching))
    }

    async fn business_stats(&self, range: Option<TimeRange>, top_n: usize) -> StoreResult<BusinessStats> {
        let state = self.state.lock().await;
        let mut stats = BusinessStats::from_transactions(&state.transactions, range, top_n);
        for sales in stats.top_selling_products.iter_mut() {
            sales.product_name = state.products.get(&sales.product_id).map(|p| p.name.clone());
        }
        Ok(stats)
    }

    async fn top_selling_products(
        &self,
        limit: usize,
        range: Option<TimeRange>,
    ) -> StoreResult<Vec<ProductSales>> {
        Ok(self.business_stats(range, limit).await?.top_selling_products)
    }

    async fn customer_summary(&self, customer_id: &str) -> StoreResult<CustomerTransactionSummary> {
        let state = self.state.lock().await;
        Ok(CustomerTransactionSummary::from_transactions(
            customer_id,
            &state.transactions,
        ))
    }
}

#[async_trait]
impl UnitOfWork for InMemoryStore {
    async fn begin(&self) -> StoreResult<TxHandle> {
        let guard = self.state.clone().lock_owned().await;
        Ok(Box::new(MemoryTransaction {
            guard,
            staged: WriteSet::default(),
        }))
    }
}

/// Rows touched by one unit of work. Reads see staged rows first, then the
/// published state.
#[derive(Default)]
struct WriteSet {
    orders: Vec<Order>,
    products: HashMap<String, Product>,
    transactions: Vec<Transaction>,
    cooldowns: HashMap<String, CustomerCooldown>,
}

struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    staged: WriteSet,
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn insert_order(&mut self, order: &Order) -> StoreResult<()> {
        let taken = self.guard.orders.contains_key(&order.id)
            || self.staged.orders.iter().any(|o| o.id == order.id);
        if taken {
            return Err(StoreError::duplicate("order", &order.id));
        }
        if !self.guard.customers.contains_key(&order.customer_id) {
            return Err(StoreError::not_found("customer", &order.customer_id));
        }
        if !self.guard.products.contains_key(&order.product_id) {
            return Err(StoreError::not_found("product", &order.product_id));
        }
        self.staged.orders.push(order.clone());
        Ok(())
    }

    async fn reduce_quantity(&mut self, product_id: &str, amount: i32) -> StoreResult<()> {
        let mut product = match self.staged.products.get(product_id) {
            Some(p) => p.clone(),
            None => self
                .guard
                .products
                .get(product_id)
                .cloned()
                .ok_or_else(|| StoreError::not_found("product", product_id))?,
        };
        if product.quantity < amount {
            return Err(StoreError::InsufficientQuantity {
                available: product.quantity,
                requested: amount,
            });
        }
        product.quantity -= amount;
        product.updated_at = Utc::now();
        self.staged.products.insert(product_id.to_string(), product);
        Ok(())
    }

    async fn append_transaction(&mut self, txn: &Transaction) -> StoreResult<()> {
        let taken = self.guard.transactions.iter().any(|t| t.id == txn.id)
            || self.staged.transactions.iter().any(|t| t.id == txn.id);
        if taken {
            return Err(StoreError::duplicate("transaction", &txn.id));
        }
        self.staged.transactions.push(txn.clone());
        Ok(())
    }

    async fn claim_cooldown(
        &mut self,
        customer_id: &str,
        now: DateTime<Utc>,
        cutoff: DateTime<Utc>,
    ) -> StoreResult<()> {
        let current = self
            .staged
            .cooldowns
            .get(customer_id)
            .or_else(|| self.guard.cooldowns.get(customer_id));
        if let Some(existing) = current {
            if existing.last_order_time > cutoff {
                return Err(StoreError::CooldownActive {
                    customer_id: customer_id.to_string(),
                    last_order_time: existing.last_order_time,
                });
            }
        }
        self.staged
            .cooldowns
            .insert(customer_id.to_string(), CustomerCooldown::new(customer_id, now));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTransaction { mut guard, staged } = *self;
        for order in staged.orders {
            guard.orders.insert(order.id.clone(), order);
        }
        guard.products.extend(staged.products);
        guard.transactions.extend(staged.transactions);
        guard.cooldowns.extend(staged.cooldowns);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn seeded() -> InMemoryStore {
        let store = InMemoryStore::new();
        let now = Utc::now();
        store
            .create_product(&Product::new("PROD10001".into(), "Desk Lamp", 10.0, 5, now).unwrap())
            .await
            .unwrap();
        store
            .create_customer(
                &Customer::new("CUST10001".into(), "Jane Doe", "jane@example.com", "555-0100", now)
                    .unwrap(),
            )
            .await
            .unwrap();
        store
    }

    fn order(id: &str, quantity: i32) -> Order {
        Order::new(id.into(), "CUST10001", "PROD10001", quantity, 10.0, Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn test_clone_shares_storage() {
        let store = seeded().await;
        let other = store.clone();
        assert!(other.get_product("PROD10001").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_conditional_decrement() {
        let store = seeded().await;
        ProductRepository::reduce_quantity(&store, "PROD10001", 3).await.unwrap();

        let err = ProductRepository::reduce_quantity(&store, "PROD10001", 3).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::InsufficientQuantity { available: 2, requested: 3 }
        ));

        let err = ProductRepository::reduce_quantity(&store, "PROD99999", 1).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "product", .. }));
        assert_eq!(store.get_product("PROD10001").await.unwrap().unwrap().quantity, 2);
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let store = seeded().await;
        let clash =
            Customer::new("CUST10002".into(), "Janet", "jane@example.com", "555-0101", Utc::now()).unwrap();
        let err = store.create_customer(&clash).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { entity: "customer email", .. }));
    }

    #[tokio::test]
    async fn test_commit_publishes_all_writes() {
        let store = seeded().await;
        let now = Utc::now();
        let o = order("ORD10001", 2);
        let txn = Transaction::for_order("TXN10001".into(), &o, now);

        let mut tx = store.begin().await.unwrap();
        tx.insert_order(&o).await.unwrap();
        tx.reduce_quantity("PROD10001", 2).await.unwrap();
        tx.append_transaction(&txn).await.unwrap();
        tx.claim_cooldown("CUST10001", now, now - Duration::minutes(5)).await.unwrap();
        tx.commit().await.unwrap();

        assert!(store.get_order("ORD10001").await.unwrap().is_some());
        assert_eq!(store.get_product("PROD10001").await.unwrap().unwrap().quantity, 3);
        assert_eq!(
            store.get_cooldown("CUST10001").await.unwrap().unwrap().last_order_time,
            now
        );
        let all = store
            .list_transactions(TransactionFilter::All, Page::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_drop_discards_staged_writes() {
        let store = seeded().await;
        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_order(&order("ORD10001", 1)).await.unwrap();
            tx.reduce_quantity("PROD10001", 1).await.unwrap();
        }
        assert!(store.get_order("ORD10001").await.unwrap().is_none());
        assert_eq!(store.get_product("PROD10001").await.unwrap().unwrap().quantity, 5);
    }

    #[tokio::test]
    async fn test_panic_inside_unit_of_work_rolls_back() {
        let store = seeded().await;
        let inner = store.clone();
        let handle = tokio::spawn(async move {
            let mut tx = inner.begin().await.unwrap();
            tx.reduce_quantity("PROD10001", 4).await.unwrap();
            panic!("boom");
        });
        assert!(handle.await.unwrap_err().is_panic());

        assert_eq!(store.get_product("PROD10001").await.unwrap().unwrap().quantity, 5);
    }

    #[tokio::test]
    async fn test_unit_of_work_reads_its_own_writes() {
        let store = seeded().await;
        let now = Utc::now();
        let cutoff = now - Duration::minutes(5);

        let mut tx = store.begin().await.unwrap();
        tx.reduce_quantity("PROD10001", 3).await.unwrap();
        let err = tx.reduce_quantity("PROD10001", 3).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::InsufficientQuantity { available: 2, requested: 3 }
        ));

        tx.claim_cooldown("CUST10001", now, cutoff).await.unwrap();
        let err = tx.claim_cooldown("CUST10001", now, cutoff).await.unwrap_err();
        assert!(matches!(err, StoreError::CooldownActive { .. }));

        tx.insert_order(&order("ORD10001", 1)).await.unwrap();
        let err = tx.insert_order(&order("ORD10001", 1)).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { entity: "order", .. }));
        tx.commit().await.unwrap();

        assert_eq!(store.get_product("PROD10001").await.unwrap().unwrap().quantity, 2);
        assert!(store.get_order("ORD10001").await.unwrap().is_some());
        assert!(store.get_cooldown("CUST10001").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_claim_respects_cutoff() {
        let store = seeded().await;
        let now = Utc::now();
        store
            .upsert_cooldown("CUST10001", now - Duration::minutes(1))
            .await
            .unwrap();

        let mut tx = store.begin().await.unwrap();
        let err = tx
            .claim_cooldown("CUST10001", now, now - Duration::minutes(5))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::CooldownActive { .. }));
        tx.rollback().await.unwrap();

        store
            .upsert_cooldown("CUST10001", now - Duration::minutes(5))
            .await
            .unwrap();
        let mut tx = store.begin().await.unwrap();
        tx.claim_cooldown("CUST10001", now, now - Duration::minutes(5))
            .await
            .unwrap();
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_history_is_newest_first() {
        let store = seeded().await;
        let base = Utc::now() - Duration::hours(1);
        for (i, id) in ["ORD10001", "ORD10002", "ORD10003"].iter().enumerate() {
            let mut o = order(id, 1);
            o.order_date = base + Duration::minutes(i as i64);
            let mut tx = store.begin().await.unwrap();
            tx.insert_order(&o).await.unwrap();
            tx.commit().await.unwrap();
        }

        let orders = store
            .list_orders_by_customer("CUST10001", Page::new(2, 0))
            .await
            .unwrap();
        let ids: Vec<_> = orders.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["ORD10003", "ORD10002"]);

        let details = store.list_orders_with_details(Page::default()).await.unwrap();
        assert_eq!(details[0].product_name.as_deref(), Some("Desk Lamp"));
    }
}
