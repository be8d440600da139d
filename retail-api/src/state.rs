use std::sync::Arc;
use retail_catalog::{CustomerService, ProductService};
use retail_order::{CooldownPolicy, OrderManager, ReportingService};
use retail_store::app_config::OrdersConfig;
use retail_store::Repositories;

#[derive(Clone)]
pub struct AppState {
    pub products: Arc<ProductService>,
    pub customers: Arc<CustomerService>,
    pub orders: Arc<OrderManager>,
    pub reporting: Arc<ReportingService>,
    pub low_stock_threshold: i32,
}

impl AppState {
    /// Wire every service onto one set of storage collaborators.
    pub fn new(repos: Repositories, orders: &OrdersConfig) -> Self {
        let limit = orders.default_page_limit;
        let manager = OrderManager::new(
            repos.products.clone(),
            repos.customers.clone(),
            repos.cooldowns.clone(),
            repos.orders.clone(),
            repos.uow.clone(),
            CooldownPolicy::from_seconds(orders.cooldown_seconds),
        )
        .with_page_limit(limit);

        Self {
            products: Arc::new(ProductService::new(repos.products.clone(), limit)),
            customers: Arc::new(CustomerService::new(repos.customers.clone(), limit)),
            orders: Arc::new(manager),
            reporting: Arc::new(ReportingService::new(
                repos.transactions,
                repos.customers,
                repos.products,
                limit,
            )),
            low_stock_threshold: orders.low_stock_threshold,
        }
    }
}
