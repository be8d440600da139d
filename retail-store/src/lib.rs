pub mod app_config;
pub mod cooldown_repo;
pub mod customer_repo;
pub mod database;
pub mod memory;
pub mod order_repo;
pub mod product_repo;
pub mod transaction_repo;
pub mod unit_of_work;

pub use app_config::{Config, DatabaseBackend, DatabaseConfig};
pub use cooldown_repo::StoreCooldownRepository;
pub use customer_repo::StoreCustomerRepository;
pub use database::DbClient;
pub use memory::InMemoryStore;
pub use order_repo::StoreOrderRepository;
pub use product_repo::StoreProductRepository;
pub use transaction_repo::StoreTransactionRepository;
pub use unit_of_work::PgUnitOfWork;

use retail_core::{
    CooldownRepository, CustomerRepository, OrderRepository, ProductRepository, StoreError,
    TransactionRepository, UnitOfWork,
};
use sqlx::PgPool;
use std::sync::Arc;

/// Every storage collaborator the services need, backed by one store.
#[derive(Clone)]
pub struct Repositories {
    pub products: Arc<dyn ProductRepository>,
    pub customers: Arc<dyn CustomerRepository>,
    pub cooldowns: Arc<dyn CooldownRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub transactions: Arc<dyn TransactionRepository>,
    pub uow: Arc<dyn UnitOfWork>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            products: Arc::new(StoreProductRepository::new(pool.clone())),
            customers: Arc::new(StoreCustomerRepository::new(pool.clone())),
            cooldowns: Arc::new(StoreCooldownRepository::new(pool.clone())),
            orders: Arc::new(StoreOrderRepository::new(pool.clone())),
            transactions: Arc::new(StoreTransactionRepository::new(pool.clone())),
            uow: Arc::new(PgUnitOfWork::new(pool)),
        }
    }

    pub fn in_memory(store: InMemoryStore) -> Self {
        Self {
            products: Arc::new(store.clone()),
            customers: Arc::new(store.clone()),
            cooldowns: Arc::new(store.clone()),
            orders: Arc::new(store.clone()),
            transactions: Arc::new(store.clone()),
            uow: Arc::new(store),
        }
    }

    /// Build the configured backend, running migrations when asked to.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        match config.backend {
            DatabaseBackend::Memory => {
                tracing::info!("Using in-memory store");
                Ok(Self::in_memory(InMemoryStore::new()))
            }
            DatabaseBackend::Postgres => {
                let db = DbClient::new(config).await.map_err(StoreError::backend)?;
                if config.run_migrations {
                    db.migrate().await.map_err(StoreError::backend)?;
                }
                tracing::info!("Connected to Postgres");
                Ok(Self::postgres(db.pool))
            }
        }
    }
}
