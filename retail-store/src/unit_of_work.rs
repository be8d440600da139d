use async_trait::async_trait;
use chrono::{DateTime, Utc};
use retail_core::{Order, StoreError, StoreResult, StoreTransaction, Transaction, TxHandle, UnitOfWork};
use sqlx::{PgPool, Postgres};

use crate::cooldown_repo::claim_cooldown_on;
use crate::order_repo::insert_order_on;
use crate::product_repo::reduce_quantity_on;
use crate::transaction_repo::append_transaction_on;

/// Opens one Postgres transaction per unit of work.
#[derive(Clone)]
pub struct PgUnitOfWork {
    pool: PgPool,
}

impl PgUnitOfWork {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn begin(&self) -> StoreResult<TxHandle> {
        let tx = self.pool.begin().await.map_err(StoreError::backend)?;
        Ok(Box::new(PgStoreTransaction { tx }))
    }
}

/// Dropping an uncommitted `sqlx::Transaction` queues a rollback on its connection.
struct PgStoreTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PgStoreTransaction {
    async fn insert_order(&mut self, order: &Order) -> StoreResult<()> {
        insert_order_on(&mut self.tx, order).await
    }

    async fn reduce_quantity(&mut self, product_id: &str, amount: i32) -> StoreResult<()> {
        reduce_quantity_on(&mut self.tx, product_id, amount).await
    }

    async fn append_transaction(&mut self, txn: &Transaction) -> StoreResult<()> {
        append_transaction_on(&mut self.tx, txn).await
    }

    async fn claim_cooldown(
        &mut self,
        customer_id: &str,
        now: DateTime<Utc>,
        cutoff: DateTime<Utc>,
    ) -> StoreResult<()> {
        claim_cooldown_on(&mut self.tx, customer_id, now, cutoff).await
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let this = *self;
        this.tx.commit().await.map_err(StoreError::backend)
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        let this = *self;
        this.tx.rollback().await.map_err(StoreError::backend)
    }
}
