//! Atomic multi-write scope for order placement.
//!
//! A [`StoreTransaction`] stages writes that become visible only on
//! [`StoreTransaction::commit`]. Dropping a handle without committing
//! discards everything it staged, so an early return, a panic or a
//! cancelled future all leave the store untouched.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;

use crate::entities::{Order, Transaction};
use crate::{StoreError, StoreResult};

#[async_trait]
pub trait StoreTransaction: Send {
    async fn insert_order(&mut self, order: &Order) -> StoreResult<()>;

    /// Decrement stock only if at least `amount` remains.
    async fn reduce_quantity(&mut self, product_id: &str, amount: i32) -> StoreResult<()>;

    async fn append_transaction(&mut self, txn: &Transaction) -> StoreResult<()>;

    /// Set the customer's last order time to `now`, but only if no record
    /// exists or the recorded time is at or before `cutoff`. Otherwise fails
    /// with `CooldownActive` carrying the time that blocked the claim.
    async fn claim_cooldown(
        &mut self,
        customer_id: &str,
        now: DateTime<Utc>,
        cutoff: DateTime<Utc>,
    ) -> StoreResult<()>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;

    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}

pub type TxHandle = Box<dyn StoreTransaction>;

#[async_trait]
pub trait UnitOfWork: Send + Sync {
    async fn begin(&self) -> StoreResult<TxHandle>;
}

/// Run `f` inside a fresh transaction. Commits when `f` returns `Ok`,
/// rolls back when it returns `Err`.
pub async fn in_transaction<U, T, E, F>(uow: &U, f: F) -> Result<T, E>
where
    U: UnitOfWork + ?Sized,
    T: Send,
    E: From<StoreError> + Send,
    F: for<'t> FnOnce(&'t mut TxHandle) -> BoxFuture<'t, Result<T, E>> + Send,
{
    let mut tx = uow.begin().await?;
    match f(&mut tx).await {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    enum Outcome {
        Committed(Vec<String>),
        RolledBack,
    }

    #[derive(Default)]
    struct RecordingUow {
        outcomes: Arc<Mutex<Vec<Outcome>>>,
    }

    struct RecordingTx {
        staged: Vec<String>,
        outcomes: Arc<Mutex<Vec<Outcome>>>,
    }

    #[async_trait]
    impl UnitOfWork for RecordingUow {
        async fn begin(&self) -> StoreResult<TxHandle> {
            Ok(Box::new(RecordingTx {
                staged: Vec::new(),
                outcomes: self.outcomes.clone(),
            }))
        }
    }

    #[async_trait]
    impl StoreTransaction for RecordingTx {
        async fn insert_order(&mut self, order: &Order) -> StoreResult<()> {
            self.staged.push(order.id.clone());
            Ok(())
        }

        async fn reduce_quantity(&mut self, product_id: &str, amount: i32) -> StoreResult<()> {
            if amount > 5 {
                return Err(StoreError::InsufficientQuantity { available: 5, requested: amount });
            }
            self.staged.push(format!("{}-{}", product_id, amount));
            Ok(())
        }

        async fn append_transaction(&mut self, txn: &Transaction) -> StoreResult<()> {
            self.staged.push(txn.id.clone());
            Ok(())
        }

        async fn claim_cooldown(
            &mut self,
            customer_id: &str,
            _now: DateTime<Utc>,
            _cutoff: DateTime<Utc>,
        ) -> StoreResult<()> {
            self.staged.push(customer_id.to_string());
            Ok(())
        }

        async fn commit(self: Box<Self>) -> StoreResult<()> {
            self.outcomes.lock().unwrap().push(Outcome::Committed(self.staged.clone()));
            Ok(())
        }

        async fn rollback(self: Box<Self>) -> StoreResult<()> {
            self.outcomes.lock().unwrap().push(Outcome::RolledBack);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_commits_on_success() {
        let uow = RecordingUow::default();
        let result: Result<i32, StoreError> = in_transaction(&uow, |tx| {
            Box::pin(async move {
                tx.reduce_quantity("PROD10001", 2).await?;
                tx.claim_cooldown("CUST10001", Utc::now(), Utc::now()).await?;
                Ok(7)
            })
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(
            *uow.outcomes.lock().unwrap(),
            vec![Outcome::Committed(vec!["PROD10001-2".into(), "CUST10001".into()])]
        );
    }

    #[tokio::test]
    async fn test_rolls_back_on_error() {
        let uow = RecordingUow::default();
        let result: Result<(), StoreError> = in_transaction(&uow, |tx| {
            Box::pin(async move {
                tx.reduce_quantity("PROD10001", 2).await?;
                tx.reduce_quantity("PROD10001", 9).await?;
                Ok(())
            })
        })
        .await;

        assert!(matches!(
            result,
            Err(StoreError::InsufficientQuantity { available: 5, requested: 9 })
        ));
        assert_eq!(*uow.outcomes.lock().unwrap(), vec![Outcome::RolledBack]);
    }
}
