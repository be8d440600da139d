use async_trait::async_trait;
use chrono::{DateTime, Utc};
use retail_core::{
    BusinessStats, CustomerTransactionSummary, ProductSales, StoreError, StoreResult, TimeRange,
    Transaction, TransactionFilter, TransactionRepository, TransactionType,
};
use retail_shared::Page;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::database::write_error;

pub struct StoreTransactionRepository {
    pool: PgPool,
}

impl StoreTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const TRANSACTION_COLUMNS: &str = "id, order_id, customer_id, product_id, type AS kind, amount, \
     quantity, unit_price, description, transaction_at, created_at";

#[derive(sqlx::FromRow)]
struct TransactionRow {
    id: String,
    order_id: String,
    customer_id: String,
    product_id: String,
    kind: String,
    amount: f64,
    quantity: i32,
    unit_price: f64,
    description: String,
    transaction_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = StoreError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(Transaction {
            kind: row.kind.parse::<TransactionType>().map_err(StoreError::backend)?,
            id: row.id,
            order_id: row.order_id,
            customer_id: row.customer_id,
            product_id: row.product_id,
            amount: row.amount,
            quantity: row.quantity,
            unit_price: row.unit_price,
            description: row.description,
            transaction_at: row.transaction_at,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct StatsRow {
    total_revenue: f64,
    order_count: i64,
    total_quantity_sold: i64,
    unique_customers: i64,
}

#[derive(sqlx::FromRow)]
struct ProductSalesRow {
    product_id: String,
    product_name: Option<String>,
    quantity_sold: i64,
    total_revenue: f64,
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    total_transactions: i64,
    total_spent: f64,
    first_transaction_at: Option<DateTime<Utc>>,
    last_transaction_at: Option<DateTime<Utc>>,
}

fn bounds(range: Option<TimeRange>) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    match range {
        Some(r) => (Some(r.start), Some(r.end)),
        None => (None, None),
    }
}

pub(crate) async fn append_transaction_on(
    conn: &mut sqlx::PgConnection,
    txn: &Transaction,
) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO transactions (id, order_id, customer_id, product_id, type, amount, quantity, \
         unit_price, description, transaction_at, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
    )
    .bind(&txn.id)
    .bind(&txn.order_id)
    .bind(&txn.customer_id)
    .bind(&txn.product_id)
    .bind(txn.kind.as_str())
    .bind(txn.amount)
    .bind(txn.quantity)
    .bind(txn.unit_price)
    .bind(&txn.description)
    .bind(txn.transaction_at)
    .bind(txn.created_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| write_error(e, "transaction", &txn.id))?;
    Ok(())
}

#[async_trait]
impl TransactionRepository for StoreTransactionRepository {
    async fn append_transaction(&self, txn: &Transaction) -> StoreResult<()> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::backend)?;
        append_transaction_on(&mut conn, txn).await
    }

    async fn list_transactions(
        &self,
        filter: TransactionFilter,
        page: Page,
    ) -> StoreResult<Vec<Transaction>> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM transactions", TRANSACTION_COLUMNS));

        match filter {
            TransactionFilter::All => {}
            TransactionFilter::Customer(id) => {
                qb.push(" WHERE customer_id = ").push_bind(id);
            }
            TransactionFilter::Product(id) => {
                qb.push(" WHERE product_id = ").push_bind(id);
            }
            TransactionFilter::Kind(kind) => {
                qb.push(" WHERE type = ").push_bind(kind.as_str());
            }
            TransactionFilter::Range(range) => {
                qb.push(" WHERE transaction_at >= ")
                    .push_bind(range.start)
                    .push(" AND transaction_at < ")
                    .push_bind(range.end);
            }
        }
        qb.push(" ORDER BY transaction_at DESC, id DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset);

        let rows = qb
            .build_query_as::<TransactionRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::backend)?;
        rows.into_iter().map(Transaction::try_from).collect()
    }

    async fn business_stats(&self, range: Option<TimeRange>, top_n: usize) -> StoreResult<BusinessStats> {
        let (start, end) = bounds(range);
        let row = sqlx::query_as::<_, StatsRow>(
            "SELECT COALESCE(SUM(amount), 0)::float8 AS total_revenue, \
                    COUNT(*) AS order_count, \
                    COALESCE(SUM(quantity), 0)::int8 AS total_quantity_sold, \
                    COUNT(DISTINCT customer_id) AS unique_customers \
             FROM transactions \
             WHERE type = 'order' \
               AND ($1::timestamptz IS NULL OR transaction_at >= $1) \
               AND ($2::timestamptz IS NULL OR transaction_at < $2)",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        let average_order_value = if row.order_count > 0 {
            row.total_revenue / row.order_count as f64
        } else {
            0.0
        };

        Ok(BusinessStats {
            total_revenue: row.total_revenue,
            order_count: row.order_count,
            average_order_value,
            total_quantity_sold: row.total_quantity_sold,
            unique_customers: row.unique_customers,
            top_selling_products: self.top_selling_products(top_n, range).await?,
        })
    }

    async fn top_selling_products(
        &self,
        limit: usize,
        range: Option<TimeRange>,
    ) -> StoreResult<Vec<ProductSales>> {
        let (start, end) = bounds(range);
        let rows = sqlx::query_as::<_, ProductSalesRow>(
            "SELECT t.product_id, p.name AS product_name, \
                    SUM(t.quantity)::int8 AS quantity_sold, \
                    SUM(t.amount)::float8 AS total_revenue \
             FROM transactions t \
             LEFT JOIN products p ON p.id = t.product_id \
             WHERE t.type = 'order' \
               AND ($1::timestamptz IS NULL OR t.transaction_at >= $1) \
               AND ($2::timestamptz IS NULL OR t.transaction_at < $2) \
             GROUP BY t.product_id, p.name \
             ORDER BY quantity_sold DESC, total_revenue DESC, t.product_id ASC \
             LIMIT $3",
        )
        .bind(start)
        .bind(end)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        Ok(rows
            .into_iter()
            .map(|row| ProductSales {
                product_id: row.product_id,
                product_name: row.product_name,
                quantity_sold: row.quantity_sold,
                total_revenue: row.total_revenue,
            })
            .collect())
    }

    async fn customer_summary(&self, customer_id: &str) -> StoreResult<CustomerTransactionSummary> {
        let row = sqlx::query_as::<_, SummaryRow>(
            "SELECT COUNT(*) AS total_transactions, \
                    COALESCE(SUM(CASE type WHEN 'order' THEN amount \
                                           WHEN 'refund' THEN -amount \
                                           ELSE 0 END), 0)::float8 AS total_spent, \
                    MIN(transaction_at) AS first_transaction_at, \
                    MAX(transaction_at) AS last_transaction_at \
             FROM transactions WHERE customer_id = $1",
        )
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        Ok(CustomerTransactionSummary {
            customer_id: customer_id.to_string(),
            total_transactions: row.total_transactions,
            total_spent: row.total_spent,
            first_transaction_at: row.first_transaction_at,
            last_transaction_at: row.last_transaction_at,
        })
    }
}
