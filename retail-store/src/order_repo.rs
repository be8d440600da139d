use async_trait::async_trait;
use chrono::{DateTime, Utc};
use retail_core::{Order, OrderDetails, OrderRepository, StoreError, StoreResult};
use retail_shared::Page;
use sqlx::PgPool;

use crate::database::write_error;

pub struct StoreOrderRepository {
    pool: PgPool,
}

impl StoreOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ORDER_COLUMNS: &str =
    "o.id, o.customer_id, o.product_id, o.quantity, o.unit_price, o.total_amount, o.order_date, o.created_at";

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: String,
    customer_id: String,
    product_id: String,
    quantity: i32,
    unit_price: f64,
    total_amount: f64,
    order_date: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderDetailsRow {
    #[sqlx(flatten)]
    order: OrderRow,
    customer_name: Option<String>,
    product_name: Option<String>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Order {
            id: row.id,
            customer_id: row.customer_id,
            product_id: row.product_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
            total_amount: row.total_amount,
            order_date: row.order_date,
            created_at: row.created_at,
        }
    }
}

impl From<OrderDetailsRow> for OrderDetails {
    fn from(row: OrderDetailsRow) -> Self {
        OrderDetails {
            order: row.order.into(),
            customer_name: row.customer_name,
            product_name: row.product_name,
        }
    }
}

pub(crate) async fn insert_order_on(conn: &mut sqlx::PgConnection, order: &Order) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO orders (id, customer_id, product_id, quantity, unit_price, total_amount, order_date, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(&order.id)
    .bind(&order.customer_id)
    .bind(&order.product_id)
    .bind(order.quantity)
    .bind(order.unit_price)
    .bind(order.total_amount)
    .bind(order.order_date)
    .bind(order.created_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| write_error(e, "order", &order.id))?;
    Ok(())
}

#[async_trait]
impl OrderRepository for StoreOrderRepository {
    async fn get_order(&self, id: &str) -> StoreResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders o WHERE o.id = $1",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(row.map(Order::from))
    }

    async fn list_orders_by_customer(&self, customer_id: &str, page: Page) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders o WHERE o.customer_id = $1 \
             ORDER BY o.order_date DESC, o.id DESC LIMIT $2 OFFSET $3",
            ORDER_COLUMNS
        ))
        .bind(customer_id)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(rows.into_iter().map(Order::from).collect())
    }

    async fn list_orders_with_details(&self, page: Page) -> StoreResult<Vec<OrderDetails>> {
        let rows = sqlx::query_as::<_, OrderDetailsRow>(&format!(
            "SELECT {}, c.name AS customer_name, p.name AS product_name \
             FROM orders o \
             LEFT JOIN customers c ON c.id = o.customer_id \
             LEFT JOIN products p ON p.id = o.product_id \
             ORDER BY o.order_date DESC, o.id DESC LIMIT $1 OFFSET $2",
            ORDER_COLUMNS
        ))
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(rows.into_iter().map(OrderDetails::from).collect())
    }

    async fn list_orders_since(&self, since: DateTime<Utc>) -> StoreResult<Vec<OrderDetails>> {
        let rows = sqlx::query_as::<_, OrderDetailsRow>(&format!(
            "SELECT {}, c.name AS customer_name, p.name AS product_name \
             FROM orders o \
             LEFT JOIN customers c ON c.id = o.customer_id \
             LEFT JOIN products p ON p.id = o.product_id \
             WHERE o.order_date >= $1 \
             ORDER BY o.order_date DESC, o.id DESC",
            ORDER_COLUMNS
        ))
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(rows.into_iter().map(OrderDetails::from).collect())
    }
}
