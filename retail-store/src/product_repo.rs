use async_trait::async_trait;
use chrono::{DateTime, Utc};
use retail_core::{Product, ProductChanges, ProductRepository, StoreError, StoreResult};
use retail_shared::Page;
use sqlx::PgPool;

use crate::database::{contains_pattern, write_error};

pub struct StoreProductRepository {
    pool: PgPool,
}

impl StoreProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const PRODUCT_COLUMNS: &str = "id, name, price, quantity, created_at, updated_at";

#[derive(sqlx::FromRow)]
pub(crate) struct ProductRow {
    id: String,
    name: String,
    price: f64,
    quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            price: row.price,
            quantity: row.quantity,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Conditional decrement shared by the pool and transaction paths.
/// Zero rows affected means either no such product or not enough stock;
/// a follow-up read on the same connection tells them apart.
pub(crate) async fn reduce_quantity_on(
    conn: &mut sqlx::PgConnection,
    id: &str,
    amount: i32,
) -> StoreResult<()> {
    let result = sqlx::query(
        "UPDATE products SET quantity = quantity - $2, updated_at = NOW() \
         WHERE id = $1 AND quantity >= $2",
    )
    .bind(id)
    .bind(amount)
    .execute(&mut *conn)
    .await
    .map_err(StoreError::backend)?;

    if result.rows_affected() == 1 {
        return Ok(());
    }

    let available: Option<i32> = sqlx::query_scalar("SELECT quantity FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(StoreError::backend)?;

    match available {
        Some(available) => Err(StoreError::InsufficientQuantity {
            available,
            requested: amount,
        }),
        None => Err(StoreError::not_found("product", id)),
    }
}

#[async_trait]
impl ProductRepository for StoreProductRepository {
    async fn create_product(&self, product: &Product) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO products (id, name, price, quantity, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price)
        .bind(product.quantity)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, "product", &product.id))?;
        Ok(())
    }

    async fn get_product(&self, id: &str) -> StoreResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products WHERE id = $1",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(row.map(Product::from))
    }

    async fn list_products(&self, page: Page) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
            PRODUCT_COLUMNS
        ))
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn update_product(
        &self,
        id: &str,
        changes: ProductChanges,
        now: DateTime<Utc>,
    ) -> StoreResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE products SET price = COALESCE($2, price), quantity = COALESCE($3, quantity), \
             updated_at = $4 WHERE id = $1 RETURNING {}",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .bind(changes.price)
        .bind(changes.quantity)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        row.map(Product::from)
            .ok_or_else(|| StoreError::not_found("product", id))
    }

    async fn reduce_quantity(&self, id: &str, amount: i32) -> StoreResult<()> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::backend)?;
        reduce_quantity_on(&mut conn, id, amount).await
    }

    async fn search_products(&self, term: &str, page: Page) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products WHERE name ILIKE $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
            PRODUCT_COLUMNS
        ))
        .bind(contains_pattern(term))
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn list_available_products(&self, page: Page) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products WHERE quantity > 0 \
             ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
            PRODUCT_COLUMNS
        ))
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn list_low_stock_products(&self, threshold: i32) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products WHERE quantity < $1 ORDER BY quantity ASC, id ASC",
            PRODUCT_COLUMNS
        ))
        .bind(threshold)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(rows.into_iter().map(Product::from).collect())
    }
}
