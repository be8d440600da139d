use async_trait::async_trait;
use chrono::{DateTime, Utc};
use retail_core::{Customer, CustomerRepository, StoreError, StoreResult};
use retail_shared::{Masked, Page};
use sqlx::PgPool;

use crate::database::{contains_pattern, write_error};

pub struct StoreCustomerRepository {
    pool: PgPool,
}

impl StoreCustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const CUSTOMER_COLUMNS: &str = "id, name, email, phone, created_at, updated_at";
const EMAIL_CONSTRAINT: &str = "customers_email_key";

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: String,
    name: String,
    email: String,
    phone: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            name: row.name,
            email: Masked(row.email),
            phone: row.phone,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl CustomerRepository for StoreCustomerRepository {
    async fn create_customer(&self, customer: &Customer) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO customers (id, name, email, phone, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(customer.email())
        .bind(&customer.phone)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let email_clash = matches!(
                &e,
                sqlx::Error::Database(db) if db.constraint() == Some(EMAIL_CONSTRAINT)
            );
            if email_clash {
                write_error(e, "customer email", customer.email())
            } else {
                write_error(e, "customer", &customer.id)
            }
        })?;
        Ok(())
    }

    async fn get_customer(&self, id: &str) -> StoreResult<Option<Customer>> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {} FROM customers WHERE id = $1",
            CUSTOMER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(row.map(Customer::from))
    }

    async fn get_customer_by_email(&self, email: &str) -> StoreResult<Option<Customer>> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {} FROM customers WHERE email = $1",
            CUSTOMER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(row.map(Customer::from))
    }

    async fn list_customers(&self, page: Page) -> StoreResult<Vec<Customer>> {
        let rows = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {} FROM customers ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
            CUSTOMER_COLUMNS
        ))
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(rows.into_iter().map(Customer::from).collect())
    }

    async fn search_customers(&self, term: &str, page: Page) -> StoreResult<Vec<Customer>> {
        let rows = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {} FROM customers WHERE name ILIKE $1 OR email ILIKE $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
            CUSTOMER_COLUMNS
        ))
        .bind(contains_pattern(term))
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(rows.into_iter().map(Customer::from).collect())
    }
}
