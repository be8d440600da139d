use async_trait::async_trait;
use chrono::{DateTime, Utc};
use retail_core::{CooldownRepository, CustomerCooldown, StoreError, StoreResult};
use sqlx::PgPool;

pub struct StoreCooldownRepository {
    pool: PgPool,
}

impl StoreCooldownRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CooldownRow {
    customer_id: String,
    last_order_time: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CooldownRow> for CustomerCooldown {
    fn from(row: CooldownRow) -> Self {
        CustomerCooldown {
            customer_id: row.customer_id,
            last_order_time: row.last_order_time,
            updated_at: row.updated_at,
        }
    }
}

/// Claim the cooldown row for an order placed at `now`.
///
/// The conflict branch only fires when the stored time is at or before
/// `cutoff`, so a concurrent claim that committed first makes this one
/// return no row. Under READ COMMITTED the second inserter waits on the
/// first's row lock and then re-evaluates the condition against the
/// committed value.
pub(crate) async fn claim_cooldown_on(
    conn: &mut sqlx::PgConnection,
    customer_id: &str,
    now: DateTime<Utc>,
    cutoff: DateTime<Utc>,
) -> StoreResult<()> {
    let claimed: Option<String> = sqlx::query_scalar(
        "INSERT INTO customer_cooldowns (customer_id, last_order_time, updated_at) \
         VALUES ($1, $2, $2) \
         ON CONFLICT (customer_id) DO UPDATE \
         SET last_order_time = EXCLUDED.last_order_time, updated_at = EXCLUDED.updated_at \
         WHERE customer_cooldowns.last_order_time <= $3 \
         RETURNING customer_id",
    )
    .bind(customer_id)
    .bind(now)
    .bind(cutoff)
    .fetch_optional(&mut *conn)
    .await
    .map_err(StoreError::backend)?;

    if claimed.is_some() {
        return Ok(());
    }

    let last_order_time: DateTime<Utc> = sqlx::query_scalar(
        "SELECT last_order_time FROM customer_cooldowns WHERE customer_id = $1",
    )
    .bind(customer_id)
    .fetch_one(&mut *conn)
    .await
    .map_err(StoreError::backend)?;

    Err(StoreError::CooldownActive {
        customer_id: customer_id.to_string(),
        last_order_time,
    })
}

#[async_trait]
impl CooldownRepository for StoreCooldownRepository {
    async fn get_cooldown(&self, customer_id: &str) -> StoreResult<Option<CustomerCooldown>> {
        let row = sqlx::query_as::<_, CooldownRow>(
            "SELECT customer_id, last_order_time, updated_at \
             FROM customer_cooldowns WHERE customer_id = $1",
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(row.map(CustomerCooldown::from))
    }

    async fn upsert_cooldown(&self, customer_id: &str, at: DateTime<Utc>) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO customer_cooldowns (customer_id, last_order_time, updated_at) \
             VALUES ($1, $2, NOW()) \
             ON CONFLICT (customer_id) DO UPDATE \
             SET last_order_time = EXCLUDED.last_order_time, updated_at = EXCLUDED.updated_at",
        )
        .bind(customer_id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(())
    }
}
