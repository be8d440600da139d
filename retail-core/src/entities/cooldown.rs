use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp of a customer's last accepted order. One row per customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerCooldown {
    pub customer_id: String,
    pub last_order_time: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CustomerCooldown {
    pub fn new(customer_id: impl Into<String>, last_order_time: DateTime<Utc>) -> Self {
        Self {
            customer_id: customer_id.into(),
            last_order_time,
            updated_at: last_order_time,
        }
    }

    /// An epoch-or-earlier timestamp is treated as "never ordered".
    pub fn is_unset(&self) -> bool {
        self.last_order_time.timestamp() <= 0
    }

    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        now - self.last_order_time
    }
}
