use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::order::Order;
use crate::validation::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Order,
    Refund,
    Credit,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Order => "order",
            TransactionType::Refund => "refund",
            TransactionType::Credit => "credit",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "order" => Ok(TransactionType::Order),
            "refund" => Ok(TransactionType::Refund),
            "credit" => Ok(TransactionType::Credit),
            other => Err(ValidationError::Invalid {
                field: "transaction type",
                value: other.to_string(),
            }),
        }
    }
}

/// Append-only audit record of a business event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub order_id: String,
    pub customer_id: String,
    pub product_id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: f64,
    pub quantity: i32,
    pub unit_price: f64,
    pub description: String,
    pub transaction_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// The `order` record written alongside a newly placed order.
    pub fn for_order(id: String, order: &Order, now: DateTime<Utc>) -> Self {
        Self {
            id,
            order_id: order.id.clone(),
            customer_id: order.customer_id.clone(),
            product_id: order.product_id.clone(),
            kind: TransactionType::Order,
            amount: order.total_amount,
            quantity: order.quantity,
            unit_price: order.unit_price,
            description: format!("Order for {} units", order.quantity),
            transaction_at: now,
            created_at: now,
        }
    }

    /// Signed contribution to revenue: orders add, refunds subtract, credits are neutral.
    pub fn revenue_amount(&self) -> f64 {
        match self.kind {
            TransactionType::Order => self.amount,
            TransactionType::Refund => -self.amount,
            TransactionType::Credit => 0.0,
        }
    }
}
