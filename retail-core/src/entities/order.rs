use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::{self, ValidationError};

/// Allowed drift between `total_amount` and `quantity * unit_price`.
pub const TOTAL_TOLERANCE: f64 = 0.01;

/// A single-product purchase. Immutable once persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub customer_id: String,
    pub product_id: String,
    pub quantity: i32,
    pub unit_price: f64,
    pub total_amount: f64,
    pub order_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Snapshot `unit_price`, derive the total and validate the result.
    pub fn new(
        id: String,
        customer_id: &str,
        product_id: &str,
        quantity: i32,
        unit_price: f64,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let order = Self {
            id,
            customer_id: customer_id.to_string(),
            product_id: product_id.to_string(),
            quantity,
            unit_price,
            total_amount: quantity as f64 * unit_price,
            order_date: now,
            created_at: now,
        };
        order.validate()?;
        Ok(order)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::require_text("customer ID", &self.customer_id)?;
        validation::require_text("product ID", &self.product_id)?;
        validation::require_positive_quantity("quantity", self.quantity)?;
        validation::require_positive_price("unit price", self.unit_price)?;

        let expected = self.quantity as f64 * self.unit_price;
        if (self.total_amount - expected).abs() > TOTAL_TOLERANCE {
            return Err(ValidationError::TotalMismatch {
                expected,
                actual: self.total_amount,
            });
        }
        Ok(())
    }
}

/// An order with customer and product display names resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub customer_name: Option<String>,
    pub product_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_is_quantity_times_price() {
        let order = Order::new("ORD10001".into(), "CUST10001", "PROD10001", 3, 19.99, Utc::now()).unwrap();
        assert!((order.total_amount - 59.97).abs() < TOTAL_TOLERANCE);
        assert_eq!(order.order_date, order.created_at);
    }

    #[test]
    fn test_validate_catches_tampered_total() {
        let mut order = Order::new("ORD10001".into(), "CUST10001", "PROD10001", 2, 10.0, Utc::now()).unwrap();
        order.total_amount = 20.009;
        assert!(order.validate().is_ok());

        order.total_amount = 21.0;
        assert_eq!(
            order.validate(),
            Err(ValidationError::TotalMismatch { expected: 20.0, actual: 21.0 })
        );
    }

    #[test]
    fn test_rejects_non_positive_quantity_and_price() {
        let now = Utc::now();
        assert!(Order::new("ORD10001".into(), "CUST10001", "PROD10001", 0, 10.0, now).is_err());
        assert!(Order::new("ORD10001".into(), "CUST10001", "PROD10001", 1, 0.0, now).is_err());
        assert!(Order::new("ORD10001".into(), "", "PROD10001", 1, 1.0, now).is_err());
    }

    #[test]
    fn test_details_flatten_order_fields() {
        let order = Order::new("ORD10001".into(), "CUST10001", "PROD10001", 1, 5.0, Utc::now()).unwrap();
        let details = OrderDetails {
            order,
            customer_name: Some("Jane".into()),
            product_name: Some("Lamp".into()),
        };
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["id"], "ORD10001");
        assert_eq!(json["product_name"], "Lamp");
    }
}
