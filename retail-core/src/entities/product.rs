use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::{self, ValidationError};

/// A catalog entry with its on-hand stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Build a validated product. `price > 0` and `quantity >= 0` hold from here on.
    pub fn new(
        id: String,
        name: &str,
        price: f64,
        quantity: i32,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let product = Self {
            id,
            name: name.trim().to_string(),
            price,
            quantity,
            created_at: now,
            updated_at: now,
        };
        product.validate()?;
        Ok(product)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::require_text("product name", &self.name)?;
        validation::require_positive_price("price", self.price)?;
        validation::require_non_negative("quantity", self.quantity)?;
        Ok(())
    }

    /// True when `requested` is positive and covered by stock on hand.
    pub fn is_available(&self, requested: i32) -> bool {
        requested > 0 && self.quantity >= requested
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(quantity: i32) -> Product {
        Product::new("PROD10001".into(), "Desk Lamp", 10.0, quantity, Utc::now()).unwrap()
    }

    #[test]
    fn test_availability() {
        let p = product(5);
        assert!(p.is_available(5));
        assert!(p.is_available(1));
        assert!(!p.is_available(6));
        assert!(!p.is_available(0));
        assert!(!p.is_available(-1));
    }

    #[test]
    fn test_construction_rejects_bad_values() {
        let now = Utc::now();
        assert!(Product::new("PROD10001".into(), "  ", 10.0, 1, now).is_err());
        assert!(Product::new("PROD10001".into(), "Lamp", 0.0, 1, now).is_err());
        assert!(Product::new("PROD10001".into(), "Lamp", 1.0, -1, now).is_err());
    }
}
