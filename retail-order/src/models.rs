use chrono::{DateTime, Utc};
use retail_core::{Customer, Order, Product, ValidationError};
use serde::{Deserialize, Serialize};

/// Input for a single placement attempt
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrderRequest {
    pub customer_id: String,
    pub product_id: String,
    pub quantity: i32,
}

impl PlaceOrderRequest {
    pub fn new(customer_id: impl Into<String>, product_id: impl Into<String>, quantity: i32) -> Self {
        Self {
            customer_id: customer_id.into(),
            product_id: product_id.into(),
            quantity,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        retail_core::validation::require_text("customer ID", &self.customer_id)?;
        retail_core::validation::require_text("product ID", &self.product_id)?;
        retail_core::validation::require_positive_quantity("quantity", self.quantity)?;
        Ok(())
    }
}

/// What the caller gets back after an accepted order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderSummary {
    pub id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: f64,
    pub total_amount: f64,
    pub order_date: DateTime<Utc>,
    pub message: String,
}

impl OrderSummary {
    pub fn new(order: &Order, customer: &Customer, product: &Product) -> Self {
        Self {
            id: order.id.clone(),
            customer_id: order.customer_id.clone(),
            customer_name: customer.name.clone(),
            product_id: order.product_id.clone(),
            product_name: product.name.clone(),
            quantity: order.quantity,
            unit_price: order.unit_price,
            total_amount: order.total_amount,
            order_date: order.order_date,
            message: "Order placed successfully".to_string(),
        }
    }
}
