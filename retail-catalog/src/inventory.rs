use retail_core::{Product, ProductRepository, StoreError};
use std::sync::Arc;

/// Read-side stock checks. Mutation happens only through a unit of work.
pub struct InventoryChecker {
    products: Arc<dyn ProductRepository>,
}

impl InventoryChecker {
    pub fn new(products: Arc<dyn ProductRepository>) -> Self {
        Self { products }
    }

    /// Load the product and confirm `requested` units are on hand
    pub async fn check_availability(
        &self,
        product_id: &str,
        requested: i32,
    ) -> Result<Product, InventoryError> {
        let product = self
            .products
            .get_product(product_id)
            .await?
            .ok_or_else(|| InventoryError::NotFound(product_id.to_string()))?;

        if !product.is_available(requested) {
            return Err(InventoryError::InsufficientInventory {
                requested,
                available: product.quantity,
            });
        }

        Ok(product)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Product not found: {0}")]
    NotFound(String),

    #[error("Insufficient inventory: requested {requested}, available {available}")]
    InsufficientInventory {
        requested: i32,
        available: i32,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use retail_store::InMemoryStore;

    #[tokio::test]
    async fn test_availability() {
        let store = InMemoryStore::new();
        let product = Product::new("PROD10001".into(), "Desk Lamp", 10.0, 5, Utc::now()).unwrap();
        store.create_product(&product).await.unwrap();

        let checker = InventoryChecker::new(Arc::new(store));

        let found = checker.check_availability("PROD10001", 5).await.unwrap();
        assert_eq!(found.quantity, 5);

        let err = checker.check_availability("PROD10001", 6).await.unwrap_err();
        assert!(matches!(
            err,
            InventoryError::InsufficientInventory { requested: 6, available: 5 }
        ));

        let err = checker.check_availability("PROD99999", 1).await.unwrap_err();
        assert!(matches!(err, InventoryError::NotFound(_)));
    }
}
