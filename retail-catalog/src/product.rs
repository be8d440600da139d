use chrono::Utc;
use retail_core::{Product, ProductChanges, ProductRepository, StoreError, ValidationError};
use retail_shared::{generate_id, EntityPrefix, Page};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub price: f64,
    pub quantity: i32,
}

/// Retailer update; omitted fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub price: Option<f64>,
    pub quantity: Option<i32>,
}

/// Retailer-facing catalog operations
pub struct ProductService {
    products: Arc<dyn ProductRepository>,
    default_page_limit: i64,
}

impl ProductService {
    pub fn new(products: Arc<dyn ProductRepository>, default_page_limit: i64) -> Self {
        Self {
            products,
            default_page_limit,
        }
    }

    pub async fn create_product(&self, req: CreateProductRequest) -> Result<Product, CatalogError> {
        let product = Product::new(
            generate_id(EntityPrefix::Product),
            &req.name,
            req.price,
            req.quantity,
            Utc::now(),
        )?;
        self.products.create_product(&product).await?;

        tracing::info!(product_id = %product.id, name = %product.name, "product created");
        Ok(product)
    }

    pub async fn get_product(&self, id: &str) -> Result<Product, CatalogError> {
        self.products
            .get_product(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    /// Newest first
    pub async fn list_products(&self, page: Page) -> Result<Vec<Product>, CatalogError> {
        let page = page.normalized(self.default_page_limit);
        Ok(self.products.list_products(page).await?)
    }

    pub async fn update_product(
        &self,
        id: &str,
        req: UpdateProductRequest,
    ) -> Result<Product, CatalogError> {
        let changes = ProductChanges {
            price: req.price,
            quantity: req.quantity,
        };
        if let Some(price) = changes.price {
            retail_core::validation::require_positive_price("price", price)?;
        }
        if let Some(quantity) = changes.quantity {
            retail_core::validation::require_non_negative("quantity", quantity)?;
        }
        if changes.is_empty() {
            return self.get_product(id).await;
        }

        let product = self
            .products
            .update_product(id, changes, Utc::now())
            .await
            .map_err(|e| match e {
                StoreError::NotFound { .. } => CatalogError::NotFound(id.to_string()),
                other => CatalogError::Store(other),
            })?;

        tracing::info!(product_id = %id, price = product.price, quantity = product.quantity, "product updated");
        Ok(product)
    }

    pub async fn search_products(&self, name: &str, page: Page) -> Result<Vec<Product>, CatalogError> {
        retail_core::validation::require_text("search term", name)?;
        let page = page.normalized(self.default_page_limit);
        Ok(self.products.search_products(name.trim(), page).await?)
    }

    /// Products with stock on hand
    pub async fn available_products(&self, page: Page) -> Result<Vec<Product>, CatalogError> {
        let page = page.normalized(self.default_page_limit);
        Ok(self.products.list_available_products(page).await?)
    }

    /// Products whose stock is strictly below `threshold`
    pub async fn low_stock_products(&self, threshold: i32) -> Result<Vec<Product>, CatalogError> {
        retail_core::validation::require_non_negative("threshold", threshold)?;
        Ok(self.products.list_low_stock_products(threshold).await?)
    }
}

/// Catalog-related errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Product not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use retail_store::InMemoryStore;

    fn service() -> ProductService {
        ProductService::new(Arc::new(InMemoryStore::new()), 50)
    }

    fn create(name: &str, price: f64, quantity: i32) -> CreateProductRequest {
        CreateProductRequest {
            name: name.to_string(),
            price,
            quantity,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let service = service();
        let product = service.create_product(create("Desk Lamp", 24.5, 10)).await.unwrap();
        assert!(product.id.starts_with("PROD"));
        assert_eq!(product.id.len(), 9);

        let loaded = service.get_product(&product.id).await.unwrap();
        assert_eq!(loaded, product);

        let err = service.get_product("PROD00000").await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_input() {
        let service = service();
        let err = service.create_product(create("Lamp", 0.0, 1)).await.unwrap_err();
        assert!(matches!(err, CatalogError::Validation(ValidationError::NotPositive { .. })));

        let err = service.create_product(create("  ", 1.0, 1)).await.unwrap_err();
        assert!(matches!(err, CatalogError::Validation(ValidationError::Required(_))));

        let err = service.create_product(create("Lamp", 1.0, -1)).await.unwrap_err();
        assert!(matches!(err, CatalogError::Validation(ValidationError::Negative { .. })));
    }

    #[tokio::test]
    async fn test_partial_update() {
        let service = service();
        let product = service.create_product(create("Desk Lamp", 24.5, 10)).await.unwrap();

        let updated = service
            .update_product(&product.id, UpdateProductRequest { price: Some(19.99), quantity: None })
            .await
            .unwrap();
        assert_eq!(updated.price, 19.99);
        assert_eq!(updated.quantity, 10);

        let err = service
            .update_product(&product.id, UpdateProductRequest { price: None, quantity: Some(-3) })
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));

        let err = service
            .update_product("PROD00000", UpdateProductRequest { price: Some(1.0), quantity: None })
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_stock_queries() {
        let service = service();
        service.create_product(create("Desk Lamp", 24.5, 10)).await.unwrap();
        service.create_product(create("Lamp Shade", 9.0, 2)).await.unwrap();
        service.create_product(create("Bulb", 1.5, 0)).await.unwrap();

        let found = service.search_products("LAMP", Page::default()).await.unwrap();
        assert_eq!(found.len(), 2);

        let available = service.available_products(Page::default()).await.unwrap();
        assert_eq!(available.len(), 2);

        let low = service.low_stock_products(5).await.unwrap();
        let names: Vec<_> = low.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(low.len(), 2);
        assert!(names.contains(&"Bulb"));
        assert!(names.contains(&"Lamp Shade"));
    }
}
