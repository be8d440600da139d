use chrono::Utc;
use retail_core::{Customer, CustomerRepository, StoreError, ValidationError};
use retail_shared::{generate_id, EntityPrefix, Masked, Page};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterCustomerRequest {
    pub name: String,
    pub email: Masked<String>,
    pub phone: String,
}

/// Customer registration and lookup
pub struct CustomerService {
    customers: Arc<dyn CustomerRepository>,
    default_page_limit: i64,
}

impl CustomerService {
    pub fn new(customers: Arc<dyn CustomerRepository>, default_page_limit: i64) -> Self {
        Self {
            customers,
            default_page_limit,
        }
    }

    /// Register a new customer. The e-mail must not belong to anyone else.
    pub async fn register(&self, req: RegisterCustomerRequest) -> Result<Customer, CustomerError> {
        let customer = Customer::new(
            generate_id(EntityPrefix::Customer),
            &req.name,
            req.email.expose(),
            &req.phone,
            Utc::now(),
        )?;

        if self
            .customers
            .get_customer_by_email(customer.email())
            .await?
            .is_some()
        {
            return Err(CustomerError::EmailTaken);
        }

        // The store's unique index still decides when two registrations race.
        self.customers
            .create_customer(&customer)
            .await
            .map_err(|e| match e {
                StoreError::Duplicate { entity: "customer email", .. } => CustomerError::EmailTaken,
                other => CustomerError::Store(other),
            })?;

        tracing::info!(customer_id = %customer.id, email = %customer.email, "customer registered");
        Ok(customer)
    }

    pub async fn get_customer(&self, id: &str) -> Result<Customer, CustomerError> {
        self.customers
            .get_customer(id)
            .await?
            .ok_or_else(|| CustomerError::NotFound(id.to_string()))
    }

    pub async fn list_customers(&self, page: Page) -> Result<Vec<Customer>, CustomerError> {
        let page = page.normalized(self.default_page_limit);
        Ok(self.customers.list_customers(page).await?)
    }

    pub async fn search_customers(&self, term: &str, page: Page) -> Result<Vec<Customer>, CustomerError> {
        retail_core::validation::require_text("search term", term)?;
        let page = page.normalized(self.default_page_limit);
        Ok(self.customers.search_customers(term.trim(), page).await?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CustomerError {
    #[error("Customer not found: {0}")]
    NotFound(String),

    #[error("Customer with this email already exists")]
    EmailTaken,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
