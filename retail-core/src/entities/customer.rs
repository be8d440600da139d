use chrono::{DateTime, Utc};
use retail_shared::Masked;
use serde::{Deserialize, Serialize};

use crate::validation::{self, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: Masked<String>,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Build a validated customer from registration input. Fields are trimmed.
    pub fn new(
        id: String,
        name: &str,
        email: &str,
        phone: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let customer = Self {
            id,
            name: name.trim().to_string(),
            email: Masked(email.trim().to_string()),
            phone: phone.trim().to_string(),
            created_at: now,
            updated_at: now,
        };
        customer.validate()?;
        Ok(customer)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::require_text("customer name", &self.name)?;
        validation::validate_email(self.email.expose())?;
        validation::require_text("phone", &self.phone)?;
        Ok(())
    }

    pub fn email(&self) -> &str {
        self.email.expose()
    }
}
