/// Typed rejection produced by the explicit validation functions that run
/// before an entity is constructed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("{field} must be greater than zero, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{field} cannot be negative, got {value}")]
    Negative { field: &'static str, value: i64 },

    #[error("invalid email format")]
    InvalidEmail,

    #[error("total amount mismatch: expected {expected:.2}, got {actual:.2}")]
    TotalMismatch { expected: f64, actual: f64 },

    #[error("invalid {field}: {value}")]
    Invalid { field: &'static str, value: String },
}

pub fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(())
}

pub fn require_positive_price(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::NotPositive { field, value });
    }
    Ok(())
}

pub fn require_positive_quantity(field: &'static str, value: i32) -> Result<(), ValidationError> {
    if value <= 0 {
        return Err(ValidationError::NotPositive { field, value: value as f64 });
    }
    Ok(())
}

pub fn require_non_negative(field: &'static str, value: i32) -> Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError::Negative { field, value: value as i64 });
    }
    Ok(())
}

/// Basic shape check: something before an `@`, and a dot in the domain.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid || email.len() <= 5 {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}
