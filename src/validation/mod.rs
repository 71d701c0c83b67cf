use bigdecimal::BigDecimal;
use std::fmt;

use crate::domain::NewTransaction;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

pub fn validate_required(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }

    Ok(())
}

pub fn validate_positive_amount(amount: &BigDecimal) -> ValidationResult {
    if amount <= &BigDecimal::from(0) {
        return Err(ValidationError::new(
            "purchase_amount",
            "must be greater than zero",
        ));
    }

    Ok(())
}

/// Checks a submitted purchase. Over-long descriptions are accepted; the store truncates them.
pub fn validate_new_transaction(tx: &NewTransaction) -> ValidationResult {
    validate_positive_amount(&tx.purchase_amount)?;
    validate_required("description", &tx.description)?;

    Ok(())
}

/// Validates every element, reporting the first failure with its position.
pub fn validate_batch(txs: &[NewTransaction]) -> ValidationResult {
    for (idx, tx) in txs.iter().enumerate() {
        validate_new_transaction(tx).map_err(|e| {
            ValidationError::new(e.field, format!("{} (item {})", e.message, idx))
        })?;
    }

    Ok(())
}
