// ⚠️ Validation errors - rejected transaction requests
// Every variant is recoverable: the request is dropped and session state is untouched

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("amount must be positive, got {amount}")]
    NonPositiveAmount { amount: Decimal },

    #[error("amount {amount} takes the ratio outside the representable range")]
    AmountOutOfRange { amount: Decimal },

    #[error("unknown product: {value:?}")]
    UnknownProduct { value: String },

    #[error("unknown direction: {value:?} (expected Debit or Credit)")]
    UnknownDirection { value: String },
}

impl ValidationError {
    /// Short machine-readable code for API clients
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MissingField { .. } => "missing_field",
            ValidationError::NonPositiveAmount { .. } => "non_positive_amount",
            ValidationError::AmountOutOfRange { .. } => "amount_out_of_range",
            ValidationError::UnknownProduct { .. } => "unknown_product",
            ValidationError::UnknownDirection { .. } => "unknown_direction",
        }
    }
}
