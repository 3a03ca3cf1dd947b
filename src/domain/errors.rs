//! # Domain Errors
//!
//! Error type for validation failures inside the domain layer.

use crate::domain::value_objects::arithmetic::ArithmeticError;
use crate::domain::value_objects::pipeline_state::PipelineState;
use thiserror::Error;

/// Errors raised while constructing or validating domain values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Currency code is not three ASCII letters.
    #[error("invalid currency code: {0:?}")]
    InvalidCurrencyCode(String),

    /// Fiscal period is out of range.
    #[error("invalid fiscal period: {0}")]
    InvalidPeriod(String),

    /// A record field holds a malformed or out-of-range value.
    #[error("invalid field {field}: {message}")]
    InvalidField {
        /// Field name.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// Checked arithmetic failed.
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),

    /// Pipeline state machine transition is not allowed.
    #[error("invalid pipeline transition from {from} to {to}")]
    InvalidStateTransition {
        /// Current state.
        from: PipelineState,
        /// Requested state.
        to: PipelineState,
    },

    /// Generic validation failure.
    #[error("validation error: {0}")]
    ValidationError(String),
}

impl DomainError {
    /// Creates an invalid field error.
    #[must_use]
    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            message: message.into(),
        }
    }

    /// Creates an invalid period error.
    #[must_use]
    pub fn invalid_period(message: impl Into<String>) -> Self {
        Self::InvalidPeriod(message.into())
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
