//! # Pipeline Errors
//!
//! Error types for the derivation pipeline.
//!
//! Only two conditions abort a run: the FX provider could not supply a rate
//! table within the retry budget, and structurally invalid input. Missing
//! history and currency gaps are reported inside a successful result.
//!
//! # Error Hierarchy
//!
//! ```text
//! PipelineError
//! ├── RateUnavailable        - FX retries exhausted or permanent FX failure
//! ├── InvalidRecord          - Malformed or out-of-range input record
//! ├── RecordNotFound         - No record for the requested company-quarter
//! ├── Validation(String)     - Bad request parameters
//! ├── Persistence(RepositoryError) - Storage failure
//! ├── Configuration(String)  - Invalid engine configuration
//! └── Internal(String)       - Broken invariant
//! ```
//!
//! # Examples
//!
//! ```
//! use portfolio_derivations::application::error::PipelineError;
//!
//! let err = PipelineError::validation("quarter must be within 1..=4");
//! assert!(!err.is_retryable());
//! ```

use crate::domain::errors::DomainError;
use crate::domain::value_objects::{CompanyId, CurrencyCode};
use crate::infrastructure::fx::FxProviderError;
use crate::infrastructure::persistence::RepositoryError;
use thiserror::Error;

/// Derivation pipeline error.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    /// The FX provider could not supply a rate table.
    #[error("fx rates unavailable for {reference} after {attempts} attempt(s): {last_error}")]
    RateUnavailable {
        /// Reference currency requested.
        reference: CurrencyCode,
        /// Number of provider calls made.
        attempts: u32,
        /// Error of the final attempt.
        last_error: FxProviderError,
    },

    /// An input record failed validation.
    #[error("invalid record {company_id} {period}: {source}")]
    InvalidRecord {
        /// Company of the record.
        company_id: CompanyId,
        /// Reporting period as stored, e.g. `2022-Q4`.
        period: String,
        /// Validation failure.
        #[source]
        source: DomainError,
    },

    /// No record exists for the requested company-quarter.
    #[error("no financial record for {company_id} {period}")]
    RecordNotFound {
        /// Requested company.
        company_id: CompanyId,
        /// Requested period.
        period: String,
    },

    /// Request parameters are invalid.
    #[error("validation error: {0}")]
    Validation(String),

    /// Storage failure.
    #[error("persistence error: {0}")]
    Persistence(#[from] RepositoryError),

    /// Engine configuration is invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Creates a rate unavailable error.
    #[must_use]
    pub fn rate_unavailable(
        reference: CurrencyCode,
        attempts: u32,
        last_error: FxProviderError,
    ) -> Self {
        Self::RateUnavailable {
            reference,
            attempts,
            last_error,
        }
    }

    /// Creates an invalid record error.
    #[must_use]
    pub fn invalid_record(
        company_id: CompanyId,
        period: impl Into<String>,
        source: DomainError,
    ) -> Self {
        Self::InvalidRecord {
            company_id,
            period: period.into(),
            source,
        }
    }

    /// Creates a record not found error.
    #[must_use]
    pub fn record_not_found(company_id: CompanyId, period: impl Into<String>) -> Self {
        Self::RecordNotFound {
            company_id,
            period: period.into(),
        }
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if re-running the same request later may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateUnavailable { last_error, .. } => last_error.is_retryable(),
            Self::Persistence(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Returns true if this is a rate unavailable error.
    #[must_use]
    pub fn is_rate_unavailable(&self) -> bool {
        matches!(self, Self::RateUnavailable { .. })
    }

    /// Returns true if this is a record not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RecordNotFound { .. })
    }
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_unavailable_display() {
        let err = PipelineError::rate_unavailable(
            CurrencyCode::USD,
            3,
            FxProviderError::timeout("request timed out"),
        );
        let text = err.to_string();
        assert!(text.contains("USD"));
        assert!(text.contains("3 attempt(s)"));
        assert!(text.contains("timed out"));
        assert!(err.is_rate_unavailable());
    }

    #[test]
    fn rate_unavailable_retryability_follows_last_error() {
        let transient = PipelineError::rate_unavailable(
            CurrencyCode::USD,
            3,
            FxProviderError::connection("reset"),
        );
        let permanent = PipelineError::rate_unavailable(
            CurrencyCode::USD,
            1,
            FxProviderError::authentication("bad key"),
        );
        assert!(transient.is_retryable());
        assert!(!permanent.is_retryable());
    }

    #[test]
    fn invalid_record_keeps_source() {
        let err = PipelineError::invalid_record(
            CompanyId::new("acme"),
            "2022-Q4",
            DomainError::invalid_field("employees", "must not be negative"),
        );
        assert!(err.to_string().contains("acme 2022-Q4"));
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_retryable());
    }

    #[test]
    fn record_not_found() {
        let err = PipelineError::record_not_found(CompanyId::new("acme"), "2022-Q4");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "no financial record for acme 2022-Q4");
    }

    #[test]
    fn persistence_from_repository_error() {
        let err: PipelineError = RepositoryError::connection("pool closed").into();
        assert!(err.to_string().contains("pool closed"));
        assert!(err.is_retryable());
    }
}
