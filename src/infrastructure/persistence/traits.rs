//! # Repository Traits
//!
//! Port definitions for the persistence collaborators of the engine.
//!
//! - [`FinancialRecordRepository`]: Raw quarterly input history
//! - [`CompanyRegistry`]: Company profiles with valuation inputs
//! - [`DerivationStore`]: Derived metrics and converted financials
//!
//! # Examples
//!
//! ```ignore
//! use portfolio_derivations::infrastructure::persistence::traits::FinancialRecordRepository;
//!
//! async fn history(repo: &impl FinancialRecordRepository, company: &CompanyId, p: FiscalQuarter) {
//!     let window = repo.find_range(company, p.quarters_back(7), p).await.unwrap();
//!     println!("{} quarters on file", window.len());
//! }
//! ```

use crate::domain::entities::{CompanyProfile, DerivedMetricsRecord, FinancialRecord};
use crate::domain::services::ConvertedRecord;
use crate::domain::value_objects::{CompanyId, CurrencyCode, FiscalQuarter};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error type for repository operations.
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    /// Entity not found.
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        /// Type of entity.
        entity_type: &'static str,
        /// Entity identifier.
        id: String,
    },

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query error.
    #[error("Query error: {0}")]
    Query(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RepositoryError {
    /// Creates a not found error.
    #[must_use]
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error.
    #[must_use]
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if the operation may succeed when retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Upsert key of stored derivation results.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DerivationKey {
    /// Company the result belongs to.
    pub company_id: CompanyId,
    /// Currency the result is expressed in.
    pub currency: CurrencyCode,
    /// Fiscal reporting date of the source record.
    pub fiscal_reporting_date: NaiveDate,
}

impl DerivationKey {
    /// Key of a derived metrics record.
    #[must_use]
    pub fn for_metrics(record: &DerivedMetricsRecord) -> Self {
        Self {
            company_id: record.company_id().clone(),
            currency: record.currency(),
            fiscal_reporting_date: record.fiscal_reporting_date(),
        }
    }

    /// Key of a converted financial record.
    #[must_use]
    pub fn for_financials(converted: &ConvertedRecord) -> Self {
        let record = converted.record();
        Self {
            company_id: record.company_id().clone(),
            currency: record.currency(),
            fiscal_reporting_date: record.fiscal_reporting_date(),
        }
    }
}

impl fmt::Display for DerivationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.company_id, self.currency, self.fiscal_reporting_date
        )
    }
}

/// Repository of raw quarterly financial input.
#[async_trait]
pub trait FinancialRecordRepository: Send + Sync + fmt::Debug {
    /// Saves a record, superseding any record with the same company and period.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the storage operation fails.
    async fn save(&self, record: &FinancialRecord) -> RepositoryResult<()>;

    /// Gets the record for one company-quarter.
    ///
    /// Returns `None` if no record exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the storage operation fails.
    async fn get(
        &self,
        company_id: &CompanyId,
        period: FiscalQuarter,
    ) -> RepositoryResult<Option<FinancialRecord>>;

    /// Finds records for `company_id` with periods in `from..=to`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the storage operation fails.
    async fn find_range(
        &self,
        company_id: &CompanyId,
        from: FiscalQuarter,
        to: FiscalQuarter,
    ) -> RepositoryResult<Vec<FinancialRecord>>;
}

/// Registry of company profiles.
#[async_trait]
pub trait CompanyRegistry: Send + Sync + fmt::Debug {
    /// Saves a profile, replacing any existing profile with the same id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the storage operation fails.
    async fn save(&self, profile: &CompanyProfile) -> RepositoryResult<()>;

    /// Gets a profile by company id.
    ///
    /// Returns `None` if the company is not registered.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the storage operation fails.
    async fn get(&self, company_id: &CompanyId) -> RepositoryResult<Option<CompanyProfile>>;
}

/// Store of derivation results.
///
/// Writes are idempotent upserts keyed by [`DerivationKey`]: storing the
/// same run twice leaves one copy, and a re-run replaces the whole record.
#[async_trait]
pub trait DerivationStore: Send + Sync + fmt::Debug {
    /// Stores one run's derived metrics together with its converted records.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the storage operation fails; in that
    /// case nothing from this call is visible.
    async fn upsert(
        &self,
        metrics: &DerivedMetricsRecord,
        converted: &[ConvertedRecord],
    ) -> RepositoryResult<()>;

    /// Gets stored derived metrics.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the storage operation fails.
    async fn get_metrics(&self, key: &DerivationKey)
    -> RepositoryResult<Option<DerivedMetricsRecord>>;

    /// Gets a stored converted financial record.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the storage operation fails.
    async fn get_financials(&self, key: &DerivationKey) -> RepositoryResult<Option<ConvertedRecord>>;

    /// Number of stored derived metrics records.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the storage operation fails.
    async fn count_metrics(&self) -> RepositoryResult<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = RepositoryError::not_found("FinancialRecord", "c1/2022-Q4");
        assert_eq!(
            err.to_string(),
            "Entity not found: FinancialRecord with id c1/2022-Q4"
        );
        assert!(err.is_not_found());
    }

    #[test]
    fn only_connection_is_retryable() {
        assert!(RepositoryError::connection("reset").is_retryable());
        assert!(!RepositoryError::query("syntax").is_retryable());
        assert!(!RepositoryError::internal("bug").is_retryable());
    }
}
