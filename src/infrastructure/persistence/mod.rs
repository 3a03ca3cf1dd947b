//! # Persistence Layer
//!
//! Repository ports and their implementations.
//!
//! ## Repository Traits (Ports)
//!
//! - [`FinancialRecordRepository`]: Quarterly financial input
//! - [`CompanyRegistry`]: Company profiles and valuation inputs
//! - [`DerivationStore`]: Derived metrics and converted financials
//!
//! ## Implementations
//!
//! - `in_memory`: In-memory implementations for tests and offline runs

pub mod in_memory;
pub mod traits;

pub use traits::{
    CompanyRegistry, DerivationKey, DerivationStore, FinancialRecordRepository, RepositoryError,
    RepositoryResult,
};
