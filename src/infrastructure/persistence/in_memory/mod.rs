//! # In-Memory Repositories
//!
//! In-memory implementations for testing without database dependencies.
//!
//! ## Available Repositories
//!
//! - [`InMemoryFinancialRecordRepository`]: Quarterly input history
//! - [`InMemoryCompanyRegistry`]: Company profiles
//! - [`InMemoryDerivationStore`]: Derived metrics and converted financials
//!
//! ## Thread Safety
//!
//! All implementations keep their state behind `Arc<RwLock<_>>`.

pub mod company_registry;
pub mod derivation_store;
pub mod financial_record_repository;

pub use company_registry::InMemoryCompanyRegistry;
pub use derivation_store::InMemoryDerivationStore;
pub use financial_record_repository::InMemoryFinancialRecordRepository;
