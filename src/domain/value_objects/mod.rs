//! # Value Objects
//!
//! Immutable types with validation and domain semantics.
//!
//! ## Identity Types
//!
//! - [`CompanyId`]: String-based company identifier
//! - [`RunId`]: UUID tagging one pipeline invocation
//!
//! ## Domain Types
//!
//! - [`CurrencyCode`]: Validated three-letter currency code
//! - [`FiscalQuarter`]: Reporting year and quarter
//! - [`FinancialField`]: Monetary fields subject to conversion
//! - [`PipelineState`]: Derivation run lifecycle
//! - [`Timestamp`]: UTC point in time
//!
//! ## Arithmetic
//!
//! - [`ArithmeticError`]: Error type for arithmetic failures
//! - [`CheckedArithmetic`]: Trait for safe arithmetic operations

pub mod arithmetic;
pub mod currency;
pub mod financial_field;
pub mod fiscal_quarter;
pub mod ids;
pub mod pipeline_state;
pub mod timestamp;

pub use arithmetic::{ArithmeticError, ArithmeticResult, CheckedArithmetic};
pub use currency::CurrencyCode;
pub use financial_field::FinancialField;
pub use fiscal_quarter::FiscalQuarter;
pub use ids::{CompanyId, RunId};
pub use pipeline_state::{PipelineState, StateTrail};
pub use timestamp::Timestamp;
