//! # Portfolio Derivations
//!
//! Derivation engine for quarterly portfolio-company financials.
//!
//! Given one company-quarter of raw financial input, the engine:
//!
//! 1. fetches a point-in-time FX rate table (shared per retrieval bucket),
//! 2. converts every monetary field into the requested target currencies,
//! 3. computes the fixed catalog of derived metrics (growth, margins,
//!    per-FTE ratios, LTM aggregates, YoY comparisons, valuation ratios),
//! 4. assembles and stores the result.
//!
//! ## Layers
//!
//! - [`domain`]: value objects, entities and the pure converter/calculator
//! - [`application`]: the [`DerivationPipeline`] orchestrator with retry and
//!   rate caching
//! - [`infrastructure`]: FX providers and persistence adapters
//! - [`config`]: layered configuration
//! - [`telemetry`]: tracing subscriber setup
//!
//! # Examples
//!
//! ```
//! use portfolio_derivations::domain::entities::FinancialRecord;
//! use portfolio_derivations::domain::services::metrics_calculator;
//! use portfolio_derivations::domain::value_objects::{CompanyId, CurrencyCode, FiscalQuarter};
//! use rust_decimal::Decimal;
//!
//! let record = FinancialRecord::builder(
//!     CompanyId::new("acme"),
//!     FiscalQuarter::new(2022, 4).unwrap(),
//!     CurrencyCode::new("USD").unwrap(),
//! )
//! .recurring_revenue(Decimal::new(3_912_138, 0))
//! .total_revenue(Decimal::new(4_194_199, 0))
//! .employees(100)
//! .build();
//!
//! let metrics = metrics_calculator::compute(&record, &[], None);
//! assert_eq!(metrics.arr(), Some(Decimal::new(15_648_552, 0)));
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod telemetry;

pub use application::error::{PipelineError, PipelineResult};
pub use application::services::derivation_pipeline::{
    DerivationOutput, DerivationPipeline, DerivationRequest,
};
pub use config::{ConfigError, EngineConfig};
