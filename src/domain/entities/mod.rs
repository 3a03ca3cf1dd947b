//! # Domain Entities
//!
//! Records flowing through the derivation engine.
//!
//! - [`FinancialRecord`]: One company-quarter of raw input
//! - [`FxRateTable`]: Point-in-time exchange rate snapshot
//! - [`CompanyProfile`]: Registry entry with valuation inputs
//! - [`DerivedMetricsRecord`]: Computed metric catalog for one company-quarter

pub mod company;
pub mod derived_metrics;
pub mod financial_record;
pub mod fx_rate_table;

pub use company::{CompanyProfile, ReportingStatus, ValuationInputs};
pub use derived_metrics::{
    DerivedMetric, DerivedMetricsRecord, HistoryCoverage, MetricValues, Runway,
};
pub use financial_record::{FinancialRecord, FinancialRecordBuilder, MAX_MONETARY_MAGNITUDE};
pub use fx_rate_table::{FxRateTable, FxRateTableBuilder};
