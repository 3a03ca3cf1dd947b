//! # Domain Services
//!
//! Pure, stateless computations over domain entities.
//!
//! - [`currency_converter`]: Re-expresses a record in target currencies
//! - [`metrics_calculator`]: Derives the metric catalog for one quarter

pub mod currency_converter;
pub mod metrics_calculator;

pub use currency_converter::{
    ConversionOutcome, ConvertedRecord, CurrencyConversion, CurrencyGap, GapReason,
};
pub use metrics_calculator::QuarterlyHistory;
