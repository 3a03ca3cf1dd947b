//! # Currency Converter
//!
//! Re-expresses a financial record in each requested target currency.
//!
//! For the native currency the record is returned unchanged at rate 1. For
//! any other target `T` every monetary field becomes
//! `value × rate[T] / rate[native]`. A target whose rate (or the native
//! rate) is missing yields an explicit [`CurrencyGap`]; the other targets
//! are unaffected and no rate is ever defaulted.
//!
//! The converter is a pure function of its inputs.
//!
//! # Examples
//!
//! ```
//! use portfolio_derivations::domain::entities::{FinancialRecord, FxRateTable};
//! use portfolio_derivations::domain::services::currency_converter::convert;
//! use portfolio_derivations::domain::value_objects::{CompanyId, CurrencyCode, FiscalQuarter, Timestamp};
//! use rust_decimal::Decimal;
//!
//! let record = FinancialRecord::builder(
//!     CompanyId::new("acme"),
//!     FiscalQuarter::new(2022, 4).unwrap(),
//!     CurrencyCode::USD,
//! )
//! .total_revenue(Decimal::new(100, 0))
//! .build();
//! let rates = FxRateTable::builder(CurrencyCode::USD, Timestamp::now())
//!     .rate(CurrencyCode::CAD, Decimal::new(13, 1))
//!     .build()
//!     .unwrap();
//!
//! let result = convert(&record, &[CurrencyCode::USD, CurrencyCode::CAD, CurrencyCode::EUR], &rates);
//! assert_eq!(result.converted(CurrencyCode::CAD).unwrap().record().total_revenue(), Decimal::new(130, 0));
//! assert!(result.gap(CurrencyCode::EUR).is_some());
//! ```

use crate::domain::entities::{FinancialRecord, FxRateTable};
use crate::domain::value_objects::{CheckedArithmetic, CurrencyCode, FinancialField};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A financial record expressed in a target currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertedRecord {
    record: FinancialRecord,
    exchange_rate_used: Decimal,
}

impl ConvertedRecord {
    /// Returns the converted record; its currency is the target currency.
    #[inline]
    #[must_use]
    pub fn record(&self) -> &FinancialRecord {
        &self.record
    }

    /// Factor applied to every native monetary value.
    #[inline]
    #[must_use]
    pub fn exchange_rate_used(&self) -> Decimal {
        self.exchange_rate_used
    }

    /// Target currency.
    #[inline]
    #[must_use]
    pub fn currency(&self) -> CurrencyCode {
        self.record.currency()
    }

    /// Consumes the wrapper and returns the record.
    #[must_use]
    pub fn into_record(self) -> FinancialRecord {
        self.record
    }
}

/// Why a target currency could not be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "currency")]
pub enum GapReason {
    /// The rate table does not quote this currency.
    MissingRate(CurrencyCode),
    /// A converted value does not fit in a decimal.
    Overflow,
}

impl fmt::Display for GapReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRate(code) => write!(f, "missing rate for {code}"),
            Self::Overflow => write!(f, "conversion overflow"),
        }
    }
}

/// A requested target currency that could not be converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyGap {
    /// Requested target currency.
    pub currency: CurrencyCode,
    /// Cause of the gap.
    pub reason: GapReason,
}

impl fmt::Display for CurrencyGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.currency, self.reason)
    }
}

/// Outcome for one target currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionOutcome {
    /// Conversion succeeded.
    Converted(ConvertedRecord),
    /// Conversion was not possible.
    Gap(CurrencyGap),
}

/// Per-currency result of converting one record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CurrencyConversion {
    outcomes: BTreeMap<CurrencyCode, ConversionOutcome>,
}

impl CurrencyConversion {
    /// Outcome for `currency`, if it was requested.
    #[must_use]
    pub fn outcome(&self, currency: CurrencyCode) -> Option<&ConversionOutcome> {
        self.outcomes.get(&currency)
    }

    /// Converted record for `currency`, if the conversion succeeded.
    #[must_use]
    pub fn converted(&self, currency: CurrencyCode) -> Option<&ConvertedRecord> {
        match self.outcomes.get(&currency)? {
            ConversionOutcome::Converted(converted) => Some(converted),
            ConversionOutcome::Gap(_) => None,
        }
    }

    /// Gap for `currency`, if the conversion failed.
    #[must_use]
    pub fn gap(&self, currency: CurrencyCode) -> Option<&CurrencyGap> {
        match self.outcomes.get(&currency)? {
            ConversionOutcome::Gap(gap) => Some(gap),
            ConversionOutcome::Converted(_) => None,
        }
    }

    /// All successful conversions, ordered by currency code.
    pub fn records(&self) -> impl Iterator<Item = &ConvertedRecord> {
        self.outcomes.values().filter_map(|outcome| match outcome {
            ConversionOutcome::Converted(converted) => Some(converted),
            ConversionOutcome::Gap(_) => None,
        })
    }

    /// All gaps, ordered by currency code.
    pub fn gaps(&self) -> impl Iterator<Item = &CurrencyGap> {
        self.outcomes.values().filter_map(|outcome| match outcome {
            ConversionOutcome::Gap(gap) => Some(gap),
            ConversionOutcome::Converted(_) => None,
        })
    }

    /// Requested currencies, ordered by code.
    pub fn currencies(&self) -> impl Iterator<Item = CurrencyCode> + '_ {
        self.outcomes.keys().copied()
    }

    /// Returns true if every requested currency converted.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.gaps().next().is_none()
    }

    /// Number of requested currencies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Returns true if no currency was requested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Flattens the result into `currency → field → value`.
    ///
    /// A gap maps to `None`; an unreported nullable field maps to `None`
    /// inside a present currency.
    #[must_use]
    pub fn to_field_map(
        &self,
    ) -> BTreeMap<CurrencyCode, Option<BTreeMap<FinancialField, Option<Decimal>>>> {
        self.outcomes
            .iter()
            .map(|(code, outcome)| {
                let fields = match outcome {
                    ConversionOutcome::Converted(converted) => Some(
                        FinancialField::ALL
                            .into_iter()
                            .map(|field| (field, converted.record.field(field)))
                            .collect(),
                    ),
                    ConversionOutcome::Gap(_) => None,
                };
                (*code, fields)
            })
            .collect()
    }
}

/// Converts `record` into each of `targets` using `rates`.
///
/// # Arguments
///
/// * `record` - Record in its native currency
/// * `targets` - Requested currencies; duplicates are collapsed
/// * `rates` - Rate table against a common reference currency
#[must_use]
pub fn convert(
    record: &FinancialRecord,
    targets: &[CurrencyCode],
    rates: &FxRateTable,
) -> CurrencyConversion {
    let outcomes = targets
        .iter()
        .map(|target| (*target, convert_one(record, *target, rates)))
        .collect();
    CurrencyConversion { outcomes }
}

fn convert_one(
    record: &FinancialRecord,
    target: CurrencyCode,
    rates: &FxRateTable,
) -> ConversionOutcome {
    let native = record.currency();
    if target == native {
        return ConversionOutcome::Converted(ConvertedRecord {
            record: record.clone(),
            exchange_rate_used: Decimal::ONE,
        });
    }

    let gap = |reason| ConversionOutcome::Gap(CurrencyGap {
        currency: target,
        reason,
    });

    let Some(native_rate) = rates.rate(native) else {
        return gap(GapReason::MissingRate(native));
    };
    let Some(target_rate) = rates.rate(target) else {
        return gap(GapReason::MissingRate(target));
    };

    // Multiply before dividing so consistent rates round-trip exactly.
    let converted = record.map_monetary(target, |value| {
        value.safe_mul(target_rate)?.safe_div(native_rate)
    });
    let factor = target_rate.safe_div(native_rate);

    match (converted, factor) {
        (Ok(converted), Ok(factor)) => ConversionOutcome::Converted(ConvertedRecord {
            record: converted,
            exchange_rate_used: factor,
        }),
        _ => gap(GapReason::Overflow),
    }
}

/// Converts a single amount from `from` into `to`.
///
/// Returns `None` if a rate is missing or the result does not fit.
#[must_use]
pub fn convert_amount(
    amount: Decimal,
    from: CurrencyCode,
    to: CurrencyCode,
    rates: &FxRateTable,
) -> Option<Decimal> {
    if from == to {
        return Some(amount);
    }
    let from_rate = rates.rate(from)?;
    let to_rate = rates.rate(to)?;
    amount.safe_mul(to_rate).ok()?.safe_div(from_rate).ok()
}
