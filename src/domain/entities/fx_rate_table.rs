//! # FX Rate Table
//!
//! Point-in-time snapshot of exchange rates against one reference currency.
//!
//! A table is immutable once built and is shared across conversions as an
//! `Arc<FxRateTable>`.
//!
//! # Examples
//!
//! ```
//! use portfolio_derivations::domain::entities::FxRateTable;
//! use portfolio_derivations::domain::value_objects::{CurrencyCode, Timestamp};
//! use rust_decimal::Decimal;
//!
//! let table = FxRateTable::builder(CurrencyCode::USD, Timestamp::now())
//!     .rate(CurrencyCode::CAD, Decimal::new(135, 2))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(table.rate(CurrencyCode::USD), Some(Decimal::ONE));
//! assert_eq!(table.cross_rate(CurrencyCode::USD, CurrencyCode::CAD), Some(Decimal::new(135, 2)));
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::arithmetic::ratio;
use crate::domain::value_objects::{CurrencyCode, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Exchange rates expressed as units of each currency per one unit of the
/// reference currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FxRateTable {
    reference: CurrencyCode,
    rates: BTreeMap<CurrencyCode, Decimal>,
    retrieved_at: Timestamp,
}

impl FxRateTable {
    /// Starts building a table.
    #[must_use]
    pub fn builder(reference: CurrencyCode, retrieved_at: Timestamp) -> FxRateTableBuilder {
        FxRateTableBuilder {
            reference,
            retrieved_at,
            rates: BTreeMap::new(),
        }
    }

    /// Reference currency all rates are expressed against.
    #[inline]
    #[must_use]
    pub fn reference(&self) -> CurrencyCode {
        self.reference
    }

    /// When the rates were retrieved.
    #[inline]
    #[must_use]
    pub fn retrieved_at(&self) -> Timestamp {
        self.retrieved_at
    }

    /// Rate for `currency`, if present.
    #[inline]
    #[must_use]
    pub fn rate(&self, currency: CurrencyCode) -> Option<Decimal> {
        self.rates.get(&currency).copied()
    }

    /// Returns true if the table quotes `currency`.
    #[inline]
    #[must_use]
    pub fn contains(&self, currency: CurrencyCode) -> bool {
        self.rates.contains_key(&currency)
    }

    /// Factor converting an amount in `from` into `to`: `rate[to] / rate[from]`.
    ///
    /// Returns `None` if either rate is absent.
    #[must_use]
    pub fn cross_rate(&self, from: CurrencyCode, to: CurrencyCode) -> Option<Decimal> {
        if from == to {
            return Some(Decimal::ONE);
        }
        ratio(self.rate(to)?, self.rate(from)?)
    }

    /// Number of quoted currencies, reference included.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Always false: the reference currency is always quoted.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Iterates over quoted currencies in code order.
    pub fn iter(&self) -> impl Iterator<Item = (CurrencyCode, Decimal)> + '_ {
        self.rates.iter().map(|(code, rate)| (*code, *rate))
    }
}

impl fmt::Display for FxRateTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FxRateTable(ref={} rates={} at={})",
            self.reference,
            self.rates.len(),
            self.retrieved_at
        )
    }
}

/// Builder for [`FxRateTable`].
#[derive(Debug, Clone)]
pub struct FxRateTableBuilder {
    reference: CurrencyCode,
    retrieved_at: Timestamp,
    rates: BTreeMap<CurrencyCode, Decimal>,
}

impl FxRateTableBuilder {
    /// Adds or replaces the rate for `currency`.
    #[must_use]
    pub fn rate(mut self, currency: CurrencyCode, rate: Decimal) -> Self {
        self.rates.insert(currency, rate);
        self
    }

    /// Adds every rate from `rates`.
    #[must_use]
    pub fn rates<I>(mut self, rates: I) -> Self
    where
        I: IntoIterator<Item = (CurrencyCode, Decimal)>,
    {
        self.rates.extend(rates);
        self
    }

    /// Builds the table.
    ///
    /// The reference currency is inserted with rate 1 when absent.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidField` if any rate is zero or negative, or
    /// if the reference currency is quoted at a rate other than 1.
    pub fn build(mut self) -> DomainResult<FxRateTable> {
        if let Some((code, rate)) = self.rates.iter().find(|(_, rate)| **rate <= Decimal::ZERO) {
            return Err(DomainError::invalid_field(
                "rate",
                format!("{code} rate must be positive, got {rate}"),
            ));
        }
        match self.rates.get(&self.reference) {
            Some(rate) if *rate != Decimal::ONE => {
                return Err(DomainError::invalid_field(
                    "rate",
                    format!("reference {} must be quoted at 1, got {rate}", self.reference),
                ));
            }
            Some(_) => {}
            None => {
                self.rates.insert(self.reference, Decimal::ONE);
            }
        }
        Ok(FxRateTable {
            reference: self.reference,
            rates: self.rates,
            retrieved_at: self.retrieved_at,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn table() -> FxRateTable {
        FxRateTable::builder(CurrencyCode::USD, Timestamp::from_secs(0).unwrap())
            .rate(CurrencyCode::CAD, Decimal::new(125, 2))
            .rate(CurrencyCode::EUR, Decimal::new(8, 1))
            .build()
            .unwrap()
    }

    #[test]
    fn reference_is_implicit_one() {
        let table = table();
        assert_eq!(table.rate(CurrencyCode::USD), Some(Decimal::ONE));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn cross_rate_between_non_reference_currencies() {
        let table = table();
        assert_eq!(
            table.cross_rate(CurrencyCode::EUR, CurrencyCode::CAD),
            Some(Decimal::new(15625, 4))
        );
    }

    #[test]
    fn cross_rate_missing_currency_is_none() {
        let table = table();
        assert_eq!(table.cross_rate(CurrencyCode::GBP, CurrencyCode::USD), None);
        assert_eq!(table.cross_rate(CurrencyCode::USD, CurrencyCode::GBP), None);
    }

    #[test]
    fn cross_rate_same_currency_is_identity_even_if_unquoted() {
        let table = table();
        assert_eq!(
            table.cross_rate(CurrencyCode::GBP, CurrencyCode::GBP),
            Some(Decimal::ONE)
        );
    }

    #[test]
    fn rejects_non_positive_rates() {
        let result = FxRateTable::builder(CurrencyCode::USD, Timestamp::now())
            .rate(CurrencyCode::CAD, Decimal::ZERO)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn rejects_reference_not_at_one() {
        let result = FxRateTable::builder(CurrencyCode::USD, Timestamp::now())
            .rate(CurrencyCode::USD, Decimal::TWO)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn iter_is_ordered_by_code() {
        let codes: Vec<_> = table().iter().map(|(code, _)| code).collect();
        assert_eq!(
            codes,
            vec![CurrencyCode::CAD, CurrencyCode::EUR, CurrencyCode::USD]
        );
    }
}
