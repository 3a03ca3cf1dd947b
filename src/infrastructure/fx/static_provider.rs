//! # Static FX Rate Provider
//!
//! Serves a fixed set of rates, for offline runs, fixtures and tests.
//!
//! Rates are held against one reference currency and re-based on request,
//! so a provider configured against USD can answer a request for CAD.

use crate::domain::entities::FxRateTable;
use crate::domain::value_objects::arithmetic::ratio;
use crate::domain::value_objects::{CurrencyCode, Timestamp};
use crate::infrastructure::fx::error::{FxProviderError, FxProviderResult};
use crate::infrastructure::fx::traits::FxRateProvider;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// FX provider returning fixed rates.
#[derive(Debug, Clone)]
pub struct StaticFxRateProvider {
    reference: CurrencyCode,
    rates: BTreeMap<CurrencyCode, Decimal>,
}

impl StaticFxRateProvider {
    /// Creates a provider quoting `rates` against `reference`.
    #[must_use]
    pub fn new<I>(reference: CurrencyCode, rates: I) -> Self
    where
        I: IntoIterator<Item = (CurrencyCode, Decimal)>,
    {
        let mut rates: BTreeMap<_, _> = rates.into_iter().collect();
        rates.entry(reference).or_insert(Decimal::ONE);
        Self { reference, rates }
    }

    /// Reference currency the rates are stored against.
    #[inline]
    #[must_use]
    pub fn reference(&self) -> CurrencyCode {
        self.reference
    }
}

#[async_trait]
impl FxRateProvider for StaticFxRateProvider {
    async fn fetch_rates(
        &self,
        reference: CurrencyCode,
        as_of: Timestamp,
    ) -> FxProviderResult<FxRateTable> {
        let base = self.rates.get(&reference).copied().ok_or_else(|| {
            FxProviderError::invalid_request(format!("no static rate for {reference}"))
        })?;
        let rebased = self
            .rates
            .iter()
            .filter_map(|(code, rate)| Some((*code, ratio(*rate, base)?)));
        FxRateTable::builder(reference, as_of)
            .rates(rebased)
            .build()
            .map_err(|e| FxProviderError::internal(format!("invalid static rates: {e}")))
    }

    fn name(&self) -> &str {
        "static"
    }
}
