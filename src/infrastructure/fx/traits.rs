//! # FX Provider Port
//!
//! Trait implemented by every source of exchange rates.

use crate::domain::entities::FxRateTable;
use crate::domain::value_objects::{CurrencyCode, Timestamp};
use crate::infrastructure::fx::error::FxProviderResult;
use async_trait::async_trait;
use std::fmt;

/// Source of point-in-time exchange rate tables.
///
/// Implementations perform at most one remote call per invocation and do
/// not retry; retry and timeout policy belong to the caller.
#[async_trait]
pub trait FxRateProvider: Send + Sync + fmt::Debug {
    /// Fetches rates against `reference` as of `as_of`.
    ///
    /// # Errors
    ///
    /// Returns an [`FxProviderError`](crate::infrastructure::fx::FxProviderError)
    /// whose `is_retryable` distinguishes transient from permanent failures.
    async fn fetch_rates(
        &self,
        reference: CurrencyCode,
        as_of: Timestamp,
    ) -> FxProviderResult<FxRateTable>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}
