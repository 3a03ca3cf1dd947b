//! # HTTP FX Rate Provider
//!
//! Fetches rate tables from a JSON rates endpoint.
//!
//! Request: `GET {endpoint}?base={REF}&date={YYYY-MM-DD}` with
//! `Authorization: Bearer {api_key}` when a key is configured.
//!
//! Response: `{"rates": {"CAD": 1.35, ...}}`, optionally with a `base`
//! field that must match the requested reference currency. Entries with an
//! unparseable code or a non-positive rate are skipped with a warning.

use crate::domain::entities::FxRateTable;
use crate::domain::value_objects::{CurrencyCode, Timestamp};
use crate::infrastructure::fx::error::{FxProviderError, FxProviderResult};
use crate::infrastructure::fx::http_client::HttpClient;
use crate::infrastructure::fx::traits::FxRateProvider;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Default request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Deserialize)]
struct RatesResponse {
    #[serde(default)]
    base: Option<String>,
    rates: BTreeMap<String, serde_json::Value>,
}

/// FX provider backed by an HTTP JSON endpoint.
#[derive(Debug, Clone)]
pub struct HttpFxRateProvider {
    client: HttpClient,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpFxRateProvider {
    /// Creates a provider for `endpoint`.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Full URL of the rates resource
    /// * `api_key` - Bearer token, if the endpoint requires one
    /// * `timeout_ms` - Per-request transport timeout
    ///
    /// # Errors
    ///
    /// Returns `FxProviderError::Internal` if the HTTP client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout_ms: u64,
    ) -> FxProviderResult<Self> {
        Ok(Self {
            client: HttpClient::new(timeout_ms)?,
            endpoint: endpoint.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    /// Returns the configured endpoint.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn headers(&self) -> FxProviderResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &self.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|_| FxProviderError::invalid_request("API key is not a valid header value"))?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    fn parse_table(
        response: RatesResponse,
        reference: CurrencyCode,
    ) -> FxProviderResult<FxRateTable> {
        if let Some(base) = response.base.as_deref() {
            let base = CurrencyCode::new(base)
                .map_err(|e| FxProviderError::protocol(format!("Invalid base currency: {e}")))?;
            if base != reference {
                return Err(FxProviderError::protocol(format!(
                    "Requested rates against {reference}, got {base}"
                )));
            }
        }

        let mut builder = FxRateTable::builder(reference, Timestamp::now());
        for (code, raw) in response.rates {
            let Ok(currency) = CurrencyCode::new(&code) else {
                tracing::warn!(code = %code, "skipping rate with invalid currency code");
                continue;
            };
            match parse_rate(&raw) {
                Some(rate) if rate > Decimal::ZERO => {
                    if currency == reference && rate != Decimal::ONE {
                        tracing::warn!(currency = %currency, rate = %rate, "ignoring reference self-rate");
                        continue;
                    }
                    builder = builder.rate(currency, rate);
                }
                _ => {
                    tracing::warn!(currency = %currency, raw = %raw, "skipping unusable rate");
                }
            }
        }
        builder
            .build()
            .map_err(|e| FxProviderError::protocol(format!("Invalid rate table: {e}")))
    }
}

fn parse_rate(raw: &serde_json::Value) -> Option<Decimal> {
    let text = match raw {
        serde_json::Value::Number(number) => number.to_string(),
        serde_json::Value::String(text) => text.clone(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

#[async_trait]
impl FxRateProvider for HttpFxRateProvider {
    async fn fetch_rates(
        &self,
        reference: CurrencyCode,
        as_of: Timestamp,
    ) -> FxProviderResult<FxRateTable> {
        let date = as_of.date().format("%Y-%m-%d").to_string();
        let params = [("base", reference.as_str()), ("date", date.as_str())];
        let response: RatesResponse = self
            .client
            .get_with_params_and_headers(&self.endpoint, &params, self.headers()?)
            .await?;
        let table = Self::parse_table(response, reference)?;
        tracing::debug!(
            provider = self.name(),
            reference = %reference,
            currencies = table.len(),
            "fetched fx rates"
        );
        Ok(table)
    }

    fn name(&self) -> &str {
        "http"
    }
}
