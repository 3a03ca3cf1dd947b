//! # Derivation Pipeline
//!
//! Orchestrates one derivation run per company-quarter:
//!
//! ```text
//! load history ─► FETCHING_RATES ─► CONVERTING ─► COMPUTING ─► ASSEMBLED ─► store
//!                       │
//!                       └─► FAILED (RateUnavailable, nothing stored)
//! ```
//!
//! Rates come through the shared [`RateCache`], so concurrent runs in the
//! same retrieval bucket make a single provider call. Each provider call is
//! bounded by a per-attempt timeout and retried according to the configured
//! [`RetryPolicy`]. Conversion and computation are synchronous and never
//! fail the run: currency gaps and null metrics are reported in the output.

use crate::application::error::{PipelineError, PipelineResult};
use crate::application::services::rate_cache::RateCache;
use crate::application::services::retry::RetryPolicy;
use crate::domain::entities::{
    CompanyProfile, DerivedMetricsRecord, FinancialRecord, FxRateTable, ValuationInputs,
};
use crate::domain::services::currency_converter::{self, convert_amount};
use crate::domain::services::{ConvertedRecord, CurrencyConversion, QuarterlyHistory};
use crate::domain::services::metrics_calculator;
use crate::domain::value_objects::{
    CompanyId, CurrencyCode, FiscalQuarter, PipelineState, RunId, StateTrail, Timestamp,
};
use crate::infrastructure::fx::{FxProviderError, FxRateProvider};
use crate::infrastructure::persistence::{
    CompanyRegistry, DerivationStore, FinancialRecordRepository,
};
use futures::future::join_all;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Default per-attempt timeout for FX provider calls.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default width of an FX retrieval bucket in seconds.
pub const DEFAULT_RATE_BUCKET_SECS: u64 = 300;

/// Quarters of history loaded before the current one.
const HISTORY_QUARTERS: u32 = 7;

/// Configuration for the derivation pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Currency rate tables are requested against.
    pub reference_currency: CurrencyCode,
    /// Currencies records are converted into when a request names none.
    pub target_currencies: Vec<CurrencyCode>,
    /// Retry policy around the FX provider.
    pub retry: RetryPolicy,
    /// Timeout of a single FX provider call.
    pub attempt_timeout: Duration,
    /// Width of an FX retrieval bucket in seconds.
    pub rate_bucket_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            reference_currency: CurrencyCode::USD,
            target_currencies: vec![CurrencyCode::USD, CurrencyCode::CAD],
            retry: RetryPolicy::default(),
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            rate_bucket_secs: DEFAULT_RATE_BUCKET_SECS,
        }
    }
}

impl PipelineConfig {
    /// Sets the reference currency.
    #[must_use]
    pub fn with_reference_currency(mut self, currency: CurrencyCode) -> Self {
        self.reference_currency = currency;
        self
    }

    /// Sets the default target currencies.
    #[must_use]
    pub fn with_target_currencies(mut self, currencies: Vec<CurrencyCode>) -> Self {
        self.target_currencies = currencies;
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the per-attempt timeout.
    #[must_use]
    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    /// Sets the retrieval bucket width.
    #[must_use]
    pub fn with_rate_bucket_secs(mut self, secs: u64) -> Self {
        self.rate_bucket_secs = secs;
        self
    }
}

/// One unit of work: a company-quarter and the currencies to convert into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivationRequest {
    /// Company to derive.
    pub company_id: CompanyId,
    /// Quarter to derive.
    pub period: FiscalQuarter,
    /// Target currencies; empty means the configured defaults.
    #[serde(default)]
    pub target_currencies: Vec<CurrencyCode>,
    /// Point in time for FX retrieval; `None` means now.
    #[serde(default)]
    pub as_of: Option<Timestamp>,
}

impl DerivationRequest {
    /// Creates a request using the configured target currencies.
    #[must_use]
    pub fn new(company_id: CompanyId, period: FiscalQuarter) -> Self {
        Self {
            company_id,
            period,
            target_currencies: Vec::new(),
            as_of: None,
        }
    }

    /// Creates a request from raw year and quarter.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Validation` if the company id is blank or
    /// the period is out of range.
    pub fn from_parts(
        company_id: impl Into<String>,
        reporting_year: i32,
        reporting_quarter: u8,
    ) -> PipelineResult<Self> {
        let company_id = CompanyId::new(company_id);
        if company_id.is_empty() {
            return Err(PipelineError::validation("company id must not be blank"));
        }
        let period = FiscalQuarter::new(reporting_year, reporting_quarter)
            .map_err(|e| PipelineError::validation(e.to_string()))?;
        Ok(Self::new(company_id, period))
    }

    /// Sets the target currencies.
    #[must_use]
    pub fn with_targets(mut self, targets: Vec<CurrencyCode>) -> Self {
        self.target_currencies = targets;
        self
    }

    /// Pins FX retrieval to a point in time.
    #[must_use]
    pub fn with_as_of(mut self, as_of: Timestamp) -> Self {
        self.as_of = Some(as_of);
        self
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivationOutput {
    /// Derived metrics in the record's native currency.
    pub metrics: DerivedMetricsRecord,
    /// Converted records and currency gaps, per target currency.
    pub conversion: CurrencyConversion,
    /// Identifier of this run.
    pub run_id: RunId,
    /// States the run passed through.
    pub states: Vec<PipelineState>,
}

impl DerivationOutput {
    /// Converted records produced by the run.
    #[must_use]
    pub fn converted_records(&self) -> Vec<ConvertedRecord> {
        self.conversion.records().cloned().collect()
    }
}

/// Derivation pipeline over injected repositories and FX provider.
#[derive(Debug)]
pub struct DerivationPipeline {
    records: Arc<dyn FinancialRecordRepository>,
    companies: Arc<dyn CompanyRegistry>,
    store: Arc<dyn DerivationStore>,
    fx_provider: Arc<dyn FxRateProvider>,
    rate_cache: Arc<RateCache>,
    config: PipelineConfig,
}

impl DerivationPipeline {
    /// Creates a pipeline with its own rate cache.
    #[must_use]
    pub fn new(
        records: Arc<dyn FinancialRecordRepository>,
        companies: Arc<dyn CompanyRegistry>,
        store: Arc<dyn DerivationStore>,
        fx_provider: Arc<dyn FxRateProvider>,
        config: PipelineConfig,
    ) -> Self {
        let rate_cache = Arc::new(RateCache::new(config.rate_bucket_secs));
        Self {
            records,
            companies,
            store,
            fx_provider,
            rate_cache,
            config,
        }
    }

    /// Replaces the rate cache, e.g. to share one across pipelines.
    #[must_use]
    pub fn with_rate_cache(mut self, rate_cache: Arc<RateCache>) -> Self {
        self.rate_cache = rate_cache;
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Returns the rate cache.
    #[must_use]
    pub fn rate_cache(&self) -> &Arc<RateCache> {
        &self.rate_cache
    }

    /// Derives metrics for one company-quarter and returns the metrics record.
    ///
    /// An empty `target_currencies` uses the configured defaults.
    ///
    /// # Errors
    ///
    /// See [`DerivationPipeline::derive`]; also returns
    /// `PipelineError::Validation` for a blank company id or invalid period.
    pub async fn run(
        &self,
        company_id: &str,
        reporting_year: i32,
        reporting_quarter: u8,
        target_currencies: &[CurrencyCode],
    ) -> PipelineResult<DerivedMetricsRecord> {
        let request = DerivationRequest::from_parts(company_id, reporting_year, reporting_quarter)?
            .with_targets(target_currencies.to_vec());
        self.derive(&request).await.map(|output| output.metrics)
    }

    /// Runs independent requests concurrently.
    ///
    /// Results are returned in request order; one failure does not affect
    /// the others.
    pub async fn run_batch(
        &self,
        requests: &[DerivationRequest],
    ) -> Vec<PipelineResult<DerivationOutput>> {
        join_all(requests.iter().map(|request| self.derive(request))).await
    }

    /// Derives metrics for one request and stores the result.
    ///
    /// # Errors
    ///
    /// - `RecordNotFound` if no record exists for the company-quarter
    /// - `InvalidRecord` if the current record fails validation
    /// - `RateUnavailable` if rates could not be fetched; nothing is stored
    /// - `Persistence` if a repository call fails
    #[tracing::instrument(
        name = "derivation",
        skip_all,
        fields(
            company_id = %request.company_id,
            period = %request.period,
            run_id = tracing::field::Empty
        )
    )]
    pub async fn derive(&self, request: &DerivationRequest) -> PipelineResult<DerivationOutput> {
        let run_id = RunId::new_v4();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));

        let (current, window) = self.load_history(request).await?;
        let profile = self.companies.get(&request.company_id).await?;
        if profile.is_none() {
            tracing::warn!("company not registered, valuation metrics will be null");
        }

        let mut trail = StateTrail::new();
        let as_of = request.as_of.unwrap_or_else(Timestamp::now);
        let rates = match self.fetch_rates(self.config.reference_currency, as_of).await {
            Ok(rates) => rates,
            Err(error) => {
                advance(&mut trail, PipelineState::Failed)?;
                tracing::error!(error = %error, "derivation failed");
                return Err(error);
            }
        };

        advance(&mut trail, PipelineState::Converting)?;
        let targets = if request.target_currencies.is_empty() {
            self.config.target_currencies.as_slice()
        } else {
            request.target_currencies.as_slice()
        };
        let conversion = currency_converter::convert(&current, targets, &rates);
        for gap in conversion.gaps() {
            tracing::warn!(currency = %gap.currency, reason = ?gap.reason, "currency gap");
        }

        advance(&mut trail, PipelineState::Computing)?;
        let valuation = profile
            .as_ref()
            .and_then(|profile| valuation_in(profile, current.currency(), &rates));
        let history = QuarterlyHistory::from_window(current, window);
        let metrics = metrics_calculator::compute_history(&history, valuation.as_ref());

        advance(&mut trail, PipelineState::Assembled)?;
        let output = DerivationOutput {
            metrics,
            conversion,
            run_id,
            states: trail.states().to_vec(),
        };
        self.store
            .upsert(&output.metrics, &output.converted_records())
            .await?;

        tracing::info!(
            currency = %output.metrics.currency(),
            converted = output.conversion.records().count(),
            gaps = output.conversion.gaps().count(),
            null_metrics = output.metrics.values().missing().len(),
            "derivation assembled"
        );
        Ok(output)
    }

    async fn load_history(
        &self,
        request: &DerivationRequest,
    ) -> PipelineResult<(FinancialRecord, Vec<FinancialRecord>)> {
        let company_id = &request.company_id;
        let period = request.period;

        let current = self
            .records
            .get(company_id, period)
            .await?
            .ok_or_else(|| PipelineError::record_not_found(company_id.clone(), period.to_string()))?;
        current
            .validate()
            .map_err(|e| PipelineError::invalid_record(company_id.clone(), period.to_string(), e))?;

        let window = self
            .records
            .find_range(company_id, period.quarters_back(HISTORY_QUARTERS), period.previous())
            .await?
            .into_iter()
            .filter(|record| usable_history(record, &current))
            .collect();
        Ok((current, window))
    }

    async fn fetch_rates(
        &self,
        reference: CurrencyCode,
        as_of: Timestamp,
    ) -> PipelineResult<Arc<FxRateTable>> {
        self.rate_cache
            .get_or_fetch(reference, as_of, || self.fetch_with_retry(reference, as_of))
            .await
    }

    async fn fetch_with_retry(
        &self,
        reference: CurrencyCode,
        as_of: Timestamp,
    ) -> PipelineResult<FxRateTable> {
        let attempt_timeout = self.config.attempt_timeout;
        let timeout_ms = u64::try_from(attempt_timeout.as_millis()).unwrap_or(u64::MAX);
        self.config
            .retry
            .execute("fetch_rates", |attempt| async move {
                tracing::debug!(
                    provider = self.fx_provider.name(),
                    reference = %reference,
                    attempt,
                    "requesting fx rates"
                );
                match timeout(attempt_timeout, self.fx_provider.fetch_rates(reference, as_of)).await
                {
                    Ok(result) => result,
                    Err(_) => Err(FxProviderError::timeout_with_duration(
                        "fx provider call exceeded attempt timeout",
                        timeout_ms,
                    )),
                }
            })
            .await
            .map_err(|failure| {
                PipelineError::rate_unavailable(reference, failure.attempts, failure.last_error)
            })
    }
}

fn advance(trail: &mut StateTrail, state: PipelineState) -> PipelineResult<()> {
    trail
        .advance(state)
        .map_err(|e| PipelineError::internal(e.to_string()))
}

/// History records are used only if they validate and share the current
/// record's currency; anything else counts as missing history.
fn usable_history(record: &FinancialRecord, current: &FinancialRecord) -> bool {
    if let Err(error) = record.validate() {
        tracing::warn!(
            year = record.reporting_year(),
            quarter = record.reporting_quarter(),
            error = %error,
            "ignoring invalid history record"
        );
        return false;
    }
    if record.currency() != current.currency() {
        tracing::warn!(
            year = record.reporting_year(),
            quarter = record.reporting_quarter(),
            currency = %record.currency(),
            expected = %current.currency(),
            "ignoring history record in another currency"
        );
        return false;
    }
    true
}

/// Valuation inputs expressed in `currency`.
///
/// Returns `None` if the profile holds no valuation data or an amount
/// cannot be converted.
fn valuation_in(
    profile: &CompanyProfile,
    currency: CurrencyCode,
    rates: &FxRateTable,
) -> Option<ValuationInputs> {
    let inputs = profile.valuation_inputs();
    if inputs.post_money_valuation.is_none() && inputs.equity_raised.is_none() {
        return None;
    }
    if inputs.currency == currency {
        return Some(inputs);
    }

    let convert = |amount: Option<Decimal>| match amount {
        None => Ok(None),
        Some(value) => convert_amount(value, inputs.currency, currency, rates)
            .map(Some)
            .ok_or(()),
    };
    match (
        convert(inputs.post_money_valuation),
        convert(inputs.equity_raised),
    ) {
        (Ok(post_money_valuation), Ok(equity_raised)) => Some(ValuationInputs {
            currency,
            post_money_valuation,
            equity_raised,
        }),
        _ => {
            tracing::warn!(
                from = %inputs.currency,
                to = %currency,
                "cannot convert valuation inputs, valuation metrics will be null"
            );
            None
        }
    }
}
