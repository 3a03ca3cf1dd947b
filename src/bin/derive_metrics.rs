//! derive_metrics - derive quarterly metrics from a JSON file of records
//!
//! ## Example Usage
//!
//! ```bash
//! # One company-quarter against the configured HTTP FX endpoint
//! derive_metrics --records records.json --company acme --year 2022 --quarter 4
//!
//! # Every record in the file, with fixed rates and extra targets
//! derive_metrics --records records.json --rates rates.json --target EUR --target GBP
//! ```
//!
//! `records.json` holds an array of financial records, `companies.json` an
//! array of company profiles, and `rates.json` a rate table of the form
//! `{"reference": "USD", "rates": {"CAD": "1.3554"}}`.

use anyhow::{Context, Result, bail};
use clap::Parser;
use portfolio_derivations::config::{EngineConfig, LogFormat};
use portfolio_derivations::domain::entities::{CompanyProfile, FinancialRecord};
use portfolio_derivations::domain::value_objects::{CompanyId, CurrencyCode, FiscalQuarter};
use portfolio_derivations::infrastructure::fx::{FxRateProvider, StaticFxRateProvider};
use portfolio_derivations::infrastructure::persistence::in_memory::{
    InMemoryCompanyRegistry, InMemoryDerivationStore, InMemoryFinancialRecordRepository,
};
use portfolio_derivations::{DerivationPipeline, DerivationRequest, telemetry};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Derive quarterly portfolio-company metrics
#[derive(Parser)]
#[command(name = "derive_metrics")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Derive quarterly portfolio-company metrics", long_about = None)]
struct Cli {
    /// JSON array of financial records
    #[arg(short, long, value_name = "FILE")]
    records: PathBuf,

    /// JSON array of company profiles
    #[arg(long, value_name = "FILE")]
    companies: Option<PathBuf>,

    /// Fixed rate table; the configured HTTP endpoint is used otherwise
    #[arg(long, value_name = "FILE")]
    rates: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Company to derive; every record in the file when omitted
    #[arg(long, requires_all = ["year", "quarter"])]
    company: Option<String>,

    /// Reporting year
    #[arg(long)]
    year: Option<i32>,

    /// Reporting quarter (1-4)
    #[arg(long)]
    quarter: Option<u8>,

    /// Target currency, repeatable; overrides the configured targets
    #[arg(short, long = "target", value_name = "CODE")]
    targets: Vec<String>,

    /// Log format override (pretty, compact, json)
    #[arg(long)]
    log_format: Option<LogFormat>,
}

#[derive(Debug, Deserialize)]
struct RatesFile {
    reference: CurrencyCode,
    rates: BTreeMap<CurrencyCode, Decimal>,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

fn requests(cli: &Cli, records: &[FinancialRecord], targets: &[CurrencyCode]) -> Result<Vec<DerivationRequest>> {
    if let (Some(company), Some(year), Some(quarter)) = (&cli.company, cli.year, cli.quarter) {
        let request = DerivationRequest::from_parts(company.as_str(), year, quarter)?
            .with_targets(targets.to_vec());
        return Ok(vec![request]);
    }

    let keys: BTreeSet<(CompanyId, FiscalQuarter)> = records
        .iter()
        .filter_map(|record| Some((record.company_id().clone(), record.period().ok()?)))
        .collect();
    Ok(keys
        .into_iter()
        .map(|(company_id, period)| {
            DerivationRequest::new(company_id, period).with_targets(targets.to_vec())
        })
        .collect())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = EngineConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(format) = cli.log_format {
        config.log.format = format;
    }
    telemetry::init_tracing(&config.log).context("installing tracing subscriber")?;

    let pipeline_config = config.pipeline_config()?;
    let targets = cli
        .targets
        .iter()
        .map(|code| CurrencyCode::new(code).with_context(|| format!("invalid target {code:?}")))
        .collect::<Result<Vec<_>>>()?;

    let records: Vec<FinancialRecord> = read_json(&cli.records)?;
    let profiles: Vec<CompanyProfile> = match &cli.companies {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };
    let provider: Arc<dyn FxRateProvider> = match &cli.rates {
        Some(path) => {
            let file: RatesFile = read_json(path)?;
            Arc::new(StaticFxRateProvider::new(file.reference, file.rates))
        }
        None => Arc::new(config.http_provider()?),
    };

    let requests = requests(&cli, &records, &targets)?;
    if requests.is_empty() {
        bail!("no records to derive in {}", cli.records.display());
    }

    let pipeline = DerivationPipeline::new(
        Arc::new(InMemoryFinancialRecordRepository::with_records(records)),
        Arc::new(InMemoryCompanyRegistry::with_profiles(profiles)),
        Arc::new(InMemoryDerivationStore::new()),
        provider,
        pipeline_config,
    );

    let mut failures = 0_usize;
    let mut outputs = Vec::with_capacity(requests.len());
    for (request, result) in requests.iter().zip(pipeline.run_batch(&requests).await) {
        match result {
            Ok(output) => outputs.push(output),
            Err(error) => {
                failures += 1;
                tracing::error!(
                    company_id = %request.company_id,
                    period = %request.period,
                    error = %error,
                    "derivation failed"
                );
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&outputs)?);
    if failures > 0 {
        bail!("{failures} of {} derivation(s) failed", requests.len());
    }
    Ok(())
}
