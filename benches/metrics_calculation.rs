//! Benchmarks for currency conversion, metric derivation and a full
//! pipeline run over in-memory collaborators.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use criterion::{Criterion, criterion_group, criterion_main};
use portfolio_derivations::application::services::PipelineConfig;
use portfolio_derivations::domain::entities::{FinancialRecord, FxRateTable};
use portfolio_derivations::domain::services::{currency_converter, metrics_calculator};
use portfolio_derivations::domain::services::QuarterlyHistory;
use portfolio_derivations::domain::value_objects::{
    CompanyId, CurrencyCode, FiscalQuarter, Timestamp,
};
use portfolio_derivations::infrastructure::fx::StaticFxRateProvider;
use portfolio_derivations::infrastructure::persistence::in_memory::{
    InMemoryCompanyRegistry, InMemoryDerivationStore, InMemoryFinancialRecordRepository,
};
use portfolio_derivations::{DerivationPipeline, DerivationRequest};
use rust_decimal::Decimal;
use std::hint::black_box;
use std::sync::Arc;

fn record(period: FiscalQuarter, revenue: i64) -> FinancialRecord {
    FinancialRecord::builder(CompanyId::new("bench"), period, CurrencyCode::CAD)
        .total_revenue(Decimal::from(revenue))
        .recurring_revenue(Decimal::from(revenue * 9 / 10))
        .gross_profit(Decimal::from(revenue * 6 / 10))
        .sales_marketing_expense(Decimal::from(revenue / 3))
        .total_operating_expense(Decimal::from(revenue * 17 / 10))
        .ebitda(Decimal::from(-revenue))
        .net_income(Decimal::from(-revenue))
        .cash_burn(Decimal::from(-revenue))
        .cash_balance(Decimal::from(revenue * 8))
        .debt_outstanding(Decimal::from(revenue / 2))
        .employees(100)
        .build()
}

fn history() -> Vec<FinancialRecord> {
    let current = FiscalQuarter::new(2022, 4).unwrap();
    (0..8)
        .map(|back| record(current.quarters_back(back), 4_000_000 - i64::from(back) * 100_000))
        .collect()
}

fn rates() -> FxRateTable {
    FxRateTable::builder(CurrencyCode::USD, Timestamp::now())
        .rate(CurrencyCode::CAD, Decimal::new(13554, 4))
        .rate(CurrencyCode::EUR, Decimal::new(9342, 4))
        .rate(CurrencyCode::GBP, Decimal::new(8301, 4))
        .build()
        .unwrap()
}

fn bench_conversion(c: &mut Criterion) {
    let record = record(FiscalQuarter::new(2022, 4).unwrap(), 4_194_199);
    let rates = rates();
    let targets = [
        CurrencyCode::USD,
        CurrencyCode::CAD,
        CurrencyCode::EUR,
        CurrencyCode::GBP,
    ];

    c.bench_function("convert_four_targets", |b| {
        b.iter(|| currency_converter::convert(black_box(&record), black_box(&targets), &rates));
    });
}

fn bench_metrics(c: &mut Criterion) {
    let records = history();
    let current = records.first().unwrap().clone();
    let window: Vec<_> = records.iter().skip(1).cloned().collect();

    c.bench_function("compute_current_quarter", |b| {
        b.iter(|| metrics_calculator::compute(black_box(&current), &[], None));
    });

    let full = QuarterlyHistory::from_window(current.clone(), window);
    c.bench_function("compute_full_history", |b| {
        b.iter(|| metrics_calculator::compute_history(black_box(&full), None));
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let pipeline = DerivationPipeline::new(
        Arc::new(InMemoryFinancialRecordRepository::with_records(history())),
        Arc::new(InMemoryCompanyRegistry::new()),
        Arc::new(InMemoryDerivationStore::new()),
        Arc::new(StaticFxRateProvider::new(
            CurrencyCode::USD,
            [(CurrencyCode::CAD, Decimal::new(13554, 4))],
        )),
        PipelineConfig::default(),
    );
    let request = DerivationRequest::new(CompanyId::new("bench"), FiscalQuarter::new(2022, 4).unwrap());

    c.bench_function("pipeline_derive_cached_rates", |b| {
        b.to_async(&runtime)
            .iter(|| async { pipeline.derive(black_box(&request)).await.unwrap() });
    });
}

criterion_group!(benches, bench_conversion, bench_metrics, bench_pipeline);
criterion_main!(benches);
