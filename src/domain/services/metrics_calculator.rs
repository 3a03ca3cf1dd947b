//! # Derivative Metrics Calculator
//!
//! Computes the metric catalog for the latest quarter of a company's
//! history.
//!
//! Every metric is computed independently: a metric whose inputs are
//! missing, whose denominator is zero, or whose arithmetic overflows is
//! `None`, and never prevents the remaining metrics from being computed.
//!
//! History is matched by period, not by position. The prior-quarter record
//! must be exactly `P-1`, the year-ago record exactly `P-4`, and LTM
//! aggregates need the three consecutive quarters `P-3..P-1`. Records for
//! any other period are ignored.
//!
//! # Examples
//!
//! ```
//! use portfolio_derivations::domain::entities::FinancialRecord;
//! use portfolio_derivations::domain::services::metrics_calculator::compute;
//! use portfolio_derivations::domain::value_objects::{CompanyId, CurrencyCode, FiscalQuarter};
//! use rust_decimal::Decimal;
//!
//! let current = FinancialRecord::builder(
//!     CompanyId::new("acme"),
//!     FiscalQuarter::new(2022, 4).unwrap(),
//!     CurrencyCode::USD,
//! )
//! .total_revenue(Decimal::ZERO)
//! .cash_burn(Decimal::new(10, 0))
//! .build();
//!
//! let metrics = compute(&current, &[], None);
//! assert_eq!(metrics.values().gross_profit_margin, None);
//! assert!(metrics.runway().unwrap().is_infinite());
//! ```

use crate::domain::entities::{
    DerivedMetricsRecord, FinancialRecord, HistoryCoverage, MetricValues, Runway,
    ValuationInputs,
};
use crate::domain::value_objects::arithmetic::{
    checked_sum, growth_percentage, percentage, ratio,
};
use crate::domain::value_objects::{CheckedArithmetic, FiscalQuarter};
use rust_decimal::Decimal;

const QUARTERS_PER_YEAR: Decimal = Decimal::from_parts(4, 0, 0, false, 0);
const MONTHS_PER_QUARTER: Decimal = Decimal::from_parts(3, 0, 0, false, 0);

/// Financial history needed to derive metrics for one quarter.
#[derive(Debug, Clone)]
pub struct QuarterlyHistory {
    current: FinancialRecord,
    trailing: Vec<FinancialRecord>,
    year_ago: Option<FinancialRecord>,
    year_ago_trailing: Vec<FinancialRecord>,
}

impl QuarterlyHistory {
    /// History with only the current quarter.
    #[must_use]
    pub fn new(current: FinancialRecord) -> Self {
        Self {
            current,
            trailing: Vec::new(),
            year_ago: None,
            year_ago_trailing: Vec::new(),
        }
    }

    /// Sets up to three trailing quarters, most recent last.
    #[must_use]
    pub fn with_trailing(mut self, trailing: Vec<FinancialRecord>) -> Self {
        self.trailing = trailing;
        self
    }

    /// Sets the record one year before the current quarter.
    #[must_use]
    pub fn with_year_ago(mut self, year_ago: Option<FinancialRecord>) -> Self {
        self.year_ago = year_ago;
        self
    }

    /// Sets the three quarters preceding the year-ago record, most recent last.
    #[must_use]
    pub fn with_year_ago_trailing(mut self, trailing: Vec<FinancialRecord>) -> Self {
        self.year_ago_trailing = trailing;
        self
    }

    /// Sorts a window of records into a history for `current`.
    ///
    /// Records are placed by period: `P-3..P-1` become trailing quarters,
    /// `P-4` the year-ago record and `P-7..P-5` its trailing quarters.
    /// Records outside `P-7..P-1` and records with invalid periods are ignored.
    #[must_use]
    pub fn from_window<I>(current: FinancialRecord, window: I) -> Self
    where
        I: IntoIterator<Item = FinancialRecord>,
    {
        let Ok(period) = current.period() else {
            return Self::new(current);
        };
        let mut records: Vec<(i64, FinancialRecord)> = window
            .into_iter()
            .filter_map(|record| {
                let back = period.quarters_since(&record.period().ok()?);
                (1..=7).contains(&back).then_some((back, record))
            })
            .collect();
        records.sort_by(|a, b| b.0.cmp(&a.0));

        let mut history = Self::new(current);
        for (back, record) in records {
            match back {
                1..=3 => history.trailing.push(record),
                4 => history.year_ago = Some(record),
                _ => history.year_ago_trailing.push(record),
            }
        }
        history
    }

    /// The quarter metrics are computed for.
    #[inline]
    #[must_use]
    pub fn current(&self) -> &FinancialRecord {
        &self.current
    }

    /// Trailing quarters, most recent last.
    #[inline]
    #[must_use]
    pub fn trailing(&self) -> &[FinancialRecord] {
        &self.trailing
    }

    /// The year-ago record, if present.
    #[inline]
    #[must_use]
    pub fn year_ago(&self) -> Option<&FinancialRecord> {
        self.year_ago.as_ref()
    }

    /// Trailing quarters of the year-ago record, most recent last.
    #[inline]
    #[must_use]
    pub fn year_ago_trailing(&self) -> &[FinancialRecord] {
        &self.year_ago_trailing
    }

    /// Every record in the history, current first.
    pub fn records(&self) -> impl Iterator<Item = &FinancialRecord> {
        std::iter::once(&self.current)
            .chain(self.trailing.iter())
            .chain(self.year_ago.iter())
            .chain(self.year_ago_trailing.iter())
    }
}

/// Computes metrics from the current quarter, up to three trailing quarters
/// (most recent last) and the year-ago record.
///
/// Valuation metrics are null; use [`compute_history`] to supply valuation
/// inputs and the year-ago LTM window.
#[must_use]
pub fn compute(
    current: &FinancialRecord,
    trailing_quarters: &[FinancialRecord],
    year_ago: Option<&FinancialRecord>,
) -> DerivedMetricsRecord {
    derive(current, trailing_quarters, year_ago, &[], None)
}

/// Computes metrics for a full history.
///
/// `valuation` must be denominated in the current record's currency;
/// inputs in any other currency are ignored and valuation metrics are null.
#[must_use]
pub fn compute_history(
    history: &QuarterlyHistory,
    valuation: Option<&ValuationInputs>,
) -> DerivedMetricsRecord {
    derive(
        &history.current,
        &history.trailing,
        history.year_ago.as_ref(),
        &history.year_ago_trailing,
        valuation,
    )
}

fn derive(
    current: &FinancialRecord,
    trailing: &[FinancialRecord],
    year_ago: Option<&FinancialRecord>,
    year_ago_trailing: &[FinancialRecord],
    valuation: Option<&ValuationInputs>,
) -> DerivedMetricsRecord {
    let period = current.period().ok();

    let prior = period.and_then(|p| {
        trailing
            .last()
            .filter(|record| record.period().ok() == Some(p.previous()))
    });
    let ltm_window = period.and_then(|p| consecutive_window(p, trailing));
    let trailing_quarters = period.map_or(0, |p| consecutive_count(p, trailing));
    let year_ago = period.and_then(|p| {
        year_ago.filter(|record| record.period().ok() == Some(p.year_ago()))
    });
    let year_ago_window = year_ago.and_then(|ya| {
        let ya_period = ya.period().ok()?;
        consecutive_window(ya_period, year_ago_trailing)
    });

    let mut values = MetricValues::default();
    current_quarter_metrics(current, &mut values);
    if let Some(prior) = prior {
        quarter_over_quarter_metrics(current, prior, &mut values);
    }
    if let Some(year_ago) = year_ago {
        year_over_year_metrics(current, year_ago, &mut values);
    }
    if let Some(window) = &ltm_window {
        ltm_metrics(current, window, &mut values);
        if let (Some(ya), Some(ya_window)) = (year_ago, &year_ago_window) {
            let ya_ltm_revenue = ltm_sum(ya, ya_window, FinancialRecord::total_revenue);
            values.yoy_growth_ltm_revenue = values
                .ltm_total_revenue
                .zip(ya_ltm_revenue)
                .and_then(|(now, then)| growth_percentage(now, then));
        }
    }
    match valuation {
        Some(inputs) if inputs.currency == current.currency() => {
            valuation_metrics(current, inputs, &mut values);
        }
        Some(inputs) => {
            tracing::debug!(
                valuation_currency = %inputs.currency,
                record_currency = %current.currency(),
                "valuation inputs not in record currency, skipping"
            );
        }
        None => {}
    }

    let coverage = HistoryCoverage {
        prior_quarter: prior.is_some(),
        trailing_quarters,
        year_ago: year_ago.is_some(),
        year_ago_ltm: year_ago_window.is_some(),
    };

    DerivedMetricsRecord::new(
        current.company_id().clone(),
        (current.reporting_year(), current.reporting_quarter()),
        current.currency(),
        current.fiscal_reporting_date(),
        values,
        coverage,
    )
}

fn current_quarter_metrics(current: &FinancialRecord, values: &mut MetricValues) {
    let revenue = current.total_revenue();
    let employees = Decimal::from(current.employees());

    values.arr = current.recurring_revenue().safe_mul(QUARTERS_PER_YEAR).ok();
    values.recurring_percentage_revenue = percentage(current.recurring_revenue(), revenue);
    values.revenue_per_fte = ratio(revenue, employees);
    values.gross_profit_per_fte = ratio(current.gross_profit(), employees);
    values.sales_marketing_percentage_revenue =
        percentage(current.sales_marketing_expense(), revenue);
    values.total_operating_percentage_revenue =
        percentage(current.total_operating_expense(), revenue);
    values.gross_profit_margin = percentage(current.gross_profit(), revenue);

    let burn = -current.cash_burn();
    values.monthly_cash_burn = ratio(burn, MONTHS_PER_QUARTER);
    values.runway_months = values.monthly_cash_burn.and_then(|monthly| {
        if monthly > Decimal::ZERO {
            // cash / (burn / 3) == 3 × cash / burn, with one rounding step.
            // Overflow leaves runway null; only a non-burning company is infinite.
            current
                .cash_balance()
                .safe_mul(MONTHS_PER_QUARTER)
                .ok()
                .and_then(|cash| ratio(cash, burn))
                .map(Runway::Months)
        } else {
            Some(Runway::Infinite)
        }
    });
}

fn quarter_over_quarter_metrics(
    current: &FinancialRecord,
    prior: &FinancialRecord,
    values: &mut MetricValues,
) {
    values.employee_growth_rate = growth_percentage(
        Decimal::from(current.employees()),
        Decimal::from(prior.employees()),
    );
    values.change_in_cash = current.cash_balance().safe_sub(prior.cash_balance()).ok();
    values.revenue_growth = growth_percentage(current.total_revenue(), prior.total_revenue());
}

fn year_over_year_metrics(
    current: &FinancialRecord,
    year_ago: &FinancialRecord,
    values: &mut MetricValues,
) {
    values.yoy_growth_revenue =
        growth_percentage(current.total_revenue(), year_ago.total_revenue());
    values.yoy_growth_profit = growth_percentage(current.gross_profit(), year_ago.gross_profit());
    values.yoy_growth_employees = growth_percentage(
        Decimal::from(current.employees()),
        Decimal::from(year_ago.employees()),
    );
}

fn ltm_metrics(current: &FinancialRecord, window: &[&FinancialRecord; 3], values: &mut MetricValues) {
    values.ltm_total_revenue = ltm_sum(current, window, FinancialRecord::total_revenue);
    values.ltm_gross_profit = ltm_sum(current, window, FinancialRecord::gross_profit);
    values.ltm_sales_marketing_expense =
        ltm_sum(current, window, FinancialRecord::sales_marketing_expense);
    values.ltm_operating_expense =
        ltm_sum(current, window, FinancialRecord::total_operating_expense);
    values.ltm_ebitda = ltm_sum(current, window, FinancialRecord::ebitda);
    values.ltm_net_income = ltm_sum(current, window, FinancialRecord::net_income);

    let revenue = values.ltm_total_revenue;
    let margin = |numerator: Option<Decimal>| {
        numerator
            .zip(revenue)
            .and_then(|(n, revenue)| percentage(n, revenue))
    };
    values.ltm_gross_margin = margin(values.ltm_gross_profit);
    values.ltm_ebitda_margin = margin(values.ltm_ebitda);
    values.ltm_net_income_margin = margin(values.ltm_net_income);
}

fn valuation_metrics(
    current: &FinancialRecord,
    inputs: &ValuationInputs,
    values: &mut MetricValues,
) {
    let debt = current.debt_outstanding();
    values.enterprise_value = inputs
        .post_money_valuation
        .zip(debt)
        .and_then(|(valuation, debt)| {
            valuation
                .safe_add(debt)
                .and_then(|v| v.safe_sub(current.cash_balance()))
                .ok()
        });
    values.ev_by_equity_raised_plus_debt = values
        .enterprise_value
        .zip(inputs.equity_raised.zip(debt))
        .and_then(|(ev, (equity, debt))| ratio(ev, equity.safe_add(debt).ok()?));
    values.valuation_to_revenue = inputs.post_money_valuation.and_then(|valuation| {
        let annualized = current.total_revenue().safe_mul(QUARTERS_PER_YEAR).ok()?;
        ratio(valuation, annualized)
    });
}

fn ltm_sum(
    current: &FinancialRecord,
    window: &[&FinancialRecord; 3],
    field: fn(&FinancialRecord) -> Decimal,
) -> Option<Decimal> {
    checked_sum(window.iter().map(|record| field(record)).chain([field(current)])).ok()
}

/// The three records for `period-3..period-1`, oldest first, when all are
/// present at the tail of `trailing`.
fn consecutive_window(
    period: FiscalQuarter,
    trailing: &[FinancialRecord],
) -> Option<[&FinancialRecord; 3]> {
    let [.., a, b, c] = trailing else {
        return None;
    };
    let is_back = |record: &FinancialRecord, back: u32| {
        record.period().ok() == Some(period.quarters_back(back))
    };
    (is_back(a, 3) && is_back(b, 2) && is_back(c, 1)).then_some([a, b, c])
}

/// Number of consecutive quarters directly preceding `period` at the tail
/// of `trailing`, capped at three.
fn consecutive_count(period: FiscalQuarter, trailing: &[FinancialRecord]) -> u8 {
    let mut count = 0u8;
    for (back, record) in (1u32..=3).zip(trailing.iter().rev()) {
        if record.period().ok() != Some(period.quarters_back(back)) {
            break;
        }
        count += 1;
    }
    count
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::entities::DerivedMetric;
    use crate::domain::value_objects::{CompanyId, CurrencyCode};
    use proptest::prelude::*;

    fn dec(value: i64) -> Decimal {
        Decimal::from(value)
    }

    fn approx(actual: Option<Decimal>, expected: Decimal, tolerance: Decimal) -> bool {
        actual.is_some_and(|v| (v - expected).abs() <= tolerance)
    }

    fn quarter(year: i32, quarter: u8) -> FiscalQuarter {
        FiscalQuarter::new(year, quarter).unwrap()
    }

    fn record(year: i32, q: u8, revenue: i64) -> FinancialRecord {
        FinancialRecord::builder(CompanyId::new("c1"), quarter(year, q), CurrencyCode::USD)
            .total_revenue(dec(revenue))
            .recurring_revenue(dec(revenue / 2))
            .gross_profit(dec(revenue / 4))
            .sales_marketing_expense(dec(revenue / 10))
            .total_operating_expense(dec(revenue / 5))
            .ebitda(dec(revenue / 20))
            .net_income(dec(-revenue / 20))
            .cash_burn(dec(-300))
            .cash_balance(dec(9_000))
            .employees(10)
            .build()
    }

    fn scenario() -> FinancialRecord {
        FinancialRecord::builder(CompanyId::new("reciLI8sBuJE9vEAv"), quarter(2022, 4), CurrencyCode::USD)
            .total_revenue(dec(4_194_199))
            .recurring_revenue(dec(3_912_138))
            .gross_profit(dec(2_730_244))
            .sales_marketing_expense(dec(1_470_828))
            .total_operating_expense(dec(7_195_136))
            .ebitda(dec(-4_464_892))
            .net_income(dec(-4_339_102))
            .cash_burn(dec(-4_464_892))
            .cash_balance(dec(32_407_138))
            .employees(100)
            .build()
    }

    mod current_quarter {
        use super::*;

        #[test]
        fn reference_scenario() {
            let metrics = compute(&scenario(), &[], None);
            let cent = Decimal::new(1, 2);
            assert_eq!(metrics.arr(), Some(dec(15_648_552)));
            assert!(approx(
                metrics.values().recurring_percentage_revenue,
                Decimal::new(9327, 2),
                cent
            ));
            assert!(approx(
                metrics.values().revenue_per_fte,
                Decimal::new(4_194_199, 2),
                cent
            ));
            assert!(approx(
                metrics.values().monthly_cash_burn,
                Decimal::new(148_829_733, 2),
                cent
            ));
            assert!(approx(
                metrics.runway().and_then(|r| r.months()),
                Decimal::new(2178, 2),
                cent
            ));
        }

        #[test]
        fn margins_are_percentages() {
            let metrics = compute(&record(2022, 4, 1_000), &[], None);
            assert_eq!(metrics.values().gross_profit_margin, Some(dec(25)));
            assert_eq!(metrics.values().sales_marketing_percentage_revenue, Some(dec(10)));
            assert_eq!(metrics.values().total_operating_percentage_revenue, Some(dec(20)));
            assert_eq!(metrics.values().recurring_percentage_revenue, Some(dec(50)));
            assert_eq!(metrics.values().gross_profit_per_fte, Some(dec(25)));
        }

        #[test]
        fn zero_revenue_nulls_revenue_ratios() {
            let metrics = compute(&record(2022, 4, 0), &[], None);
            for metric in DerivedMetric::REVENUE_RATIOS {
                assert_eq!(metrics.get(metric), None, "{metric} should be null");
            }
            assert!(metrics.runway().is_some());
            assert_eq!(metrics.arr(), Some(Decimal::ZERO));
        }

        #[test]
        fn zero_employees_nulls_per_fte() {
            let current = FinancialRecord::builder(CompanyId::new("c1"), quarter(2022, 4), CurrencyCode::USD)
                .total_revenue(dec(100))
                .build();
            let metrics = compute(&current, &[], None);
            assert_eq!(metrics.values().revenue_per_fte, None);
            assert_eq!(metrics.values().gross_profit_per_fte, None);
        }

        #[test]
        fn cash_generation_gives_negative_burn_and_infinite_runway() {
            let current = FinancialRecord::builder(CompanyId::new("c1"), quarter(2022, 4), CurrencyCode::USD)
                .cash_burn(dec(300))
                .cash_balance(dec(1_000))
                .build();
            let metrics = compute(&current, &[], None);
            assert_eq!(metrics.values().monthly_cash_burn, Some(dec(-100)));
            assert_eq!(metrics.runway(), Some(Runway::Infinite));
        }

        #[test]
        fn zero_burn_is_infinite_runway() {
            let current = FinancialRecord::builder(CompanyId::new("c1"), quarter(2022, 4), CurrencyCode::USD)
                .cash_balance(dec(1_000))
                .build();
            let metrics = compute(&current, &[], None);
            assert_eq!(metrics.values().monthly_cash_burn, Some(Decimal::ZERO));
            assert_eq!(metrics.runway(), Some(Runway::Infinite));
        }

        #[test]
        fn runway_divides_cash_by_monthly_burn() {
            let metrics = compute(&record(2022, 4, 1_000), &[], None);
            assert_eq!(metrics.values().monthly_cash_burn, Some(dec(100)));
            assert_eq!(metrics.runway(), Some(Runway::Months(dec(90))));
        }

        #[test]
        fn runway_overflow_is_null_not_infinite() {
            let current = FinancialRecord::builder(CompanyId::new("c1"), quarter(2022, 4), CurrencyCode::USD)
                .cash_burn(Decimal::new(-1, 14))
                .cash_balance(dec(1_000_000_000_000_000))
                .build();
            assert!(current.validate().is_ok());

            let metrics = compute(&current, &[], None);
            assert!(metrics.values().monthly_cash_burn.unwrap() > Decimal::ZERO);
            assert_eq!(metrics.runway(), None);
            assert_eq!(metrics.arr(), Some(Decimal::ZERO));
        }

        #[test]
        fn keyed_like_source_record() {
            let metrics = compute(&scenario(), &[], None);
            assert_eq!(metrics.company_id().as_str(), "reciLI8sBuJE9vEAv");
            assert_eq!(metrics.period().unwrap(), quarter(2022, 4));
            assert_eq!(metrics.currency(), CurrencyCode::USD);
        }
    }

    mod quarter_over_quarter {
        use super::*;

        #[test]
        fn growth_against_prior_quarter() {
            let prior = FinancialRecord::builder(CompanyId::new("c1"), quarter(2022, 3), CurrencyCode::USD)
                .total_revenue(dec(800))
                .cash_balance(dec(10_000))
                .employees(8)
                .build();
            let metrics = compute(&record(2022, 4, 1_000), &[prior], None);
            assert_eq!(metrics.values().revenue_growth, Some(dec(25)));
            assert_eq!(metrics.values().employee_growth_rate, Some(dec(25)));
            assert_eq!(metrics.values().change_in_cash, Some(dec(-1_000)));
            assert!(metrics.coverage().prior_quarter);
        }

        #[test]
        fn non_adjacent_quarter_is_not_prior() {
            let metrics = compute(&record(2022, 4, 1_000), &[record(2022, 2, 800)], None);
            assert_eq!(metrics.values().revenue_growth, None);
            assert_eq!(metrics.values().change_in_cash, None);
            assert!(!metrics.coverage().prior_quarter);
        }

        #[test]
        fn prior_with_zero_revenue_nulls_growth_only() {
            let metrics = compute(&record(2022, 4, 1_000), &[record(2022, 3, 0)], None);
            assert_eq!(metrics.values().revenue_growth, None);
            assert_eq!(metrics.values().change_in_cash, Some(Decimal::ZERO));
        }
    }

    mod ltm {
        use super::*;

        fn trailing() -> Vec<FinancialRecord> {
            vec![
                record(2022, 1, 700),
                record(2022, 2, 800),
                record(2022, 3, 900),
            ]
        }

        #[test]
        fn four_consecutive_quarters_sum() {
            let metrics = compute(&record(2022, 4, 1_000), &trailing(), None);
            assert_eq!(metrics.values().ltm_total_revenue, Some(dec(3_400)));
            assert_eq!(metrics.values().ltm_gross_profit, Some(dec(850)));
            assert_eq!(metrics.values().ltm_sales_marketing_expense, Some(dec(340)));
            assert_eq!(metrics.values().ltm_operating_expense, Some(dec(680)));
            assert_eq!(metrics.values().ltm_ebitda, Some(dec(170)));
            assert_eq!(metrics.values().ltm_net_income, Some(dec(-170)));
            assert_eq!(metrics.values().ltm_gross_margin, Some(dec(25)));
            assert_eq!(metrics.values().ltm_ebitda_margin, Some(dec(5)));
            assert_eq!(metrics.values().ltm_net_income_margin, Some(dec(-5)));
            assert_eq!(metrics.coverage().trailing_quarters, 3);
        }

        #[test]
        fn fewer_than_four_quarters_is_null() {
            let short = vec![record(2022, 2, 800), record(2022, 3, 900)];
            let metrics = compute(&record(2022, 4, 1_000), &short, None);
            assert_eq!(metrics.values().ltm_total_revenue, None);
            assert_eq!(metrics.values().ltm_gross_margin, None);
            assert_eq!(metrics.coverage().trailing_quarters, 2);
        }

        #[test]
        fn gap_in_history_is_null() {
            let gapped = vec![
                record(2021, 4, 600),
                record(2022, 2, 800),
                record(2022, 3, 900),
            ];
            let metrics = compute(&record(2022, 4, 1_000), &gapped, None);
            assert_eq!(metrics.values().ltm_total_revenue, None);
            assert_eq!(metrics.coverage().trailing_quarters, 2);
        }

        #[test]
        fn zero_ltm_revenue_nulls_margins() {
            let zeros = vec![record(2022, 1, 0), record(2022, 2, 0), record(2022, 3, 0)];
            let metrics = compute(&record(2022, 4, 0), &zeros, None);
            assert_eq!(metrics.values().ltm_total_revenue, Some(Decimal::ZERO));
            assert_eq!(metrics.values().ltm_gross_margin, None);
        }
    }

    mod year_over_year {
        use super::*;

        #[test]
        fn exact_year_ago_is_used() {
            let year_ago = record(2021, 4, 500);
            let metrics = compute(&record(2022, 4, 1_000), &[], Some(&year_ago));
            assert_eq!(metrics.values().yoy_growth_revenue, Some(dec(100)));
            assert_eq!(metrics.values().yoy_growth_profit, Some(dec(100)));
            assert_eq!(metrics.values().yoy_growth_employees, Some(Decimal::ZERO));
            assert!(metrics.coverage().year_ago);
        }

        #[test]
        fn wrong_quarter_is_ignored() {
            let not_a_year = record(2021, 3, 500);
            let metrics = compute(&record(2022, 4, 1_000), &[], Some(&not_a_year));
            assert_eq!(metrics.values().yoy_growth_revenue, None);
            assert_eq!(metrics.values().yoy_growth_employees, None);
        }

        #[test]
        fn missing_year_ago_is_null() {
            let metrics = compute(&record(2022, 4, 1_000), &[], None);
            assert_eq!(metrics.values().yoy_growth_revenue, None);
            assert_eq!(metrics.values().yoy_growth_ltm_revenue, None);
        }

        #[test]
        fn ltm_growth_needs_both_windows() {
            let window: Vec<_> = (1..=7)
                .map(|back| {
                    let p = quarter(2022, 4).quarters_back(back);
                    record(p.year(), p.quarter(), 100 * (8 - i64::from(back)))
                })
                .collect();
            let history = QuarterlyHistory::from_window(record(2022, 4, 800), window);
            let metrics = compute_history(&history, None);
            // current window 500+600+700+800, year-ago window 100+200+300+400
            assert_eq!(metrics.values().ltm_total_revenue, Some(dec(2_600)));
            assert_eq!(metrics.values().yoy_growth_ltm_revenue, Some(dec(160)));
            assert!(metrics.coverage().year_ago_ltm);
        }

        #[test]
        fn ltm_growth_null_without_year_ago_window() {
            let window = vec![
                record(2021, 4, 400),
                record(2022, 1, 500),
                record(2022, 2, 600),
                record(2022, 3, 700),
            ];
            let history = QuarterlyHistory::from_window(record(2022, 4, 800), window);
            let metrics = compute_history(&history, None);
            assert!(metrics.values().ltm_total_revenue.is_some());
            assert!(metrics.values().yoy_growth_revenue.is_some());
            assert_eq!(metrics.values().yoy_growth_ltm_revenue, None);
        }
    }

    mod valuation {
        use super::*;

        fn inputs(currency: CurrencyCode) -> ValuationInputs {
            ValuationInputs {
                currency,
                post_money_valuation: Some(dec(100_000)),
                equity_raised: Some(dec(40_000)),
            }
        }

        fn with_debt() -> FinancialRecord {
            FinancialRecord::builder(CompanyId::new("c1"), quarter(2022, 4), CurrencyCode::USD)
                .total_revenue(dec(1_000))
                .cash_balance(dec(20_000))
                .debt_outstanding(dec(10_000))
                .build()
        }

        #[test]
        fn enterprise_value_metrics() {
            let history = QuarterlyHistory::new(with_debt());
            let metrics = compute_history(&history, Some(&inputs(CurrencyCode::USD)));
            assert_eq!(metrics.values().enterprise_value, Some(dec(90_000)));
            assert_eq!(metrics.values().ev_by_equity_raised_plus_debt, Some(dec(180) / dec(100)));
            assert_eq!(metrics.values().valuation_to_revenue, Some(dec(25)));
        }

        #[test]
        fn missing_debt_nulls_enterprise_value_only() {
            let history = QuarterlyHistory::new(record(2022, 4, 1_000));
            let metrics = compute_history(&history, Some(&inputs(CurrencyCode::USD)));
            assert_eq!(metrics.values().enterprise_value, None);
            assert_eq!(metrics.values().ev_by_equity_raised_plus_debt, None);
            assert_eq!(metrics.values().valuation_to_revenue, Some(dec(25)));
        }

        #[test]
        fn foreign_currency_inputs_are_ignored() {
            let history = QuarterlyHistory::new(with_debt());
            let metrics = compute_history(&history, Some(&inputs(CurrencyCode::CAD)));
            assert_eq!(metrics.values().enterprise_value, None);
            assert_eq!(metrics.values().valuation_to_revenue, None);
        }

        #[test]
        fn plain_compute_leaves_valuation_null() {
            let metrics = compute(&with_debt(), &[], None);
            assert_eq!(metrics.values().enterprise_value, None);
        }
    }

    mod history_window {
        use super::*;

        #[test]
        fn places_records_by_period() {
            let window = vec![
                record(2022, 3, 1),
                record(2021, 4, 2),
                record(2021, 1, 3),
                record(2022, 1, 4),
                record(2023, 1, 5),
                record(2020, 4, 6),
            ];
            let history = QuarterlyHistory::from_window(record(2022, 4, 0), window);
            let trailing: Vec<_> = history
                .trailing()
                .iter()
                .map(|r| r.period().unwrap())
                .collect();
            assert_eq!(trailing, vec![quarter(2022, 1), quarter(2022, 3)]);
            assert_eq!(
                history.year_ago().map(|r| r.period().unwrap()),
                Some(quarter(2021, 4))
            );
            assert_eq!(history.year_ago_trailing().len(), 1);
            assert_eq!(history.records().count(), 5);
        }
    }

    proptest! {
        #[test]
        fn arr_is_exactly_four_times_recurring(cents in 0i64..1_000_000_000_000_000) {
            let recurring = Decimal::new(cents, 2);
            let current = FinancialRecord::builder(CompanyId::new("c"), quarter(2022, 4), CurrencyCode::USD)
                .recurring_revenue(recurring)
                .build();
            let metrics = compute(&current, &[], None);
            prop_assert_eq!(metrics.arr(), Some(recurring * Decimal::from(4)));
        }

        #[test]
        fn ratios_never_fail_on_zero_revenue(burn in -1_000_000i64..1_000_000, cash in 0i64..1_000_000) {
            let current = FinancialRecord::builder(CompanyId::new("c"), quarter(2022, 4), CurrencyCode::USD)
                .cash_burn(Decimal::from(burn))
                .cash_balance(Decimal::from(cash))
                .build();
            let metrics = compute(&current, &[], None);
            prop_assert_eq!(metrics.values().gross_profit_margin, None);
            prop_assert!(metrics.runway().is_some());
        }
    }
}
