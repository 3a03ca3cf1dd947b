//! # Derived Metrics Record
//!
//! Engine output for one company-quarter.
//!
//! A record is produced fresh on every pipeline run and is never partially
//! updated: a re-run replaces it whole. Every metric is nullable; `None`
//! means "not computable from the available inputs", never zero.
//!
//! This module provides:
//! - [`DerivedMetricsRecord`] - The keyed output record
//! - [`MetricValues`] - The metric catalog
//! - [`DerivedMetric`] - Names of catalog entries
//! - [`Runway`] - Finite or infinite cash runway
//! - [`HistoryCoverage`] - Which history windows were available

use crate::domain::errors::DomainResult;
use crate::domain::value_objects::{CompanyId, CurrencyCode, FiscalQuarter, Timestamp};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Months of operation sustainable at the current burn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Runway {
    /// Finite runway in months.
    Months(Decimal),
    /// No net burn: the company is not consuming cash.
    Infinite,
}

impl Runway {
    /// Returns the finite month count, if any.
    #[inline]
    #[must_use]
    pub fn months(&self) -> Option<Decimal> {
        match self {
            Self::Months(months) => Some(*months),
            Self::Infinite => None,
        }
    }

    /// Returns true for an infinite runway.
    #[inline]
    #[must_use]
    pub fn is_infinite(&self) -> bool {
        matches!(self, Self::Infinite)
    }
}

impl fmt::Display for Runway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Months(months) => write!(f, "{} months", months.round_dp(2)),
            Self::Infinite => write!(f, "infinite"),
        }
    }
}

/// Which history windows were available when a record was computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HistoryCoverage {
    /// Record for exactly the previous quarter was present.
    pub prior_quarter: bool,
    /// Consecutive trailing quarters directly preceding the current one (0-3).
    pub trailing_quarters: u8,
    /// Record for exactly one year earlier was present.
    pub year_ago: bool,
    /// Four consecutive quarters ending one year earlier were present.
    pub year_ago_ltm: bool,
}

impl HistoryCoverage {
    /// Returns true if LTM aggregates were computable.
    #[inline]
    #[must_use]
    pub fn has_ltm(&self) -> bool {
        self.trailing_quarters >= 3
    }
}

/// Name of one entry in the metric catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum DerivedMetric {
    Arr,
    RecurringPercentageRevenue,
    RevenuePerFte,
    GrossProfitPerFte,
    EmployeeGrowthRate,
    ChangeInCash,
    RevenueGrowth,
    MonthlyCashBurn,
    RunwayMonths,
    SalesMarketingPercentageRevenue,
    TotalOperatingPercentageRevenue,
    GrossProfitMargin,
    YoyGrowthRevenue,
    YoyGrowthProfit,
    YoyGrowthEmployees,
    LtmTotalRevenue,
    LtmGrossProfit,
    LtmSalesMarketingExpense,
    LtmOperatingExpense,
    LtmEbitda,
    LtmNetIncome,
    LtmGrossMargin,
    LtmEbitdaMargin,
    LtmNetIncomeMargin,
    YoyGrowthLtmRevenue,
    EnterpriseValue,
    EvByEquityRaisedPlusDebt,
    ValuationToRevenue,
}

impl DerivedMetric {
    /// The full catalog, in output order.
    pub const ALL: [Self; 28] = [
        Self::Arr,
        Self::RecurringPercentageRevenue,
        Self::RevenuePerFte,
        Self::GrossProfitPerFte,
        Self::EmployeeGrowthRate,
        Self::ChangeInCash,
        Self::RevenueGrowth,
        Self::MonthlyCashBurn,
        Self::RunwayMonths,
        Self::SalesMarketingPercentageRevenue,
        Self::TotalOperatingPercentageRevenue,
        Self::GrossProfitMargin,
        Self::YoyGrowthRevenue,
        Self::YoyGrowthProfit,
        Self::YoyGrowthEmployees,
        Self::LtmTotalRevenue,
        Self::LtmGrossProfit,
        Self::LtmSalesMarketingExpense,
        Self::LtmOperatingExpense,
        Self::LtmEbitda,
        Self::LtmNetIncome,
        Self::LtmGrossMargin,
        Self::LtmEbitdaMargin,
        Self::LtmNetIncomeMargin,
        Self::YoyGrowthLtmRevenue,
        Self::EnterpriseValue,
        Self::EvByEquityRaisedPlusDebt,
        Self::ValuationToRevenue,
    ];

    /// Ratio metrics whose denominator is the quarter's total revenue.
    pub const REVENUE_RATIOS: [Self; 5] = [
        Self::RecurringPercentageRevenue,
        Self::SalesMarketingPercentageRevenue,
        Self::TotalOperatingPercentageRevenue,
        Self::GrossProfitMargin,
        Self::ValuationToRevenue,
    ];

    /// Snake-case metric name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Arr => "arr",
            Self::RecurringPercentageRevenue => "recurring_percentage_revenue",
            Self::RevenuePerFte => "revenue_per_fte",
            Self::GrossProfitPerFte => "gross_profit_per_fte",
            Self::EmployeeGrowthRate => "employee_growth_rate",
            Self::ChangeInCash => "change_in_cash",
            Self::RevenueGrowth => "revenue_growth",
            Self::MonthlyCashBurn => "monthly_cash_burn",
            Self::RunwayMonths => "runway_months",
            Self::SalesMarketingPercentageRevenue => "sales_marketing_percentage_revenue",
            Self::TotalOperatingPercentageRevenue => "total_operating_percentage_revenue",
            Self::GrossProfitMargin => "gross_profit_margin",
            Self::YoyGrowthRevenue => "yoy_growth_revenue",
            Self::YoyGrowthProfit => "yoy_growth_profit",
            Self::YoyGrowthEmployees => "yoy_growth_employees",
            Self::LtmTotalRevenue => "ltm_total_revenue",
            Self::LtmGrossProfit => "ltm_gross_profit",
            Self::LtmSalesMarketingExpense => "ltm_sales_marketing_expense",
            Self::LtmOperatingExpense => "ltm_operating_expense",
            Self::LtmEbitda => "ltm_ebitda",
            Self::LtmNetIncome => "ltm_net_income",
            Self::LtmGrossMargin => "ltm_gross_margin",
            Self::LtmEbitdaMargin => "ltm_ebitda_margin",
            Self::LtmNetIncomeMargin => "ltm_net_income_margin",
            Self::YoyGrowthLtmRevenue => "yoy_growth_ltm_revenue",
            Self::EnterpriseValue => "enterprise_value",
            Self::EvByEquityRaisedPlusDebt => "ev_by_equity_raised_plus_debt",
            Self::ValuationToRevenue => "valuation_to_revenue",
        }
    }
}

impl fmt::Display for DerivedMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The metric catalog. Percentages are expressed ×100.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct MetricValues {
    pub arr: Option<Decimal>,
    pub recurring_percentage_revenue: Option<Decimal>,
    pub revenue_per_fte: Option<Decimal>,
    pub gross_profit_per_fte: Option<Decimal>,
    pub employee_growth_rate: Option<Decimal>,
    pub change_in_cash: Option<Decimal>,
    pub revenue_growth: Option<Decimal>,
    pub monthly_cash_burn: Option<Decimal>,
    pub runway_months: Option<Runway>,
    pub sales_marketing_percentage_revenue: Option<Decimal>,
    pub total_operating_percentage_revenue: Option<Decimal>,
    pub gross_profit_margin: Option<Decimal>,
    pub yoy_growth_revenue: Option<Decimal>,
    pub yoy_growth_profit: Option<Decimal>,
    pub yoy_growth_employees: Option<Decimal>,
    pub ltm_total_revenue: Option<Decimal>,
    pub ltm_gross_profit: Option<Decimal>,
    pub ltm_sales_marketing_expense: Option<Decimal>,
    pub ltm_operating_expense: Option<Decimal>,
    pub ltm_ebitda: Option<Decimal>,
    pub ltm_net_income: Option<Decimal>,
    pub ltm_gross_margin: Option<Decimal>,
    pub ltm_ebitda_margin: Option<Decimal>,
    pub ltm_net_income_margin: Option<Decimal>,
    pub yoy_growth_ltm_revenue: Option<Decimal>,
    pub enterprise_value: Option<Decimal>,
    pub ev_by_equity_raised_plus_debt: Option<Decimal>,
    pub valuation_to_revenue: Option<Decimal>,
}

impl MetricValues {
    /// Returns one metric by name.
    ///
    /// `RunwayMonths` yields the finite month count only; use
    /// [`MetricValues::runway_months`] to distinguish infinite from absent.
    #[must_use]
    pub fn get(&self, metric: DerivedMetric) -> Option<Decimal> {
        match metric {
            DerivedMetric::Arr => self.arr,
            DerivedMetric::RecurringPercentageRevenue => self.recurring_percentage_revenue,
            DerivedMetric::RevenuePerFte => self.revenue_per_fte,
            DerivedMetric::GrossProfitPerFte => self.gross_profit_per_fte,
            DerivedMetric::EmployeeGrowthRate => self.employee_growth_rate,
            DerivedMetric::ChangeInCash => self.change_in_cash,
            DerivedMetric::RevenueGrowth => self.revenue_growth,
            DerivedMetric::MonthlyCashBurn => self.monthly_cash_burn,
            DerivedMetric::RunwayMonths => self.runway_months.and_then(|r| r.months()),
            DerivedMetric::SalesMarketingPercentageRevenue => {
                self.sales_marketing_percentage_revenue
            }
            DerivedMetric::TotalOperatingPercentageRevenue => {
                self.total_operating_percentage_revenue
            }
            DerivedMetric::GrossProfitMargin => self.gross_profit_margin,
            DerivedMetric::YoyGrowthRevenue => self.yoy_growth_revenue,
            DerivedMetric::YoyGrowthProfit => self.yoy_growth_profit,
            DerivedMetric::YoyGrowthEmployees => self.yoy_growth_employees,
            DerivedMetric::LtmTotalRevenue => self.ltm_total_revenue,
            DerivedMetric::LtmGrossProfit => self.ltm_gross_profit,
            DerivedMetric::LtmSalesMarketingExpense => self.ltm_sales_marketing_expense,
            DerivedMetric::LtmOperatingExpense => self.ltm_operating_expense,
            DerivedMetric::LtmEbitda => self.ltm_ebitda,
            DerivedMetric::LtmNetIncome => self.ltm_net_income,
            DerivedMetric::LtmGrossMargin => self.ltm_gross_margin,
            DerivedMetric::LtmEbitdaMargin => self.ltm_ebitda_margin,
            DerivedMetric::LtmNetIncomeMargin => self.ltm_net_income_margin,
            DerivedMetric::YoyGrowthLtmRevenue => self.yoy_growth_ltm_revenue,
            DerivedMetric::EnterpriseValue => self.enterprise_value,
            DerivedMetric::EvByEquityRaisedPlusDebt => self.ev_by_equity_raised_plus_debt,
            DerivedMetric::ValuationToRevenue => self.valuation_to_revenue,
        }
    }

    /// Names of the metrics that are null.
    #[must_use]
    pub fn missing(&self) -> Vec<DerivedMetric> {
        DerivedMetric::ALL
            .into_iter()
            .filter(|metric| match metric {
                DerivedMetric::RunwayMonths => self.runway_months.is_none(),
                other => self.get(*other).is_none(),
            })
            .collect()
    }
}

/// Derived metrics for one company-quarter in one currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedMetricsRecord {
    company_id: CompanyId,
    reporting_year: i32,
    reporting_quarter: u8,
    currency: CurrencyCode,
    fiscal_reporting_date: NaiveDate,
    computed_at: Timestamp,
    values: MetricValues,
    coverage: HistoryCoverage,
}

impl DerivedMetricsRecord {
    /// Assembles a record keyed like its source financial record.
    #[must_use]
    pub fn new(
        company_id: CompanyId,
        (reporting_year, reporting_quarter): (i32, u8),
        currency: CurrencyCode,
        fiscal_reporting_date: NaiveDate,
        values: MetricValues,
        coverage: HistoryCoverage,
    ) -> Self {
        Self {
            company_id,
            reporting_year,
            reporting_quarter,
            currency,
            fiscal_reporting_date,
            computed_at: Timestamp::now(),
            values,
            coverage,
        }
    }

    /// Returns the company identifier.
    #[inline]
    #[must_use]
    pub fn company_id(&self) -> &CompanyId {
        &self.company_id
    }

    /// Returns the reporting year.
    #[inline]
    #[must_use]
    pub fn reporting_year(&self) -> i32 {
        self.reporting_year
    }

    /// Returns the reporting quarter.
    #[inline]
    #[must_use]
    pub fn reporting_quarter(&self) -> u8 {
        self.reporting_quarter
    }

    /// Returns the fiscal period the metrics describe.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPeriod` if the source record carried an
    /// out-of-range period.
    pub fn period(&self) -> DomainResult<FiscalQuarter> {
        FiscalQuarter::new(self.reporting_year, self.reporting_quarter)
    }

    /// Returns the currency monetary metrics are expressed in.
    #[inline]
    #[must_use]
    pub fn currency(&self) -> CurrencyCode {
        self.currency
    }

    /// Returns the fiscal reporting date.
    #[inline]
    #[must_use]
    pub fn fiscal_reporting_date(&self) -> NaiveDate {
        self.fiscal_reporting_date
    }

    /// Returns when the record was computed.
    #[inline]
    #[must_use]
    pub fn computed_at(&self) -> Timestamp {
        self.computed_at
    }

    /// Returns the full metric catalog.
    #[inline]
    #[must_use]
    pub fn values(&self) -> &MetricValues {
        &self.values
    }

    /// Returns the history coverage used for the computation.
    #[inline]
    #[must_use]
    pub fn coverage(&self) -> HistoryCoverage {
        self.coverage
    }

    /// Returns one metric by name.
    #[inline]
    #[must_use]
    pub fn get(&self, metric: DerivedMetric) -> Option<Decimal> {
        self.values.get(metric)
    }

    /// Annual recurring revenue.
    #[inline]
    #[must_use]
    pub fn arr(&self) -> Option<Decimal> {
        self.values.arr
    }

    /// Cash runway.
    #[inline]
    #[must_use]
    pub fn runway(&self) -> Option<Runway> {
        self.values.runway_months
    }
}

impl fmt::Display for DerivedMetricsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DerivedMetrics({} {}-Q{} {} missing={})",
            self.company_id,
            self.reporting_year,
            self.reporting_quarter,
            self.currency,
            self.values.missing().len()
        )
    }
}
