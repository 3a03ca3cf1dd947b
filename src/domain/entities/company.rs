//! # Company Profile
//!
//! Registry-level facts about a portfolio company.
//!
//! Only the valuation inputs participate in derivation; the descriptive
//! fields travel with the profile so adapters can round-trip a full
//! registry entry.

use crate::domain::value_objects::{CompanyId, CurrencyCode};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reporting status of a company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportingStatus {
    /// Company submits quarterly figures.
    #[default]
    Active,
    /// Company no longer reports.
    Inactive,
    /// Company has been exited from the portfolio.
    Exited,
}

impl fmt::Display for ReportingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
            Self::Exited => "EXITED",
        };
        write!(f, "{s}")
    }
}

/// Valuation inputs for enterprise-value-class metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationInputs {
    /// Currency the amounts are denominated in.
    pub currency: CurrencyCode,
    /// Latest post-money valuation, if known.
    pub post_money_valuation: Option<Decimal>,
    /// Cumulative equity raised, if known.
    pub equity_raised: Option<Decimal>,
}

/// A company registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
    id: CompanyId,
    name: String,
    reporting_currency: CurrencyCode,
    #[serde(default)]
    reporting_status: ReportingStatus,
    #[serde(default)]
    fund: Option<String>,
    #[serde(default)]
    location_country: Option<String>,
    #[serde(default)]
    customer_type: Option<String>,
    #[serde(default)]
    revenue_type: Option<String>,
    #[serde(default)]
    equity_raised: Option<Decimal>,
    #[serde(default)]
    post_money_valuation: Option<Decimal>,
    #[serde(default)]
    year_end_date: Option<NaiveDate>,
}

impl CompanyProfile {
    /// Creates a profile with no valuation data.
    #[must_use]
    pub fn new(id: CompanyId, name: impl Into<String>, reporting_currency: CurrencyCode) -> Self {
        Self {
            id,
            name: name.into(),
            reporting_currency,
            reporting_status: ReportingStatus::Active,
            fund: None,
            location_country: None,
            customer_type: None,
            revenue_type: None,
            equity_raised: None,
            post_money_valuation: None,
            year_end_date: None,
        }
    }

    /// Sets the post-money valuation.
    #[must_use]
    pub fn with_post_money_valuation(mut self, value: Decimal) -> Self {
        self.post_money_valuation = Some(value);
        self
    }

    /// Sets the cumulative equity raised.
    #[must_use]
    pub fn with_equity_raised(mut self, value: Decimal) -> Self {
        self.equity_raised = Some(value);
        self
    }

    /// Sets the fund the company belongs to.
    #[must_use]
    pub fn with_fund(mut self, fund: impl Into<String>) -> Self {
        self.fund = Some(fund.into());
        self
    }

    /// Sets the reporting status.
    #[must_use]
    pub fn with_reporting_status(mut self, status: ReportingStatus) -> Self {
        self.reporting_status = status;
        self
    }

    /// Returns the company identifier.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &CompanyId {
        &self.id
    }

    /// Returns the company name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the currency the company reports in.
    #[inline]
    #[must_use]
    pub fn reporting_currency(&self) -> CurrencyCode {
        self.reporting_currency
    }

    /// Returns the reporting status.
    #[inline]
    #[must_use]
    pub fn reporting_status(&self) -> ReportingStatus {
        self.reporting_status
    }

    /// Returns the fund, if set.
    #[inline]
    #[must_use]
    pub fn fund(&self) -> Option<&str> {
        self.fund.as_deref()
    }

    /// Returns the post-money valuation, if known.
    #[inline]
    #[must_use]
    pub fn post_money_valuation(&self) -> Option<Decimal> {
        self.post_money_valuation
    }

    /// Returns the cumulative equity raised, if known.
    #[inline]
    #[must_use]
    pub fn equity_raised(&self) -> Option<Decimal> {
        self.equity_raised
    }

    /// Valuation inputs denominated in the reporting currency.
    #[must_use]
    pub fn valuation_inputs(&self) -> ValuationInputs {
        ValuationInputs {
            currency: self.reporting_currency,
            post_money_valuation: self.post_money_valuation,
            equity_raised: self.equity_raised,
        }
    }
}

impl fmt::Display for CompanyProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Company({} {} {})", self.id, self.name, self.reporting_currency)
    }
}
