//! # Financial Record Entity
//!
//! One company-quarter of raw financial input.
//!
//! A record is immutable once built. Corrections are new records that
//! supersede the old one in storage; the derivation engine never edits
//! historical facts.
//!
//! Period components are stored raw so that deserialized input can be
//! rejected at the pipeline boundary with [`FinancialRecord::validate`]
//! rather than deep inside a metric formula.
//!
//! # Examples
//!
//! ```
//! use portfolio_derivations::domain::entities::FinancialRecord;
//! use portfolio_derivations::domain::value_objects::{CompanyId, CurrencyCode, FiscalQuarter};
//! use rust_decimal::Decimal;
//!
//! let record = FinancialRecord::builder(
//!     CompanyId::new("acme"),
//!     FiscalQuarter::new(2022, 4).unwrap(),
//!     CurrencyCode::USD,
//! )
//! .total_revenue(Decimal::new(1_000, 0))
//! .employees(10)
//! .build();
//!
//! assert!(record.validate().is_ok());
//! assert_eq!(record.debt_outstanding(), None);
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::arithmetic::ArithmeticResult;
use crate::domain::value_objects::{CompanyId, CurrencyCode, FinancialField, FiscalQuarter};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest accepted magnitude for any monetary field.
pub const MAX_MONETARY_MAGNITUDE: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

/// One company-quarter of financial input in its native currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialRecord {
    company_id: CompanyId,
    reporting_year: i32,
    reporting_quarter: u8,
    currency: CurrencyCode,
    total_revenue: Decimal,
    recurring_revenue: Decimal,
    gross_profit: Decimal,
    sales_marketing_expense: Decimal,
    total_operating_expense: Decimal,
    ebitda: Decimal,
    net_income: Decimal,
    cash_burn: Decimal,
    cash_balance: Decimal,
    #[serde(default)]
    debt_outstanding: Option<Decimal>,
    employees: u32,
    #[serde(default)]
    customers: Option<u32>,
    fiscal_reporting_date: NaiveDate,
}

impl FinancialRecord {
    /// Starts building a record; every monetary field defaults to zero.
    #[must_use]
    pub fn builder(
        company_id: CompanyId,
        period: FiscalQuarter,
        currency: CurrencyCode,
    ) -> FinancialRecordBuilder {
        FinancialRecordBuilder::new(company_id, period, currency)
    }

    /// Returns the company identifier.
    #[inline]
    #[must_use]
    pub fn company_id(&self) -> &CompanyId {
        &self.company_id
    }

    /// Returns the raw reporting year.
    #[inline]
    #[must_use]
    pub fn reporting_year(&self) -> i32 {
        self.reporting_year
    }

    /// Returns the raw reporting quarter.
    #[inline]
    #[must_use]
    pub fn reporting_quarter(&self) -> u8 {
        self.reporting_quarter
    }

    /// Returns the fiscal period.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPeriod` if the stored year or quarter is
    /// out of range.
    pub fn period(&self) -> DomainResult<FiscalQuarter> {
        FiscalQuarter::new(self.reporting_year, self.reporting_quarter)
    }

    /// Returns the native currency.
    #[inline]
    #[must_use]
    pub fn currency(&self) -> CurrencyCode {
        self.currency
    }

    /// Returns the total revenue.
    #[inline]
    #[must_use]
    pub fn total_revenue(&self) -> Decimal {
        self.total_revenue
    }

    /// Returns the recurring revenue.
    #[inline]
    #[must_use]
    pub fn recurring_revenue(&self) -> Decimal {
        self.recurring_revenue
    }

    /// Returns the gross profit.
    #[inline]
    #[must_use]
    pub fn gross_profit(&self) -> Decimal {
        self.gross_profit
    }

    /// Returns the sales and marketing expense.
    #[inline]
    #[must_use]
    pub fn sales_marketing_expense(&self) -> Decimal {
        self.sales_marketing_expense
    }

    /// Returns the total operating expense.
    #[inline]
    #[must_use]
    pub fn total_operating_expense(&self) -> Decimal {
        self.total_operating_expense
    }

    /// Returns EBITDA.
    #[inline]
    #[must_use]
    pub fn ebitda(&self) -> Decimal {
        self.ebitda
    }

    /// Returns net income.
    #[inline]
    #[must_use]
    pub fn net_income(&self) -> Decimal {
        self.net_income
    }

    /// Returns the quarter's cash burn; negative means cash was consumed.
    #[inline]
    #[must_use]
    pub fn cash_burn(&self) -> Decimal {
        self.cash_burn
    }

    /// Returns the quarter-end cash balance.
    #[inline]
    #[must_use]
    pub fn cash_balance(&self) -> Decimal {
        self.cash_balance
    }

    /// Returns outstanding debt, if reported.
    #[inline]
    #[must_use]
    pub fn debt_outstanding(&self) -> Option<Decimal> {
        self.debt_outstanding
    }

    /// Returns the FTE headcount.
    #[inline]
    #[must_use]
    pub fn employees(&self) -> u32 {
        self.employees
    }

    /// Returns the customer count, if reported.
    #[inline]
    #[must_use]
    pub fn customers(&self) -> Option<u32> {
        self.customers
    }

    /// Returns the fiscal reporting date.
    #[inline]
    #[must_use]
    pub fn fiscal_reporting_date(&self) -> NaiveDate {
        self.fiscal_reporting_date
    }

    /// Returns a monetary field by name; `None` only for unreported debt.
    #[must_use]
    pub fn field(&self, field: FinancialField) -> Option<Decimal> {
        match field {
            FinancialField::TotalRevenue => Some(self.total_revenue),
            FinancialField::RecurringRevenue => Some(self.recurring_revenue),
            FinancialField::GrossProfit => Some(self.gross_profit),
            FinancialField::SalesMarketingExpense => Some(self.sales_marketing_expense),
            FinancialField::TotalOperatingExpense => Some(self.total_operating_expense),
            FinancialField::Ebitda => Some(self.ebitda),
            FinancialField::NetIncome => Some(self.net_income),
            FinancialField::CashBurn => Some(self.cash_burn),
            FinancialField::CashBalance => Some(self.cash_balance),
            FinancialField::DebtOutstanding => self.debt_outstanding,
        }
    }

    /// Validates the record and returns its fiscal period.
    ///
    /// Checks the period range, the company identifier, sign constraints on
    /// revenue, expense and debt fields, and the magnitude of every
    /// monetary field.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPeriod` or `DomainError::InvalidField`
    /// describing the first violation found.
    pub fn validate(&self) -> DomainResult<FiscalQuarter> {
        let period = self.period()?;
        if self.company_id.is_empty() {
            return Err(DomainError::invalid_field("company_id", "must not be empty"));
        }
        for field in FinancialField::ALL {
            let Some(value) = self.field(field) else {
                continue;
            };
            if field.must_be_non_negative() && value.is_sign_negative() && !value.is_zero() {
                return Err(DomainError::invalid_field(
                    field.as_str(),
                    format!("must not be negative, got {value}"),
                ));
            }
            if value.abs() > MAX_MONETARY_MAGNITUDE {
                return Err(DomainError::invalid_field(
                    field.as_str(),
                    format!("magnitude {value} exceeds {MAX_MONETARY_MAGNITUDE}"),
                ));
            }
        }
        Ok(period)
    }

    /// Re-expresses every monetary field through `convert`, relabelling the
    /// record with `currency`. Non-monetary fields are copied unchanged.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by `convert`.
    pub fn map_monetary<F>(&self, currency: CurrencyCode, convert: F) -> ArithmeticResult<Self>
    where
        F: Fn(Decimal) -> ArithmeticResult<Decimal>,
    {
        Ok(Self {
            company_id: self.company_id.clone(),
            reporting_year: self.reporting_year,
            reporting_quarter: self.reporting_quarter,
            currency,
            total_revenue: convert(self.total_revenue)?,
            recurring_revenue: convert(self.recurring_revenue)?,
            gross_profit: convert(self.gross_profit)?,
            sales_marketing_expense: convert(self.sales_marketing_expense)?,
            total_operating_expense: convert(self.total_operating_expense)?,
            ebitda: convert(self.ebitda)?,
            net_income: convert(self.net_income)?,
            cash_burn: convert(self.cash_burn)?,
            cash_balance: convert(self.cash_balance)?,
            debt_outstanding: self.debt_outstanding.map(&convert).transpose()?,
            employees: self.employees,
            customers: self.customers,
            fiscal_reporting_date: self.fiscal_reporting_date,
        })
    }
}

impl fmt::Display for FinancialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FinancialRecord({} {}-Q{} {} revenue={})",
            self.company_id,
            self.reporting_year,
            self.reporting_quarter,
            self.currency,
            self.total_revenue
        )
    }
}

/// Builder for [`FinancialRecord`].
#[derive(Debug, Clone)]
pub struct FinancialRecordBuilder {
    record: FinancialRecord,
}

impl FinancialRecordBuilder {
    /// Creates a builder with zeroed monetary fields.
    ///
    /// The fiscal reporting date defaults to the last calendar day of the
    /// quarter.
    #[must_use]
    pub fn new(company_id: CompanyId, period: FiscalQuarter, currency: CurrencyCode) -> Self {
        Self {
            record: FinancialRecord {
                company_id,
                reporting_year: period.year(),
                reporting_quarter: period.quarter(),
                currency,
                total_revenue: Decimal::ZERO,
                recurring_revenue: Decimal::ZERO,
                gross_profit: Decimal::ZERO,
                sales_marketing_expense: Decimal::ZERO,
                total_operating_expense: Decimal::ZERO,
                ebitda: Decimal::ZERO,
                net_income: Decimal::ZERO,
                cash_burn: Decimal::ZERO,
                cash_balance: Decimal::ZERO,
                debt_outstanding: None,
                employees: 0,
                customers: None,
                fiscal_reporting_date: period.end_date().unwrap_or_default(),
            },
        }
    }

    /// Sets total revenue.
    #[must_use]
    pub fn total_revenue(mut self, value: Decimal) -> Self {
        self.record.total_revenue = value;
        self
    }

    /// Sets recurring revenue.
    #[must_use]
    pub fn recurring_revenue(mut self, value: Decimal) -> Self {
        self.record.recurring_revenue = value;
        self
    }

    /// Sets gross profit.
    #[must_use]
    pub fn gross_profit(mut self, value: Decimal) -> Self {
        self.record.gross_profit = value;
        self
    }

    /// Sets sales and marketing expense.
    #[must_use]
    pub fn sales_marketing_expense(mut self, value: Decimal) -> Self {
        self.record.sales_marketing_expense = value;
        self
    }

    /// Sets total operating expense.
    #[must_use]
    pub fn total_operating_expense(mut self, value: Decimal) -> Self {
        self.record.total_operating_expense = value;
        self
    }

    /// Sets EBITDA.
    #[must_use]
    pub fn ebitda(mut self, value: Decimal) -> Self {
        self.record.ebitda = value;
        self
    }

    /// Sets net income.
    #[must_use]
    pub fn net_income(mut self, value: Decimal) -> Self {
        self.record.net_income = value;
        self
    }

    /// Sets cash burn.
    #[must_use]
    pub fn cash_burn(mut self, value: Decimal) -> Self {
        self.record.cash_burn = value;
        self
    }

    /// Sets cash balance.
    #[must_use]
    pub fn cash_balance(mut self, value: Decimal) -> Self {
        self.record.cash_balance = value;
        self
    }

    /// Sets outstanding debt.
    #[must_use]
    pub fn debt_outstanding(mut self, value: Decimal) -> Self {
        self.record.debt_outstanding = Some(value);
        self
    }

    /// Sets the FTE headcount.
    #[must_use]
    pub fn employees(mut self, value: u32) -> Self {
        self.record.employees = value;
        self
    }

    /// Sets the customer count.
    #[must_use]
    pub fn customers(mut self, value: u32) -> Self {
        self.record.customers = Some(value);
        self
    }

    /// Sets the fiscal reporting date.
    #[must_use]
    pub fn fiscal_reporting_date(mut self, date: NaiveDate) -> Self {
        self.record.fiscal_reporting_date = date;
        self
    }

    /// Builds the record without validation.
    ///
    /// Use [`try_build`](Self::try_build) for validated construction.
    #[must_use]
    pub fn build(self) -> FinancialRecord {
        self.record
    }

    /// Builds the record with validation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if [`FinancialRecord::validate`] fails.
    pub fn try_build(self) -> DomainResult<FinancialRecord> {
        self.record.validate()?;
        Ok(self.record)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::value_objects::CheckedArithmetic;

    fn builder() -> FinancialRecordBuilder {
        FinancialRecord::builder(
            CompanyId::new("reciLI8sBuJE9vEAv"),
            FiscalQuarter::new(2022, 4).unwrap(),
            CurrencyCode::USD,
        )
    }

    mod construction {
        use super::*;

        #[test]
        fn defaults_reporting_date_to_quarter_end() {
            let record = builder().build();
            assert_eq!(
                record.fiscal_reporting_date(),
                NaiveDate::from_ymd_opt(2022, 12, 31).unwrap()
            );
        }

        #[test]
        fn optional_fields_default_to_none() {
            let record = builder().build();
            assert_eq!(record.debt_outstanding(), None);
            assert_eq!(record.customers(), None);
            assert_eq!(record.field(FinancialField::DebtOutstanding), None);
        }

        #[test]
        fn deserializes_with_missing_optionals() {
            let json = r#"{
                "company_id": "c1",
                "reporting_year": 2022,
                "reporting_quarter": 4,
                "currency": "usd",
                "total_revenue": "4194199",
                "recurring_revenue": "3912138",
                "gross_profit": "2730244",
                "sales_marketing_expense": "1470828",
                "total_operating_expense": "7195136",
                "ebitda": "-4464892",
                "net_income": "-4339102",
                "cash_burn": "-4464892",
                "cash_balance": "32407138",
                "employees": 100,
                "fiscal_reporting_date": "2022-12-31"
            }"#;
            let record: FinancialRecord = serde_json::from_str(json).unwrap();
            assert_eq!(record.currency(), CurrencyCode::USD);
            assert_eq!(record.debt_outstanding(), None);
            assert_eq!(record.period().unwrap(), FiscalQuarter::new(2022, 4).unwrap());
        }
    }

    mod validation {
        use super::*;

        #[test]
        fn accepts_negative_burn_and_income() {
            let record = builder()
                .cash_burn(Decimal::new(-100, 0))
                .net_income(Decimal::new(-50, 0))
                .ebitda(Decimal::new(-10, 0))
                .build();
            assert!(record.validate().is_ok());
        }

        #[test]
        fn rejects_negative_revenue() {
            let result = builder().total_revenue(Decimal::new(-1, 0)).try_build();
            assert!(matches!(
                result,
                Err(DomainError::InvalidField {
                    field: "total_revenue",
                    ..
                })
            ));
        }

        #[test]
        fn rejects_negative_debt() {
            let result = builder().debt_outstanding(Decimal::new(-1, 0)).try_build();
            assert!(matches!(
                result,
                Err(DomainError::InvalidField {
                    field: "debt_outstanding",
                    ..
                })
            ));
        }

        #[test]
        fn rejects_out_of_range_magnitude() {
            let huge = MAX_MONETARY_MAGNITUDE.safe_add(Decimal::ONE).unwrap();
            let result = builder().cash_balance(huge).try_build();
            assert!(matches!(result, Err(DomainError::InvalidField { .. })));
        }

        #[test]
        fn magnitude_limit_is_one_quadrillion() {
            assert_eq!(MAX_MONETARY_MAGNITUDE, Decimal::from(1_000_000_000_000_000_i64));
        }

        #[test]
        fn rejects_bad_quarter_from_input() {
            let mut json = serde_json::to_value(builder().build()).unwrap();
            json["reporting_quarter"] = serde_json::json!(7);
            let record: FinancialRecord = serde_json::from_value(json).unwrap();
            assert!(matches!(record.validate(), Err(DomainError::InvalidPeriod(_))));
        }

        #[test]
        fn rejects_blank_company() {
            let record = FinancialRecord::builder(
                CompanyId::new(""),
                FiscalQuarter::new(2022, 4).unwrap(),
                CurrencyCode::USD,
            )
            .build();
            assert!(record.validate().is_err());
        }
    }

    mod map_monetary {
        use super::*;

        #[test]
        fn scales_money_but_not_counts() {
            let record = builder()
                .total_revenue(Decimal::new(100, 0))
                .debt_outstanding(Decimal::new(10, 0))
                .employees(7)
                .customers(3)
                .build();
            let doubled = record
                .map_monetary(CurrencyCode::CAD, |v| v.safe_mul(Decimal::TWO))
                .unwrap();
            assert_eq!(doubled.currency(), CurrencyCode::CAD);
            assert_eq!(doubled.total_revenue(), Decimal::new(200, 0));
            assert_eq!(doubled.debt_outstanding(), Some(Decimal::new(20, 0)));
            assert_eq!(doubled.employees(), 7);
            assert_eq!(doubled.customers(), Some(3));
            assert_eq!(doubled.fiscal_reporting_date(), record.fiscal_reporting_date());
        }

        #[test]
        fn null_debt_stays_null() {
            let record = builder().build();
            let mapped = record
                .map_monetary(CurrencyCode::CAD, |v| v.safe_mul(Decimal::TWO))
                .unwrap();
            assert_eq!(mapped.debt_outstanding(), None);
        }
    }
}
