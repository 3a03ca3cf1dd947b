//! # Financial Field
//!
//! The closed set of monetary fields carried by a financial record.
//!
//! These are exactly the fields subject to currency conversion; headcounts,
//! dates and identifiers are not listed here.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A monetary field of a [`FinancialRecord`](crate::domain::entities::FinancialRecord).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinancialField {
    /// Total quarterly revenue.
    TotalRevenue,
    /// Recurring share of revenue.
    RecurringRevenue,
    /// Gross profit.
    GrossProfit,
    /// Sales and marketing expense.
    SalesMarketingExpense,
    /// Total operating expense.
    TotalOperatingExpense,
    /// EBITDA.
    Ebitda,
    /// Net income.
    NetIncome,
    /// Net cash movement for the quarter; negative means cash consumed.
    CashBurn,
    /// Cash on hand at quarter end.
    CashBalance,
    /// Outstanding debt (nullable).
    DebtOutstanding,
}

impl FinancialField {
    /// Every monetary field, in record order.
    pub const ALL: [Self; 10] = [
        Self::TotalRevenue,
        Self::RecurringRevenue,
        Self::GrossProfit,
        Self::SalesMarketingExpense,
        Self::TotalOperatingExpense,
        Self::Ebitda,
        Self::NetIncome,
        Self::CashBurn,
        Self::CashBalance,
        Self::DebtOutstanding,
    ];

    /// Snake-case field name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TotalRevenue => "total_revenue",
            Self::RecurringRevenue => "recurring_revenue",
            Self::GrossProfit => "gross_profit",
            Self::SalesMarketingExpense => "sales_marketing_expense",
            Self::TotalOperatingExpense => "total_operating_expense",
            Self::Ebitda => "ebitda",
            Self::NetIncome => "net_income",
            Self::CashBurn => "cash_burn",
            Self::CashBalance => "cash_balance",
            Self::DebtOutstanding => "debt_outstanding",
        }
    }

    /// Returns true if a negative value is malformed input for this field.
    ///
    /// Profit, EBITDA, net income, cash burn and cash balance may legitimately
    /// be negative.
    #[must_use]
    pub const fn must_be_non_negative(&self) -> bool {
        matches!(
            self,
            Self::TotalRevenue
                | Self::RecurringRevenue
                | Self::SalesMarketingExpense
                | Self::TotalOperatingExpense
                | Self::DebtOutstanding
        )
    }
}

impl fmt::Display for FinancialField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
