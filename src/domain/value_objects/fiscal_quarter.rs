//! # Fiscal Quarter
//!
//! A `(reporting_year, reporting_quarter)` pair with calendar arithmetic.
//!
//! The derivation engine only ever looks backwards in time, so the type
//! offers [`FiscalQuarter::previous`], [`FiscalQuarter::quarters_back`] and
//! [`FiscalQuarter::year_ago`] but no forward stepping.
//!
//! # Examples
//!
//! ```
//! use portfolio_derivations::domain::value_objects::fiscal_quarter::FiscalQuarter;
//!
//! let q = FiscalQuarter::new(2022, 1).unwrap();
//! assert_eq!(q.previous(), FiscalQuarter::new(2021, 4).unwrap());
//! assert_eq!(q.year_ago().to_string(), "2021-Q1");
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Earliest accepted reporting year.
pub const MIN_REPORTING_YEAR: i32 = 1900;

/// Latest accepted reporting year.
pub const MAX_REPORTING_YEAR: i32 = 2200;

/// A validated fiscal quarter.
///
/// Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FiscalQuarter {
    year: i32,
    quarter: u8,
}

impl FiscalQuarter {
    /// Creates a fiscal quarter.
    ///
    /// # Arguments
    ///
    /// * `year` - Reporting year, within `1900..=2200`
    /// * `quarter` - Reporting quarter, within `1..=4`
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPeriod` if either component is out of range.
    pub fn new(year: i32, quarter: u8) -> DomainResult<Self> {
        if !(1..=4).contains(&quarter) {
            return Err(DomainError::invalid_period(format!(
                "quarter {quarter} is not within 1..=4"
            )));
        }
        if !(MIN_REPORTING_YEAR..=MAX_REPORTING_YEAR).contains(&year) {
            return Err(DomainError::invalid_period(format!(
                "year {year} is not within {MIN_REPORTING_YEAR}..={MAX_REPORTING_YEAR}"
            )));
        }
        Ok(Self { year, quarter })
    }

    /// Returns the reporting year.
    #[inline]
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Returns the reporting quarter (1-4).
    #[inline]
    #[must_use]
    pub const fn quarter(&self) -> u8 {
        self.quarter
    }

    /// Returns the immediately preceding quarter, unchecked like
    /// [`Self::quarters_back`].
    #[must_use]
    pub const fn previous(&self) -> Self {
        self.quarters_back(1)
    }

    /// Returns the same quarter one year earlier, unchecked like
    /// [`Self::quarters_back`].
    #[must_use]
    pub const fn year_ago(&self) -> Self {
        self.quarters_back(4)
    }

    /// Returns the quarter `n` quarters before this one.
    ///
    /// The result is not range-checked: stepping back from the earliest
    /// reporting years may yield a year below [`MIN_REPORTING_YEAR`]. Such a
    /// quarter is only used as a bound for history lookups, where it matches
    /// no stored record. Use [`FiscalQuarter::new`] to validate one.
    #[must_use]
    pub const fn quarters_back(&self, n: u32) -> Self {
        let ordinal = self.ordinal() - n as i64;
        let year = ordinal.div_euclid(4);
        let quarter = ordinal.rem_euclid(4) + 1;
        Self {
            year: year as i32,
            quarter: quarter as u8,
        }
    }

    /// Number of quarters from `earlier` to `self`; negative if `earlier` is later.
    #[must_use]
    pub const fn quarters_since(&self, earlier: &Self) -> i64 {
        self.ordinal() - earlier.ordinal()
    }

    /// Last calendar day of the quarter.
    #[must_use]
    pub fn end_date(&self) -> Option<NaiveDate> {
        let (month, day) = match self.quarter {
            1 => (3, 31),
            2 => (6, 30),
            3 => (9, 30),
            _ => (12, 31),
        };
        NaiveDate::from_ymd_opt(self.year, month, day)
    }

    const fn ordinal(&self) -> i64 {
        self.year as i64 * 4 + (self.quarter as i64 - 1)
    }
}

impl fmt::Display for FiscalQuarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-Q{}", self.year, self.quarter)
    }
}
