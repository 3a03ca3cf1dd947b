//! # Checked Arithmetic
//!
//! Safe decimal arithmetic and the ratio helpers used by metric formulas.
//!
//! This module provides:
//! - [`ArithmeticError`] - Error type for arithmetic failures
//! - [`CheckedArithmetic`] - Trait for safe arithmetic operations
//! - [`ratio`], [`percentage`], [`growth_percentage`] - Null-propagating
//!   ratio helpers that never produce infinity
//!
//! # Examples
//!
//! ```
//! use portfolio_derivations::domain::value_objects::arithmetic::{percentage, CheckedArithmetic};
//! use rust_decimal::Decimal;
//!
//! let a = Decimal::new(100, 0);
//! assert!(a.safe_div(Decimal::ZERO).is_err());
//! assert_eq!(percentage(Decimal::ONE, Decimal::new(4, 0)), Some(Decimal::new(25, 0)));
//! assert_eq!(percentage(Decimal::ONE, Decimal::ZERO), None);
//! ```

use rust_decimal::Decimal;
use thiserror::Error;

/// Error type for arithmetic operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ArithmeticError {
    /// Arithmetic operation resulted in overflow.
    #[error("arithmetic overflow")]
    Overflow,

    /// Arithmetic operation resulted in underflow.
    #[error("arithmetic underflow")]
    Underflow,

    /// Division by zero attempted.
    #[error("division by zero")]
    DivisionByZero,
}

/// Result type for arithmetic operations.
pub type ArithmeticResult<T> = Result<T, ArithmeticError>;

/// Trait for checked arithmetic operations.
///
/// Provides safe arithmetic methods that return `Result` instead of
/// panicking on overflow, underflow, or division by zero.
pub trait CheckedArithmetic: Sized {
    /// Safely add two values.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::Overflow` if the result would overflow.
    fn safe_add(self, rhs: Self) -> ArithmeticResult<Self>;

    /// Safely subtract two values.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::Underflow` if the result would underflow.
    fn safe_sub(self, rhs: Self) -> ArithmeticResult<Self>;

    /// Safely multiply two values.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::Overflow` if the result would overflow.
    fn safe_mul(self, rhs: Self) -> ArithmeticResult<Self>;

    /// Safely divide two values.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::DivisionByZero` if the divisor is zero.
    fn safe_div(self, rhs: Self) -> ArithmeticResult<Self>;
}

impl CheckedArithmetic for Decimal {
    #[inline]
    fn safe_add(self, rhs: Self) -> ArithmeticResult<Self> {
        self.checked_add(rhs).ok_or(ArithmeticError::Overflow)
    }

    #[inline]
    fn safe_sub(self, rhs: Self) -> ArithmeticResult<Self> {
        self.checked_sub(rhs).ok_or(ArithmeticError::Underflow)
    }

    #[inline]
    fn safe_mul(self, rhs: Self) -> ArithmeticResult<Self> {
        self.checked_mul(rhs).ok_or(ArithmeticError::Overflow)
    }

    #[inline]
    fn safe_div(self, rhs: Self) -> ArithmeticResult<Self> {
        if rhs.is_zero() {
            return Err(ArithmeticError::DivisionByZero);
        }
        self.checked_div(rhs).ok_or(ArithmeticError::Overflow)
    }
}

/// `numerator / denominator`, or `None` when the denominator is zero or
/// the quotient does not fit.
#[inline]
#[must_use]
pub fn ratio(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    numerator.safe_div(denominator).ok()
}

/// `numerator / denominator × 100`, or `None` when undefined.
#[inline]
#[must_use]
pub fn percentage(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    ratio(numerator, denominator)?
        .safe_mul(Decimal::ONE_HUNDRED)
        .ok()
}

/// Relative change `(current − prior) / prior × 100`, or `None` when the
/// prior value is zero.
///
/// # Examples
///
/// ```
/// use portfolio_derivations::domain::value_objects::arithmetic::growth_percentage;
/// use rust_decimal::Decimal;
///
/// let growth = growth_percentage(Decimal::new(110, 0), Decimal::new(100, 0));
/// assert_eq!(growth, Some(Decimal::new(10, 0)));
/// ```
#[inline]
#[must_use]
pub fn growth_percentage(current: Decimal, prior: Decimal) -> Option<Decimal> {
    let delta = current.safe_sub(prior).ok()?;
    percentage(delta, prior)
}

/// Sums decimals, failing on overflow.
///
/// # Errors
///
/// Returns `ArithmeticError::Overflow` if an intermediate sum overflows.
pub fn checked_sum<I>(values: I) -> ArithmeticResult<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .try_fold(Decimal::ZERO, CheckedArithmetic::safe_add)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod checked_arithmetic_decimal {
        use super::*;

        #[test]
        fn safe_ops_work() {
            let a = Decimal::new(100, 0);
            let b = Decimal::new(5, 0);
            assert_eq!(a.safe_add(b).unwrap(), Decimal::new(105, 0));
            assert_eq!(a.safe_sub(b).unwrap(), Decimal::new(95, 0));
            assert_eq!(a.safe_mul(b).unwrap(), Decimal::new(500, 0));
            assert_eq!(a.safe_div(b).unwrap(), Decimal::new(20, 0));
        }

        #[test]
        fn safe_div_by_zero_fails() {
            assert_eq!(
                Decimal::ONE.safe_div(Decimal::ZERO),
                Err(ArithmeticError::DivisionByZero)
            );
        }

        #[test]
        fn safe_mul_overflow_fails() {
            assert_eq!(
                Decimal::MAX.safe_mul(Decimal::TWO),
                Err(ArithmeticError::Overflow)
            );
        }

        #[test]
        fn safe_sub_underflow_fails() {
            assert_eq!(
                Decimal::MIN.safe_sub(Decimal::ONE),
                Err(ArithmeticError::Underflow)
            );
        }
    }

    mod ratio_helpers {
        use super::*;

        #[test]
        fn ratio_of_zero_denominator_is_none() {
            assert_eq!(ratio(Decimal::ONE, Decimal::ZERO), None);
        }

        #[test]
        fn percentage_scales_by_hundred() {
            assert_eq!(
                percentage(Decimal::new(3, 0), Decimal::new(12, 0)),
                Some(Decimal::new(25, 0))
            );
        }

        #[test]
        fn growth_handles_decline() {
            assert_eq!(
                growth_percentage(Decimal::new(75, 0), Decimal::new(100, 0)),
                Some(Decimal::new(-25, 0))
            );
        }

        #[test]
        fn growth_from_zero_is_none() {
            assert_eq!(growth_percentage(Decimal::new(75, 0), Decimal::ZERO), None);
        }

        #[test]
        fn checked_sum_adds_all() {
            let total = checked_sum([Decimal::ONE, Decimal::TWO, Decimal::TEN]).unwrap();
            assert_eq!(total, Decimal::new(13, 0));
        }

        #[test]
        fn checked_sum_detects_overflow() {
            assert_eq!(
                checked_sum([Decimal::MAX, Decimal::ONE]),
                Err(ArithmeticError::Overflow)
            );
        }
    }
}
