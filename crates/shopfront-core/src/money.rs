//! # Money Module
//!
//! Integer money for every amount the register touches: prices, discounts,
//! tendered cash, change and customer dues.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Floating point:   0.1 + 0.2 = 0.30000000000000004                      │
//! │                                                                         │
//! │  A cashier comparing "tendered == amount due" with floats can see a     │
//! │  500.00 payment rejected against a 500.00 bill.                         │
//! │                                                                         │
//! │  Integer minor units (paise / cents):                                   │
//! │    50000 == 50000, always.                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shopfront_core::money::Money;
//!
//! let price = Money::from_cents(12_50);
//! let line = price.multiply_quantity(4);
//! assert_eq!(line.cents(), 50_00);
//!
//! let typed: Money = "19.99".parse().unwrap();
//! assert_eq!(typed.cents(), 1999);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// Signed on purpose: a negative `Money` is a refund, a credit balance, or a
/// shortfall (`balance_due` in a settlement can go below zero).
///
/// ## Where Money Flows
/// ```text
/// CatalogItem.unit_price ──► CartLine.line_total ──► subtotal
///                                                       │
///                                   discount ──────────►│
///                                                       ▼
///                         credit_applied ──────────► amount_due
///                                                       │
///          amount_tendered / change_returned ──────────►▼
///                                               reconciliation
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ```rust
    /// use shopfront_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1099).cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole currency units.
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major.saturating_mul(100))
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Floors the value at zero.
    ///
    /// Used for `change_required = max(0, tendered - due)` and for turning a
    /// signed customer balance into available store credit.
    ///
    /// ```rust
    /// use shopfront_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(-300).non_negative(), Money::zero());
    /// assert_eq!(Money::from_cents(300).non_negative().cents(), 300);
    /// ```
    #[inline]
    pub const fn non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }

    /// Restricts the value to `[lo, hi]`. If `hi < lo`, `lo` wins.
    pub fn clamp_between(self, lo: Money, hi: Money) -> Money {
        if self < lo {
            lo
        } else if self > hi {
            hi.max(lo)
        } else {
            self
        }
    }

    /// Multiplies a unit price by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parses operator input such as `500`, `499.5`, `12.05` or `-3.00`.
///
/// At most two fractional digits are accepted; anything else is an
/// `InvalidFormat` validation error rather than a silent rounding.
impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        let s = s.trim();
        if s.is_empty() {
            return Err(ValidationError::Required {
                field: "amount".to_string(),
            });
        }

        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let (major, minor) = match digits.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (digits, ""),
        };

        if major.is_empty() && minor.is_empty() {
            return Err(invalid("no digits"));
        }
        if minor.len() > 2 {
            return Err(invalid("at most two decimal places"));
        }
        if !major.chars().chain(minor.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid("must be a number like 120 or 120.50"));
        }

        let major: i64 = if major.is_empty() {
            0
        } else {
            major.parse().map_err(|_| invalid("amount too large"))?
        };
        let minor: i64 = match minor.len() {
            0 => 0,
            1 => minor.parse::<i64>().map_err(|_| invalid("bad fraction"))? * 10,
            _ => minor.parse().map_err(|_| invalid("bad fraction"))?,
        };

        let cents = major
            .checked_mul(100)
            .and_then(|m| m.checked_add(minor))
            .ok_or_else(|| invalid("amount too large"))?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

// Arithmetic saturates at the i64 bounds; totals over extreme inputs
// must not panic.

/// Plain `1234.50` rendering; currency symbols are a front-end concern.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(self.0.saturating_neg())
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_parse_operator_input() {
        assert_eq!("500".parse::<Money>().unwrap(), Money::from_major(500));
        assert_eq!("499.5".parse::<Money>().unwrap().cents(), 49950);
        assert_eq!("12.05".parse::<Money>().unwrap().cents(), 1205);
        assert_eq!(".75".parse::<Money>().unwrap().cents(), 75);
        assert_eq!("-3.00".parse::<Money>().unwrap().cents(), -300);

        assert!("".parse::<Money>().is_err());
        assert!("1.999".parse::<Money>().is_err());
        assert!("12a".parse::<Money>().is_err());
        assert!("1,000".parse::<Money>().is_err());
        assert!(".".parse::<Money>().is_err());
    }

    #[test]
    fn test_arithmetic_saturates() {
        let max = Money::from_cents(i64::MAX);
        let min = Money::from_cents(i64::MIN);

        assert_eq!(Money::from_cents(500) - min, max);
        assert_eq!(max + Money::from_cents(1), max);
        assert_eq!(-min, max);
        assert_eq!(max * 3, max);
        assert_eq!(Money::from_major(i64::MAX), max);

        let mut m = min;
        m -= Money::from_cents(1);
        assert_eq!(m, min);
    }

    #[test]
    fn test_non_negative_and_clamp() {
        assert_eq!(Money::from_cents(-1).non_negative(), Money::zero());

        let lo = Money::zero();
        let hi = Money::from_cents(1000);
        assert_eq!(Money::from_cents(-5).clamp_between(lo, hi), lo);
        assert_eq!(Money::from_cents(5000).clamp_between(lo, hi), hi);
        assert_eq!(Money::from_cents(400).clamp_between(lo, hi).cents(), 400);
        // inverted bounds collapse to the lower one
        assert_eq!(Money::from_cents(400).clamp_between(lo, Money::from_cents(-1)), lo);
    }

    #[test]
    fn test_sum_and_arithmetic() {
        let lines = [Money::from_cents(200), Money::from_cents(300)];
        let total: Money = lines.iter().sum();
        assert_eq!(total.cents(), 500);
        assert_eq!((-total).cents(), -500);
        assert_eq!((total * 3).cents(), 1500);
    }

    #[test]
    fn test_serializes_as_plain_number() {
        let json = serde_json::to_string(&Money::from_cents(1250)).unwrap();
        assert_eq!(json, "1250");
        let back: Money = serde_json::from_str("1250").unwrap();
        assert_eq!(back.cents(), 1250);
    }
}
