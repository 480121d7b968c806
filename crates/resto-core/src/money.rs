//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │                                                                         │
//! │  Commission payouts are bracket lookups on exact amounts; a one-cent   │
//! │  drift at a bracket boundary changes the payout. So every monetary     │
//! │  value in this workspace is integer cents (i64), and only the service  │
//! │  boundary formats to a 2-decimal string.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use resto_core::money::Money;
//!
//! let price = Money::from_cents(5000); // 50.00
//! let sold = price.multiply_quantity(8);
//! assert_eq!(sold.to_decimal_string(), "400.00");
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: deductions can exceed gross, intermediate values may
///   go negative before clamping
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Derives**: full serde support for JSON serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole currency units (e.g. 100 → 100.00).
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Money(units * 100)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use resto_core::money::Money;
    ///
    /// let price_each = Money::from_cents(5000); // 50.00
    /// let sold_amount = price_each.multiply_quantity(8);
    /// assert_eq!(sold_amount.cents(), 40_000); // 400.00
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Clamps negative values to zero.
    ///
    /// Used for the net-pay / carry-forward split: neither side of a payroll
    /// line is ever paid out negative.
    #[inline]
    pub const fn clamp_non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }

    /// Saturating subtraction clamped at zero.
    #[inline]
    pub const fn saturating_sub_zero(&self, other: Money) -> Self {
        let diff = self.0 - other.0;
        if diff < 0 {
            Money(0)
        } else {
            Money(diff)
        }
    }

    /// Formats as a fixed 2-decimal string: `"400.00"`, `"-12.50"`.
    ///
    /// All monetary values crossing the service boundary are serialized this
    /// way rather than as floats, to avoid precision loss in transit.
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
    }

    /// Coerces a loosely-typed JSON value to Money.
    ///
    /// Bracket lists come from JSON columns written by several generations of
    /// admin tooling, so amounts show up as numbers, numeric strings,
    /// strings with thousands separators ("1,500"), and strings with regular
    /// or non-breaking spaces ("1 500.00"). Anything that does not coerce to
    /// a finite number yields `None` and the caller drops the entry.
    ///
    /// Fractions are rounded half-up to the nearest cent.
    ///
    /// ## Example
    /// ```rust
    /// use resto_core::money::Money;
    /// use serde_json::json;
    ///
    /// assert_eq!(Money::parse_loose(&json!(500)), Some(Money::from_cents(50_000)));
    /// assert_eq!(Money::parse_loose(&json!("1,500.25")), Some(Money::from_cents(150_025)));
    /// assert_eq!(Money::parse_loose(&json!("abc")), None);
    /// assert_eq!(Money::parse_loose(&json!(null)), None);
    /// ```
    pub fn parse_loose(value: &Value) -> Option<Money> {
        match value {
            Value::Number(n) => {
                let f = n.as_f64()?;
                Self::from_finite_f64(f)
            }
            Value::String(s) => {
                // Strip thousands separators and both kinds of space
                let cleaned: String = s
                    .chars()
                    .filter(|c| *c != ',' && *c != ' ' && *c != '\u{a0}')
                    .collect();
                if cleaned.is_empty() {
                    return None;
                }
                let f = cleaned.parse::<f64>().ok()?;
                Self::from_finite_f64(f)
            }
            _ => None,
        }
    }

    /// Converts a finite f64 amount (in currency units) to cents, half-up.
    fn from_finite_f64(f: f64) -> Option<Money> {
        if !f.is_finite() {
            return None;
        }
        let cents = (f * 100.0).round();
        if cents < i64::MIN as f64 || cents > i64::MAX as f64 {
            return None;
        }
        Some(Money(cents as i64))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal_string())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by i64 (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
    }

    #[test]
    fn test_from_units() {
        assert_eq!(Money::from_units(500).cents(), 50_000);
    }

    #[test]
    fn test_decimal_string() {
        assert_eq!(Money::from_cents(1099).to_decimal_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_decimal_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_decimal_string(), "-5.50");
        assert_eq!(Money::from_cents(0).to_decimal_string(), "0.00");
        assert_eq!(Money::from_cents(40_000).to_decimal_string(), "400.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
    }

    #[test]
    fn test_clamp_non_negative() {
        assert_eq!(Money::from_cents(-100).clamp_non_negative().cents(), 0);
        assert_eq!(Money::from_cents(100).clamp_non_negative().cents(), 100);
    }

    #[test]
    fn test_saturating_sub_zero() {
        let gross = Money::from_cents(1000);
        let deductions = Money::from_cents(1500);
        assert_eq!(gross.saturating_sub_zero(deductions).cents(), 0);
        assert_eq!(deductions.saturating_sub_zero(gross).cents(), 500);
    }

    #[test]
    fn test_parse_loose_number() {
        assert_eq!(Money::parse_loose(&json!(500)), Some(Money::from_cents(50_000)));
        assert_eq!(Money::parse_loose(&json!(10.5)), Some(Money::from_cents(1050)));
        assert_eq!(Money::parse_loose(&json!(0)), Some(Money::zero()));
    }

    #[test]
    fn test_parse_loose_string_variants() {
        assert_eq!(Money::parse_loose(&json!("500")), Some(Money::from_cents(50_000)));
        assert_eq!(
            Money::parse_loose(&json!("1,500.25")),
            Some(Money::from_cents(150_025))
        );
        // Non-breaking space as thousands separator
        assert_eq!(
            Money::parse_loose(&json!("1\u{a0}500")),
            Some(Money::from_cents(150_000))
        );
        assert_eq!(Money::parse_loose(&json!("2 000")), Some(Money::from_cents(200_000)));
    }

    #[test]
    fn test_parse_loose_rejects_garbage() {
        assert_eq!(Money::parse_loose(&json!("abc")), None);
        assert_eq!(Money::parse_loose(&json!("")), None);
        assert_eq!(Money::parse_loose(&json!(null)), None);
        assert_eq!(Money::parse_loose(&json!([1, 2])), None);
        assert_eq!(Money::parse_loose(&json!({"v": 1})), None);
    }

    #[test]
    fn test_parse_loose_rounds_to_nearest_cent() {
        assert_eq!(Money::parse_loose(&json!("10.006")), Some(Money::from_cents(1001)));
        assert_eq!(Money::parse_loose(&json!("10.004")), Some(Money::from_cents(1000)));
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 200, 300].iter().map(|c| Money::from_cents(*c)).sum();
        assert_eq!(total.cents(), 600);
    }
}
