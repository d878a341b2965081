//! Fixed-point monetary type with 2 decimal places precision.
//!
//! Uses `rust_decimal` internally with scale enforcement and round-half-up
//! so that shares and balances never touch binary floating point.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

/// A monetary amount that maintains exactly 2 decimal places.
///
/// Any value wider than 2 decimal places is rounded half-up (midpoint away
/// from zero), never to even.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use expense_splitter::Money;
///
/// let amount = Money::from_str("10").unwrap();
/// assert_eq!(amount.to_string(), "10.00");
/// assert_eq!(amount.split(3).unwrap().to_string(), "3.33");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(Decimal);

impl Money {
    /// The number of decimal places to maintain.
    pub const SCALE: u32 = 2;

    /// Zero value.
    pub const ZERO: Self = Money(Decimal::ZERO);

    /// Creates a new `Money`, rounding half-up to 2 decimal places.
    pub fn new(value: Decimal) -> Self {
        let mut rounded =
            value.round_dp_with_strategy(Self::SCALE, RoundingStrategy::MidpointAwayFromZero);
        if rounded.is_zero() {
            rounded = Decimal::ZERO;
        }
        rounded.rescale(Self::SCALE);
        Money(rounded)
    }

    /// Creates a value from a whole number of cents.
    pub fn from_cents(cents: i64) -> Self {
        Money::new(Decimal::new(cents, Self::SCALE))
    }

    /// Returns the underlying decimal.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Returns `true` if this value is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns `true` if this value is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Returns `true` if this value is strictly less than zero.
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Magnitude of the amount, dropping its sign.
    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Divides the amount into `parts` equal shares, rounded half-up.
    ///
    /// The division runs at full precision and is rounded once, so
    /// `10.00 / 3` gives `3.33` and `0.05 / 2` gives `0.03`.
    /// Returns `None` when `parts` is zero.
    pub fn split(&self, parts: usize) -> Option<Self> {
        if parts == 0 {
            return None;
        }
        let divisor = Decimal::from(parts as u64);
        self.0.checked_div(divisor).map(Money::new)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let decimal = Decimal::from_str(trimmed)?;
        Ok(Money::new(decimal))
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Money::new(value)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Money::new(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Money::new(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Money::new(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{:.2}", self.0))
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Money::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn money(s: &str) -> Money {
        Money::from_str(s).unwrap()
    }

    #[test]
    fn test_from_str_normalizes_scale() {
        assert_eq!(money("1").to_string(), "1.00");
        assert_eq!(money("1.5").to_string(), "1.50");
        assert_eq!(money("  2.25  ").to_string(), "2.25");
    }

    #[test]
    fn test_rounds_half_up_not_to_even() {
        // Banker's rounding would give 0.02 and 2.34 here.
        assert_eq!(Money::new(dec!(0.025)).to_string(), "0.03");
        assert_eq!(Money::new(dec!(2.345)).to_string(), "2.35");
        assert_eq!(Money::new(dec!(2.344)).to_string(), "2.34");
    }

    #[test]
    fn test_negative_midpoint_rounds_away_from_zero() {
        assert_eq!(Money::new(dec!(-0.025)).to_string(), "-0.03");
        assert_eq!(Money::new(dec!(-1.005)).to_string(), "-1.01");
    }

    #[test]
    fn test_negative_zero_is_normalized() {
        let zero = Money::new(dec!(-0.001));
        assert!(zero.is_zero());
        assert_eq!(zero.to_string(), "0.00");
        assert_eq!((money("3.33") - money("3.33")).to_string(), "0.00");
    }

    #[test]
    fn test_split_rounds_once() {
        assert_eq!(money("10").split(3).unwrap().to_string(), "3.33");
        assert_eq!(money("20").split(3).unwrap().to_string(), "6.67");
        assert_eq!(money("0.05").split(2).unwrap().to_string(), "0.03");
        assert_eq!(money("300").split(3).unwrap().to_string(), "100.00");
    }

    #[test]
    fn test_split_into_zero_parts() {
        assert!(money("10").split(0).is_none());
    }

    #[test]
    fn test_arithmetic_preserves_scale() {
        let a = money("1.5");
        let b = money("2.5");

        assert_eq!((a + b).to_string(), "4.00");
        assert_eq!((b - a).to_string(), "1.00");
        assert_eq!((a - b).to_string(), "-1.00");
        assert_eq!((-a).to_string(), "-1.50");
    }

    #[test]
    fn test_sign_helpers() {
        assert!(money("0.01").is_positive());
        assert!(money("-0.01").is_negative());
        assert!(!Money::ZERO.is_positive());
        assert!(!Money::ZERO.is_negative());
        assert_eq!(money("-4.20").abs(), money("4.20"));
    }

    #[test]
    fn test_from_cents_and_sum() {
        let total: Money = [Money::from_cents(333), Money::from_cents(667)]
            .iter()
            .sum();
        assert_eq!(total.to_string(), "10.00");
    }
}
