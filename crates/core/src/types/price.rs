//! Monetary amounts using decimal arithmetic.
//!
//! Prices are stored as `NUMERIC(10, 2)`: at most ten digits, two of them
//! after the decimal point. The marketplace is single-currency.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    #[error("price cannot be negative")]
    Negative,
    #[error("price can have at most 2 decimal places")]
    TooPrecise,
    #[error("price must be less than 100000000")]
    TooLarge,
    #[error("price is not a number")]
    Invalid,
}

/// A non-negative amount with at most two decimal places.
///
/// Line totals (`price x quantity`) and cart totals are also `Price`s. They
/// are not range-checked against the column limit since they are never
/// stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Exclusive upper bound implied by `NUMERIC(10, 2)`.
    const LIMIT: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);

    /// Validate a decimal amount as a unit price.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError`] if the amount is negative, has more than two
    /// decimal places (after dropping trailing zeros) or does not fit the column.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        if amount.normalize().scale() > 2 {
            return Err(PriceError::TooPrecise);
        }
        if amount >= Self::LIMIT {
            return Err(PriceError::TooLarge);
        }
        Ok(Self(amount))
    }

    /// Parse user input such as `"10"`, `"10.5"` or `"10.50"`.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Invalid`] if the text is not a decimal number,
    /// or any error from [`Price::new`].
    pub fn parse(input: &str) -> Result<Self, PriceError> {
        let amount: Decimal = input.trim().parse().map_err(|_| PriceError::Invalid)?;
        Self::new(amount)
    }

    /// Build a price from a whole number of cents.
    #[must_use]
    pub fn from_cents(cents: u32) -> Self {
        Self(Decimal::new(i64::from(cents), 2))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// This price multiplied by a quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut amount = self.0;
        amount.rescale(2);
        write!(f, "{amount}")
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_common_forms() {
        assert_eq!(Price::parse("10").unwrap(), Price::from_cents(1000));
        assert_eq!(Price::parse(" 10.5 ").unwrap(), Price::from_cents(1050));
        assert_eq!(Price::parse("0.99").unwrap(), Price::from_cents(99));
        assert_eq!(Price::parse("3.100").unwrap(), Price::from_cents(310));
    }

    #[test]
    fn test_parse_rejects_invalid() {
        assert_eq!(Price::parse("-1"), Err(PriceError::Negative));
        assert_eq!(Price::parse("1.999"), Err(PriceError::TooPrecise));
        assert_eq!(Price::parse("100000000"), Err(PriceError::TooLarge));
        assert_eq!(Price::parse("ten"), Err(PriceError::Invalid));
    }

    #[test]
    fn test_display_always_two_places() {
        assert_eq!(Price::from_cents(1000).to_string(), "10.00");
        assert_eq!(Price::parse("7.5").unwrap().to_string(), "7.50");
        assert_eq!(Price::ZERO.to_string(), "0.00");
    }

    #[test]
    fn test_times_and_sum() {
        let unit = Price::from_cents(1999);
        assert_eq!(unit.times(3), Price::from_cents(5997));
        assert_eq!(unit.times(0), Price::ZERO);

        let total: Price = [Price::from_cents(100), Price::from_cents(250)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_cents(350));
    }
}
