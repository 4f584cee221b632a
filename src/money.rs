//! Fixed-point money amounts.
//!
//! All balances, chore payments, goal targets and transaction amounts are
//! [Money]: a decimal rounded to two fraction digits. Amounts are stored in
//! the database as TEXT and sent to clients as strings, e.g. `"12.50"`, so
//! that no value ever passes through binary floating point.

use std::{
    fmt::Display,
    ops::{Add, Neg, Sub},
    str::FromStr,
};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::Error;

/// The number of fraction digits kept for every amount.
pub const MONEY_SCALE: u32 = 2;

/// A decimal amount of money with exactly two fraction digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(Decimal);

impl Money {
    /// Create an amount from a decimal, rounding midpoints away from zero.
    ///
    /// Negative zero is normalised to zero.
    pub fn new(amount: Decimal) -> Self {
        let mut amount =
            amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);

        if amount.is_zero() {
            amount = Decimal::ZERO;
        }

        amount.rescale(MONEY_SCALE);

        Self(amount)
    }

    /// The amount `0.00`.
    pub fn zero() -> Self {
        Self::new(Decimal::ZERO)
    }

    /// The largest amount a client may submit, matching a `DECIMAL(10, 2)` column.
    pub fn max_input() -> Self {
        Self::new(Decimal::new(9_999_999_999, MONEY_SCALE))
    }

    /// Whether the amount is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// The absolute value of the amount.
    pub fn abs(&self) -> Self {
        Self::new(self.0.abs())
    }

    /// Clamp the amount so that it is never below zero.
    pub fn at_least_zero(self) -> Self {
        if self.0 < Decimal::ZERO {
            Self::zero()
        } else {
            self
        }
    }

    /// The underlying decimal value.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self::new(value)
    }
}

impl FromStr for Money {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        Decimal::from_str_exact(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map(Money::new)
            .map_err(|_| Error::InvalidAmount(s.to_owned()))
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money::new(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money::new(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money::new(-self.0)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;

        Money::from_str(&raw).map_err(de::Error::custom)
    }
}

impl ToSql for Money {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for Money {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Text(text) => {
                let text = std::str::from_utf8(text)
                    .map_err(|error| FromSqlError::Other(Box::new(error)))?;

                Money::from_str(text).map_err(|error| FromSqlError::Other(Box::new(error)))
            }
            ValueRef::Integer(integer) => Ok(Money::new(Decimal::from(integer))),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// An amount exactly as a client submitted it, before validation.
///
/// Clients normally send amounts as strings, but plain JSON numbers are
/// accepted too and kept as their decimal text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmountInput(String);

impl AmountInput {
    /// Wrap raw amount text.
    pub fn new(raw: &str) -> Self {
        Self(raw.to_owned())
    }

    /// Parse the input as a strictly positive amount no larger than [Money::max_input].
    ///
    /// The error is a message suitable for showing next to the form field.
    pub fn parse_positive(&self) -> Result<Money, String> {
        let amount = Money::from_str(&self.0)
            .ok()
            .filter(Money::is_positive)
            .ok_or_else(|| "Amount must be a positive number".to_owned())?;

        if amount > Money::max_input() {
            return Err(format!("Amount must be at most {}", Money::max_input()));
        }

        Ok(amount)
    }
}

impl<'de> Deserialize<'de> for AmountInput {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AmountInputVisitor;

        impl de::Visitor<'_> for AmountInputVisitor {
            type Value = AmountInput;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("an amount as a string or number")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(AmountInput::new(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(AmountInput(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(AmountInput(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(AmountInput(v.to_string()))
            }
        }

        deserializer.deserialize_any(AmountInputVisitor)
    }
}
