use crate::error::{EngineError, Result};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;

/// Number of fractional digits carried by the currency.
pub const CURRENCY_SCALE: u32 = 2;
pub const CURRENCY_SYMBOL: &str = "₱";

const MINOR_PER_MAJOR: u64 = 100;
const BASIS_POINTS: u128 = 10_000;

/// A non-negative amount of currency, stored as a count of minor units (centavos).
///
/// At the boundary it converts to and from a major-unit `rust_decimal::Decimal`, so
/// CSV and JSON carry values like `4000.50`. Inside the engine all arithmetic is
/// integer arithmetic and can never drift.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(u64);

impl Money {
    pub const ZERO: Self = Self(0);

    pub const fn from_minor(minor: u64) -> Self {
        Self(minor)
    }

    /// Whole major units, e.g. `Money::from_major(10_000)` is ₱10,000.00.
    pub fn from_major(major: u64) -> Result<Self> {
        major
            .checked_mul(MINOR_PER_MAJOR)
            .map(Self)
            .ok_or(EngineError::Overflow)
    }

    pub fn from_decimal(value: Decimal) -> Result<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(EngineError::InvalidAmount(format!(
                "{value} is negative"
            )));
        }
        if value.normalize().scale() > CURRENCY_SCALE {
            return Err(EngineError::InvalidAmount(format!(
                "{value} has more than {CURRENCY_SCALE} decimal places"
            )));
        }
        value
            .checked_mul(Decimal::ONE_HUNDRED)
            .ok_or(EngineError::Overflow)?
            .trunc()
            .to_u64()
            .map(Self)
            .ok_or(EngineError::Overflow)
    }

    pub fn minor_units(&self) -> u64 {
        self.0
    }

    pub fn to_decimal(&self) -> Decimal {
        Decimal::from_i128_with_scale(i128::from(self.0), CURRENCY_SCALE)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, rhs: Self) -> Result<Self> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .ok_or(EngineError::Overflow)
    }

    /// Subtracts `rhs`, failing rather than going below zero.
    pub fn checked_sub(self, rhs: Self) -> Result<Self> {
        self.0
            .checked_sub(rhs.0)
            .map(Self)
            .ok_or(EngineError::NegativeResult)
    }

    pub fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    pub fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Grows the amount by `bps` basis points, rounding down.
    pub fn with_tolerance_bps(self, bps: u32) -> Self {
        let scaled = u128::from(self.0) * (BASIS_POINTS + u128::from(bps)) / BASIS_POINTS;
        Self(u64::try_from(scaled).unwrap_or(u64::MAX))
    }

    /// `round(self / total * 100)`, clamped to `[0, 100]`. A zero total yields 0.
    pub fn percent_of(self, total: Self) -> u8 {
        if total.is_zero() {
            return 0;
        }
        let numerator = u128::from(self.0) * 100 + u128::from(total.0) / 2;
        let percent = numerator / u128::from(total.0);
        percent.min(100) as u8
    }

    /// Locale-formatted major-unit string, e.g. `₱10,000.00`.
    pub fn to_display_string(&self) -> String {
        let major = (self.0 / MINOR_PER_MAJOR).to_string();
        let minor = self.0 % MINOR_PER_MAJOR;

        let mut grouped = String::with_capacity(major.len() + major.len() / 3);
        for (i, digit) in major.chars().enumerate() {
            if i > 0 && (major.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(digit);
        }

        format!("{CURRENCY_SYMBOL}{grouped}.{minor:02}")
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

impl TryFrom<Decimal> for Money {
    type Error = EngineError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::from_decimal(value)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.to_decimal()
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Money::saturating_add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}
