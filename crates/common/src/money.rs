//! Fixed-point money amounts.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of fractional digits carried by every amount.
pub const SCALE: u32 = 2;

/// Total digits a stored price or sale total may carry (`NUMERIC(10, 2)`).
pub const PRECISION: u32 = 10;

/// A monetary amount with exactly two fractional digits.
///
/// Backed by a decimal so that `quantity * unit_price` and sums of line
/// totals never drift the way binary floating point would. Serialized as a
/// decimal string (`"60.00"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    /// Largest amount a price or a sale total may hold: `99999999.99`.
    pub const MAX: Money = Money(Decimal::from_parts(1_410_065_407, 2, 0, false, SCALE));

    /// Creates an amount, rounding half away from zero to two digits.
    pub fn new(amount: Decimal) -> Self {
        let mut value = amount.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero);
        value.rescale(SCALE);
        Self(value)
    }

    /// Creates an amount from a count of cents.
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, SCALE))
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self::from_cents(0)
    }

    /// Returns the underlying decimal.
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is below zero.
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount fits a `NUMERIC(10, 2)` column.
    pub fn is_storable(&self) -> bool {
        !self.is_negative() && *self <= Money::MAX
    }

    /// Multiplies by a quantity, or `None` on decimal overflow.
    pub fn checked_mul(&self, quantity: i64) -> Option<Money> {
        self.0.checked_mul(Decimal::from(quantity)).map(Money::new)
    }

    /// Adds two amounts, or `None` on decimal overflow.
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money::new)
    }

    /// Multiplies by a quantity, saturating at the decimal range.
    ///
    /// Meant for amounts already bounded by [`Money::MAX`]; the workflow uses
    /// [`Money::checked_mul`].
    pub fn multiply(&self, quantity: i64) -> Money {
        Money::new(self.0.saturating_mul(Decimal::from(quantity)))
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self::new(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s).map(Self::new)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money::new(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}
