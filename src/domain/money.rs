use crate::error::{FeeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Monetary amount in the smallest indivisible currency unit.
///
/// All fee computation happens on integers; grouping and rounding are a
/// display concern and never part of calculation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Self = Self(0);

    pub fn new(units: i64) -> Self {
        Self(units)
    }

    /// Constructor for amounts that must not be negative (entry amounts,
    /// procedure prices, formula base amounts).
    pub fn non_negative(units: i64) -> Result<Self> {
        if units >= 0 {
            Ok(Self(units))
        } else {
            Err(FeeError::Validation(format!(
                "amount must not be negative, got {units}"
            )))
        }
    }

    pub fn units(&self) -> i64 {
        self.0
    }

    pub fn checked_add(self, rhs: Self) -> Result<Self> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .ok_or(FeeError::AmountOverflow)
    }

    pub fn checked_mul(self, factor: u32) -> Result<Self> {
        self.0
            .checked_mul(i64::from(factor))
            .map(Self)
            .ok_or(FeeError::AmountOverflow)
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_arithmetic() {
        let a = Money::new(10_000);
        let b = Money::new(5_000);
        assert_eq!(a + b, Money::new(15_000));
        assert_eq!(a - b, Money::new(5_000));
    }

    #[test]
    fn test_non_negative_validation() {
        assert!(Money::non_negative(0).is_ok());
        assert!(Money::non_negative(50_000).is_ok());
        assert!(matches!(
            Money::non_negative(-1),
            Err(FeeError::Validation(_))
        ));
    }

    #[test]
    fn test_checked_mul_overflow() {
        let huge = Money::new(i64::MAX / 2);
        assert!(matches!(huge.checked_mul(3), Err(FeeError::AmountOverflow)));
        assert_eq!(Money::new(5_000).checked_mul(12).unwrap(), Money::new(60_000));
    }

    #[test]
    fn test_checked_add_overflow() {
        let huge = Money::new(i64::MAX);
        assert!(matches!(
            huge.checked_add(Money::new(1)),
            Err(FeeError::AmountOverflow)
        ));
    }
}
