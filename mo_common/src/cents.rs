use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const CURRENCY_CODE: &str = "CNY";

//--------------------------------------       Cents         ---------------------------------------------------------
/// An amount of money in exact integer minor units (1/100 of the display currency).
///
/// Balances, prices and ledger amounts all use this type, so no floating point ever touches money.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Cents(i64);

op!(binary Cents, Add, add);
op!(binary Cents, Sub, sub);
op!(inplace Cents, AddAssign, add_assign);
op!(inplace Cents, SubAssign, sub_assign);
op!(unary Cents, Neg, neg);

impl Mul<i64> for Cents {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in cents: {0}")]
pub struct CentsConversionError(String);

impl From<i64> for Cents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Cents {
    type Error = CentsConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(CentsConversionError(format!("Value {value} is too large to convert to Cents")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Cents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02} {CURRENCY_CODE}", abs / 100, abs % 100)
    }
}

impl Cents {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_units(units: i64) -> Self {
        Self(units * 100)
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    pub fn checked_mul(self, rhs: i64) -> Option<Self> {
        self.0.checked_mul(rhs).map(Self)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn arithmetic() {
        let a = Cents::from(3000);
        let b = Cents::from(1000);
        assert_eq!(a + b, Cents::from(4000));
        assert_eq!(a - b, Cents::from(2000));
        assert_eq!(a * 2, Cents::from(6000));
        assert_eq!(-a, Cents::from(-3000));
        let mut c = a;
        c -= b;
        c += Cents::from(1);
        assert_eq!(c, Cents::from(2001));
        let total: Cents = vec![a, b, c].into_iter().sum();
        assert_eq!(total.value(), 6001);
    }

    #[test]
    fn checked_arithmetic() {
        assert!(Cents::from(i64::MAX).checked_add(Cents::from(1)).is_none());
        assert!(Cents::from(i64::MAX / 2 + 1).checked_mul(2).is_none());
        assert_eq!(Cents::from(50).checked_mul(3), Some(Cents::from(150)));
        assert!(Cents::try_from(u64::MAX).is_err());
    }

    #[test]
    fn display() {
        assert_eq!(Cents::from(6000).to_string(), "60.00 CNY");
        assert_eq!(Cents::from(5).to_string(), "0.05 CNY");
        assert_eq!(Cents::from(-1234).to_string(), "-12.34 CNY");
        assert_eq!(Cents::from_units(3).value(), 300);
    }

    #[test]
    fn serializes_as_integer() {
        let json = serde_json::to_string(&Cents::from(4200)).unwrap();
        assert_eq!(json, "4200");
        let c: Cents = serde_json::from_str("17").unwrap();
        assert_eq!(c.value(), 17);
    }
}
