use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

/// Number of minor units per whole unit of spendable currency.
///
/// Balances are stored as integer counts of 1/10,000ths. Four decimal places is the
/// resolution at which balance comparisons are made, so two amounts that agree to
/// 1e-4 are the same amount.
pub const MONEY_SCALE: i64 = 10_000;

//--------------------------------------       Money       -----------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a money amount: {0}")]
pub struct MoneyConversionError(String);

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Money {}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let units = self.0 as f64 / MONEY_SCALE as f64;
        write!(f, "${units:0.2}")
    }
}

impl FromStr for Money {
    type Err = MoneyConversionError;

    /// Parses a decimal amount such as `"9.50"` into a `Money` value. At most four
    /// decimal places are kept; extra digits are an error rather than being silently
    /// truncated.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_start_matches('$');
        let (sign, s) = match s.strip_prefix('-') {
            Some(rest) => (-1i64, rest),
            None => (1i64, s),
        };
        let mut parts = s.splitn(2, '.');
        let whole = parts.next().unwrap_or("");
        let frac = parts.next().unwrap_or("");
        if whole.is_empty() && frac.is_empty() {
            return Err(MoneyConversionError(s.to_string()));
        }
        if frac.len() > 4 {
            return Err(MoneyConversionError(format!("{s} has more than 4 decimal places")));
        }
        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| MoneyConversionError(s.to_string()))?
        };
        let mut minor: i64 = if frac.is_empty() {
            0
        } else {
            frac.parse().map_err(|_| MoneyConversionError(s.to_string()))?
        };
        minor *= 10i64.pow(4 - frac.len() as u32);
        Ok(Self(sign * (whole * MONEY_SCALE + minor)))
    }
}

impl Money {
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Whole units of spendable currency.
    pub fn from_units(units: i64) -> Self {
        Self(units * MONEY_SCALE)
    }

    /// Rounds a floating point amount of whole units to the nearest minor unit.
    /// Used at the exchange-rate boundary only; everything downstream is integer
    /// arithmetic.
    pub fn from_f64_rounded(units: f64) -> Self {
        Self((units * MONEY_SCALE as f64).round() as i64)
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / MONEY_SCALE as f64
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_whole_and_fractional_amounts() {
        assert_eq!("10".parse::<Money>().unwrap(), Money::from_units(10));
        assert_eq!("9.50".parse::<Money>().unwrap(), Money::from(95_000));
        assert_eq!("$4.00".parse::<Money>().unwrap(), Money::from_units(4));
        assert_eq!("0.0001".parse::<Money>().unwrap(), Money::from(1));
        assert_eq!("-2.5".parse::<Money>().unwrap(), Money::from(-25_000));
    }

    #[test]
    fn rejects_sub_tolerance_precision() {
        assert!("1.00001".parse::<Money>().is_err());
        assert!("".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
    }

    #[test]
    fn arithmetic_round_trips() {
        let balance = Money::from_units(10);
        let cost = "4.00".parse::<Money>().unwrap();
        let after = balance - cost;
        assert_eq!(after, Money::from_units(6));
        assert_eq!(after + cost, balance);
    }

    #[test]
    fn display_uses_two_decimals() {
        assert_eq!(Money::from(95_000).to_string(), "$9.50");
        assert_eq!(Money::from_units(150).to_string(), "$150.00");
    }

    #[test]
    fn f64_rounding_is_symmetric() {
        let m = Money::from_f64_rounded(150_000.0 / 15_000.0);
        assert_eq!(m, Money::from_units(10));
        let with_commission = Money::from_f64_rounded(10.0 * 0.95);
        assert_eq!(with_commission, Money::from(95_000));
    }
}
