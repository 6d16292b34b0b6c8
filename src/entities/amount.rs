use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::middleware::error::AppError;

pub const MICROS_PER_UNIT: i64 = 1_000_000;
const FRACTION_DIGITS: usize = 6;

/// Monetary amount in micro-USD. Stored as `int` so every ledger
/// operation is exact.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_micros(micros: i64) -> Self {
        Amount(micros)
    }

    pub const fn from_units(units: i64) -> Self {
        Amount(units * MICROS_PER_UNIT)
    }

    pub const fn micros(self) -> i64 {
        self.0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Equal share of `self` for `parts` recipients, truncated to the micro unit.
    pub fn split_evenly(self, parts: usize) -> Amount {
        if parts == 0 {
            return Amount::ZERO;
        }
        Amount(self.0 / parts as i64)
    }

    /// `self * numerator / denominator`, truncated to the micro unit.
    pub fn scale(self, numerator: i64, denominator: i64) -> Amount {
        let scaled = (self.0 as i128 * numerator as i128) / denominator as i128;
        Amount(scaled as i64)
    }

    /// Share in basis points (1/10000).
    pub fn basis_points(self, bps: u32) -> Amount {
        self.scale(bps as i64, 10_000)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Amount) {
        self.0 += rhs.0;
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Amount) -> Amount {
        Amount(self.0 - rhs.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, |acc, a| acc + a)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let unit = MICROS_PER_UNIT as u64;
        write!(f, "{sign}{}.{:06}", abs / unit, abs % unit)
    }
}

impl FromStr for Amount {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::Validation {
            description: format!("invalid amount '{value}'"),
        };
        let value = value.trim();
        let (whole, fraction) = match value.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (value, ""),
        };
        if whole.is_empty()
            || !whole.bytes().all(|b| b.is_ascii_digit())
            || !fraction.bytes().all(|b| b.is_ascii_digit())
            || fraction.len() > FRACTION_DIGITS
        {
            return Err(invalid());
        }

        let whole: i64 = whole.parse().map_err(|_| invalid())?;
        let fraction: i64 = if fraction.is_empty() {
            0
        } else {
            let padded = format!("{fraction:0<width$}", width = FRACTION_DIGITS);
            padded.parse().map_err(|_| invalid())?
        };

        whole
            .checked_mul(MICROS_PER_UNIT)
            .and_then(|m| m.checked_add(fraction))
            .map(Amount)
            .ok_or_else(invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_strings() {
        assert_eq!("0.12".parse::<Amount>().unwrap(), Amount::from_micros(120_000));
        assert_eq!("5".parse::<Amount>().unwrap(), Amount::from_units(5));
        assert_eq!("0.000001".parse::<Amount>().unwrap(), Amount::from_micros(1));
        assert_eq!("25.50".parse::<Amount>().unwrap(), Amount::from_micros(25_500_000));
    }

    #[test]
    fn rejects_malformed_amounts() {
        for bad in ["", "-1", "1.2345678", "abc", ".5", "1.2.3", "1e3"] {
            assert!(bad.parse::<Amount>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn displays_six_decimals() {
        assert_eq!(Amount::from_micros(120_000).to_string(), "0.120000");
        assert_eq!(Amount::from_units(25).to_string(), "25.000000");
        assert_eq!(Amount::from_micros(-1).to_string(), "-0.000001");
    }

    #[test]
    fn splits_and_scales_exactly() {
        let pool = Amount::from_micros(100_000);
        let share = pool.split_evenly(3);
        assert_eq!(share, Amount::from_micros(33_333));
        assert_eq!(share.scale(12, 10), Amount::from_micros(39_999));
        assert_eq!(share.scale(8, 10), Amount::from_micros(26_666));
        assert_eq!(pool.split_evenly(0), Amount::ZERO);
    }

    #[test]
    fn basis_points_split() {
        let price = Amount::from_micros(1_000_001);
        assert_eq!(price.basis_points(7000), Amount::from_micros(700_000));
        assert_eq!(price.basis_points(2000), Amount::from_micros(200_000));
    }
}
