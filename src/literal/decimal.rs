//! A fixed-point decimal, backing `Literal::Decimal`.
//!
//! XSD `decimal` has an infinite, exact value space; this is a practical
//! approximation scaled to microsecond-grade precision (6 fractional
//! digits), which is more than the comparison engine or SUM/AVG
//! aggregates need (spec §4.6, §4.10) and avoids pulling in a bignum
//! dependency this crate otherwise has no use for.

use crate::error::TypeError;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

const SCALE: u32 = 6;
const SCALE_FACTOR: i128 = 1_000_000;

/// `unscaled / 10^SCALE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Decimal {
    unscaled: i128,
}

impl Decimal {
    pub fn from_i64(v: i64) -> Self {
        Decimal {
            unscaled: i128::from(v) * SCALE_FACTOR,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.unscaled == 0
    }

    pub fn to_f64(&self) -> f64 {
        self.unscaled as f64 / SCALE_FACTOR as f64
    }

    /// `Some` only when the value has no fractional part.
    pub fn to_integer(&self) -> Option<i64> {
        if self.unscaled % SCALE_FACTOR == 0 {
            i64::try_from(self.unscaled / SCALE_FACTOR).ok()
        } else {
            None
        }
    }

    pub fn compare(&self, other: &Decimal) -> Ordering {
        self.unscaled.cmp(&other.unscaled)
    }

    pub fn add(&self, other: &Decimal) -> Result<Decimal, TypeError> {
        self.unscaled
            .checked_add(other.unscaled)
            .map(|unscaled| Decimal { unscaled })
            .ok_or_else(|| TypeError::Overflow { op: "add".into() })
    }

    pub fn subtract(&self, other: &Decimal) -> Result<Decimal, TypeError> {
        self.unscaled
            .checked_sub(other.unscaled)
            .map(|unscaled| Decimal { unscaled })
            .ok_or_else(|| TypeError::Overflow { op: "subtract".into() })
    }

    pub fn multiply(&self, other: &Decimal) -> Result<Decimal, TypeError> {
        let product = self
            .unscaled
            .checked_mul(other.unscaled)
            .ok_or_else(|| TypeError::Overflow { op: "multiply".into() })?;
        Ok(Decimal { unscaled: product / SCALE_FACTOR })
    }

    pub fn divide(&self, other: &Decimal) -> Result<Decimal, TypeError> {
        if other.unscaled == 0 {
            return Err(TypeError::DivisionByZero);
        }
        // Scale the numerator up before dividing so the quotient keeps SCALE digits of precision.
        let numerator = self
            .unscaled
            .checked_mul(SCALE_FACTOR)
            .ok_or_else(|| TypeError::Overflow { op: "divide".into() })?;
        Ok(Decimal {
            unscaled: numerator / other.unscaled,
        })
    }
}

impl FromStr for Decimal {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (sign, rest) = match s.strip_prefix('-') {
            Some(rest) => (-1i128, rest),
            None => (1i128, s.strip_prefix('+').unwrap_or(s)),
        };
        let (int_part, frac_part) = match rest.split_once('.') {
            Some((i, f)) => (i, f),
            None => (rest, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(TypeError::CoercionFailed(format!("'{s}' is not a decimal")));
        }
        let int_val: i128 = if int_part.is_empty() {
            0
        } else {
            int_part
                .parse()
                .map_err(|_| TypeError::CoercionFailed(format!("'{s}' is not a decimal")))?
        };
        if frac_part.len() > SCALE as usize {
            return Err(TypeError::CoercionFailed(format!(
                "'{s}' has more than {SCALE} fractional digits"
            )));
        }
        let mut frac_digits = frac_part.to_string();
        while frac_digits.len() < SCALE as usize {
            frac_digits.push('0');
        }
        let frac_val: i128 = if frac_digits.is_empty() {
            0
        } else {
            frac_digits
                .parse()
                .map_err(|_| TypeError::CoercionFailed(format!("'{s}' is not a decimal")))?
        };
        Ok(Decimal {
            unscaled: sign * (int_val * SCALE_FACTOR + frac_val),
        })
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.unscaled < 0 { "-" } else { "" };
        let abs = self.unscaled.unsigned_abs();
        let int_part = abs / SCALE_FACTOR as u128;
        let mut frac_part = (abs % SCALE_FACTOR as u128).to_string();
        while frac_part.len() < SCALE as usize {
            frac_part.insert(0, '0');
        }
        while frac_part.len() > 1 && frac_part.ends_with('0') {
            frac_part.pop();
        }
        write!(f, "{sign}{int_part}.{frac_part}")
    }
}
