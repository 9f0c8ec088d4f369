//! Price value object backed by fixed-point integer arithmetic.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::fixed_point::{
    canonicalize, div_half_even, format_fixed, parse_fixed, pow10_i128, pow10_i64,
    FIXED_PRECISION_MAX,
};
use super::Quantity;
use crate::domain::shared::DomainError;

/// A price with a fixed decimal precision.
///
/// Backed by a scaled 64-bit signed integer: `value = raw / 10^precision`.
/// Parse once at the boundary, compute in integers, format at the boundary.
/// Equality and ordering compare the scaled integer at matched precision, so
/// `1.0 == 1.00`.
#[derive(Debug, Clone, Copy)]
pub struct Price {
    raw: i64,
    precision: u8,
}

impl Price {
    /// Create a price from a raw scaled integer and precision.
    ///
    /// # Errors
    ///
    /// Returns error if precision exceeds [`FIXED_PRECISION_MAX`].
    pub fn new(raw: i64, precision: u8) -> Result<Self, DomainError> {
        check_precision(precision, "Price")?;
        Ok(Self { raw, precision })
    }

    /// Zero at precision 0.
    pub const ZERO: Self = Self {
        raw: 0,
        precision: 0,
    };

    /// Create a price from a float, rounding half to even at the given
    /// precision.
    ///
    /// # Errors
    ///
    /// Returns error if the value is not finite, the precision is out of
    /// range, or the scaled value overflows the backing integer.
    pub fn from_f64(value: f64, precision: u8) -> Result<Self, DomainError> {
        check_precision(precision, "Price")?;
        let decimal = Decimal::try_from(value).map_err(|e| DomainError::InvalidValue {
            field: "price".to_string(),
            message: e.to_string(),
        })?;
        Self::from_decimal(decimal, precision)
    }

    /// Create a price from a `Decimal`, rounding half to even at the given
    /// precision.
    ///
    /// # Errors
    ///
    /// Returns error if the precision is out of range or the scaled value
    /// overflows the backing integer.
    pub fn from_decimal(value: Decimal, precision: u8) -> Result<Self, DomainError> {
        check_precision(precision, "Price")?;
        let rounded = value.round_dp_with_strategy(
            u32::from(precision),
            RoundingStrategy::MidpointNearestEven,
        );
        let scaled = rounded
            .checked_mul(Decimal::from(pow10_i64(precision)))
            .ok_or_else(|| overflow("Price", "from_decimal"))?;
        let raw = scaled
            .trunc()
            .to_i64()
            .ok_or_else(|| overflow("Price", "from_decimal"))?;
        Ok(Self { raw, precision })
    }

    /// Get the raw scaled integer value.
    #[must_use]
    pub const fn raw(&self) -> i64 {
        self.raw
    }

    /// Get the decimal precision.
    #[must_use]
    pub const fn precision(&self) -> u8 {
        self.precision
    }

    /// Convert to an unscaled `Decimal`.
    #[must_use]
    pub fn as_decimal(&self) -> Decimal {
        Decimal::from_i128_with_scale(i128::from(self.raw), u32::from(self.precision))
    }

    /// Convert to an `f64` (lossy; for display and diagnostics only).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> f64 {
        self.raw as f64 / pow10_i64(self.precision) as f64
    }

    /// Returns true if the price is greater than zero.
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.raw > 0
    }

    /// Returns true if the price is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.raw == 0
    }

    /// Rescale the raw value to the target precision. The result fits i128
    /// because `raw <= i64::MAX` and the factor is at most `10^9`.
    fn rescaled(&self, precision: u8) -> i128 {
        i128::from(self.raw) * pow10_i128(precision - self.precision)
    }

    /// Checked addition at the higher precision of the two operands.
    ///
    /// # Errors
    ///
    /// Returns error on overflow of the backing integer.
    pub fn checked_add(self, rhs: Self) -> Result<Self, DomainError> {
        let precision = self.precision.max(rhs.precision);
        let sum = self.rescaled(precision) + rhs.rescaled(precision);
        from_i128(sum, precision, "add")
    }

    /// Checked subtraction at the higher precision of the two operands.
    ///
    /// # Errors
    ///
    /// Returns error on overflow of the backing integer.
    pub fn checked_sub(self, rhs: Self) -> Result<Self, DomainError> {
        let precision = self.precision.max(rhs.precision);
        let diff = self.rescaled(precision) - rhs.rescaled(precision);
        from_i128(diff, precision, "sub")
    }

    /// Checked multiplication at the higher precision of the two operands,
    /// rounding half to even.
    ///
    /// # Errors
    ///
    /// Returns error on overflow of the backing integer.
    pub fn checked_mul(self, rhs: Self) -> Result<Self, DomainError> {
        let precision = self.precision.max(rhs.precision);
        let product = self
            .rescaled(precision)
            .checked_mul(rhs.rescaled(precision))
            .ok_or_else(|| overflow("Price", "mul"))?;
        from_i128(div_half_even(product, pow10_i128(precision)), precision, "mul")
    }

    /// Checked division at the higher precision of the two operands, rounding
    /// half to even.
    ///
    /// # Errors
    ///
    /// Returns error on division by zero or overflow.
    pub fn checked_div(self, rhs: Self) -> Result<Self, DomainError> {
        if rhs.raw == 0 {
            return Err(DomainError::InvalidValue {
                field: "price".to_string(),
                message: "division by zero".to_string(),
            });
        }
        let precision = self.precision.max(rhs.precision);
        let mut numerator = self
            .rescaled(precision)
            .checked_mul(pow10_i128(precision))
            .ok_or_else(|| overflow("Price", "div"))?;
        let mut denominator = rhs.rescaled(precision);
        if denominator < 0 {
            numerator = -numerator;
            denominator = -denominator;
        }
        from_i128(div_half_even(numerator, denominator), precision, "div")
    }
}

fn check_precision(precision: u8, type_name: &str) -> Result<(), DomainError> {
    if precision > FIXED_PRECISION_MAX {
        return Err(DomainError::InvalidValue {
            field: "precision".to_string(),
            message: format!(
                "{type_name} precision {precision} exceeds maximum {FIXED_PRECISION_MAX}"
            ),
        });
    }
    Ok(())
}

fn overflow(type_name: &str, operation: &str) -> DomainError {
    DomainError::Overflow {
        type_name: type_name.to_string(),
        operation: operation.to_string(),
    }
}

fn from_i128(raw: i128, precision: u8, operation: &str) -> Result<Price, DomainError> {
    let raw = i64::try_from(raw).map_err(|_| overflow("Price", operation))?;
    Ok(Price { raw, precision })
}

impl PartialEq for Price {
    fn eq(&self, other: &Self) -> bool {
        let precision = self.precision.max(other.precision);
        self.rescaled(precision) == other.rescaled(precision)
    }
}

impl Eq for Price {}

impl PartialOrd for Price {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Price {
    fn cmp(&self, other: &Self) -> Ordering {
        let precision = self.precision.max(other.precision);
        self.rescaled(precision).cmp(&other.rescaled(precision))
    }
}

impl Hash for Price {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Canonical form keeps Hash consistent with precision-insensitive Eq.
        canonicalize(i128::from(self.raw), self.precision).hash(state);
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_fixed(i128::from(self.raw), self.precision, f)
    }
}

impl FromStr for Price {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (raw, precision) = parse_fixed(s).map_err(|message| DomainError::InvalidValue {
            field: "price".to_string(),
            message,
        })?;
        from_i128(raw, precision, "from_str")
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        self.checked_add(rhs).expect("price addition overflowed")
    }
}

impl Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        self.checked_sub(rhs).expect("price subtraction overflowed")
    }
}

impl Mul for Price {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        self.checked_mul(rhs)
            .expect("price multiplication overflowed")
    }
}

impl Div for Price {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        self.checked_div(rhs).expect("price division failed")
    }
}

impl Neg for Price {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self {
            raw: -self.raw,
            precision: self.precision,
        }
    }
}

/// Mixing `Price` with `Quantity` yields an unscaled `Decimal`.
impl Mul<Quantity> for Price {
    type Output = Decimal;

    fn mul(self, rhs: Quantity) -> Self::Output {
        self.as_decimal() * rhs.as_decimal()
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
