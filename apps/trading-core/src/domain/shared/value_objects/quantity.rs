//! Quantity value object backed by fixed-point integer arithmetic.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Mul, Sub};
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::fixed_point::{
    canonicalize, div_half_even, format_fixed, parse_fixed, pow10_i128, pow10_u64,
    FIXED_PRECISION_MAX,
};
use super::Price;
use crate::domain::shared::DomainError;

/// A quantity (order size, position size, volume) with a fixed decimal
/// precision.
///
/// Backed by a scaled 64-bit unsigned integer, so a quantity can never be
/// negative. Equality and ordering compare the scaled integer at matched
/// precision.
#[derive(Debug, Clone, Copy)]
pub struct Quantity {
    raw: u64,
    precision: u8,
}

impl Quantity {
    /// Create a quantity from a raw scaled integer and precision.
    ///
    /// # Errors
    ///
    /// Returns error if precision exceeds [`FIXED_PRECISION_MAX`].
    pub fn new(raw: u64, precision: u8) -> Result<Self, DomainError> {
        if precision > FIXED_PRECISION_MAX {
            return Err(DomainError::InvalidValue {
                field: "precision".to_string(),
                message: format!(
                    "Quantity precision {precision} exceeds maximum {FIXED_PRECISION_MAX}"
                ),
            });
        }
        Ok(Self { raw, precision })
    }

    /// Zero at precision 0.
    pub const ZERO: Self = Self {
        raw: 0,
        precision: 0,
    };

    /// Zero at the given precision.
    ///
    /// # Panics
    ///
    /// Panics if precision exceeds [`FIXED_PRECISION_MAX`].
    #[must_use]
    pub fn zero(precision: u8) -> Self {
        Self::new(0, precision).expect("precision within bounds")
    }

    /// Create a quantity from a float, rounding half to even at the given
    /// precision.
    ///
    /// # Errors
    ///
    /// Returns error if the value is negative or not finite, the precision is
    /// out of range, or the scaled value overflows.
    pub fn from_f64(value: f64, precision: u8) -> Result<Self, DomainError> {
        let decimal = Decimal::try_from(value).map_err(|e| DomainError::InvalidValue {
            field: "quantity".to_string(),
            message: e.to_string(),
        })?;
        Self::from_decimal(decimal, precision)
    }

    /// Create a quantity from a `Decimal`, rounding half to even at the given
    /// precision.
    ///
    /// # Errors
    ///
    /// Returns error if the value is negative, the precision is out of range,
    /// or the scaled value overflows.
    pub fn from_decimal(value: Decimal, precision: u8) -> Result<Self, DomainError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(DomainError::InvalidValue {
                field: "quantity".to_string(),
                message: format!("quantity cannot be negative, was {value}"),
            });
        }
        if precision > FIXED_PRECISION_MAX {
            return Err(DomainError::InvalidValue {
                field: "precision".to_string(),
                message: format!(
                    "Quantity precision {precision} exceeds maximum {FIXED_PRECISION_MAX}"
                ),
            });
        }
        let rounded = value.round_dp_with_strategy(
            u32::from(precision),
            RoundingStrategy::MidpointNearestEven,
        );
        let scaled = rounded
            .checked_mul(Decimal::from(pow10_u64(precision)))
            .ok_or_else(|| overflow("from_decimal"))?;
        let raw = scaled
            .trunc()
            .to_u64()
            .ok_or_else(|| overflow("from_decimal"))?;
        Ok(Self { raw, precision })
    }

    /// Get the raw scaled integer value.
    #[must_use]
    pub const fn raw(&self) -> u64 {
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
        self.raw as f64 / pow10_u64(self.precision) as f64
    }

    /// Returns true if the quantity is greater than zero.
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.raw > 0
    }

    /// Returns true if the quantity is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.raw == 0
    }

    fn rescaled(&self, precision: u8) -> u128 {
        u128::from(self.raw) * pow10_i128(precision - self.precision).unsigned_abs()
    }

    /// Checked addition at the higher precision of the two operands.
    ///
    /// # Errors
    ///
    /// Returns error on overflow of the backing integer.
    pub fn checked_add(self, rhs: Self) -> Result<Self, DomainError> {
        let precision = self.precision.max(rhs.precision);
        let sum = self.rescaled(precision) + rhs.rescaled(precision);
        from_u128(sum, precision, "add")
    }

    /// Checked subtraction at the higher precision of the two operands.
    ///
    /// # Errors
    ///
    /// Returns error if the result would be negative.
    pub fn checked_sub(self, rhs: Self) -> Result<Self, DomainError> {
        let precision = self.precision.max(rhs.precision);
        let lhs = self.rescaled(precision);
        let rhs_scaled = rhs.rescaled(precision);
        let diff = lhs
            .checked_sub(rhs_scaled)
            .ok_or_else(|| DomainError::InvalidValue {
                field: "quantity".to_string(),
                message: format!("subtraction underflow: {self} - {rhs}"),
            })?;
        from_u128(diff, precision, "sub")
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
            .ok_or_else(|| overflow("mul"))?;
        let product = i128::try_from(product).map_err(|_| overflow("mul"))?;
        let scaled = div_half_even(product, pow10_i128(precision));
        from_u128(scaled.unsigned_abs(), precision, "mul")
    }
}

fn overflow(operation: &str) -> DomainError {
    DomainError::Overflow {
        type_name: "Quantity".to_string(),
        operation: operation.to_string(),
    }
}

fn from_u128(raw: u128, precision: u8, operation: &str) -> Result<Quantity, DomainError> {
    let raw = u64::try_from(raw).map_err(|_| overflow(operation))?;
    Ok(Quantity { raw, precision })
}

impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        let precision = self.precision.max(other.precision);
        self.rescaled(precision) == other.rescaled(precision)
    }
}

impl Eq for Quantity {}

impl PartialOrd for Quantity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Quantity {
    fn cmp(&self, other: &Self) -> Ordering {
        let precision = self.precision.max(other.precision);
        self.rescaled(precision).cmp(&other.rescaled(precision))
    }
}

impl Hash for Quantity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        canonicalize(i128::from(self.raw), self.precision).hash(state);
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        format_fixed(i128::from(self.raw), self.precision, f)
    }
}

impl FromStr for Quantity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (raw, precision) = parse_fixed(s).map_err(|message| DomainError::InvalidValue {
            field: "quantity".to_string(),
            message,
        })?;
        if raw < 0 {
            return Err(DomainError::InvalidValue {
                field: "quantity".to_string(),
                message: format!("quantity cannot be negative, was {s}"),
            });
        }
        from_u128(raw.unsigned_abs(), precision, "from_str")
    }
}

impl Add for Quantity {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        self.checked_add(rhs).expect("quantity addition overflowed")
    }
}

impl Sub for Quantity {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        self.checked_sub(rhs)
            .expect("quantity subtraction underflowed")
    }
}

/// Mixing `Quantity` with `Price` yields an unscaled `Decimal`.
impl Mul<Price> for Quantity {
    type Output = Decimal;

    fn mul(self, rhs: Price) -> Self::Output {
        self.as_decimal() * rhs.as_decimal()
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_from_str() {
        let q: Quantity = "10.5".parse().unwrap();
        assert_eq!(q.raw(), 105);
        assert_eq!(q.precision(), 1);
    }

    #[test]
    fn quantity_rejects_negative() {
        assert!("-1".parse::<Quantity>().is_err());
        assert!(Quantity::from_f64(-0.5, 1).is_err());
        assert!(Quantity::from_decimal(Decimal::new(-10, 0), 0).is_err());
    }

    #[test]
    fn quantity_rejects_precision_over_max() {
        assert!(Quantity::new(1, 10).is_err());
        assert!("0.1234567890".parse::<Quantity>().is_err());
    }

    #[test]
    fn quantity_display_round_trip() {
        for s in ["10.5", "100", "0.000000001", "0.50"] {
            let q: Quantity = s.parse().unwrap();
            let parsed: Quantity = q.to_string().parse().unwrap();
            assert_eq!(parsed.raw(), q.raw());
            assert_eq!(parsed.precision(), q.precision());
        }
    }

    #[test]
    fn quantity_from_f64_rounds_half_to_even() {
        assert_eq!(Quantity::from_f64(0.5, 0).unwrap().raw(), 0);
        assert_eq!(Quantity::from_f64(1.5, 0).unwrap().raw(), 2);
    }

    #[test]
    fn quantity_arithmetic() {
        let a: Quantity = "10".parse().unwrap();
        let b: Quantity = "4.5".parse().unwrap();
        assert_eq!((a + b).to_string(), "14.5");
        assert_eq!((a - b).to_string(), "5.5");
    }

    #[test]
    fn quantity_sub_underflow_is_error() {
        let a: Quantity = "1".parse().unwrap();
        let b: Quantity = "2".parse().unwrap();
        assert!(a.checked_sub(b).is_err());
    }

    #[test]
    fn quantity_equality_across_precisions() {
        let a: Quantity = "10".parse().unwrap();
        let b: Quantity = "10.00".parse().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn quantity_ordering() {
        let a: Quantity = "10".parse().unwrap();
        let b: Quantity = "10.5".parse().unwrap();
        assert!(a < b);
    }

    #[test]
    fn quantity_zero() {
        let q = Quantity::zero(3);
        assert!(q.is_zero());
        assert_eq!(q.precision(), 3);
        assert_eq!(q.to_string(), "0.000");
    }

    #[test]
    fn quantity_times_price_is_decimal() {
        let q: Quantity = "3".parse().unwrap();
        let p: Price = "1.50".parse().unwrap();
        assert_eq!(q * p, Decimal::new(450, 2));
    }

    #[test]
    fn quantity_serde_round_trip() {
        let q: Quantity = "10.50".parse().unwrap();
        let json = serde_json::to_string(&q).unwrap();
        assert_eq!(json, "\"10.50\"");
        let parsed: Quantity = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, q);
        assert_eq!(parsed.precision(), q.precision());
    }
}
