//! Money value object for currency amounts.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Currency;
use crate::domain::shared::DomainError;

/// A monetary amount in a specific currency.
///
/// Represented as a `Decimal` for precise financial calculations.
/// Arithmetic between different currencies is forbidden: the checked methods
/// return an error and the operators panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    /// Create a new Money value.
    #[must_use]
    pub const fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Zero in the given currency.
    #[must_use]
    pub const fn zero(currency: Currency) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    /// Create a Money value from a float.
    ///
    /// # Errors
    ///
    /// Returns error if the float cannot be represented as a `Decimal`.
    pub fn from_f64(amount: f64, currency: Currency) -> Result<Self, DomainError> {
        let amount = Decimal::try_from(amount).map_err(|e| DomainError::InvalidValue {
            field: "money".to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { amount, currency })
    }

    /// Get the amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }

    /// Get the currency.
    #[must_use]
    pub const fn currency(&self) -> Currency {
        self.currency
    }

    /// Returns true if this amount is positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// Returns true if this amount is negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    /// Returns true if this amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount == Decimal::ZERO
    }

    /// Get the absolute value.
    #[must_use]
    pub fn abs(&self) -> Self {
        Self::new(self.amount.abs(), self.currency)
    }

    /// Round to the currency's display precision.
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self::new(
            self.amount.round_dp(u32::from(self.currency.precision())),
            self.currency,
        )
    }

    /// Checked addition; both operands must share a currency.
    ///
    /// # Errors
    ///
    /// Returns error on currency mismatch.
    pub fn checked_add(self, rhs: Self) -> Result<Self, DomainError> {
        self.ensure_same_currency(rhs)?;
        Ok(Self::new(self.amount + rhs.amount, self.currency))
    }

    /// Checked subtraction; both operands must share a currency.
    ///
    /// # Errors
    ///
    /// Returns error on currency mismatch.
    pub fn checked_sub(self, rhs: Self) -> Result<Self, DomainError> {
        self.ensure_same_currency(rhs)?;
        Ok(Self::new(self.amount - rhs.amount, self.currency))
    }

    fn ensure_same_currency(self, rhs: Self) -> Result<(), DomainError> {
        if self.currency == rhs.currency {
            Ok(())
        } else {
            Err(DomainError::CurrencyMismatch {
                lhs: self.currency.code().to_string(),
                rhs: rhs.currency.code().to_string(),
            })
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = usize::from(self.currency.precision());
        write!(f, "{:.precision$} {}", self.amount, self.currency)
    }
}

impl PartialOrd for Money {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.currency == other.currency {
            Some(self.amount.cmp(&other.amount))
        } else {
            None
        }
    }
}

impl Add for Money {
    type Output = Self;

    /// # Panics
    ///
    /// Panics on currency mismatch; use [`Money::checked_add`] when the
    /// currencies are not known to match.
    fn add(self, rhs: Self) -> Self::Output {
        self.checked_add(rhs).expect("currency mismatch in add")
    }
}

impl Sub for Money {
    type Output = Self;

    /// # Panics
    ///
    /// Panics on currency mismatch; use [`Money::checked_sub`] when the
    /// currencies are not known to match.
    fn sub(self, rhs: Self) -> Self::Output {
        self.checked_sub(rhs).expect("currency mismatch in sub")
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.amount, self.currency)
    }
}

impl Mul<Decimal> for Money {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self::Output {
        Self::new(self.amount * rhs, self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_new_and_display() {
        let m = Money::new(Decimal::new(15050, 2), Currency::USD);
        assert_eq!(format!("{m}"), "150.50 USD");
    }

    #[test]
    fn money_display_uses_currency_precision() {
        let m = Money::new(Decimal::new(1000, 0), Currency::JPY);
        assert_eq!(format!("{m}"), "1000 JPY");

        let m = Money::new(Decimal::new(5, 1), Currency::BTC);
        assert_eq!(format!("{m}"), "0.50000000 BTC");
    }

    #[test]
    fn money_zero() {
        let m = Money::zero(Currency::USD);
        assert!(m.is_zero());
        assert!(!m.is_positive());
        assert!(!m.is_negative());
    }

    #[test]
    fn money_from_f64() {
        let m = Money::from_f64(150.50, Currency::USD).unwrap();
        assert_eq!(m.amount(), Decimal::try_from(150.50).unwrap());
    }

    #[test]
    fn money_same_currency_arithmetic() {
        let a = Money::new(Decimal::new(100, 0), Currency::USD);
        let b = Money::new(Decimal::new(40, 0), Currency::USD);
        assert_eq!((a + b).amount(), Decimal::new(140, 0));
        assert_eq!((a - b).amount(), Decimal::new(60, 0));
        assert_eq!((-a).amount(), Decimal::new(-100, 0));
    }

    #[test]
    fn money_cross_currency_is_error() {
        let a = Money::new(Decimal::new(100, 0), Currency::USD);
        let b = Money::new(Decimal::new(1, 0), Currency::BTC);
        assert!(a.checked_add(b).is_err());
        assert!(a.checked_sub(b).is_err());
    }

    #[test]
    #[should_panic(expected = "currency mismatch")]
    fn money_cross_currency_operator_panics() {
        let a = Money::new(Decimal::new(100, 0), Currency::USD);
        let b = Money::new(Decimal::new(1, 0), Currency::BTC);
        let _ = a + b;
    }

    #[test]
    fn money_cross_currency_not_ordered() {
        let a = Money::new(Decimal::new(100, 0), Currency::USD);
        let b = Money::new(Decimal::new(1, 0), Currency::BTC);
        assert!(a.partial_cmp(&b).is_none());
    }

    #[test]
    fn money_scalar_multiply() {
        let m = Money::new(Decimal::new(100, 0), Currency::USD);
        assert_eq!((m * Decimal::new(3, 0)).amount(), Decimal::new(300, 0));
    }

    #[test]
    fn money_abs_and_rounded() {
        let m = Money::new(Decimal::new(-150555, 3), Currency::USD);
        assert_eq!(m.abs().amount(), Decimal::new(150555, 3));
        assert_eq!(m.rounded().amount(), Decimal::new(-15056, 2));
    }

    #[test]
    fn money_serde_round_trip() {
        let m = Money::new(Decimal::new(15050, 2), Currency::USD);
        let json = serde_json::to_string(&m).unwrap();
        let parsed: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, m);
    }
}
