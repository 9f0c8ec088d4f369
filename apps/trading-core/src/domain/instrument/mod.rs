//! Instrument definitions.
//!
//! An instrument fixes the precisions, multiplier, and currencies that every
//! order, position, and market-data value for that market must agree on.
//! Instruments are registered with the engine before any tick referencing
//! them arrives.

use serde::{Deserialize, Serialize};

use crate::domain::shared::{
    Currency, DomainError, InstrumentId, Price, Quantity, FIXED_PRECISION_MAX,
};

/// An immutable tradeable instrument definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    id: InstrumentId,
    price_precision: u8,
    size_precision: u8,
    multiplier: Quantity,
    is_inverse: bool,
    quote_currency: Currency,
    base_currency: Option<Currency>,
}

impl Instrument {
    /// Create a new instrument definition.
    ///
    /// # Errors
    ///
    /// Returns error if a precision exceeds the fixed-point maximum, the
    /// multiplier is zero, or the instrument is inverse without a base
    /// currency (inverse PnL settles in the base currency).
    pub fn new(
        id: InstrumentId,
        price_precision: u8,
        size_precision: u8,
        multiplier: Quantity,
        is_inverse: bool,
        quote_currency: Currency,
        base_currency: Option<Currency>,
    ) -> Result<Self, DomainError> {
        if price_precision > FIXED_PRECISION_MAX || size_precision > FIXED_PRECISION_MAX {
            return Err(DomainError::InvalidValue {
                field: "precision".to_string(),
                message: format!(
                    "price_precision {price_precision} / size_precision {size_precision} \
                     exceed maximum {FIXED_PRECISION_MAX}"
                ),
            });
        }
        if multiplier.is_zero() {
            return Err(DomainError::InvalidValue {
                field: "multiplier".to_string(),
                message: "multiplier must be positive".to_string(),
            });
        }
        if is_inverse && base_currency.is_none() {
            return Err(DomainError::InvalidValue {
                field: "base_currency".to_string(),
                message: "inverse instruments require a base currency".to_string(),
            });
        }
        Ok(Self {
            id,
            price_precision,
            size_precision,
            multiplier,
            is_inverse,
            quote_currency,
            base_currency,
        })
    }

    /// Get the instrument ID.
    #[must_use]
    pub const fn id(&self) -> &InstrumentId {
        &self.id
    }

    /// Get the price precision in decimal places.
    #[must_use]
    pub const fn price_precision(&self) -> u8 {
        self.price_precision
    }

    /// Get the size precision in decimal places.
    #[must_use]
    pub const fn size_precision(&self) -> u8 {
        self.size_precision
    }

    /// Get the contract multiplier.
    #[must_use]
    pub const fn multiplier(&self) -> Quantity {
        self.multiplier
    }

    /// Returns true if the instrument is inverse (payout is `1/price`
    /// linear, expressed in the base currency).
    #[must_use]
    pub const fn is_inverse(&self) -> bool {
        self.is_inverse
    }

    /// Get the quote currency.
    #[must_use]
    pub const fn quote_currency(&self) -> Currency {
        self.quote_currency
    }

    /// Get the base currency, if defined.
    #[must_use]
    pub const fn base_currency(&self) -> Option<Currency> {
        self.base_currency
    }

    /// The currency PnL and commissions settle in: the base currency for
    /// inverse instruments, otherwise the quote currency.
    ///
    /// # Panics
    ///
    /// Never panics: the constructor guarantees inverse instruments carry a
    /// base currency.
    #[must_use]
    pub fn cost_currency(&self) -> Currency {
        if self.is_inverse {
            self.base_currency.expect("validated at construction")
        } else {
            self.quote_currency
        }
    }

    /// Build a price at this instrument's price precision, rounding half to
    /// even.
    ///
    /// # Errors
    ///
    /// Returns error if the value cannot be represented.
    pub fn make_price(&self, value: f64) -> Result<Price, DomainError> {
        Price::from_f64(value, self.price_precision)
    }

    /// Build a quantity at this instrument's size precision, rounding half
    /// to even.
    ///
    /// # Errors
    ///
    /// Returns error if the value is negative or cannot be represented.
    pub fn make_qty(&self, value: f64) -> Result<Quantity, DomainError> {
        Quantity::from_f64(value, self.size_precision)
    }
}
