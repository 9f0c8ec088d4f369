//! Market data atoms: quote and trade ticks.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::shared::{
    DomainError, InstrumentId, Price, Quantity, TradeId, UnixNanos, FIXED_PRECISION_MAX,
};

/// Which side crossed the spread in a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AggressorSide {
    /// The buyer lifted the offer.
    Buyer,
    /// The seller hit the bid.
    Seller,
}

impl fmt::Display for AggressorSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buyer => write!(f, "BUYER"),
            Self::Seller => write!(f, "SELLER"),
        }
    }
}

/// Which price of the market a bar series is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceType {
    /// Best bid.
    Bid,
    /// Best ask.
    Ask,
    /// Midpoint of bid and ask.
    Mid,
    /// Last traded price.
    Last,
}

impl fmt::Display for PriceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bid => write!(f, "BID"),
            Self::Ask => write!(f, "ASK"),
            Self::Mid => write!(f, "MID"),
            Self::Last => write!(f, "LAST"),
        }
    }
}

impl FromStr for PriceType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BID" => Ok(Self::Bid),
            "ASK" => Ok(Self::Ask),
            "MID" => Ok(Self::Mid),
            "LAST" => Ok(Self::Last),
            other => Err(DomainError::InvalidValue {
                field: "price_type".to_string(),
                message: format!("unknown price type '{other}'"),
            }),
        }
    }
}

/// Top-of-book quote: best bid and ask with sizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteTick {
    /// Instrument quoted.
    pub instrument_id: InstrumentId,
    /// Best bid price.
    pub bid_price: Price,
    /// Best ask price.
    pub ask_price: Price,
    /// Size at the best bid.
    pub bid_size: Quantity,
    /// Size at the best ask.
    pub ask_size: Quantity,
    /// Venue event time.
    pub ts_event: UnixNanos,
    /// Local creation time.
    pub ts_init: UnixNanos,
}

impl QuoteTick {
    /// Extract the price and size for a bar series of the given price type.
    ///
    /// Returns `None` for [`PriceType::Last`]: quotes carry no trade price.
    /// The midpoint is computed one decimal finer than the quoted prices
    /// (capped at the fixed-point maximum).
    #[must_use]
    pub fn extract(&self, price_type: PriceType) -> Option<(Price, Quantity)> {
        match price_type {
            PriceType::Bid => Some((self.bid_price, self.bid_size)),
            PriceType::Ask => Some((self.ask_price, self.ask_size)),
            PriceType::Mid => {
                let price_precision = self
                    .bid_price
                    .precision()
                    .max(self.ask_price.precision())
                    .saturating_add(1)
                    .min(FIXED_PRECISION_MAX);
                let size_precision = self
                    .bid_size
                    .precision()
                    .max(self.ask_size.precision())
                    .saturating_add(1)
                    .min(FIXED_PRECISION_MAX);
                let two = rust_decimal::Decimal::TWO;
                let mid_px = (self.bid_price.as_decimal() + self.ask_price.as_decimal()) / two;
                let mid_size = (self.bid_size.as_decimal() + self.ask_size.as_decimal()) / two;
                let price = Price::from_decimal(mid_px, price_precision).ok()?;
                let size = Quantity::from_decimal(mid_size, size_precision).ok()?;
                Some((price, size))
            }
            PriceType::Last => None,
        }
    }
}

/// A market trade print.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeTick {
    /// Instrument traded.
    pub instrument_id: InstrumentId,
    /// Traded price.
    pub price: Price,
    /// Traded size.
    pub size: Quantity,
    /// Side that crossed the spread.
    pub aggressor_side: AggressorSide,
    /// Venue trade identifier.
    pub trade_id: TradeId,
    /// Venue event time.
    pub ts_event: UnixNanos,
    /// Local creation time.
    pub ts_init: UnixNanos,
}
