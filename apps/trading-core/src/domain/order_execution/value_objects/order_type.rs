//! Order type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::shared::DomainError;

/// The execution type of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    /// Execute immediately at the best available price.
    Market,
    /// Rest at a limit price or better.
    Limit,
    /// Become a market order once the trigger price trades.
    StopMarket,
    /// Become a limit order once the trigger price trades.
    StopLimit,
}

impl OrderType {
    /// Returns true if this type requires a limit price.
    #[must_use]
    pub const fn requires_price(&self) -> bool {
        matches!(self, Self::Limit | Self::StopLimit)
    }

    /// Returns true if this type requires a trigger price.
    #[must_use]
    pub const fn requires_trigger(&self) -> bool {
        matches!(self, Self::StopMarket | Self::StopLimit)
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Market => write!(f, "MARKET"),
            Self::Limit => write!(f, "LIMIT"),
            Self::StopMarket => write!(f, "STOP_MARKET"),
            Self::StopLimit => write!(f, "STOP_LIMIT"),
        }
    }
}

impl FromStr for OrderType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MARKET" => Ok(Self::Market),
            "LIMIT" => Ok(Self::Limit),
            "STOP_MARKET" => Ok(Self::StopMarket),
            "STOP_LIMIT" => Ok(Self::StopLimit),
            other => Err(DomainError::InvalidValue {
                field: "order_type".to_string(),
                message: format!("unknown order type '{other}'"),
            }),
        }
    }
}
