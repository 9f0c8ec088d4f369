//! Strongly-typed identifiers for domain entities.
//!
//! These prevent mixing up IDs from different contexts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::shared::DomainError;

macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier from a string.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Generate a new unique identifier using UUID v4.
            #[must_use]
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// Get the inner string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

define_id!(TraderId, "Unique identifier for a trader.");
define_id!(StrategyId, "Unique identifier for a strategy instance.");
define_id!(AccountId, "Unique identifier for a trading account.");
define_id!(
    ClientOrderId,
    "Client-assigned unique identifier for an order."
);
define_id!(
    VenueOrderId,
    "Venue-assigned unique identifier for an order."
);
define_id!(PositionId, "Unique identifier for a position.");
define_id!(
    ExecutionId,
    "Venue-assigned unique identifier for a single execution (fill)."
);
define_id!(OrderListId, "Unique identifier for a list of related orders.");
define_id!(TradeId, "Venue-assigned identifier for a market trade print.");
define_id!(Symbol, "Ticker symbol for a tradeable instrument.");
define_id!(Venue, "Trading venue or exchange code.");

/// Identifier for a tradeable instrument: a symbol qualified by its venue.
///
/// String form is `{symbol}.{venue}`; the symbol may itself contain dots, so
/// parsing splits on the last one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstrumentId {
    /// Ticker symbol.
    pub symbol: Symbol,
    /// Trading venue.
    pub venue: Venue,
}

impl InstrumentId {
    /// Create an instrument ID from its parts.
    #[must_use]
    pub const fn new(symbol: Symbol, venue: Venue) -> Self {
        Self { symbol, venue }
    }
}

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.symbol, self.venue)
    }
}

impl FromStr for InstrumentId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.rsplit_once('.') {
            Some((symbol, venue)) if !symbol.is_empty() && !venue.is_empty() => {
                Ok(Self::new(Symbol::new(symbol), Venue::new(venue)))
            }
            _ => Err(DomainError::InvalidValue {
                field: "instrument_id".to_string(),
                message: format!("'{s}' is not in SYMBOL.VENUE form"),
            }),
        }
    }
}

impl Serialize for InstrumentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for InstrumentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
