//! Order book deltas and snapshots.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::order_execution::value_objects::OrderSide;
use crate::domain::shared::{InstrumentId, Price, Quantity, UnixNanos};

/// What a delta does to the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookAction {
    /// Add a resting order.
    Add,
    /// Update a resting order (price or size).
    Update,
    /// Remove a resting order.
    Delete,
    /// Clear the whole book.
    Clear,
}

impl fmt::Display for BookAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "ADD"),
            Self::Update => write!(f, "UPDATE"),
            Self::Delete => write!(f, "DELETE"),
            Self::Clear => write!(f, "CLEAR"),
        }
    }
}

/// A resting order in the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookOrder {
    /// Side of the book the order rests on.
    pub side: OrderSide,
    /// Resting price.
    pub price: Price,
    /// Resting size.
    pub size: Quantity,
    /// Venue order ID (zero when the feed is price-keyed).
    pub order_id: u64,
}

impl BookOrder {
    /// Create a book order.
    #[must_use]
    pub const fn new(side: OrderSide, price: Price, size: Quantity, order_id: u64) -> Self {
        Self {
            side,
            price,
            size,
            order_id,
        }
    }
}

/// A single incremental change to an order book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBookDelta {
    /// Instrument the book tracks.
    pub instrument_id: InstrumentId,
    /// What the delta does.
    pub action: BookAction,
    /// The affected order (ignored for `Clear`).
    pub order: BookOrder,
    /// Monotonically increasing sequence; stale deltas are dropped.
    pub update_id: u64,
    /// Venue event time.
    pub ts_event: UnixNanos,
    /// Local creation time.
    pub ts_init: UnixNanos,
}

/// A full image of both sides of an order book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    /// Instrument the book tracks.
    pub instrument_id: InstrumentId,
    /// Bid orders, best first.
    pub bids: Vec<BookOrder>,
    /// Ask orders, best first.
    pub asks: Vec<BookOrder>,
    /// Monotonically increasing sequence; stale snapshots are dropped.
    pub update_id: u64,
    /// Venue event time.
    pub ts_event: UnixNanos,
    /// Local creation time.
    pub ts_init: UnixNanos,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_action_display() {
        assert_eq!(format!("{}", BookAction::Add), "ADD");
        assert_eq!(format!("{}", BookAction::Clear), "CLEAR");
    }

    #[test]
    fn delta_serde_round_trip() {
        let delta = OrderBookDelta {
            instrument_id: "BTCUSDT.BINANCE".parse().unwrap(),
            action: BookAction::Add,
            order: BookOrder::new(
                OrderSide::Buy,
                "100.00".parse().unwrap(),
                "5".parse().unwrap(),
                42,
            ),
            update_id: 1,
            ts_event: UnixNanos::new(1),
            ts_init: UnixNanos::new(1),
        };
        let json = serde_json::to_string(&delta).unwrap();
        let parsed: OrderBookDelta = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, delta);
    }
}
