//! The order book aggregate at three fidelities.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::delta::{BookAction, BookOrder, OrderBookDelta, OrderBookSnapshot};
use super::ladder::Ladder;
use super::level::PriceLevel;
use crate::domain::market_data::errors::BookError;
use crate::domain::market_data::value_objects::{AggressorSide, QuoteTick, TradeTick};
use crate::domain::order_execution::value_objects::OrderSide;
use crate::domain::shared::{InstrumentId, Price, Quantity, UnixNanos};

/// Synthetic order ID for the single L1 bid level.
const L1_BID_ORDER_ID: u64 = 1;
/// Synthetic order ID for the single L1 ask level.
const L1_ASK_ORDER_ID: u64 = 2;

/// Order book fidelity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookType {
    /// Top-of-book only, driven by quote and trade ticks.
    L1Tbbo,
    /// Market by price: levels aggregate size across orders.
    L2Mbp,
    /// Market by order: every resting order preserved FIFO.
    L3Mbo,
}

impl fmt::Display for BookType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::L1Tbbo => write!(f, "L1_TBBO"),
            Self::L2Mbp => write!(f, "L2_MBP"),
            Self::L3Mbo => write!(f, "L3_MBO"),
        }
    }
}

/// A two-sided order book.
///
/// One struct covers all three fidelities; incoming orders are normalized
/// per fidelity (L1 collapses to one synthetic order per side, L2 keys
/// orders by price so sizes aggregate per level, L3 keeps venue order IDs).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBook {
    instrument_id: InstrumentId,
    book_type: BookType,
    bids: Ladder,
    asks: Ladder,
    last_update_id: u64,
    update_count: u64,
    ts_last: UnixNanos,
}

impl OrderBook {
    /// Create an empty book.
    #[must_use]
    pub fn new(instrument_id: InstrumentId, book_type: BookType) -> Self {
        Self {
            instrument_id,
            book_type,
            bids: Ladder::new(OrderSide::Buy),
            asks: Ladder::new(OrderSide::Sell),
            last_update_id: 0,
            update_count: 0,
            ts_last: UnixNanos::default(),
        }
    }

    /// Get the instrument ID.
    #[must_use]
    pub const fn instrument_id(&self) -> &InstrumentId {
        &self.instrument_id
    }

    /// Get the book fidelity.
    #[must_use]
    pub const fn book_type(&self) -> BookType {
        self.book_type
    }

    /// Number of applied mutations.
    #[must_use]
    pub const fn update_count(&self) -> u64 {
        self.update_count
    }

    /// Sequence number of the last applied delta or snapshot.
    #[must_use]
    pub const fn last_update_id(&self) -> u64 {
        self.last_update_id
    }

    /// Time of the last mutation.
    #[must_use]
    pub const fn ts_last(&self) -> UnixNanos {
        self.ts_last
    }

    /// Normalize an order for this book's fidelity.
    fn pre_process(&self, mut order: BookOrder) -> BookOrder {
        match self.book_type {
            BookType::L3Mbo => {}
            // Price-keyed: one synthetic order per level.
            #[allow(clippy::cast_sign_loss)]
            BookType::L2Mbp => order.order_id = order.price.raw() as u64,
            // Top-of-book: one synthetic order per side.
            BookType::L1Tbbo => {
                order.order_id = match order.side {
                    OrderSide::Buy => L1_BID_ORDER_ID,
                    OrderSide::Sell => L1_ASK_ORDER_ID,
                }
            }
        }
        order
    }

    fn ladder_mut(&mut self, side: OrderSide) -> &mut Ladder {
        match side {
            OrderSide::Buy => &mut self.bids,
            OrderSide::Sell => &mut self.asks,
        }
    }

    /// Add a resting order.
    ///
    /// # Errors
    ///
    /// Returns error for L1 books: top-of-book has no order placement.
    pub fn add(&mut self, order: BookOrder, ts_event: UnixNanos) -> Result<(), BookError> {
        if self.book_type == BookType::L1Tbbo {
            return Err(BookError::Unsupported {
                book_type: self.book_type.to_string(),
                operation: "add".to_string(),
            });
        }
        let order = self.pre_process(order);
        self.ladder_mut(order.side).add(order);
        self.touch(ts_event);
        Ok(())
    }

    /// Update a resting order (price or size); unknown orders are added.
    pub fn update(&mut self, order: BookOrder, ts_event: UnixNanos) {
        let order = self.pre_process(order);
        self.ladder_mut(order.side).update(order);
        self.touch(ts_event);
    }

    /// Delete a resting order.
    ///
    /// # Errors
    ///
    /// Returns error if the order is not in the book.
    pub fn delete(&mut self, order: BookOrder, ts_event: UnixNanos) -> Result<(), BookError> {
        let order = self.pre_process(order);
        if !self.ladder_mut(order.side).delete(order.order_id) {
            return Err(BookError::OrderNotFound {
                order_id: order.order_id,
            });
        }
        self.touch(ts_event);
        Ok(())
    }

    /// Remove all levels from both sides.
    pub fn clear(&mut self, ts_event: UnixNanos) {
        self.bids.clear();
        self.asks.clear();
        self.touch(ts_event);
    }

    /// Apply an incremental delta.
    ///
    /// Deltas whose `update_id` is not beyond the last applied one are
    /// dropped idempotently.
    ///
    /// # Errors
    ///
    /// Returns error on instrument mismatch or an unsupported action for
    /// this fidelity.
    pub fn apply_delta(&mut self, delta: &OrderBookDelta) -> Result<(), BookError> {
        if delta.instrument_id != self.instrument_id {
            return Err(BookError::InstrumentMismatch {
                expected: self.instrument_id.to_string(),
                actual: delta.instrument_id.to_string(),
            });
        }
        if self.is_stale(delta.update_id) {
            debug!(
                instrument_id = %self.instrument_id,
                update_id = delta.update_id,
                last_update_id = self.last_update_id,
                "stale book delta dropped"
            );
            return Ok(());
        }

        match delta.action {
            BookAction::Add => self.add(delta.order, delta.ts_event)?,
            BookAction::Update => self.update(delta.order, delta.ts_event),
            BookAction::Delete => self.delete(delta.order, delta.ts_event)?,
            BookAction::Clear => self.clear(delta.ts_event),
        }
        self.last_update_id = delta.update_id;
        Ok(())
    }

    /// Replace the book contents from a snapshot.
    ///
    /// Stale snapshots (by `update_id`) are dropped idempotently.
    ///
    /// # Errors
    ///
    /// Returns error on instrument mismatch.
    pub fn apply_snapshot(&mut self, snapshot: &OrderBookSnapshot) -> Result<(), BookError> {
        if snapshot.instrument_id != self.instrument_id {
            return Err(BookError::InstrumentMismatch {
                expected: self.instrument_id.to_string(),
                actual: snapshot.instrument_id.to_string(),
            });
        }
        if self.is_stale(snapshot.update_id) {
            debug!(
                instrument_id = %self.instrument_id,
                update_id = snapshot.update_id,
                "stale book snapshot dropped"
            );
            return Ok(());
        }

        self.bids.clear();
        self.asks.clear();
        // L1 keeps only the top level of each side.
        let (bids, asks): (&[BookOrder], &[BookOrder]) = if self.book_type == BookType::L1Tbbo {
            (
                snapshot.bids.first().map_or(&[], std::slice::from_ref),
                snapshot.asks.first().map_or(&[], std::slice::from_ref),
            )
        } else {
            (&snapshot.bids, &snapshot.asks)
        };
        for order in bids.iter().chain(asks) {
            let order = self.pre_process(*order);
            self.ladder_mut(order.side).add(order);
        }
        self.last_update_id = snapshot.update_id;
        self.touch(snapshot.ts_event);
        Ok(())
    }

    fn is_stale(&self, update_id: u64) -> bool {
        self.last_update_id > 0 && update_id <= self.last_update_id
    }

    /// Set both top-of-book sides from a quote tick (L1 only).
    ///
    /// # Errors
    ///
    /// Returns error for L2/L3 books or an instrument mismatch.
    pub fn update_quote_tick(&mut self, tick: &QuoteTick) -> Result<(), BookError> {
        self.ensure_l1("update_quote_tick")?;
        if tick.instrument_id != self.instrument_id {
            return Err(BookError::InstrumentMismatch {
                expected: self.instrument_id.to_string(),
                actual: tick.instrument_id.to_string(),
            });
        }
        self.set_l1_side(OrderSide::Buy, tick.bid_price, tick.bid_size);
        self.set_l1_side(OrderSide::Sell, tick.ask_price, tick.ask_size);
        self.touch(tick.ts_event);
        Ok(())
    }

    /// Update one top-of-book side from a trade tick by aggressor (L1 only).
    ///
    /// A SELL aggressor sets the bid, a BUY aggressor sets the ask. If the
    /// trade crosses the book, the untouched side is forced to the trade
    /// price (the trade consumed the opposing quote).
    ///
    /// # Errors
    ///
    /// Returns error for L2/L3 books or an instrument mismatch.
    pub fn update_trade_tick(&mut self, tick: &TradeTick) -> Result<(), BookError> {
        self.ensure_l1("update_trade_tick")?;
        if tick.instrument_id != self.instrument_id {
            return Err(BookError::InstrumentMismatch {
                expected: self.instrument_id.to_string(),
                actual: tick.instrument_id.to_string(),
            });
        }
        match tick.aggressor_side {
            AggressorSide::Seller => {
                self.set_l1_side(OrderSide::Buy, tick.price, tick.size);
                if self.is_crossed() {
                    if let Some(size) = self.best_ask_size() {
                        let size = Quantity::from_decimal(size, tick.size.precision())
                            .unwrap_or(tick.size);
                        self.set_l1_side(OrderSide::Sell, tick.price, size);
                    }
                }
            }
            AggressorSide::Buyer => {
                self.set_l1_side(OrderSide::Sell, tick.price, tick.size);
                if self.is_crossed() {
                    if let Some(size) = self.best_bid_size() {
                        let size = Quantity::from_decimal(size, tick.size.precision())
                            .unwrap_or(tick.size);
                        self.set_l1_side(OrderSide::Buy, tick.price, size);
                    }
                }
            }
        }
        self.touch(tick.ts_event);
        Ok(())
    }

    fn ensure_l1(&self, operation: &str) -> Result<(), BookError> {
        if self.book_type == BookType::L1Tbbo {
            Ok(())
        } else {
            Err(BookError::Unsupported {
                book_type: self.book_type.to_string(),
                operation: operation.to_string(),
            })
        }
    }

    fn set_l1_side(&mut self, side: OrderSide, price: Price, size: Quantity) {
        let order_id = match side {
            OrderSide::Buy => L1_BID_ORDER_ID,
            OrderSide::Sell => L1_ASK_ORDER_ID,
        };
        self.ladder_mut(side)
            .update(BookOrder::new(side, price, size, order_id));
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Best bid price.
    #[must_use]
    pub fn best_bid_price(&self) -> Option<Price> {
        self.bids.top().map(PriceLevel::price)
    }

    /// Best ask price.
    #[must_use]
    pub fn best_ask_price(&self) -> Option<Price> {
        self.asks.top().map(PriceLevel::price)
    }

    /// Aggregate size at the best bid.
    #[must_use]
    pub fn best_bid_size(&self) -> Option<Decimal> {
        self.bids.top().map(PriceLevel::size)
    }

    /// Aggregate size at the best ask.
    #[must_use]
    pub fn best_ask_size(&self) -> Option<Decimal> {
        self.asks.top().map(PriceLevel::size)
    }

    /// Ask minus bid, when both sides exist.
    #[must_use]
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_bid_price(), self.best_ask_price()) {
            (Some(bid), Some(ask)) => Some(ask.as_decimal() - bid.as_decimal()),
            _ => None,
        }
    }

    /// Midpoint of the top of book, when both sides exist.
    #[must_use]
    pub fn midpoint(&self) -> Option<Decimal> {
        match (self.best_bid_price(), self.best_ask_price()) {
            (Some(bid), Some(ask)) => {
                Some((bid.as_decimal() + ask.as_decimal()) / Decimal::TWO)
            }
            _ => None,
        }
    }

    /// Bid levels, best first.
    #[must_use]
    pub fn bids(&self) -> Vec<&PriceLevel> {
        self.bids.levels()
    }

    /// Ask levels, best first.
    #[must_use]
    pub fn asks(&self) -> Vec<&PriceLevel> {
        self.asks.levels()
    }

    fn is_crossed(&self) -> bool {
        matches!(
            (self.best_bid_price(), self.best_ask_price()),
            (Some(bid), Some(ask)) if bid >= ask
        )
    }

    /// Verify the book is not crossed and every level's cached size matches
    /// its resting orders. A locked book (bid equal to ask, the post-state
    /// of L1 crossing resolution) passes.
    ///
    /// # Errors
    ///
    /// Returns error describing the first violation found.
    pub fn check_integrity(&self) -> Result<(), BookError> {
        if let (Some(bid), Some(ask)) = (self.best_bid_price(), self.best_ask_price()) {
            if bid > ask {
                return Err(BookError::Integrity {
                    message: format!("book crossed: bid {bid} > ask {ask}"),
                });
            }
        }
        for level in self.bids.levels().into_iter().chain(self.asks.levels()) {
            if level.size() != level.computed_size() {
                return Err(BookError::Integrity {
                    message: format!(
                        "level {} size {} != sum of orders {}",
                        level.price(),
                        level.size(),
                        level.computed_size()
                    ),
                });
            }
        }
        Ok(())
    }

    fn touch(&mut self, ts_event: UnixNanos) {
        self.update_count += 1;
        self.ts_last = ts_event;
    }
}
