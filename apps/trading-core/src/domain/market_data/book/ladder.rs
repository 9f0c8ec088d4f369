//! One side of an order book: price levels in book order.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::delta::BookOrder;
use super::level::PriceLevel;
use crate::domain::order_execution::value_objects::OrderSide;
use crate::domain::shared::Price;

/// An ordered side of the book.
///
/// Levels are keyed by price; iteration yields bids descending and asks
/// ascending. An order-ID cache locates resting orders for update/delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ladder {
    side: OrderSide,
    levels: BTreeMap<Price, PriceLevel>,
    cache: HashMap<u64, Price>,
}

impl Ladder {
    /// Create an empty ladder for a side.
    #[must_use]
    pub fn new(side: OrderSide) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
            cache: HashMap::new(),
        }
    }

    /// The side this ladder holds.
    #[must_use]
    pub const fn side(&self) -> OrderSide {
        self.side
    }

    /// Number of price levels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Returns true if the side is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.levels.clear();
        self.cache.clear();
    }

    /// The best level: highest bid or lowest ask.
    #[must_use]
    pub fn top(&self) -> Option<&PriceLevel> {
        match self.side {
            OrderSide::Buy => self.levels.last_key_value().map(|(_, level)| level),
            OrderSide::Sell => self.levels.first_key_value().map(|(_, level)| level),
        }
    }

    /// Levels in book order (bids descending, asks ascending).
    #[must_use]
    pub fn levels(&self) -> Vec<&PriceLevel> {
        match self.side {
            OrderSide::Buy => self.levels.values().rev().collect(),
            OrderSide::Sell => self.levels.values().collect(),
        }
    }

    /// Add an order at its price level.
    pub fn add(&mut self, order: BookOrder) {
        self.cache.insert(order.order_id, order.price);
        self.levels
            .entry(order.price)
            .or_insert_with(|| PriceLevel::new(order.price))
            .add(order);
    }

    /// Update a resting order. An unknown ID is treated as an add; a price
    /// change re-queues the order at its new level; a zero size deletes.
    pub fn update(&mut self, order: BookOrder) {
        let Some(&cached_price) = self.cache.get(&order.order_id) else {
            if !order.size.is_zero() {
                self.add(order);
            }
            return;
        };

        if cached_price != order.price {
            self.remove_at(cached_price, order.order_id);
            if !order.size.is_zero() {
                self.add(order);
            }
            return;
        }

        if order.size.is_zero() {
            self.remove_at(cached_price, order.order_id);
            return;
        }

        if let Some(level) = self.levels.get_mut(&cached_price) {
            level.update(&order);
        }
    }

    /// Delete a resting order by ID. Returns false if the ID is unknown.
    pub fn delete(&mut self, order_id: u64) -> bool {
        let Some(&price) = self.cache.get(&order_id) else {
            return false;
        };
        self.remove_at(price, order_id);
        true
    }

    fn remove_at(&mut self, price: Price, order_id: u64) {
        if let Some(level) = self.levels.get_mut(&price) {
            level.delete(order_id);
            if level.is_empty() {
                self.levels.remove(&price);
            }
        }
        self.cache.remove(&order_id);
    }
}
