//! A single price level holding resting orders in FIFO order.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::delta::BookOrder;
use crate::domain::shared::Price;

/// One price level of an order book side.
///
/// Orders rest in arrival order; the cached aggregate size is maintained on
/// every mutation and verified by the book's integrity check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    price: Price,
    orders: Vec<BookOrder>,
    agg_size: Decimal,
}

impl PriceLevel {
    /// Create an empty level at a price.
    #[must_use]
    pub fn new(price: Price) -> Self {
        Self {
            price,
            orders: Vec::new(),
            agg_size: Decimal::ZERO,
        }
    }

    /// The level's price.
    #[must_use]
    pub const fn price(&self) -> Price {
        self.price
    }

    /// Resting orders in FIFO order.
    #[must_use]
    pub fn orders(&self) -> &[BookOrder] {
        &self.orders
    }

    /// Number of resting orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Returns true if no orders rest at this level.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Cached aggregate size across resting orders.
    #[must_use]
    pub const fn size(&self) -> Decimal {
        self.agg_size
    }

    /// Aggregate exposure (price times size).
    #[must_use]
    pub fn exposure(&self) -> Decimal {
        self.agg_size * self.price.as_decimal()
    }

    /// Append an order at the back of the queue.
    pub fn add(&mut self, order: BookOrder) {
        self.agg_size += order.size.as_decimal();
        self.orders.push(order);
    }

    /// Replace the size of a resting order, keeping its queue position.
    /// A zero size removes the order. Returns false if the ID is unknown.
    pub fn update(&mut self, order: &BookOrder) -> bool {
        let Some(index) = self.orders.iter().position(|o| o.order_id == order.order_id) else {
            return false;
        };
        self.agg_size -= self.orders[index].size.as_decimal();
        if order.size.is_zero() {
            self.orders.remove(index);
        } else {
            self.agg_size += order.size.as_decimal();
            self.orders[index].size = order.size;
        }
        true
    }

    /// Remove a resting order by ID. Returns false if the ID is unknown.
    pub fn delete(&mut self, order_id: u64) -> bool {
        let Some(index) = self.orders.iter().position(|o| o.order_id == order_id) else {
            return false;
        };
        self.agg_size -= self.orders[index].size.as_decimal();
        self.orders.remove(index);
        true
    }

    /// Recompute the aggregate size from the resting orders.
    #[must_use]
    pub fn computed_size(&self) -> Decimal {
        self.orders
            .iter()
            .map(|o| o.size.as_decimal())
            .sum::<Decimal>()
    }
}
