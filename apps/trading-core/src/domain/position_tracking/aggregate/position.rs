//! Position Aggregate Root
//!
//! A position folds `OrderFilled` events for a single `(instrument,
//! position_id)` into direction, quantities, average prices, realized and
//! unrealized PnL, and per-currency commissions.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::super::errors::PositionError;
use super::super::value_objects::PositionSide;
use crate::domain::instrument::Instrument;
use crate::domain::order_execution::events::OrderFilled;
use crate::domain::order_execution::value_objects::OrderSide;
use crate::domain::shared::{
    ClientOrderId, Currency, ExecutionId, InstrumentId, Money, PositionId, Price, Quantity,
    StrategyId, TraderId, UnixNanos,
};

/// Position aggregate root.
///
/// After every applied fill the `(side, net_qty)` pair is consistent:
/// positive net is LONG, negative is SHORT, zero is FLAT. Returning to FLAT
/// closes the position; further fills are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    trader_id: TraderId,
    strategy_id: StrategyId,
    instrument_id: InstrumentId,
    id: PositionId,
    opening_order_id: ClientOrderId,
    closing_order_id: Option<ClientOrderId>,
    entry: OrderSide,
    side: PositionSide,
    net_qty: Decimal,
    quantity: Quantity,
    peak_qty: Quantity,
    price_precision: u8,
    size_precision: u8,
    multiplier: Quantity,
    is_inverse: bool,
    quote_currency: Currency,
    base_currency: Option<Currency>,
    cost_currency: Currency,
    ts_init: UnixNanos,
    ts_opened: UnixNanos,
    ts_last: UnixNanos,
    ts_closed: Option<UnixNanos>,
    duration_ns: u64,
    avg_px_open: Decimal,
    avg_px_close: Option<Decimal>,
    realized_points: Decimal,
    realized_return: Decimal,
    realized_pnl: Money,
    commissions: HashMap<Currency, Money>,
    buy_qty: Quantity,
    sell_qty: Quantity,
    execution_ids: Vec<ExecutionId>,
    events: Vec<OrderFilled>,
}

impl Position {
    /// Open a position from its first fill.
    ///
    /// # Errors
    ///
    /// Returns error if the fill references a different instrument, carries
    /// no position ID, or is malformed.
    pub fn open(instrument: &Instrument, fill: &OrderFilled) -> Result<Self, PositionError> {
        if instrument.id() != &fill.instrument_id {
            return Err(PositionError::InstrumentMismatch {
                expected: instrument.id().to_string(),
                actual: fill.instrument_id.to_string(),
            });
        }
        let id = fill
            .position_id
            .clone()
            .ok_or_else(|| PositionError::MissingPositionId {
                client_order_id: fill.client_order_id.to_string(),
            })?;

        let mut position = Self {
            trader_id: fill.trader_id.clone(),
            strategy_id: fill.strategy_id.clone(),
            instrument_id: fill.instrument_id.clone(),
            id,
            opening_order_id: fill.client_order_id.clone(),
            closing_order_id: None,
            entry: fill.order_side,
            side: PositionSide::Flat,
            net_qty: Decimal::ZERO,
            quantity: Quantity::zero(instrument.size_precision()),
            peak_qty: Quantity::zero(instrument.size_precision()),
            price_precision: instrument.price_precision(),
            size_precision: instrument.size_precision(),
            multiplier: instrument.multiplier(),
            is_inverse: instrument.is_inverse(),
            quote_currency: instrument.quote_currency(),
            base_currency: instrument.base_currency(),
            cost_currency: instrument.cost_currency(),
            ts_init: fill.ts_init,
            ts_opened: fill.ts_event,
            ts_last: fill.ts_event,
            ts_closed: None,
            duration_ns: 0,
            avg_px_open: fill.last_px.as_decimal(),
            avg_px_close: None,
            realized_points: Decimal::ZERO,
            realized_return: Decimal::ZERO,
            realized_pnl: Money::zero(instrument.cost_currency()),
            commissions: HashMap::new(),
            buy_qty: Quantity::zero(instrument.size_precision()),
            sell_qty: Quantity::zero(instrument.size_precision()),
            execution_ids: Vec::new(),
            events: Vec::new(),
        };
        position.apply(fill)?;
        Ok(position)
    }

    /// Check a fill against the position without mutating it.
    ///
    /// # Errors
    ///
    /// Returns error on a duplicate execution ID, a fill against a closed
    /// position, an instrument mismatch, or a zero-quantity fill.
    pub fn validate_fill(&self, fill: &OrderFilled) -> Result<(), PositionError> {
        if self.execution_ids.contains(&fill.execution_id) {
            return Err(PositionError::DuplicateExecutionId {
                execution_id: fill.execution_id.to_string(),
            });
        }
        if self.is_closed() {
            return Err(PositionError::PositionClosed {
                position_id: self.id.to_string(),
            });
        }
        if fill.instrument_id != self.instrument_id {
            return Err(PositionError::InstrumentMismatch {
                expected: self.instrument_id.to_string(),
                actual: fill.instrument_id.to_string(),
            });
        }
        if fill.last_qty.is_zero() {
            return Err(PositionError::InvalidFill {
                message: "fill quantity must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Apply a fill to the position.
    ///
    /// # Errors
    ///
    /// Returns error on a duplicate execution ID, a fill against a closed
    /// position, or a malformed fill; the position is unchanged on error.
    pub fn apply(&mut self, fill: &OrderFilled) -> Result<(), PositionError> {
        self.validate_fill(fill)?;

        // Commission bookkeeping: recorded per currency; only the cost
        // currency reduces realized PnL.
        let mut pnl_delta = Decimal::ZERO;
        if let Some(commission) = fill.commission {
            let entry = self
                .commissions
                .entry(commission.currency())
                .or_insert_with(|| Money::zero(commission.currency()));
            *entry = Money::new(entry.amount() + commission.amount(), commission.currency());
            if commission.currency() == self.cost_currency {
                pnl_delta -= commission.amount();
            }
        }

        let last_px = fill.last_px.as_decimal();
        let last_qty = fill.last_qty.as_decimal();
        let signed_qty = match fill.order_side {
            OrderSide::Buy => last_qty,
            OrderSide::Sell => -last_qty,
        };
        let prev_net = self.net_qty;
        let opening = prev_net.is_zero() || (prev_net.is_sign_positive() == signed_qty.is_sign_positive());

        if opening {
            self.avg_px_open = if prev_net.is_zero() {
                last_px
            } else {
                weighted_avg(self.avg_px_open, prev_net.abs(), last_px, last_qty)
            };
        } else {
            let close_qty = last_qty.min(prev_net.abs());
            let prev_side = PositionSide::from_net_qty(prev_net);
            let closed_so_far = match prev_side {
                PositionSide::Long => self.sell_qty.as_decimal(),
                _ => self.buy_qty.as_decimal(),
            };
            self.avg_px_close = Some(match self.avg_px_close {
                None => last_px,
                Some(avg) => weighted_avg(avg, closed_so_far, last_px, last_qty),
            });
            self.realized_points = self.calculate_points(prev_side, self.avg_px_open, last_px);
            self.realized_return = if self.avg_px_open.is_zero() {
                Decimal::ZERO
            } else {
                points_linear(prev_side, self.avg_px_open, last_px) / self.avg_px_open
            };
            pnl_delta += self.calculate_pnl_raw(prev_side, self.avg_px_open, last_px, close_qty);

            // A fill larger than the open quantity flips the position: the
            // residual opens at the fill price and the closed-quantity
            // weights restart, so the next close of the new episode weights
            // from zero.
            if last_qty > prev_net.abs() {
                self.avg_px_open = last_px;
                self.buy_qty = Quantity::zero(self.size_precision);
                self.sell_qty = Quantity::zero(self.size_precision);
            }
        }

        self.net_qty = prev_net + signed_qty;
        self.realized_pnl = Money::new(
            self.realized_pnl.amount() + pnl_delta,
            self.cost_currency,
        );

        match fill.order_side {
            OrderSide::Buy => {
                self.buy_qty = self.buy_qty + fill.last_qty;
            }
            OrderSide::Sell => {
                self.sell_qty = self.sell_qty + fill.last_qty;
            }
        }

        self.quantity = Quantity::from_decimal(self.net_qty.abs(), self.size_precision)
            .map_err(|e| PositionError::InvalidFill {
                message: e.to_string(),
            })?;
        if self.quantity > self.peak_qty {
            self.peak_qty = self.quantity;
        }

        self.side = PositionSide::from_net_qty(self.net_qty);
        match self.side {
            PositionSide::Long => self.entry = OrderSide::Buy,
            PositionSide::Short => self.entry = OrderSide::Sell,
            PositionSide::Flat => {
                self.closing_order_id = Some(fill.client_order_id.clone());
                self.ts_closed = Some(fill.ts_event);
                self.duration_ns = fill.ts_event.duration_since(self.ts_opened);
            }
        }

        self.ts_last = fill.ts_event;
        self.execution_ids.push(fill.execution_id.clone());
        self.events.push(fill.clone());

        debug!(
            position_id = %self.id,
            side = %self.side,
            net_qty = %self.net_qty,
            realized_pnl = %self.realized_pnl,
            "position fill applied"
        );
        Ok(())
    }

    fn calculate_points(&self, side: PositionSide, open: Decimal, close: Decimal) -> Decimal {
        if self.is_inverse {
            points_inverse(side, open, close)
        } else {
            points_linear(side, open, close)
        }
    }

    fn calculate_pnl_raw(
        &self,
        side: PositionSide,
        open: Decimal,
        close: Decimal,
        quantity: Decimal,
    ) -> Decimal {
        quantity * self.multiplier.as_decimal() * self.calculate_points(side, open, close)
    }

    /// Realize the PnL of closing `quantity` at `close` against `open`,
    /// in the cost currency.
    #[must_use]
    pub fn calculate_pnl(&self, open: Decimal, close: Decimal, quantity: Quantity) -> Money {
        let side = if self.side == PositionSide::Flat {
            PositionSide::from_net_qty(self.net_qty)
        } else {
            self.side
        };
        Money::new(
            self.calculate_pnl_raw(side, open, close, quantity.as_decimal()),
            self.cost_currency,
        )
    }

    /// Unrealized PnL of the open quantity marked at `last`.
    #[must_use]
    pub fn unrealized_pnl(&self, last: Price) -> Money {
        if self.side == PositionSide::Flat {
            Money::zero(self.cost_currency)
        } else {
            Money::new(
                self.calculate_pnl_raw(
                    self.side,
                    self.avg_px_open,
                    last.as_decimal(),
                    self.quantity.as_decimal(),
                ),
                self.cost_currency,
            )
        }
    }

    /// Realized plus unrealized PnL marked at `last`.
    #[must_use]
    pub fn total_pnl(&self, last: Price) -> Money {
        Money::new(
            self.realized_pnl.amount() + self.unrealized_pnl(last).amount(),
            self.cost_currency,
        )
    }

    /// Notional exposure marked at `last`: in the base currency for inverse
    /// instruments, otherwise in the quote currency.
    #[must_use]
    pub fn notional_value(&self, last: Price) -> Money {
        let qty = self.quantity.as_decimal() * self.multiplier.as_decimal();
        if self.is_inverse {
            let amount = if last.as_decimal().is_zero() {
                Decimal::ZERO
            } else {
                qty / last.as_decimal()
            };
            Money::new(amount, self.cost_currency)
        } else {
            Money::new(qty * last.as_decimal(), self.quote_currency)
        }
    }

    // ========================================================================
    // Getters
    // ========================================================================

    /// Get the trader ID.
    #[must_use]
    pub const fn trader_id(&self) -> &TraderId {
        &self.trader_id
    }

    /// Get the strategy ID.
    #[must_use]
    pub const fn strategy_id(&self) -> &StrategyId {
        &self.strategy_id
    }

    /// Get the instrument ID.
    #[must_use]
    pub const fn instrument_id(&self) -> &InstrumentId {
        &self.instrument_id
    }

    /// Get the position ID.
    #[must_use]
    pub const fn id(&self) -> &PositionId {
        &self.id
    }

    /// Order that opened the position.
    #[must_use]
    pub const fn opening_order_id(&self) -> &ClientOrderId {
        &self.opening_order_id
    }

    /// Order that closed the position, once flat.
    #[must_use]
    pub const fn closing_order_id(&self) -> Option<&ClientOrderId> {
        self.closing_order_id.as_ref()
    }

    /// Side of the order that established the current direction.
    #[must_use]
    pub const fn entry(&self) -> OrderSide {
        self.entry
    }

    /// Current position side.
    #[must_use]
    pub const fn side(&self) -> PositionSide {
        self.side
    }

    /// Signed net quantity (positive long, negative short).
    #[must_use]
    pub const fn net_qty(&self) -> Decimal {
        self.net_qty
    }

    /// Unsigned open quantity.
    #[must_use]
    pub const fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Largest open quantity reached over the lifecycle.
    #[must_use]
    pub const fn peak_qty(&self) -> Quantity {
        self.peak_qty
    }

    /// Quantity-weighted average opening price.
    #[must_use]
    pub const fn avg_px_open(&self) -> Decimal {
        self.avg_px_open
    }

    /// Quantity-weighted average closing price, once any quantity closed.
    #[must_use]
    pub const fn avg_px_close(&self) -> Option<Decimal> {
        self.avg_px_close
    }

    /// Raw price points realized by the latest closing fill.
    #[must_use]
    pub const fn realized_points(&self) -> Decimal {
        self.realized_points
    }

    /// Realized points divided by the average open price.
    #[must_use]
    pub const fn realized_return(&self) -> Decimal {
        self.realized_return
    }

    /// Cumulative realized PnL in the cost currency (commissions included).
    #[must_use]
    pub const fn realized_pnl(&self) -> Money {
        self.realized_pnl
    }

    /// Cumulative commissions keyed by currency.
    #[must_use]
    pub const fn commissions(&self) -> &HashMap<Currency, Money> {
        &self.commissions
    }

    /// Total bought quantity.
    #[must_use]
    pub const fn buy_qty(&self) -> Quantity {
        self.buy_qty
    }

    /// Total sold quantity.
    #[must_use]
    pub const fn sell_qty(&self) -> Quantity {
        self.sell_qty
    }

    /// Currency PnL settles in.
    #[must_use]
    pub const fn cost_currency(&self) -> Currency {
        self.cost_currency
    }

    /// When the position opened.
    #[must_use]
    pub const fn ts_opened(&self) -> UnixNanos {
        self.ts_opened
    }

    /// Time of the last applied fill.
    #[must_use]
    pub const fn ts_last(&self) -> UnixNanos {
        self.ts_last
    }

    /// When the position closed, once flat.
    #[must_use]
    pub const fn ts_closed(&self) -> Option<UnixNanos> {
        self.ts_closed
    }

    /// Nanoseconds from open to close.
    #[must_use]
    pub const fn duration_ns(&self) -> u64 {
        self.duration_ns
    }

    /// Applied fills, oldest first.
    #[must_use]
    pub fn events(&self) -> &[OrderFilled] {
        &self.events
    }

    /// Execution IDs applied so far.
    #[must_use]
    pub fn execution_ids(&self) -> &[ExecutionId] {
        &self.execution_ids
    }

    /// Number of applied fills.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Returns true while the position has exposure.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.side != PositionSide::Flat
    }

    /// Returns true once the position has returned to flat.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.ts_closed.is_some()
    }

    /// Returns true for long positions.
    #[must_use]
    pub fn is_long(&self) -> bool {
        self.side == PositionSide::Long
    }

    /// Returns true for short positions.
    #[must_use]
    pub fn is_short(&self) -> bool {
        self.side == PositionSide::Short
    }
}

fn weighted_avg(avg: Decimal, qty: Decimal, last_px: Decimal, last_qty: Decimal) -> Decimal {
    let total = qty + last_qty;
    if total.is_zero() {
        last_px
    } else {
        (avg * qty + last_px * last_qty) / total
    }
}

fn points_linear(side: PositionSide, open: Decimal, close: Decimal) -> Decimal {
    match side {
        PositionSide::Long => close - open,
        PositionSide::Short => open - close,
        PositionSide::Flat => Decimal::ZERO,
    }
}

fn points_inverse(side: PositionSide, open: Decimal, close: Decimal) -> Decimal {
    if open.is_zero() || close.is_zero() {
        return Decimal::ZERO;
    }
    let inverse_open = Decimal::ONE / open;
    let inverse_close = Decimal::ONE / close;
    match side {
        PositionSide::Long => inverse_open - inverse_close,
        PositionSide::Short => inverse_close - inverse_open,
        PositionSide::Flat => Decimal::ZERO,
    }
}
