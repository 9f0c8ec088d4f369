//! Order Aggregate Root
//!
//! An order is an event-sourced aggregate: it is constructed from an
//! `OrderInitialized` event and mutated exclusively by applying further
//! order events. Every apply validates the lifecycle transition and the
//! event's preconditions before touching any state.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::super::errors::OrderError;
use super::super::events::{OrderEvent, OrderFilled, OrderInitialized, OrderUpdated};
use super::super::services::{OrderStateMachine, TransitionOutcome};
use super::super::value_objects::{
    ContingencyType, OrderSide, OrderStatus, OrderType, TimeInForce,
};
use crate::domain::shared::{
    ClientOrderId, ExecutionId, InstrumentId, OrderListId, PositionId, Price, Quantity,
    StrategyId, TraderId, UnixNanos, VenueOrderId,
};

/// Order aggregate root.
///
/// One struct covers all order types; the type-specific fields (`price`,
/// `trigger_price`, `display_qty`) are validated against the order type at
/// construction. The lifecycle is governed by the shared state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    trader_id: TraderId,
    strategy_id: StrategyId,
    instrument_id: InstrumentId,
    client_order_id: ClientOrderId,
    venue_order_id: Option<VenueOrderId>,
    position_id: Option<PositionId>,
    order_side: OrderSide,
    order_type: OrderType,
    quantity: Quantity,
    time_in_force: TimeInForce,
    expire_time: Option<UnixNanos>,
    price: Option<Price>,
    trigger_price: Option<Price>,
    display_qty: Option<Quantity>,
    is_reduce_only: bool,
    is_triggered: bool,
    status: OrderStatus,
    prior_status: Option<OrderStatus>,
    events: Vec<OrderEvent>,
    execution_ids: Vec<ExecutionId>,
    filled_qty: Quantity,
    leaves_qty: Quantity,
    avg_px: Option<Decimal>,
    slippage: Option<Decimal>,
    ts_init: UnixNanos,
    ts_last: UnixNanos,
    order_list_id: Option<OrderListId>,
    parent_order_id: Option<ClientOrderId>,
    child_order_ids: Vec<ClientOrderId>,
    contingency_type: Option<ContingencyType>,
    contingency_ids: Vec<ClientOrderId>,
    tags: Option<String>,
}

impl Order {
    /// Construct an order from its initialization event.
    ///
    /// # Errors
    ///
    /// Returns error if the definition is inconsistent: zero quantity,
    /// display quantity above the order quantity, a GTD order without an
    /// expire time (or an expire time without GTD), or prices that do not
    /// match the order type.
    pub fn from_init(init: OrderInitialized) -> Result<Self, OrderError> {
        Self::validate_init(&init)?;

        let leaves_qty = init.quantity;
        let order = Self {
            trader_id: init.trader_id.clone(),
            strategy_id: init.strategy_id.clone(),
            instrument_id: init.instrument_id.clone(),
            client_order_id: init.client_order_id.clone(),
            venue_order_id: None,
            position_id: None,
            order_side: init.order_side,
            order_type: init.order_type,
            quantity: init.quantity,
            time_in_force: init.time_in_force,
            expire_time: init.expire_time,
            price: init.price,
            trigger_price: init.trigger_price,
            display_qty: init.display_qty,
            is_reduce_only: init.is_reduce_only,
            is_triggered: false,
            status: OrderStatus::Initialized,
            prior_status: None,
            events: vec![OrderEvent::Initialized(init.clone())],
            execution_ids: Vec::new(),
            filled_qty: Quantity::zero(init.quantity.precision()),
            leaves_qty,
            avg_px: None,
            slippage: None,
            ts_init: init.ts_init,
            ts_last: init.ts_event,
            order_list_id: init.order_list_id,
            parent_order_id: init.parent_order_id,
            child_order_ids: Vec::new(),
            contingency_type: init.contingency_type,
            contingency_ids: init.contingency_ids,
            tags: init.tags,
        };
        Ok(order)
    }

    fn validate_init(init: &OrderInitialized) -> Result<(), OrderError> {
        if init.quantity.is_zero() {
            return Err(OrderError::InvalidParameters {
                field: "quantity".to_string(),
                message: "order quantity must be positive".to_string(),
            });
        }
        if let Some(display_qty) = init.display_qty {
            if display_qty > init.quantity {
                return Err(OrderError::InvalidParameters {
                    field: "display_qty".to_string(),
                    message: format!(
                        "display quantity {display_qty} exceeds order quantity {}",
                        init.quantity
                    ),
                });
            }
        }
        match (init.time_in_force, init.expire_time) {
            (TimeInForce::Gtd, None) => {
                return Err(OrderError::InvalidParameters {
                    field: "expire_time".to_string(),
                    message: "GTD orders require an expire time".to_string(),
                });
            }
            (tif, Some(_)) if tif != TimeInForce::Gtd => {
                return Err(OrderError::InvalidParameters {
                    field: "expire_time".to_string(),
                    message: format!("expire time set on {tif} order"),
                });
            }
            _ => {}
        }
        if init.order_type.requires_price() != init.price.is_some() {
            return Err(OrderError::InvalidParameters {
                field: "price".to_string(),
                message: format!(
                    "{} orders {} a limit price",
                    init.order_type,
                    if init.order_type.requires_price() {
                        "require"
                    } else {
                        "do not take"
                    }
                ),
            });
        }
        if init.order_type.requires_trigger() != init.trigger_price.is_some() {
            return Err(OrderError::InvalidParameters {
                field: "trigger_price".to_string(),
                message: format!(
                    "{} orders {} a trigger price",
                    init.order_type,
                    if init.order_type.requires_trigger() {
                        "require"
                    } else {
                        "do not take"
                    }
                ),
            });
        }
        Ok(())
    }

    /// Apply an event to the order.
    ///
    /// Appends the event and updates the denormalized fields. Transitions
    /// not in the lifecycle table, duplicate execution IDs, and fills past
    /// the open quantity are rejected without mutating the order.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError`] describing the rejected event; the order is
    /// unchanged on error.
    pub fn apply(&mut self, event: OrderEvent) -> Result<(), OrderError> {
        if event.client_order_id() != &self.client_order_id {
            return Err(OrderError::InvalidParameters {
                field: "client_order_id".to_string(),
                message: format!(
                    "event for {} applied to order {}",
                    event.client_order_id(),
                    self.client_order_id
                ),
            });
        }
        if event.ts_event() < self.ts_last {
            return Err(OrderError::StaleTimestamp {
                ts_event: event.ts_event(),
                ts_last: self.ts_last,
            });
        }

        let outcome = OrderStateMachine::transition(self.status, event.kind())?;
        self.validate_event(&event)?;

        let new_status = match outcome {
            TransitionOutcome::To(status) => status,
            TransitionOutcome::Rollback => {
                self.prior_status.take().unwrap_or(OrderStatus::Accepted)
            }
            TransitionOutcome::Fill => {
                let OrderEvent::Filled(fill) = &event else {
                    unreachable!("fill outcome only produced for fill events")
                };
                let filled_after = self.filled_qty.checked_add(fill.last_qty).map_err(|_| {
                    OrderError::FillExceedsQuantity {
                        last_qty: fill.last_qty.to_string(),
                        leaves_qty: self.leaves_qty.to_string(),
                    }
                })?;
                if filled_after == self.quantity {
                    OrderStatus::Filled
                } else {
                    OrderStatus::PartiallyFilled
                }
            }
        };

        match &event {
            OrderEvent::PendingUpdate(_) | OrderEvent::PendingCancel(_) => {
                self.prior_status = Some(self.status);
            }
            OrderEvent::Accepted(e) => {
                self.venue_order_id = Some(e.venue_order_id.clone());
            }
            OrderEvent::Updated(e) => self.apply_updated(e),
            OrderEvent::Triggered(_) => {
                self.is_triggered = true;
            }
            OrderEvent::Canceled(e) => {
                if self.venue_order_id.is_none() {
                    self.venue_order_id.clone_from(&e.venue_order_id);
                }
            }
            OrderEvent::Filled(e) => self.apply_filled(e),
            _ => {}
        }

        debug!(
            client_order_id = %self.client_order_id,
            from = %self.status,
            to = %new_status,
            event = event.event_type(),
            "order event applied"
        );

        self.status = new_status;
        if !self.status.is_pending() {
            self.prior_status = None;
        }
        self.ts_last = event.ts_event();
        self.events.push(event);
        Ok(())
    }

    /// Event preconditions checked before any mutation.
    fn validate_event(&self, event: &OrderEvent) -> Result<(), OrderError> {
        match event {
            OrderEvent::Filled(fill) => {
                if self.execution_ids.contains(&fill.execution_id) {
                    return Err(OrderError::DuplicateExecutionId {
                        execution_id: fill.execution_id.to_string(),
                    });
                }
                if fill.last_qty.is_zero() {
                    return Err(OrderError::InvalidParameters {
                        field: "last_qty".to_string(),
                        message: "fill quantity must be positive".to_string(),
                    });
                }
                if fill.last_qty > self.leaves_qty {
                    return Err(OrderError::FillExceedsQuantity {
                        last_qty: fill.last_qty.to_string(),
                        leaves_qty: self.leaves_qty.to_string(),
                    });
                }
            }
            OrderEvent::Updated(update) => {
                if let Some(quantity) = update.quantity {
                    if quantity < self.filled_qty || quantity.is_zero() {
                        return Err(OrderError::QuantityBelowFilled {
                            requested: quantity.to_string(),
                            filled: self.filled_qty.to_string(),
                        });
                    }
                }
            }
            OrderEvent::Triggered(_) => {
                if self.trigger_price.is_none() {
                    return Err(OrderError::InvalidParameters {
                        field: "trigger_price".to_string(),
                        message: format!("{} orders cannot be triggered", self.order_type),
                    });
                }
            }
            OrderEvent::Expired(expired) => {
                if self.time_in_force != TimeInForce::Gtd {
                    return Err(OrderError::CannotExpire {
                        reason: format!("time in force is {}", self.time_in_force),
                    });
                }
                match self.expire_time {
                    Some(expire_time) if expired.ts_event >= expire_time => {}
                    Some(expire_time) => {
                        return Err(OrderError::CannotExpire {
                            reason: format!(
                                "event time {} precedes expire time {expire_time}",
                                expired.ts_event
                            ),
                        });
                    }
                    None => {
                        return Err(OrderError::CannotExpire {
                            reason: "no expire time set".to_string(),
                        });
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn apply_updated(&mut self, update: &OrderUpdated) {
        if let Some(quantity) = update.quantity {
            self.quantity = quantity;
            self.leaves_qty = quantity
                .checked_sub(self.filled_qty)
                .unwrap_or_else(|_| Quantity::zero(quantity.precision()));
        }
        match (self.order_type, self.is_triggered) {
            // Pre-trigger a stop-limit's working price is its trigger.
            (OrderType::StopLimit, false) => {
                if let Some(price) = update.price {
                    self.trigger_price = Some(price);
                }
                if let Some(trigger_price) = update.trigger_price {
                    self.trigger_price = Some(trigger_price);
                }
            }
            (OrderType::StopLimit, true) => {
                if let Some(price) = update.price {
                    self.price = Some(price);
                }
            }
            _ => {
                if let Some(price) = update.price {
                    self.price = Some(price);
                }
                if let Some(trigger_price) = update.trigger_price {
                    self.trigger_price = Some(trigger_price);
                }
            }
        }
    }

    fn apply_filled(&mut self, fill: &OrderFilled) {
        if self.venue_order_id.is_none() {
            self.venue_order_id = Some(fill.venue_order_id.clone());
        }
        if self.position_id.is_none() {
            self.position_id.clone_from(&fill.position_id);
        }
        self.execution_ids.push(fill.execution_id.clone());

        // Quantity-weighted average across all fills.
        let prev_filled = self.filled_qty.as_decimal();
        let last_qty = fill.last_qty.as_decimal();
        let last_px = fill.last_px.as_decimal();
        let total = prev_filled + last_qty;
        let avg = match self.avg_px {
            Some(avg) => (avg * prev_filled + last_px * last_qty) / total,
            None => last_px,
        };
        self.avg_px = Some(avg);

        // Slippage applies to priced (passive) orders, signed by side.
        if let Some(price) = self.price {
            self.slippage = Some(match self.order_side {
                OrderSide::Buy => avg - price.as_decimal(),
                OrderSide::Sell => price.as_decimal() - avg,
            });
        }

        // Guarded by `validate_event`: the fill fits the open quantity.
        self.filled_qty = self.filled_qty + fill.last_qty;
        self.leaves_qty = self.quantity - self.filled_qty;
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

    /// Get the client order ID.
    #[must_use]
    pub const fn client_order_id(&self) -> &ClientOrderId {
        &self.client_order_id
    }

    /// Get the venue order ID, once assigned.
    #[must_use]
    pub const fn venue_order_id(&self) -> Option<&VenueOrderId> {
        self.venue_order_id.as_ref()
    }

    /// Get the position ID, once assigned.
    #[must_use]
    pub const fn position_id(&self) -> Option<&PositionId> {
        self.position_id.as_ref()
    }

    /// Get the order side.
    #[must_use]
    pub const fn order_side(&self) -> OrderSide {
        self.order_side
    }

    /// Get the order type.
    #[must_use]
    pub const fn order_type(&self) -> OrderType {
        self.order_type
    }

    /// Get the order quantity.
    #[must_use]
    pub const fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Get the time in force.
    #[must_use]
    pub const fn time_in_force(&self) -> TimeInForce {
        self.time_in_force
    }

    /// Get the expire time (GTD orders).
    #[must_use]
    pub const fn expire_time(&self) -> Option<UnixNanos> {
        self.expire_time
    }

    /// Get the limit price, if the type carries one.
    #[must_use]
    pub const fn price(&self) -> Option<Price> {
        self.price
    }

    /// Get the trigger price, if the type carries one.
    #[must_use]
    pub const fn trigger_price(&self) -> Option<Price> {
        self.trigger_price
    }

    /// Get the display quantity, if set.
    #[must_use]
    pub const fn display_qty(&self) -> Option<Quantity> {
        self.display_qty
    }

    /// Returns true if the order only reduces an existing position.
    #[must_use]
    pub const fn is_reduce_only(&self) -> bool {
        self.is_reduce_only
    }

    /// Returns true once the stop trigger has traded.
    #[must_use]
    pub const fn is_triggered(&self) -> bool {
        self.is_triggered
    }

    /// Get the current status.
    #[must_use]
    pub const fn status(&self) -> OrderStatus {
        self.status
    }

    /// Get the cumulative filled quantity.
    #[must_use]
    pub const fn filled_qty(&self) -> Quantity {
        self.filled_qty
    }

    /// Get the quantity still open.
    #[must_use]
    pub const fn leaves_qty(&self) -> Quantity {
        self.leaves_qty
    }

    /// Get the quantity-weighted average fill price.
    #[must_use]
    pub const fn avg_px(&self) -> Option<Decimal> {
        self.avg_px
    }

    /// Get the slippage versus the order price, signed by side.
    #[must_use]
    pub const fn slippage(&self) -> Option<Decimal> {
        self.slippage
    }

    /// Get the creation time.
    #[must_use]
    pub const fn ts_init(&self) -> UnixNanos {
        self.ts_init
    }

    /// Get the time of the last applied event.
    #[must_use]
    pub const fn ts_last(&self) -> UnixNanos {
        self.ts_last
    }

    /// Ordered event history, oldest first.
    #[must_use]
    pub fn events(&self) -> &[OrderEvent] {
        &self.events
    }

    /// Number of applied events (including initialization).
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// The most recently applied event.
    #[must_use]
    pub fn last_event(&self) -> Option<&OrderEvent> {
        self.events.last()
    }

    /// Execution IDs applied so far, in fill order.
    #[must_use]
    pub fn execution_ids(&self) -> &[ExecutionId] {
        &self.execution_ids
    }

    /// Get the order list ID.
    #[must_use]
    pub const fn order_list_id(&self) -> Option<&OrderListId> {
        self.order_list_id.as_ref()
    }

    /// Get the parent order ID.
    #[must_use]
    pub const fn parent_order_id(&self) -> Option<&ClientOrderId> {
        self.parent_order_id.as_ref()
    }

    /// Child order IDs registered by the engine.
    #[must_use]
    pub fn child_order_ids(&self) -> &[ClientOrderId] {
        &self.child_order_ids
    }

    /// Register a child order. Relationships are id-based; lookups go
    /// through the engine registries.
    pub fn add_child_order_id(&mut self, child: ClientOrderId) {
        if !self.child_order_ids.contains(&child) {
            self.child_order_ids.push(child);
        }
    }

    /// Get the contingency type.
    #[must_use]
    pub const fn contingency_type(&self) -> Option<ContingencyType> {
        self.contingency_type
    }

    /// The other orders bound by the contingency.
    #[must_use]
    pub fn contingency_ids(&self) -> &[ClientOrderId] {
        &self.contingency_ids
    }

    /// Free-form tags.
    #[must_use]
    pub fn tags(&self) -> Option<&str> {
        self.tags.as_deref()
    }

    /// Returns true for buy orders.
    #[must_use]
    pub fn is_buy(&self) -> bool {
        self.order_side == OrderSide::Buy
    }

    /// Returns true for sell orders.
    #[must_use]
    pub fn is_sell(&self) -> bool {
        self.order_side == OrderSide::Sell
    }

    /// Returns true while the order is working at the venue.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.status.is_open()
    }

    /// Returns true once the order reaches a terminal state.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.status.is_terminal()
    }

    /// Returns true for orders resting at a price.
    #[must_use]
    pub const fn is_passive(&self) -> bool {
        self.price.is_some()
    }
}
