//! Domain events for the order lifecycle.
//!
//! Every event carries the order identity, a unique event ID, the venue
//! event time (`ts_event`), and the local creation time (`ts_init`). Orders
//! are event-sourced: applying an event appends it to the order's history
//! and updates the denormalized fields.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_objects::{ContingencyType, OrderSide, OrderType, TimeInForce};
use crate::domain::shared::{
    ClientOrderId, Currency, ExecutionId, InstrumentId, Money, OrderListId, PositionId, Price,
    Quantity, StrategyId, TraderId, UnixNanos, VenueOrderId,
};

/// Discriminant of an order event, used by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderEventKind {
    /// Order constructed.
    Initialized,
    /// Order denied locally.
    Denied,
    /// Order routed to the venue.
    Submitted,
    /// Order acknowledged by the venue.
    Accepted,
    /// Order rejected by the venue.
    Rejected,
    /// Update request in flight.
    PendingUpdate,
    /// Cancel request in flight.
    PendingCancel,
    /// Order fields updated at the venue.
    Updated,
    /// Stop trigger price traded.
    Triggered,
    /// Order canceled.
    Canceled,
    /// Order expired.
    Expired,
    /// Order (partially) filled.
    Filled,
}

/// All possible order events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderEvent {
    /// Order constructed with its full definition.
    Initialized(OrderInitialized),
    /// Order denied before reaching the venue.
    Denied(OrderDenied),
    /// Order routed to the venue.
    Submitted(OrderSubmitted),
    /// Order acknowledged and working at the venue.
    Accepted(OrderAccepted),
    /// Order rejected by the venue.
    Rejected(OrderRejected),
    /// Update request in flight.
    PendingUpdate(OrderPendingUpdate),
    /// Cancel request in flight.
    PendingCancel(OrderPendingCancel),
    /// Order fields updated at the venue.
    Updated(OrderUpdated),
    /// Stop trigger price traded.
    Triggered(OrderTriggered),
    /// Order canceled.
    Canceled(OrderCanceled),
    /// Order expired.
    Expired(OrderExpired),
    /// An execution against the order.
    Filled(OrderFilled),
}

macro_rules! for_each_event {
    ($self:expr, $e:ident => $body:expr) => {
        match $self {
            OrderEvent::Initialized($e) => $body,
            OrderEvent::Denied($e) => $body,
            OrderEvent::Submitted($e) => $body,
            OrderEvent::Accepted($e) => $body,
            OrderEvent::Rejected($e) => $body,
            OrderEvent::PendingUpdate($e) => $body,
            OrderEvent::PendingCancel($e) => $body,
            OrderEvent::Updated($e) => $body,
            OrderEvent::Triggered($e) => $body,
            OrderEvent::Canceled($e) => $body,
            OrderEvent::Expired($e) => $body,
            OrderEvent::Filled($e) => $body,
        }
    };
}

impl OrderEvent {
    /// Get the event kind.
    #[must_use]
    pub const fn kind(&self) -> OrderEventKind {
        match self {
            Self::Initialized(_) => OrderEventKind::Initialized,
            Self::Denied(_) => OrderEventKind::Denied,
            Self::Submitted(_) => OrderEventKind::Submitted,
            Self::Accepted(_) => OrderEventKind::Accepted,
            Self::Rejected(_) => OrderEventKind::Rejected,
            Self::PendingUpdate(_) => OrderEventKind::PendingUpdate,
            Self::PendingCancel(_) => OrderEventKind::PendingCancel,
            Self::Updated(_) => OrderEventKind::Updated,
            Self::Triggered(_) => OrderEventKind::Triggered,
            Self::Canceled(_) => OrderEventKind::Canceled,
            Self::Expired(_) => OrderEventKind::Expired,
            Self::Filled(_) => OrderEventKind::Filled,
        }
    }

    /// Get the event type name.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::Initialized(_) => "ORDER_INITIALIZED",
            Self::Denied(_) => "ORDER_DENIED",
            Self::Submitted(_) => "ORDER_SUBMITTED",
            Self::Accepted(_) => "ORDER_ACCEPTED",
            Self::Rejected(_) => "ORDER_REJECTED",
            Self::PendingUpdate(_) => "ORDER_PENDING_UPDATE",
            Self::PendingCancel(_) => "ORDER_PENDING_CANCEL",
            Self::Updated(_) => "ORDER_UPDATED",
            Self::Triggered(_) => "ORDER_TRIGGERED",
            Self::Canceled(_) => "ORDER_CANCELED",
            Self::Expired(_) => "ORDER_EXPIRED",
            Self::Filled(_) => "ORDER_FILLED",
        }
    }

    /// Get the affected client order ID.
    #[must_use]
    pub fn client_order_id(&self) -> &ClientOrderId {
        for_each_event!(self, e => &e.client_order_id)
    }

    /// Get the instrument ID.
    #[must_use]
    pub fn instrument_id(&self) -> &InstrumentId {
        for_each_event!(self, e => &e.instrument_id)
    }

    /// Get the unique event ID.
    #[must_use]
    pub fn event_id(&self) -> Uuid {
        for_each_event!(self, e => e.event_id)
    }

    /// Get the venue event time.
    #[must_use]
    pub fn ts_event(&self) -> UnixNanos {
        for_each_event!(self, e => e.ts_event)
    }

    /// Get the local creation time.
    #[must_use]
    pub fn ts_init(&self) -> UnixNanos {
        for_each_event!(self, e => e.ts_init)
    }
}

/// Event: order constructed with its full definition.
///
/// Carries everything needed to reconstruct the order, so an order can be
/// rebuilt from its first event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderInitialized {
    /// Trader that owns the order.
    pub trader_id: TraderId,
    /// Strategy that produced the order.
    pub strategy_id: StrategyId,
    /// Instrument being traded.
    pub instrument_id: InstrumentId,
    /// Client-assigned order ID.
    pub client_order_id: ClientOrderId,
    /// Order side.
    pub order_side: OrderSide,
    /// Order type.
    pub order_type: OrderType,
    /// Total quantity.
    pub quantity: Quantity,
    /// Time-in-force policy.
    pub time_in_force: TimeInForce,
    /// Expiry time (required for GTD).
    pub expire_time: Option<UnixNanos>,
    /// Limit price (limit and stop-limit orders).
    pub price: Option<Price>,
    /// Trigger price (stop orders).
    pub trigger_price: Option<Price>,
    /// Displayed quantity for iceberg behavior.
    pub display_qty: Option<Quantity>,
    /// Only ever reduces an existing position.
    pub is_reduce_only: bool,
    /// Order list this order belongs to.
    pub order_list_id: Option<OrderListId>,
    /// Parent order for contingent children.
    pub parent_order_id: Option<ClientOrderId>,
    /// Contingency relationship within the list.
    pub contingency_type: Option<ContingencyType>,
    /// The other orders bound by the contingency.
    pub contingency_ids: Vec<ClientOrderId>,
    /// Free-form tags.
    pub tags: Option<String>,
    /// Unique event ID.
    pub event_id: Uuid,
    /// Venue event time.
    pub ts_event: UnixNanos,
    /// Local creation time.
    pub ts_init: UnixNanos,
}

/// Event: order denied before reaching the venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDenied {
    /// Trader that owns the order.
    pub trader_id: TraderId,
    /// Strategy that produced the order.
    pub strategy_id: StrategyId,
    /// Instrument being traded.
    pub instrument_id: InstrumentId,
    /// Client-assigned order ID.
    pub client_order_id: ClientOrderId,
    /// Why the order was denied.
    pub reason: String,
    /// Unique event ID.
    pub event_id: Uuid,
    /// Venue event time.
    pub ts_event: UnixNanos,
    /// Local creation time.
    pub ts_init: UnixNanos,
}

/// Event: order routed to the venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSubmitted {
    /// Trader that owns the order.
    pub trader_id: TraderId,
    /// Strategy that produced the order.
    pub strategy_id: StrategyId,
    /// Instrument being traded.
    pub instrument_id: InstrumentId,
    /// Client-assigned order ID.
    pub client_order_id: ClientOrderId,
    /// Unique event ID.
    pub event_id: Uuid,
    /// Venue event time.
    pub ts_event: UnixNanos,
    /// Local creation time.
    pub ts_init: UnixNanos,
}

/// Event: order acknowledged and working at the venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAccepted {
    /// Trader that owns the order.
    pub trader_id: TraderId,
    /// Strategy that produced the order.
    pub strategy_id: StrategyId,
    /// Instrument being traded.
    pub instrument_id: InstrumentId,
    /// Client-assigned order ID.
    pub client_order_id: ClientOrderId,
    /// Venue-assigned order ID.
    pub venue_order_id: VenueOrderId,
    /// Unique event ID.
    pub event_id: Uuid,
    /// Venue event time.
    pub ts_event: UnixNanos,
    /// Local creation time.
    pub ts_init: UnixNanos,
}

/// Event: order rejected by the venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRejected {
    /// Trader that owns the order.
    pub trader_id: TraderId,
    /// Strategy that produced the order.
    pub strategy_id: StrategyId,
    /// Instrument being traded.
    pub instrument_id: InstrumentId,
    /// Client-assigned order ID.
    pub client_order_id: ClientOrderId,
    /// Why the venue rejected the order.
    pub reason: String,
    /// Unique event ID.
    pub event_id: Uuid,
    /// Venue event time.
    pub ts_event: UnixNanos,
    /// Local creation time.
    pub ts_init: UnixNanos,
}

/// Event: an update request is in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPendingUpdate {
    /// Trader that owns the order.
    pub trader_id: TraderId,
    /// Strategy that produced the order.
    pub strategy_id: StrategyId,
    /// Instrument being traded.
    pub instrument_id: InstrumentId,
    /// Client-assigned order ID.
    pub client_order_id: ClientOrderId,
    /// Unique event ID.
    pub event_id: Uuid,
    /// Venue event time.
    pub ts_event: UnixNanos,
    /// Local creation time.
    pub ts_init: UnixNanos,
}

/// Event: a cancel request is in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPendingCancel {
    /// Trader that owns the order.
    pub trader_id: TraderId,
    /// Strategy that produced the order.
    pub strategy_id: StrategyId,
    /// Instrument being traded.
    pub instrument_id: InstrumentId,
    /// Client-assigned order ID.
    pub client_order_id: ClientOrderId,
    /// Unique event ID.
    pub event_id: Uuid,
    /// Venue event time.
    pub ts_event: UnixNanos,
    /// Local creation time.
    pub ts_init: UnixNanos,
}

/// Event: order fields updated at the venue.
///
/// For an untriggered stop-limit the price update rewrites the trigger; once
/// triggered it rewrites the limit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderUpdated {
    /// Trader that owns the order.
    pub trader_id: TraderId,
    /// Strategy that produced the order.
    pub strategy_id: StrategyId,
    /// Instrument being traded.
    pub instrument_id: InstrumentId,
    /// Client-assigned order ID.
    pub client_order_id: ClientOrderId,
    /// New total quantity, if changed. Must not drop below the filled
    /// quantity.
    pub quantity: Option<Quantity>,
    /// New price, if changed.
    pub price: Option<Price>,
    /// New trigger price, if changed.
    pub trigger_price: Option<Price>,
    /// Unique event ID.
    pub event_id: Uuid,
    /// Venue event time.
    pub ts_event: UnixNanos,
    /// Local creation time.
    pub ts_init: UnixNanos,
}

/// Event: a stop order's trigger price traded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTriggered {
    /// Trader that owns the order.
    pub trader_id: TraderId,
    /// Strategy that produced the order.
    pub strategy_id: StrategyId,
    /// Instrument being traded.
    pub instrument_id: InstrumentId,
    /// Client-assigned order ID.
    pub client_order_id: ClientOrderId,
    /// Unique event ID.
    pub event_id: Uuid,
    /// Venue event time.
    pub ts_event: UnixNanos,
    /// Local creation time.
    pub ts_init: UnixNanos,
}

/// Event: order canceled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCanceled {
    /// Trader that owns the order.
    pub trader_id: TraderId,
    /// Strategy that produced the order.
    pub strategy_id: StrategyId,
    /// Instrument being traded.
    pub instrument_id: InstrumentId,
    /// Client-assigned order ID.
    pub client_order_id: ClientOrderId,
    /// Venue-assigned order ID, if known.
    pub venue_order_id: Option<VenueOrderId>,
    /// Unique event ID.
    pub event_id: Uuid,
    /// Venue event time.
    pub ts_event: UnixNanos,
    /// Local creation time.
    pub ts_init: UnixNanos,
}

/// Event: order expired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderExpired {
    /// Trader that owns the order.
    pub trader_id: TraderId,
    /// Strategy that produced the order.
    pub strategy_id: StrategyId,
    /// Instrument being traded.
    pub instrument_id: InstrumentId,
    /// Client-assigned order ID.
    pub client_order_id: ClientOrderId,
    /// Unique event ID.
    pub event_id: Uuid,
    /// Venue event time.
    pub ts_event: UnixNanos,
    /// Local creation time.
    pub ts_init: UnixNanos,
}

/// Event: an execution against the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFilled {
    /// Trader that owns the order.
    pub trader_id: TraderId,
    /// Strategy that produced the order.
    pub strategy_id: StrategyId,
    /// Instrument being traded.
    pub instrument_id: InstrumentId,
    /// Client-assigned order ID.
    pub client_order_id: ClientOrderId,
    /// Venue-assigned order ID.
    pub venue_order_id: VenueOrderId,
    /// Venue-assigned execution ID, unique within the order.
    pub execution_id: ExecutionId,
    /// Position the fill is allocated to, if assigned.
    pub position_id: Option<PositionId>,
    /// Side of the fill.
    pub order_side: OrderSide,
    /// Quantity of this execution.
    pub last_qty: Quantity,
    /// Price of this execution.
    pub last_px: Price,
    /// Quote currency of the execution.
    pub currency: Currency,
    /// Commission charged on the fill, if any.
    pub commission: Option<Money>,
    /// Unique event ID.
    pub event_id: Uuid,
    /// Venue event time.
    pub ts_event: UnixNanos,
    /// Local creation time.
    pub ts_init: UnixNanos,
}
