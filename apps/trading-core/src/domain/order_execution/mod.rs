//! Order Execution Bounded Context
//!
//! The event-sourced order aggregate, its event types, and the shared
//! lifecycle state machine.

pub mod aggregate;
pub mod errors;
pub mod events;
pub mod services;
pub mod value_objects;

pub use aggregate::Order;
pub use errors::OrderError;
pub use events::{
    OrderAccepted, OrderCanceled, OrderDenied, OrderEvent, OrderEventKind, OrderExpired,
    OrderFilled, OrderInitialized, OrderPendingCancel, OrderPendingUpdate, OrderRejected,
    OrderSubmitted, OrderTriggered, OrderUpdated,
};
pub use services::{OrderStateMachine, TransitionOutcome};
pub use value_objects::{ContingencyType, OrderSide, OrderStatus, OrderType, TimeInForce};
