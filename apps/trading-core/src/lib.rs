//! Trading Core - Event-Sourced Domain Library
//!
//! The in-memory domain model of an algorithmic trading platform: orders,
//! positions, and order books, plus the aggregators that fold raw market
//! ticks into bar series. The same components drive live execution and
//! historical backtesting; every trading decision and accounting figure
//! flows through them.
//!
//! # Architecture
//!
//! - [`domain::shared`]: fixed-point `Price`/`Quantity`, `Money`,
//!   identifiers, nanosecond timestamps
//! - [`clock`]: the `Clock` contract with real and simulated variants and
//!   named timers
//! - [`domain::order_execution`]: the event-sourced `Order` aggregate and
//!   its lifecycle state machine
//! - [`domain::position_tracking`]: the `Position` aggregate folding fills
//!   into direction, average prices, and PnL
//! - [`domain::market_data`]: ticks, bars, the order book at three
//!   fidelities, and the bar aggregators
//! - [`engine`]: id-keyed registries and the event-subscriber seam
//!
//! The core is single-threaded cooperative per session: all mutation
//! happens on one logical thread, driven by feeding events and ticks in
//! timestamp order.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

pub mod clock;
pub mod domain;
pub mod engine;
pub mod telemetry;

// Re-export commonly used types
pub use clock::{Clock, ClockError, RealClock, TestClock, TimeEvent, Timer, TimerCallback};
pub use domain::instrument::Instrument;
pub use domain::market_data::{
    AggregationError, AggregationSource, AggressorSide, Bar, BarAggregation, BarBuilder,
    BarHandler, BarSpecification, BarType, BookAction, BookError, BookOrder, BookType, OrderBook,
    OrderBookDelta, OrderBookSnapshot, PriceLevel, PriceType, QuoteTick, TickBarAggregator,
    TimeBarAggregator, TradeTick, ValueBarAggregator, VolumeBarAggregator,
};
pub use domain::order_execution::{
    ContingencyType, Order, OrderError, OrderEvent, OrderEventKind, OrderFilled, OrderInitialized,
    OrderSide, OrderStateMachine, OrderStatus, OrderType, TimeInForce,
};
pub use domain::position_tracking::{Position, PositionError, PositionSide};
pub use domain::shared::{
    AccountId, ClientOrderId, Currency, DomainError, ExecutionId, InstrumentId, Money,
    OrderListId, PositionId, Price, Quantity, StrategyId, Symbol, TradeId, TraderId, UnixNanos,
    Venue, VenueOrderId,
};
pub use engine::{CoreEngine, EngineError, EventSubscriber};
