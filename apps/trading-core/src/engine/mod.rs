//! Engine registries and event routing.
//!
//! The engine owns every aggregate for a trading session: instruments,
//! orders, positions, and one order book per instrument. Aggregates refer
//! to each other by ID only; all lookups go through these registries.
//! Subscribers receive every order event applied through the engine.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;
use tracing::debug;

use crate::clock::Clock;
use crate::domain::instrument::Instrument;
use crate::domain::market_data::{
    BookError, BookType, OrderBook, OrderBookDelta, OrderBookSnapshot, QuoteTick, TradeTick,
};
use crate::domain::order_execution::{Order, OrderError, OrderEvent};
use crate::domain::position_tracking::{Position, PositionError};
use crate::domain::shared::{ClientOrderId, InstrumentId, PositionId};

/// Callback receiving every order event applied through the engine.
pub type EventSubscriber = Box<dyn FnMut(&OrderEvent)>;

/// Engine-level errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No instrument registered under this ID.
    #[error("instrument not registered: {0}")]
    InstrumentNotFound(String),

    /// An instrument is already registered under this ID.
    #[error("instrument already registered: {0}")]
    DuplicateInstrument(String),

    /// No order tracked under this client order ID.
    #[error("order not found: {0}")]
    OrderNotFound(String),

    /// An order is already tracked under this client order ID.
    #[error("duplicate client order id: {0}")]
    DuplicateOrder(String),

    /// An order aggregate rejected the event.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// A position aggregate rejected the fill.
    #[error(transparent)]
    Position(#[from] PositionError),

    /// An order book rejected the input.
    #[error(transparent)]
    Book(#[from] BookError),
}

/// Single-threaded owner of all aggregates for one trading session.
pub struct CoreEngine {
    clock: Rc<dyn Clock>,
    instruments: HashMap<InstrumentId, Instrument>,
    books: HashMap<InstrumentId, OrderBook>,
    orders: HashMap<ClientOrderId, Order>,
    positions: HashMap<PositionId, Position>,
    subscribers: Vec<EventSubscriber>,
}

impl CoreEngine {
    /// Create an engine driven by the given clock.
    #[must_use]
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            instruments: HashMap::new(),
            books: HashMap::new(),
            orders: HashMap::new(),
            positions: HashMap::new(),
            subscribers: Vec::new(),
        }
    }

    /// The engine's clock.
    #[must_use]
    pub fn clock(&self) -> &Rc<dyn Clock> {
        &self.clock
    }

    /// Subscribe to every order event applied through the engine.
    pub fn subscribe(&mut self, subscriber: EventSubscriber) {
        self.subscribers.push(subscriber);
    }

    // ========================================================================
    // Instruments & books
    // ========================================================================

    /// Register an instrument and create its order book.
    ///
    /// Instruments must be registered before any tick referencing them.
    ///
    /// # Errors
    ///
    /// Returns error if the instrument ID is already registered.
    pub fn register_instrument(
        &mut self,
        instrument: Instrument,
        book_type: BookType,
    ) -> Result<(), EngineError> {
        let id = instrument.id().clone();
        if self.instruments.contains_key(&id) {
            return Err(EngineError::DuplicateInstrument(id.to_string()));
        }
        self.books
            .insert(id.clone(), OrderBook::new(id.clone(), book_type));
        self.instruments.insert(id.clone(), instrument);
        debug!(instrument_id = %id, book_type = %book_type, "instrument registered");
        Ok(())
    }

    /// Look up a registered instrument. Missing registration is a hard
    /// error.
    ///
    /// # Errors
    ///
    /// Returns error if the instrument is not registered.
    pub fn instrument(&self, id: &InstrumentId) -> Result<&Instrument, EngineError> {
        self.instruments
            .get(id)
            .ok_or_else(|| EngineError::InstrumentNotFound(id.to_string()))
    }

    /// Look up an instrument's order book.
    ///
    /// # Errors
    ///
    /// Returns error if the instrument is not registered.
    pub fn book(&self, id: &InstrumentId) -> Result<&OrderBook, EngineError> {
        self.books
            .get(id)
            .ok_or_else(|| EngineError::InstrumentNotFound(id.to_string()))
    }

    fn book_mut(&mut self, id: &InstrumentId) -> Result<&mut OrderBook, EngineError> {
        self.books
            .get_mut(id)
            .ok_or_else(|| EngineError::InstrumentNotFound(id.to_string()))
    }

    // ========================================================================
    // Orders & positions
    // ========================================================================

    /// Start tracking an order.
    ///
    /// # Errors
    ///
    /// Returns error if its instrument is unregistered or the client order
    /// ID is already tracked.
    pub fn register_order(&mut self, order: Order) -> Result<(), EngineError> {
        self.instrument(order.instrument_id())?;
        let id = order.client_order_id().clone();
        if self.orders.contains_key(&id) {
            return Err(EngineError::DuplicateOrder(id.to_string()));
        }
        self.orders.insert(id, order);
        Ok(())
    }

    /// Look up a tracked order.
    #[must_use]
    pub fn order(&self, id: &ClientOrderId) -> Option<&Order> {
        self.orders.get(id)
    }

    /// All tracked orders.
    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    /// Look up a position.
    #[must_use]
    pub fn position(&self, id: &PositionId) -> Option<&Position> {
        self.positions.get(id)
    }

    /// All positions.
    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    /// Apply an order event to its order, routing fills to their position
    /// and fanning the event out to subscribers.
    ///
    /// A fill carrying an unknown position ID opens a new position for the
    /// order's instrument. The position side of a fill is validated (and a
    /// new position constructed) before the order mutates, so a rejected
    /// event leaves both aggregates untouched.
    ///
    /// # Errors
    ///
    /// Returns error if the order is unknown or an aggregate rejects the
    /// event; rejected events are not fanned out.
    pub fn apply_order_event(&mut self, event: OrderEvent) -> Result<(), EngineError> {
        if !self.orders.contains_key(event.client_order_id()) {
            return Err(EngineError::OrderNotFound(event.client_order_id().to_string()));
        }

        let mut opened: Option<(PositionId, Position)> = None;
        if let OrderEvent::Filled(fill) = &event {
            if let Some(position_id) = &fill.position_id {
                match self.positions.get(position_id) {
                    Some(position) => position.validate_fill(fill)?,
                    None => {
                        let instrument =
                            self.instruments.get(&fill.instrument_id).ok_or_else(|| {
                                EngineError::InstrumentNotFound(fill.instrument_id.to_string())
                            })?;
                        opened = Some((position_id.clone(), Position::open(instrument, fill)?));
                    }
                }
            }
        }

        let order = self
            .orders
            .get_mut(event.client_order_id())
            .ok_or_else(|| EngineError::OrderNotFound(event.client_order_id().to_string()))?;
        order.apply(event.clone())?;

        if let Some((position_id, position)) = opened {
            self.positions.insert(position_id, position);
        } else if let OrderEvent::Filled(fill) = &event {
            if let Some(position_id) = &fill.position_id {
                if let Some(position) = self.positions.get_mut(position_id) {
                    // Pre-validated above.
                    position.apply(fill)?;
                }
            }
        }

        for subscriber in &mut self.subscribers {
            subscriber(&event);
        }
        Ok(())
    }

    // ========================================================================
    // Market data routing
    // ========================================================================

    /// Route a quote tick to its instrument's book (L1 books only; deeper
    /// books are delta-driven and ignore quotes).
    ///
    /// # Errors
    ///
    /// Returns error if the instrument is not registered.
    pub fn apply_quote(&mut self, tick: &QuoteTick) -> Result<(), EngineError> {
        let book = self.book_mut(&tick.instrument_id)?;
        if book.book_type() == BookType::L1Tbbo {
            book.update_quote_tick(tick)?;
        }
        Ok(())
    }

    /// Route a trade tick to its instrument's book (L1 books only).
    ///
    /// # Errors
    ///
    /// Returns error if the instrument is not registered.
    pub fn apply_trade(&mut self, tick: &TradeTick) -> Result<(), EngineError> {
        let book = self.book_mut(&tick.instrument_id)?;
        if book.book_type() == BookType::L1Tbbo {
            book.update_trade_tick(tick)?;
        }
        Ok(())
    }

    /// Route a book delta to its instrument's book.
    ///
    /// # Errors
    ///
    /// Returns error if the instrument is not registered or the book
    /// rejects the delta.
    pub fn apply_delta(&mut self, delta: &OrderBookDelta) -> Result<(), EngineError> {
        self.book_mut(&delta.instrument_id)?.apply_delta(delta)?;
        Ok(())
    }

    /// Route a book snapshot to its instrument's book.
    ///
    /// # Errors
    ///
    /// Returns error if the instrument is not registered or the book
    /// rejects the snapshot.
    pub fn apply_snapshot(&mut self, snapshot: &OrderBookSnapshot) -> Result<(), EngineError> {
        self.book_mut(&snapshot.instrument_id)?
            .apply_snapshot(snapshot)?;
        Ok(())
    }
}

impl fmt::Debug for CoreEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreEngine")
            .field("instruments", &self.instruments.len())
            .field("orders", &self.orders.len())
            .field("positions", &self.positions.len())
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}
