//! Market Data Bounded Context
//!
//! Ticks, bars, the order book at three fidelities, and the bar
//! aggregators.

pub mod aggregation;
pub mod book;
pub mod errors;
pub mod value_objects;

pub use aggregation::{
    BarBuilder, BarHandler, TickBarAggregator, TimeBarAggregator, ValueBarAggregator,
    VolumeBarAggregator,
};
pub use book::{
    BookAction, BookOrder, BookType, Ladder, OrderBook, OrderBookDelta, OrderBookSnapshot,
    PriceLevel,
};
pub use errors::{AggregationError, BookError};
pub use value_objects::{
    AggregationSource, AggressorSide, Bar, BarAggregation, BarSpecification, BarType, PriceType,
    QuoteTick, TradeTick,
};
