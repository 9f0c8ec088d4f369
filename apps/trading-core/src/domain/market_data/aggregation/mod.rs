//! Bar Aggregation
//!
//! Stateful aggregators that fold ticks into OHLCV bars: by tick count, by
//! traded volume, by traded value, and by wall time.

mod aggregators;
mod bar_builder;
mod time_bar;

pub use aggregators::{BarHandler, TickBarAggregator, ValueBarAggregator, VolumeBarAggregator};
pub use bar_builder::BarBuilder;
pub use time_bar::TimeBarAggregator;
