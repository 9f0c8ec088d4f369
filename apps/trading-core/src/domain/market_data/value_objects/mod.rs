//! Market Data Value Objects

mod bar;
mod tick;

pub use bar::{AggregationSource, Bar, BarAggregation, BarSpecification, BarType};
pub use tick::{AggressorSide, PriceType, QuoteTick, TradeTick};
