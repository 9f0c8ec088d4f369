//! Accumulates OHLCV state for the bar under construction.

use tracing::debug;

use crate::domain::market_data::errors::AggregationError;
use crate::domain::market_data::value_objects::{Bar, BarType};
use crate::domain::shared::{Price, Quantity, UnixNanos};

/// Builds one bar at a time from a stream of price/size updates.
///
/// Updates must be monotonic in `ts_event`; stale updates are dropped.
/// Building a bar carries the close forward as the next bar's open, high,
/// and low, so an interval without updates yields a flat zero-volume bar
/// and the series stays gapless.
#[derive(Debug)]
pub struct BarBuilder {
    bar_type: BarType,
    size_precision: u8,
    initialized: bool,
    partial_set: bool,
    ts_last: UnixNanos,
    count: usize,
    open: Option<Price>,
    high: Option<Price>,
    low: Option<Price>,
    close: Option<Price>,
    volume: Quantity,
}

impl BarBuilder {
    /// Create a builder for a bar series.
    #[must_use]
    pub fn new(bar_type: BarType, size_precision: u8) -> Self {
        Self {
            bar_type,
            size_precision,
            initialized: false,
            partial_set: false,
            ts_last: UnixNanos::default(),
            count: 0,
            open: None,
            high: None,
            low: None,
            close: None,
            volume: Quantity::zero(size_precision),
        }
    }

    /// The series being built.
    #[must_use]
    pub const fn bar_type(&self) -> &BarType {
        &self.bar_type
    }

    /// Updates applied to the current bar.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Volume accumulated in the current bar.
    #[must_use]
    pub const fn volume(&self) -> Quantity {
        self.volume
    }

    /// Returns true once the builder has seen a price.
    #[must_use]
    pub const fn initialized(&self) -> bool {
        self.initialized
    }

    /// Time of the last applied update.
    #[must_use]
    pub const fn ts_last(&self) -> UnixNanos {
        self.ts_last
    }

    /// Seed initial OHLCV from a partially complete bar. Only the first
    /// call has any effect.
    pub fn set_partial(&mut self, partial: &Bar) {
        if self.partial_set || self.initialized {
            return;
        }
        self.open = Some(partial.open);
        self.high = Some(partial.high);
        self.low = Some(partial.low);
        self.close = Some(partial.close);
        self.volume = partial.volume;
        self.ts_last = partial.ts_event;
        self.partial_set = true;
        self.initialized = true;
    }

    /// Push a price/size update into the current bar.
    ///
    /// Updates older than the last applied one are dropped.
    pub fn update(&mut self, price: Price, size: Quantity, ts_event: UnixNanos) {
        if ts_event < self.ts_last {
            debug!(
                bar_type = %self.bar_type,
                ts_event = %ts_event,
                ts_last = %self.ts_last,
                "stale bar update dropped"
            );
            return;
        }

        match (self.high, self.low) {
            (Some(high), Some(low)) => {
                if price > high {
                    self.high = Some(price);
                }
                if price < low {
                    self.low = Some(price);
                }
            }
            _ => {
                self.open = Some(price);
                self.high = Some(price);
                self.low = Some(price);
            }
        }
        self.close = Some(price);
        self.volume = self.volume + size;
        self.count += 1;
        self.ts_last = ts_event;
        self.initialized = true;
    }

    /// Build the current bar using the last update time as its close time.
    ///
    /// # Errors
    ///
    /// Returns error if the builder has never seen a price.
    pub fn build_now(&mut self) -> Result<Bar, AggregationError> {
        let ts = self.ts_last;
        self.build(ts, ts)
    }

    /// Build the current bar, closing it at `ts_event`, then reset with the
    /// close carried forward.
    ///
    /// # Errors
    ///
    /// Returns error if the builder has never seen a price.
    pub fn build(&mut self, ts_event: UnixNanos, ts_init: UnixNanos) -> Result<Bar, AggregationError> {
        let (Some(open), Some(high), Some(low), Some(close)) =
            (self.open, self.high, self.low, self.close)
        else {
            return Err(AggregationError::NoData {
                bar_type: self.bar_type.to_string(),
            });
        };

        let bar = Bar::new(
            self.bar_type.clone(),
            open,
            high,
            low,
            close,
            self.volume,
            ts_event,
            ts_init,
        )?;

        // Carry the close forward for a gapless series.
        self.open = Some(close);
        self.high = Some(close);
        self.low = Some(close);
        self.volume = Quantity::zero(self.size_precision);
        self.count = 0;
        Ok(bar)
    }
}
