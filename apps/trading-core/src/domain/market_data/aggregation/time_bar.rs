//! Wall-time driven bar aggregation.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::warn;

use super::aggregators::{AggregatorCore, BarHandler};
use crate::clock::{Clock, TimeEvent, TimerCallback};
use crate::domain::market_data::errors::AggregationError;
use crate::domain::market_data::value_objects::{BarType, QuoteTick, TradeTick};
use crate::domain::shared::{Price, Quantity, UnixNanos};

/// Closes a bar at every interval boundary of wall or simulated time.
///
/// A timer named after the bar type fires at each boundary. Under a
/// simulated clock, updates whose timestamps straddle the pending boundary
/// close the bar inline so bars stay correct when data is pushed faster
/// than the clock advances.
pub struct TimeBarAggregator {
    core: AggregatorCore,
    clock: Rc<dyn Clock>,
    interval_ns: u64,
    next_close_ns: UnixNanos,
    build_with_no_updates: bool,
    build_on_next_tick: bool,
    stored_close_ns: UnixNanos,
    timer_name: String,
}

impl TimeBarAggregator {
    /// Create the aggregator and schedule its build timer on the clock.
    ///
    /// The first boundary is the next interval multiple at or after the
    /// clock's current time. With `build_with_no_updates` (the default
    /// behavior of a gapless series) an interval without updates emits a
    /// flat zero-volume bar carrying the prior close; without it, emission
    /// is deferred to the next update.
    ///
    /// # Errors
    ///
    /// Returns error if the bar type is not time-driven, the step is zero,
    /// or the timer cannot be scheduled.
    pub fn start(
        bar_type: BarType,
        size_precision: u8,
        build_with_no_updates: bool,
        clock: &Rc<dyn Clock>,
        handler: BarHandler,
    ) -> Result<Rc<RefCell<Self>>, AggregationError> {
        let interval_ns = bar_type.spec.aggregation.interval_ns(bar_type.spec.step)?;
        let now_ns = clock.timestamp_ns().as_u64();
        // Align to the nearest lower interval boundary.
        let start_ns = now_ns - (now_ns % interval_ns);
        let timer_name = bar_type.to_string();

        let aggregator = Rc::new(RefCell::new(Self {
            core: AggregatorCore::new(bar_type, size_precision, handler),
            clock: Rc::clone(clock),
            interval_ns,
            next_close_ns: UnixNanos::new(start_ns + interval_ns),
            build_with_no_updates,
            build_on_next_tick: false,
            stored_close_ns: UnixNanos::default(),
            timer_name: timer_name.clone(),
        }));

        let weak = Rc::downgrade(&aggregator);
        let callback: TimerCallback = Rc::new(RefCell::new(move |event: TimeEvent| {
            if let Some(aggregator) = weak.upgrade() {
                aggregator.borrow_mut().on_time_event(&event);
            }
        }));
        clock.set_timer(
            &timer_name,
            interval_ns,
            UnixNanos::new(start_ns),
            None,
            callback,
        )?;
        Ok(aggregator)
    }

    /// Cancel the build timer.
    ///
    /// # Errors
    ///
    /// Returns error if the timer is already gone.
    pub fn stop(&self) -> Result<(), AggregationError> {
        self.clock.cancel_timer(&self.timer_name)?;
        Ok(())
    }

    /// Name of the build timer (the bar type string).
    #[must_use]
    pub fn timer_name(&self) -> &str {
        &self.timer_name
    }

    /// The pending bar's close time.
    #[must_use]
    pub const fn next_close_ns(&self) -> UnixNanos {
        self.next_close_ns
    }

    /// Push a quote tick.
    ///
    /// # Errors
    ///
    /// Returns error if a bar fails to build.
    pub fn handle_quote_tick(&mut self, tick: &QuoteTick) -> Result<(), AggregationError> {
        let price_type = self.core.builder().bar_type().spec.price_type;
        match tick.extract(price_type) {
            Some((price, size)) => self.apply_update(price, size, tick.ts_event),
            None => Ok(()),
        }
    }

    /// Push a trade tick.
    ///
    /// # Errors
    ///
    /// Returns error if a bar fails to build.
    pub fn handle_trade_tick(&mut self, tick: &TradeTick) -> Result<(), AggregationError> {
        self.apply_update(tick.price, tick.size, tick.ts_event)
    }

    fn apply_update(
        &mut self,
        price: Price,
        size: Quantity,
        ts_event: UnixNanos,
    ) -> Result<(), AggregationError> {
        if self.clock.is_simulated() && !self.build_on_next_tick {
            // Data can be pushed ahead of the simulated clock: close every
            // boundary the update straddles before applying it, and close
            // after applying when it lands exactly on the boundary.
            while self.next_close_ns < ts_event {
                let close_ns = self.next_close_ns;
                self.process_boundary(close_ns)?;
            }
            if self.next_close_ns == ts_event {
                self.core.builder_mut().update(price, size, ts_event);
                let close_ns = self.next_close_ns;
                self.process_boundary(close_ns)?;
                return Ok(());
            }
        }

        self.core.builder_mut().update(price, size, ts_event);

        if self.build_on_next_tick {
            let close_ns = self.stored_close_ns;
            self.core.build_and_send(close_ns, ts_event)?;
            self.build_on_next_tick = false;
            self.stored_close_ns = UnixNanos::default();
        }
        Ok(())
    }

    /// Close the bar at a reached interval boundary.
    fn process_boundary(&mut self, close_ns: UnixNanos) -> Result<(), AggregationError> {
        if self.core.builder().initialized() {
            if self.core.builder().count() == 0 && !self.build_with_no_updates {
                // Defer emission until the next update arrives.
                self.build_on_next_tick = true;
                self.stored_close_ns = close_ns;
            } else {
                self.core.build_and_send(close_ns, close_ns)?;
            }
        }
        self.next_close_ns = close_ns + self.interval_ns;
        Ok(())
    }

    fn on_time_event(&mut self, event: &TimeEvent) {
        // The boundary may already have been closed inline by a straddling
        // update.
        if event.ts_event < self.next_close_ns {
            return;
        }
        let close_ns = self.next_close_ns;
        if let Err(e) = self.process_boundary(close_ns) {
            warn!(
                bar_type = %self.core.builder().bar_type(),
                error = %e,
                "time bar emission failed"
            );
        }
    }
}

impl fmt::Debug for TimeBarAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeBarAggregator")
            .field("timer_name", &self.timer_name)
            .field("interval_ns", &self.interval_ns)
            .field("next_close_ns", &self.next_close_ns)
            .field("build_with_no_updates", &self.build_with_no_updates)
            .field("build_on_next_tick", &self.build_on_next_tick)
            .finish_non_exhaustive()
    }
}
