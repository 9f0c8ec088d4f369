//! Count, volume, and value driven bar aggregators.

use std::fmt;

use rust_decimal::Decimal;

use super::bar_builder::BarBuilder;
use crate::domain::market_data::errors::AggregationError;
use crate::domain::market_data::value_objects::{Bar, BarType, QuoteTick, TradeTick};
use crate::domain::shared::{Price, Quantity, UnixNanos};

/// Callback receiving each completed bar.
pub type BarHandler = Box<dyn FnMut(Bar)>;

/// State shared by every aggregator: the builder and the output handler.
pub(crate) struct AggregatorCore {
    builder: BarBuilder,
    handler: BarHandler,
}

impl AggregatorCore {
    pub(crate) fn new(bar_type: BarType, size_precision: u8, handler: BarHandler) -> Self {
        Self {
            builder: BarBuilder::new(bar_type, size_precision),
            handler,
        }
    }

    pub(crate) fn builder(&self) -> &BarBuilder {
        &self.builder
    }

    pub(crate) fn builder_mut(&mut self) -> &mut BarBuilder {
        &mut self.builder
    }

    pub(crate) fn build_now_and_send(&mut self) -> Result<(), AggregationError> {
        let bar = self.builder.build_now()?;
        (self.handler)(bar);
        Ok(())
    }

    pub(crate) fn build_and_send(
        &mut self,
        ts_event: UnixNanos,
        ts_init: UnixNanos,
    ) -> Result<(), AggregationError> {
        let bar = self.builder.build(ts_event, ts_init)?;
        (self.handler)(bar);
        Ok(())
    }
}

impl fmt::Debug for AggregatorCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregatorCore")
            .field("builder", &self.builder)
            .finish_non_exhaustive()
    }
}

/// Closes a bar every `step` updates.
#[derive(Debug)]
pub struct TickBarAggregator {
    core: AggregatorCore,
    step: usize,
}

impl TickBarAggregator {
    /// Create a tick bar aggregator.
    ///
    /// # Errors
    ///
    /// Returns error if the bar type's step is zero.
    pub fn new(
        bar_type: BarType,
        size_precision: u8,
        handler: BarHandler,
    ) -> Result<Self, AggregationError> {
        let step = bar_type.spec.step;
        if step == 0 {
            return Err(AggregationError::InvalidStep { step });
        }
        Ok(Self {
            core: AggregatorCore::new(bar_type, size_precision, handler),
            step,
        })
    }

    /// Push a quote tick. Quotes feed BID, ASK, and MID series.
    ///
    /// # Errors
    ///
    /// Returns error if a completed bar fails to build.
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
    /// Returns error if a completed bar fails to build.
    pub fn handle_trade_tick(&mut self, tick: &TradeTick) -> Result<(), AggregationError> {
        self.apply_update(tick.price, tick.size, tick.ts_event)
    }

    fn apply_update(
        &mut self,
        price: Price,
        size: Quantity,
        ts_event: UnixNanos,
    ) -> Result<(), AggregationError> {
        self.core.builder_mut().update(price, size, ts_event);
        if self.core.builder().count() == self.step {
            self.core.build_now_and_send()?;
        }
        Ok(())
    }
}

/// Closes a bar every `step` units of traded volume, splitting updates that
/// straddle the threshold.
#[derive(Debug)]
pub struct VolumeBarAggregator {
    core: AggregatorCore,
    threshold: Quantity,
}

impl VolumeBarAggregator {
    /// Create a volume bar aggregator.
    ///
    /// # Errors
    ///
    /// Returns error if the bar type's step is zero or the volume threshold
    /// cannot be represented at the size precision.
    pub fn new(
        bar_type: BarType,
        size_precision: u8,
        handler: BarHandler,
    ) -> Result<Self, AggregationError> {
        let step = bar_type.spec.step;
        if step == 0 {
            return Err(AggregationError::InvalidStep { step });
        }
        let threshold = Quantity::from_decimal(Decimal::from(step as u64), size_precision)?;
        Ok(Self {
            core: AggregatorCore::new(bar_type, size_precision, handler),
            threshold,
        })
    }

    /// Push a quote tick.
    ///
    /// # Errors
    ///
    /// Returns error if a completed bar fails to build.
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
    /// Returns error if a completed bar fails to build.
    pub fn handle_trade_tick(&mut self, tick: &TradeTick) -> Result<(), AggregationError> {
        self.apply_update(tick.price, tick.size, tick.ts_event)
    }

    fn apply_update(
        &mut self,
        price: Price,
        size: Quantity,
        ts_event: UnixNanos,
    ) -> Result<(), AggregationError> {
        let mut size_remaining = size;
        loop {
            let space = self.threshold.checked_sub(self.core.builder().volume())?;
            if size_remaining < space {
                self.core.builder_mut().update(price, size_remaining, ts_event);
                return Ok(());
            }
            // Consume exactly up to the threshold, close, and continue with
            // the residual at the same price and time.
            self.core.builder_mut().update(price, space, ts_event);
            self.core.build_now_and_send()?;
            size_remaining = size_remaining.checked_sub(space)?;
            if size_remaining.is_zero() {
                return Ok(());
            }
        }
    }
}

/// Closes a bar every `step` units of traded value (price times size),
/// splitting updates that straddle the threshold.
#[derive(Debug)]
pub struct ValueBarAggregator {
    core: AggregatorCore,
    size_precision: u8,
    threshold: Decimal,
    cum_value: Decimal,
}

impl ValueBarAggregator {
    /// Create a value bar aggregator.
    ///
    /// # Errors
    ///
    /// Returns error if the bar type's step is zero.
    pub fn new(
        bar_type: BarType,
        size_precision: u8,
        handler: BarHandler,
    ) -> Result<Self, AggregationError> {
        let step = bar_type.spec.step;
        if step == 0 {
            return Err(AggregationError::InvalidStep { step });
        }
        Ok(Self {
            core: AggregatorCore::new(bar_type, size_precision, handler),
            size_precision,
            threshold: Decimal::from(step as u64),
            cum_value: Decimal::ZERO,
        })
    }

    /// Value accumulated toward the next bar.
    #[must_use]
    pub const fn cum_value(&self) -> Decimal {
        self.cum_value
    }

    /// Push a quote tick.
    ///
    /// # Errors
    ///
    /// Returns error if a completed bar fails to build.
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
    /// Returns error if a completed bar fails to build.
    pub fn handle_trade_tick(&mut self, tick: &TradeTick) -> Result<(), AggregationError> {
        self.apply_update(tick.price, tick.size, tick.ts_event)
    }

    fn apply_update(
        &mut self,
        price: Price,
        size: Quantity,
        ts_event: UnixNanos,
    ) -> Result<(), AggregationError> {
        let mut size_remaining = size.as_decimal();
        loop {
            let value_update = price.as_decimal() * size_remaining;
            if self.cum_value + value_update < self.threshold {
                self.cum_value += value_update;
                let qty = Quantity::from_decimal(size_remaining, self.size_precision)?;
                self.core.builder_mut().update(price, qty, ts_event);
                return Ok(());
            }

            // Consume the proportion of size that fills the value threshold.
            let value_diff = self.threshold - self.cum_value;
            let size_diff = size_remaining * (value_diff / value_update);
            let qty = Quantity::from_decimal(size_diff, self.size_precision)?;
            self.core.builder_mut().update(price, qty, ts_event);
            self.core.build_now_and_send()?;
            self.cum_value = Decimal::ZERO;
            size_remaining -= qty.as_decimal();
            if size_remaining <= Decimal::ZERO {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market_data::value_objects::{
        AggregationSource, BarAggregation, BarSpecification, PriceType,
    };
    use std::cell::RefCell;
    use std::rc::Rc;

    fn bar_type(step: usize, aggregation: BarAggregation) -> BarType {
        BarType::new(
            "BTCUSDT.BINANCE".parse().unwrap(),
            BarSpecification {
                step,
                aggregation,
                price_type: PriceType::Last,
            },
            AggregationSource::Internal,
        )
    }

    fn sink() -> (BarHandler, Rc<RefCell<Vec<Bar>>>) {
        let bars = Rc::new(RefCell::new(Vec::new()));
        let bars_clone = Rc::clone(&bars);
        let handler: BarHandler = Box::new(move |bar| bars_clone.borrow_mut().push(bar));
        (handler, bars)
    }

    fn trade(price: &str, size: &str, ts: u64) -> TradeTick {
        TradeTick {
            instrument_id: "BTCUSDT.BINANCE".parse().unwrap(),
            price: price.parse().unwrap(),
            size: size.parse().unwrap(),
            aggressor_side: crate::domain::market_data::value_objects::AggressorSide::Buyer,
            trade_id: crate::domain::shared::TradeId::new(format!("T-{ts}")),
            ts_event: UnixNanos::new(ts),
            ts_init: UnixNanos::new(ts),
        }
    }

    #[test]
    fn zero_step_is_rejected() {
        let (handler, _bars) = sink();
        assert!(matches!(
            TickBarAggregator::new(bar_type(0, BarAggregation::Tick), 0, handler),
            Err(AggregationError::InvalidStep { .. })
        ));
    }

    #[test]
    fn tick_bars_close_on_count() {
        let (handler, bars) = sink();
        let mut aggregator =
            TickBarAggregator::new(bar_type(3, BarAggregation::Tick), 0, handler).unwrap();

        aggregator.handle_trade_tick(&trade("100.0", "1", 1)).unwrap();
        aggregator.handle_trade_tick(&trade("101.0", "1", 2)).unwrap();
        assert!(bars.borrow().is_empty());

        aggregator.handle_trade_tick(&trade("99.0", "1", 3)).unwrap();
        assert_eq!(bars.borrow().len(), 1);

        let bar = bars.borrow()[0].clone();
        assert_eq!(bar.open, "100.0".parse().unwrap());
        assert_eq!(bar.high, "101.0".parse().unwrap());
        assert_eq!(bar.low, "99.0".parse().unwrap());
        assert_eq!(bar.close, "99.0".parse().unwrap());
        assert_eq!(bar.volume, "3".parse().unwrap());
        assert_eq!(bar.ts_event, UnixNanos::new(3));
    }

    #[test]
    fn tick_bar_quote_series_uses_mid() {
        let (handler, bars) = sink();
        let mut bt = bar_type(2, BarAggregation::Tick);
        bt.spec.price_type = PriceType::Mid;
        let mut aggregator = TickBarAggregator::new(bt, 0, handler).unwrap();

        let tick = QuoteTick {
            instrument_id: "BTCUSDT.BINANCE".parse().unwrap(),
            bid_price: "1.00".parse().unwrap(),
            ask_price: "1.01".parse().unwrap(),
            bid_size: "10".parse().unwrap(),
            ask_size: "10".parse().unwrap(),
            ts_event: UnixNanos::new(1),
            ts_init: UnixNanos::new(1),
        };
        aggregator.handle_quote_tick(&tick).unwrap();
        let mut second = tick.clone();
        second.ts_event = UnixNanos::new(2);
        aggregator.handle_quote_tick(&second).unwrap();

        assert_eq!(bars.borrow().len(), 1);
        assert_eq!(bars.borrow()[0].close, "1.005".parse().unwrap());
    }

    #[test]
    fn volume_bar_splits_straddling_update() {
        let (handler, bars) = sink();
        let mut aggregator =
            VolumeBarAggregator::new(bar_type(100, BarAggregation::Volume), 0, handler).unwrap();

        aggregator.handle_trade_tick(&trade("1.0", "60", 1)).unwrap();
        assert!(bars.borrow().is_empty());

        aggregator.handle_trade_tick(&trade("1.1", "80", 2)).unwrap();
        assert_eq!(bars.borrow().len(), 1);

        let bar = bars.borrow()[0].clone();
        assert_eq!(bar.volume, "100".parse().unwrap());
        assert_eq!(bar.high, "1.1".parse().unwrap());

        // The residual 40 at 1.1 carries into the next bar.
        assert_eq!(aggregator.core.builder().volume(), "40".parse().unwrap());
        assert_eq!(aggregator.core.builder().count(), 1);
    }

    #[test]
    fn volume_bar_emits_multiple_bars_from_one_update() {
        let (handler, bars) = sink();
        let mut aggregator =
            VolumeBarAggregator::new(bar_type(10, BarAggregation::Volume), 0, handler).unwrap();

        aggregator.handle_trade_tick(&trade("1.0", "25", 1)).unwrap();
        assert_eq!(bars.borrow().len(), 2);
        assert_eq!(aggregator.core.builder().volume(), "5".parse().unwrap());
    }

    #[test]
    fn volume_bar_exact_threshold_closes_cleanly() {
        let (handler, bars) = sink();
        let mut aggregator =
            VolumeBarAggregator::new(bar_type(10, BarAggregation::Volume), 0, handler).unwrap();

        aggregator.handle_trade_tick(&trade("1.0", "10", 1)).unwrap();
        assert_eq!(bars.borrow().len(), 1);
        assert!(aggregator.core.builder().volume().is_zero());
    }

    #[test]
    fn volume_bar_preserves_size_precision() {
        let (handler, bars) = sink();
        let mut aggregator =
            VolumeBarAggregator::new(bar_type(1, BarAggregation::Volume), 2, handler).unwrap();

        aggregator.handle_trade_tick(&trade("1.0", "0.60", 1)).unwrap();
        aggregator.handle_trade_tick(&trade("1.0", "0.65", 2)).unwrap();
        assert_eq!(bars.borrow().len(), 1);
        assert_eq!(bars.borrow()[0].volume, "1.00".parse().unwrap());
        assert_eq!(aggregator.core.builder().volume(), "0.25".parse().unwrap());
    }

    #[test]
    fn value_bar_closes_on_cumulative_value() {
        let (handler, bars) = sink();
        let mut aggregator =
            ValueBarAggregator::new(bar_type(1000, BarAggregation::Value), 0, handler).unwrap();

        // 20 * 15 = 300, below the 1000 threshold.
        aggregator.handle_trade_tick(&trade("20.0", "15", 1)).unwrap();
        assert!(bars.borrow().is_empty());
        assert_eq!(aggregator.cum_value(), Decimal::new(300, 0));

        // 90 more at 20.0 is 1800 of value: 35 completes the first bar
        // (300 + 700), the next 50 fills a whole second bar, and 5 carries
        // with 100 of value accrued.
        aggregator.handle_trade_tick(&trade("20.0", "90", 2)).unwrap();
        assert_eq!(bars.borrow().len(), 2);
        assert_eq!(bars.borrow()[0].volume, "50".parse().unwrap());
        assert_eq!(bars.borrow()[1].volume, "50".parse().unwrap());
        assert_eq!(aggregator.cum_value(), Decimal::new(100, 0));
        assert_eq!(aggregator.core.builder().volume(), "5".parse().unwrap());
    }

    #[test]
    fn value_bar_residual_value_accrues() {
        let (handler, bars) = sink();
        let mut aggregator =
            ValueBarAggregator::new(bar_type(100, BarAggregation::Value), 1, handler).unwrap();

        aggregator.handle_trade_tick(&trade("10.0", "15", 1)).unwrap();
        // 150 of value: one bar of 100, 50 residual (5.0 at 10.0).
        assert_eq!(bars.borrow().len(), 1);
        assert_eq!(aggregator.core.builder().volume(), "5.0".parse().unwrap());
        assert_eq!(aggregator.cum_value(), Decimal::new(50, 0));
    }
}
