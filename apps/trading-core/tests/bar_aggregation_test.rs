//! Bar aggregation scenarios, including simulated-clock time bars.

use std::cell::RefCell;
use std::rc::Rc;

use trading_core::{
    AggregationSource, AggressorSide, Bar, BarAggregation, BarHandler, BarSpecification, BarType,
    Clock, PriceType, TestClock, TickBarAggregator, TimeBarAggregator, TradeId, TradeTick,
    UnixNanos, VolumeBarAggregator,
};

const NANOS_PER_SEC: u64 = 1_000_000_000;
const NANOS_PER_MIN: u64 = 60 * NANOS_PER_SEC;

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
        aggressor_side: AggressorSide::Buyer,
        trade_id: TradeId::new(format!("T-{ts}")),
        ts_event: UnixNanos::new(ts),
        ts_init: UnixNanos::new(ts),
    }
}

#[test]
fn volume_bar_split_carries_residual() {
    // step=100: updates (1.0, 60) then (1.1, 80) close one bar of exactly
    // 100 including 40 of the second update; 40 carries at 1.1.
    let (handler, bars) = sink();
    let mut aggregator =
        VolumeBarAggregator::new(bar_type(100, BarAggregation::Volume), 0, handler).unwrap();

    aggregator.handle_trade_tick(&trade("1.0", "60", 1)).unwrap();
    aggregator.handle_trade_tick(&trade("1.1", "80", 2)).unwrap();

    let bars = bars.borrow();
    assert_eq!(bars.len(), 1);
    assert_eq!(bars[0].volume, "100".parse().unwrap());
    assert_eq!(bars[0].open, "1.0".parse().unwrap());
    assert_eq!(bars[0].high, "1.1".parse().unwrap());
    assert_eq!(bars[0].close, "1.1".parse().unwrap());
}

#[test]
fn time_bar_gap_emits_carried_bar() {
    // Minute bars: a tick at 00:00:30, clock advanced to 00:02:15. Two
    // bars: the first with the tick's OHLCV, the second a flat carry with
    // zero volume.
    let test_clock = Rc::new(TestClock::new(UnixNanos::new(0)));
    let clock: Rc<dyn Clock> = test_clock.clone();
    let (handler, bars) = sink();
    let aggregator = TimeBarAggregator::start(
        bar_type(1, BarAggregation::Minute),
        0,
        true,
        &clock,
        handler,
    )
    .unwrap();

    aggregator
        .borrow_mut()
        .handle_trade_tick(&trade("100.0", "5", 30 * NANOS_PER_SEC))
        .unwrap();
    test_clock
        .advance_time_to(UnixNanos::new(135 * NANOS_PER_SEC))
        .unwrap();

    let bars = bars.borrow();
    assert_eq!(bars.len(), 2);

    assert_eq!(bars[0].ts_event, UnixNanos::new(NANOS_PER_MIN));
    assert_eq!(bars[0].open, "100.0".parse().unwrap());
    assert_eq!(bars[0].close, "100.0".parse().unwrap());
    assert_eq!(bars[0].volume, "5".parse().unwrap());

    assert_eq!(bars[1].ts_event, UnixNanos::new(2 * NANOS_PER_MIN));
    assert_eq!(bars[1].open, "100.0".parse().unwrap());
    assert_eq!(bars[1].high, "100.0".parse().unwrap());
    assert_eq!(bars[1].low, "100.0".parse().unwrap());
    assert_eq!(bars[1].close, "100.0".parse().unwrap());
    assert!(bars[1].volume.is_zero());
}

#[test]
fn emitted_bars_stay_well_formed_and_ordered() {
    let (handler, bars) = sink();
    let mut aggregator =
        TickBarAggregator::new(bar_type(2, BarAggregation::Tick), 0, handler).unwrap();

    let prices = ["100.0", "101.0", "99.0", "98.0", "102.0", "101.5"];
    for (i, price) in prices.iter().enumerate() {
        aggregator
            .handle_trade_tick(&trade(price, "1", (i as u64 + 1) * 10))
            .unwrap();
    }

    let bars = bars.borrow();
    assert_eq!(bars.len(), 3);
    let mut last_ts = UnixNanos::new(0);
    for bar in bars.iter() {
        assert!(bar.low <= bar.open && bar.low <= bar.close);
        assert!(bar.high >= bar.open && bar.high >= bar.close);
        assert!(bar.ts_event > last_ts);
        last_ts = bar.ts_event;
    }
}

#[test]
fn out_of_order_ticks_are_dropped() {
    let (handler, bars) = sink();
    let mut aggregator =
        TickBarAggregator::new(bar_type(2, BarAggregation::Tick), 0, handler).unwrap();

    aggregator.handle_trade_tick(&trade("100.0", "1", 10)).unwrap();
    // Stale tick: dropped, so the bar is not yet complete.
    aggregator.handle_trade_tick(&trade("50.0", "1", 5)).unwrap();
    assert!(bars.borrow().is_empty());

    aggregator.handle_trade_tick(&trade("101.0", "1", 20)).unwrap();
    assert_eq!(bars.borrow().len(), 1);
    assert_eq!(bars.borrow()[0].low, "100.0".parse().unwrap());
}

#[test]
fn time_bars_straddle_when_data_outruns_the_clock() {
    let test_clock = Rc::new(TestClock::new(UnixNanos::new(0)));
    let clock: Rc<dyn Clock> = test_clock.clone();
    let (handler, bars) = sink();
    let aggregator = TimeBarAggregator::start(
        bar_type(1, BarAggregation::Minute),
        0,
        true,
        &clock,
        handler,
    )
    .unwrap();

    // Feed ticks spanning three minutes without advancing the clock.
    let ticks = [
        ("100.0", 10 * NANOS_PER_SEC),
        ("101.0", 70 * NANOS_PER_SEC),
        ("102.0", 130 * NANOS_PER_SEC),
    ];
    for (price, ts) in ticks {
        aggregator
            .borrow_mut()
            .handle_trade_tick(&trade(price, "1", ts))
            .unwrap();
    }

    let emitted = bars.borrow().len();
    assert_eq!(emitted, 2);
    assert_eq!(bars.borrow()[0].close, "100.0".parse().unwrap());
    assert_eq!(bars.borrow()[1].close, "101.0".parse().unwrap());

    // Advancing the clock across the already-closed boundaries must not
    // duplicate them.
    test_clock
        .advance_time_to(UnixNanos::new(2 * NANOS_PER_MIN))
        .unwrap();
    assert_eq!(bars.borrow().len(), emitted);
}
