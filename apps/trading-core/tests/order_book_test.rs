//! Order book behavior across the three fidelities.

use trading_core::{
    AggressorSide, BookAction, BookOrder, BookType, OrderBook, OrderBookDelta, OrderBookSnapshot,
    OrderSide, QuoteTick, TradeId, TradeTick, UnixNanos,
};

fn instrument_id() -> trading_core::InstrumentId {
    "BTCUSDT.BINANCE".parse().unwrap()
}

fn order(side: OrderSide, id: u64, price: &str, size: &str) -> BookOrder {
    BookOrder::new(side, price.parse().unwrap(), size.parse().unwrap(), id)
}

fn quote(bid: &str, ask: &str, ts: u64) -> QuoteTick {
    QuoteTick {
        instrument_id: instrument_id(),
        bid_price: bid.parse().unwrap(),
        ask_price: ask.parse().unwrap(),
        bid_size: "10".parse().unwrap(),
        ask_size: "10".parse().unwrap(),
        ts_event: UnixNanos::new(ts),
        ts_init: UnixNanos::new(ts),
    }
}

fn trade(aggressor: AggressorSide, price: &str, size: &str, ts: u64) -> TradeTick {
    TradeTick {
        instrument_id: instrument_id(),
        price: price.parse().unwrap(),
        size: size.parse().unwrap(),
        aggressor_side: aggressor,
        trade_id: TradeId::new(format!("T-{ts}")),
        ts_event: UnixNanos::new(ts),
        ts_init: UnixNanos::new(ts),
    }
}

#[test]
fn l1_buy_aggressor_consumes_the_offer() {
    // Quote bid=1.00 ask=1.01, then a buyer trades at 1.02.
    let mut book = OrderBook::new(instrument_id(), BookType::L1Tbbo);
    book.update_quote_tick(&quote("1.00", "1.01", 1)).unwrap();
    book.update_trade_tick(&trade(AggressorSide::Buyer, "1.02", "1", 2))
        .unwrap();

    assert_eq!(book.best_ask_price(), Some("1.02".parse().unwrap()));
    assert_eq!(book.best_bid_price(), Some("1.00".parse().unwrap()));
    book.check_integrity().unwrap();
}

#[test]
fn l1_stays_single_level_per_side() {
    let mut book = OrderBook::new(instrument_id(), BookType::L1Tbbo);
    for ts in 1..=5u64 {
        book.update_quote_tick(&quote("1.00", "1.01", ts)).unwrap();
    }
    assert_eq!(book.bids().len(), 1);
    assert_eq!(book.asks().len(), 1);
    assert_eq!(book.update_count(), 5);
}

#[test]
fn l2_levels_aggregate_and_empty_levels_drop() {
    let mut book = OrderBook::new(instrument_id(), BookType::L2Mbp);
    book.apply_delta(&OrderBookDelta {
        instrument_id: instrument_id(),
        action: BookAction::Add,
        order: order(OrderSide::Buy, 0, "100.00", "5"),
        update_id: 1,
        ts_event: UnixNanos::new(1),
        ts_init: UnixNanos::new(1),
    })
    .unwrap();
    book.apply_delta(&OrderBookDelta {
        instrument_id: instrument_id(),
        action: BookAction::Update,
        order: order(OrderSide::Buy, 0, "100.00", "9"),
        update_id: 2,
        ts_event: UnixNanos::new(2),
        ts_init: UnixNanos::new(2),
    })
    .unwrap();

    assert_eq!(
        book.best_bid_size(),
        Some(rust_decimal::Decimal::new(9, 0))
    );

    book.apply_delta(&OrderBookDelta {
        instrument_id: instrument_id(),
        action: BookAction::Delete,
        order: order(OrderSide::Buy, 0, "100.00", "0"),
        update_id: 3,
        ts_event: UnixNanos::new(3),
        ts_init: UnixNanos::new(3),
    })
    .unwrap();
    assert!(book.bids().is_empty());
    book.check_integrity().unwrap();
}

#[test]
fn l3_orders_keep_identity_and_queue_position() {
    let mut book = OrderBook::new(instrument_id(), BookType::L3Mbo);
    book.add(order(OrderSide::Sell, 11, "101.00", "5"), UnixNanos::new(1))
        .unwrap();
    book.add(order(OrderSide::Sell, 12, "101.00", "7"), UnixNanos::new(2))
        .unwrap();

    // Modify the first order's size in place.
    book.update(order(OrderSide::Sell, 11, "101.00", "2"), UnixNanos::new(3));
    let asks = book.asks();
    assert_eq!(asks[0].orders()[0].order_id, 11);
    assert_eq!(asks[0].orders()[0].size, "2".parse().unwrap());
    assert_eq!(asks[0].orders()[1].order_id, 12);

    // Cancel by identifier.
    book.delete(order(OrderSide::Sell, 11, "101.00", "0"), UnixNanos::new(4))
        .unwrap();
    assert_eq!(book.asks()[0].len(), 1);
    book.check_integrity().unwrap();
}

#[test]
fn stale_updates_are_idempotently_dropped() {
    let mut book = OrderBook::new(instrument_id(), BookType::L2Mbp);
    let add = OrderBookDelta {
        instrument_id: instrument_id(),
        action: BookAction::Add,
        order: order(OrderSide::Buy, 0, "100.00", "5"),
        update_id: 7,
        ts_event: UnixNanos::new(1),
        ts_init: UnixNanos::new(1),
    };
    book.apply_delta(&add).unwrap();
    book.apply_delta(&add).unwrap();
    book.apply_delta(&OrderBookDelta {
        update_id: 3,
        ..add.clone()
    })
    .unwrap();

    assert_eq!(
        book.best_bid_size(),
        Some(rust_decimal::Decimal::new(5, 0))
    );
    assert_eq!(book.last_update_id(), 7);
}

#[test]
fn snapshot_then_deltas() {
    let mut book = OrderBook::new(instrument_id(), BookType::L2Mbp);
    book.apply_snapshot(&OrderBookSnapshot {
        instrument_id: instrument_id(),
        bids: vec![
            order(OrderSide::Buy, 0, "100.00", "5"),
            order(OrderSide::Buy, 0, "99.00", "8"),
        ],
        asks: vec![
            order(OrderSide::Sell, 0, "101.00", "4"),
            order(OrderSide::Sell, 0, "102.00", "6"),
        ],
        update_id: 10,
        ts_event: UnixNanos::new(1),
        ts_init: UnixNanos::new(1),
    })
    .unwrap();

    assert_eq!(book.spread(), Some(rust_decimal::Decimal::new(100, 2)));

    // Tighten the ask.
    book.apply_delta(&OrderBookDelta {
        instrument_id: instrument_id(),
        action: BookAction::Add,
        order: order(OrderSide::Sell, 0, "100.50", "2"),
        update_id: 11,
        ts_event: UnixNanos::new(2),
        ts_init: UnixNanos::new(2),
    })
    .unwrap();
    assert_eq!(book.best_ask_price(), Some("100.50".parse().unwrap()));
    assert_eq!(book.midpoint(), Some(rust_decimal::Decimal::new(10025, 2)));
    book.check_integrity().unwrap();
}
