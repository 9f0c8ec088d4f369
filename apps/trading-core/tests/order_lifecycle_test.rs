//! End-to-end order lifecycle scenarios.

use rust_decimal::Decimal;
use trading_core::{
    ClientOrderId, Currency, ExecutionId, Order, OrderError, OrderEvent, OrderInitialized,
    OrderSide, OrderStatus, OrderType, Quantity, StrategyId, TimeInForce, TraderId, UnixNanos,
    VenueOrderId,
};
use uuid::Uuid;

fn limit_buy(qty: &str, price: &str) -> Order {
    Order::from_init(OrderInitialized {
        trader_id: TraderId::new("TRADER-001"),
        strategy_id: StrategyId::new("EMA-CROSS"),
        instrument_id: "BTCUSDT.BINANCE".parse().unwrap(),
        client_order_id: ClientOrderId::new("O-001"),
        order_side: OrderSide::Buy,
        order_type: OrderType::Limit,
        quantity: qty.parse().unwrap(),
        time_in_force: TimeInForce::Gtc,
        expire_time: None,
        price: Some(price.parse().unwrap()),
        trigger_price: None,
        display_qty: None,
        is_reduce_only: false,
        order_list_id: None,
        parent_order_id: None,
        contingency_type: None,
        contingency_ids: vec![],
        tags: None,
        event_id: Uuid::new_v4(),
        ts_event: UnixNanos::new(1),
        ts_init: UnixNanos::new(1),
    })
    .unwrap()
}

fn submitted(ts: u64) -> OrderEvent {
    OrderEvent::Submitted(trading_core::domain::order_execution::events::OrderSubmitted {
        trader_id: TraderId::new("TRADER-001"),
        strategy_id: StrategyId::new("EMA-CROSS"),
        instrument_id: "BTCUSDT.BINANCE".parse().unwrap(),
        client_order_id: ClientOrderId::new("O-001"),
        event_id: Uuid::new_v4(),
        ts_event: UnixNanos::new(ts),
        ts_init: UnixNanos::new(ts),
    })
}

fn accepted(ts: u64) -> OrderEvent {
    OrderEvent::Accepted(trading_core::domain::order_execution::events::OrderAccepted {
        trader_id: TraderId::new("TRADER-001"),
        strategy_id: StrategyId::new("EMA-CROSS"),
        instrument_id: "BTCUSDT.BINANCE".parse().unwrap(),
        client_order_id: ClientOrderId::new("O-001"),
        venue_order_id: VenueOrderId::new("V-1"),
        event_id: Uuid::new_v4(),
        ts_event: UnixNanos::new(ts),
        ts_init: UnixNanos::new(ts),
    })
}

fn filled(exec: &str, qty: &str, px: &str, ts: u64) -> OrderEvent {
    OrderEvent::Filled(trading_core::OrderFilled {
        trader_id: TraderId::new("TRADER-001"),
        strategy_id: StrategyId::new("EMA-CROSS"),
        instrument_id: "BTCUSDT.BINANCE".parse().unwrap(),
        client_order_id: ClientOrderId::new("O-001"),
        venue_order_id: VenueOrderId::new("V-1"),
        execution_id: ExecutionId::new(exec),
        position_id: None,
        order_side: OrderSide::Buy,
        last_qty: qty.parse().unwrap(),
        last_px: px.parse().unwrap(),
        currency: Currency::USDT,
        commission: None,
        event_id: Uuid::new_v4(),
        ts_event: UnixNanos::new(ts),
        ts_init: UnixNanos::new(ts),
    })
}

#[test]
fn limit_buy_two_fills_to_completion() {
    // Limit buy 10 @ 100.00, filled 4 @ 100.10 then 6 @ 100.20.
    let mut order = limit_buy("10", "100.00");
    order.apply(submitted(2)).unwrap();
    order.apply(accepted(3)).unwrap();
    order.apply(filled("E-1", "4", "100.10", 4)).unwrap();
    order.apply(filled("E-2", "6", "100.20", 5)).unwrap();

    assert_eq!(order.status(), OrderStatus::Filled);
    assert_eq!(order.filled_qty(), "10".parse::<Quantity>().unwrap());
    assert_eq!(order.leaves_qty(), Quantity::ZERO);
    // avg = (4 * 100.10 + 6 * 100.20) / 10 = 100.16
    assert_eq!(order.avg_px(), Some(Decimal::new(10016, 2)));
    assert_eq!(order.slippage(), Some(Decimal::new(16, 2)));
}

#[test]
fn fill_invariants_hold_at_every_step() {
    let mut order = limit_buy("10", "100.00");
    order.apply(submitted(2)).unwrap();
    order.apply(accepted(3)).unwrap();

    for (i, (exec, qty)) in [("E-1", "3"), ("E-2", "2"), ("E-3", "5")].iter().enumerate() {
        order
            .apply(filled(exec, qty, "100.00", 4 + i as u64))
            .unwrap();
        // leaves + filled = quantity, and filled never exceeds quantity.
        assert_eq!(
            order.filled_qty() + order.leaves_qty(),
            order.quantity()
        );
        assert!(order.filled_qty() <= order.quantity());
    }
    assert_eq!(order.status(), OrderStatus::Filled);
}

#[test]
fn duplicate_execution_id_is_rejected_with_state_unchanged() {
    let mut order = limit_buy("10", "100.00");
    order.apply(submitted(2)).unwrap();
    order.apply(accepted(3)).unwrap();
    order.apply(filled("E-1", "4", "100.10", 4)).unwrap();

    let snapshot = serde_json::to_value(&order).unwrap();
    let result = order.apply(filled("E-1", "4", "100.10", 5));
    assert!(matches!(
        result,
        Err(OrderError::DuplicateExecutionId { .. })
    ));
    assert_eq!(serde_json::to_value(&order).unwrap(), snapshot);
}

#[test]
fn serde_round_trip_preserves_full_history() {
    let mut order = limit_buy("10", "100.00");
    order.apply(submitted(2)).unwrap();
    order.apply(accepted(3)).unwrap();
    order.apply(filled("E-1", "4", "100.10", 4)).unwrap();

    let json = serde_json::to_string(&order).unwrap();
    let restored: Order = serde_json::from_str(&json).unwrap();

    assert_eq!(restored, order);
    assert_eq!(restored.events().len(), 4);
    assert_eq!(restored.avg_px(), order.avg_px());
}

#[test]
fn terminal_states_are_final() {
    let mut order = limit_buy("10", "100.00");
    order.apply(submitted(2)).unwrap();
    order
        .apply(OrderEvent::Canceled(
            trading_core::domain::order_execution::events::OrderCanceled {
                trader_id: TraderId::new("TRADER-001"),
                strategy_id: StrategyId::new("EMA-CROSS"),
                instrument_id: "BTCUSDT.BINANCE".parse().unwrap(),
                client_order_id: ClientOrderId::new("O-001"),
                venue_order_id: None,
                event_id: Uuid::new_v4(),
                ts_event: UnixNanos::new(3),
                ts_init: UnixNanos::new(3),
            },
        ))
        .unwrap();

    assert_eq!(order.status(), OrderStatus::Canceled);
    assert!(order.is_closed());
    assert!(order.apply(filled("E-1", "1", "100.00", 4)).is_err());
    assert!(order.apply(accepted(5)).is_err());
}
