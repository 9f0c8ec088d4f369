//! Position accounting scenarios across fills.

use rust_decimal::Decimal;
use trading_core::{
    ClientOrderId, Currency, ExecutionId, Instrument, Money, OrderFilled, OrderSide, Position,
    PositionId, PositionSide, Quantity, StrategyId, TraderId, UnixNanos, VenueOrderId,
};
use uuid::Uuid;

fn instrument() -> Instrument {
    Instrument::new(
        "BTCUSDT.BINANCE".parse().unwrap(),
        2,
        0,
        Quantity::new(1, 0).unwrap(),
        false,
        Currency::USDT,
        None,
    )
    .unwrap()
}

fn fill(
    exec: &str,
    side: OrderSide,
    qty: &str,
    px: &str,
    commission: Option<Money>,
    ts: u64,
) -> OrderFilled {
    OrderFilled {
        trader_id: TraderId::new("TRADER-001"),
        strategy_id: StrategyId::new("EMA-CROSS"),
        instrument_id: "BTCUSDT.BINANCE".parse().unwrap(),
        client_order_id: ClientOrderId::new(format!("O-{exec}")),
        venue_order_id: VenueOrderId::new(format!("V-{exec}")),
        execution_id: ExecutionId::new(exec),
        position_id: Some(PositionId::new("P-1")),
        order_side: side,
        last_qty: qty.parse().unwrap(),
        last_px: px.parse().unwrap(),
        currency: Currency::USDT,
        commission,
        event_id: Uuid::new_v4(),
        ts_event: UnixNanos::new(ts),
        ts_init: UnixNanos::new(ts),
    }
}

#[test]
fn long_flips_short_on_oversized_sell() {
    // Open LONG 5 @ 10.00, then SELL 8 @ 12.00.
    let inst = instrument();
    let mut position =
        Position::open(&inst, &fill("E-1", OrderSide::Buy, "5", "10.00", None, 1)).unwrap();
    position
        .apply(&fill("E-2", OrderSide::Sell, "8", "12.00", None, 2))
        .unwrap();

    assert_eq!(position.side(), PositionSide::Short);
    assert_eq!(position.net_qty(), Decimal::new(-3, 0));
    // Realized on the closed 5: 5 * (12 - 10) * 1
    assert_eq!(position.realized_pnl().amount(), Decimal::new(10, 0));
    assert_eq!(position.avg_px_open(), Decimal::new(1200, 2));
    assert_eq!(position.avg_px_close(), Some(Decimal::new(1200, 2)));
}

#[test]
fn flip_with_cost_currency_commissions() {
    let inst = instrument();
    let commission = Money::new(Decimal::ONE, Currency::USDT);
    let mut position = Position::open(
        &inst,
        &fill("E-1", OrderSide::Buy, "5", "10.00", Some(commission), 1),
    )
    .unwrap();
    position
        .apply(&fill("E-2", OrderSide::Sell, "8", "12.00", Some(commission), 2))
        .unwrap();

    // 5 * (12 - 10) minus 2 of commissions in the cost currency.
    assert_eq!(position.realized_pnl().amount(), Decimal::new(8, 0));
    assert_eq!(
        position.commissions().get(&Currency::USDT).unwrap().amount(),
        Decimal::new(2, 0)
    );
}

#[test]
fn round_trip_long_accounting() {
    let inst = instrument();
    let mut position =
        Position::open(&inst, &fill("E-1", OrderSide::Buy, "10", "100.00", None, 1_000)).unwrap();
    position
        .apply(&fill("E-2", OrderSide::Buy, "10", "102.00", None, 2_000))
        .unwrap();
    assert_eq!(position.avg_px_open(), Decimal::new(10100, 2));
    assert_eq!(position.peak_qty(), "20".parse::<Quantity>().unwrap());

    position
        .apply(&fill("E-3", OrderSide::Sell, "20", "105.00", None, 9_000))
        .unwrap();

    assert!(position.is_closed());
    assert_eq!(position.side(), PositionSide::Flat);
    assert_eq!(position.ts_closed(), Some(UnixNanos::new(9_000)));
    assert_eq!(position.duration_ns(), 8_000);
    // 20 * (105 - 101) = 80
    assert_eq!(position.realized_pnl().amount(), Decimal::new(80, 0));
    // return = (105 - 101) / 101
    assert_eq!(
        position.realized_return(),
        Decimal::new(400, 2) / Decimal::new(10100, 2)
    );
    // Fills against the closed position are rejected.
    assert!(position
        .apply(&fill("E-4", OrderSide::Buy, "1", "100.00", None, 10_000))
        .is_err());
}

#[test]
fn unrealized_marks_against_last_price() {
    let inst = instrument();
    let mut position =
        Position::open(&inst, &fill("E-1", OrderSide::Buy, "10", "100.00", None, 1)).unwrap();
    position
        .apply(&fill("E-2", OrderSide::Sell, "4", "104.00", None, 2))
        .unwrap();

    let last = "103.00".parse().unwrap();
    // Open 6 at avg 100: unrealized 6 * 3 = 18; realized 4 * 4 = 16.
    assert_eq!(position.unrealized_pnl(last).amount(), Decimal::new(18, 0));
    assert_eq!(position.realized_pnl().amount(), Decimal::new(16, 0));
    assert_eq!(position.total_pnl(last).amount(), Decimal::new(34, 0));
    assert_eq!(
        position.notional_value(last).amount(),
        Decimal::new(618, 0)
    );
}

#[test]
fn execution_ids_unique_per_position() {
    let inst = instrument();
    let mut position =
        Position::open(&inst, &fill("E-1", OrderSide::Buy, "5", "10.00", None, 1)).unwrap();
    position
        .apply(&fill("E-2", OrderSide::Buy, "5", "10.00", None, 2))
        .unwrap();

    assert_eq!(position.execution_ids().len(), 2);
    assert!(position
        .apply(&fill("E-2", OrderSide::Sell, "1", "11.00", None, 3))
        .is_err());
    assert_eq!(position.execution_ids().len(), 2);
}
