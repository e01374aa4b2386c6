// Accounting invariants: cost basis, realized/unrealized PnL and the
// flip-aware position update

use market_maker_sim::{Accounting, FeeSchedule, Side};

const EPS: f64 = 1e-6;

fn near(a: f64, b: f64) -> bool {
    (a - b).abs() < EPS
}

fn zero_fee_account() -> Accounting {
    Accounting::new(100_000.0, FeeSchedule::default())
}

#[test]
fn test_initial_state() {
    let acct = zero_fee_account();
    assert_eq!(acct.position(), 0);
    assert!(near(acct.cash(), 100_000.0));
    assert!(near(acct.realized_pnl(), 0.0));
    assert!(near(acct.unrealized_pnl(), 0.0));
    assert!(near(acct.total_pnl(), 0.0));
    assert!(near(acct.net_pnl(), 0.0));
    assert!(near(acct.avg_entry_price(), 0.0));
    assert!(near(acct.cost_basis(), 0.0));
}

#[test]
fn test_single_buy() {
    let mut acct = zero_fee_account();
    acct.on_fill(Side::Buy, 50.0, 10, true);

    assert_eq!(acct.position(), 10);
    assert!(near(acct.cash(), 99_500.0));
    assert!(near(acct.avg_entry_price(), 50.0));
    assert!(near(acct.cost_basis(), 500.0));
    assert!(near(acct.realized_pnl(), 0.0));
    // Marked at the fill price, so unrealized is zero
    assert!(near(acct.unrealized_pnl(), 0.0));
}

#[test]
fn test_round_trip_realizes_spread() {
    let mut acct = zero_fee_account();
    acct.on_fill(Side::Buy, 50.0, 10, true);
    acct.on_fill(Side::Sell, 52.0, 10, true);

    assert_eq!(acct.position(), 0);
    assert!(near(acct.realized_pnl(), 20.0));
    assert!(near(acct.unrealized_pnl(), 0.0));
    assert!(near(acct.cost_basis(), 0.0));
    assert!(near(acct.cash(), 100_020.0));
}

#[test]
fn test_symmetric_round_trip_leaves_cash_unchanged() {
    let mut acct = zero_fee_account();
    acct.on_fill(Side::Buy, 47.5, 8, true);
    acct.on_fill(Side::Sell, 47.5, 8, true);

    assert_eq!(acct.position(), 0);
    assert!(near(acct.realized_pnl(), 0.0));
    assert!(near(acct.unrealized_pnl(), 0.0));
    assert!(near(acct.cash(), 100_000.0));
}

#[test]
fn test_partial_close_keeps_avg_entry() {
    let mut acct = zero_fee_account();
    acct.on_fill(Side::Buy, 50.0, 10, true);
    acct.on_fill(Side::Sell, 55.0, 4, true);

    assert_eq!(acct.position(), 6);
    assert!(near(acct.realized_pnl(), 20.0));
    assert!(near(acct.avg_entry_price(), 50.0));
    assert!(near(acct.cost_basis(), 300.0));

    acct.mark_to_market(53.0);
    assert!(near(acct.unrealized_pnl(), 18.0));
}

#[test]
fn test_position_flip_long_to_short() {
    let mut acct = zero_fee_account();
    acct.on_fill(Side::Buy, 50.0, 10, true);
    acct.on_fill(Side::Sell, 55.0, 15, true);

    assert_eq!(acct.position(), -5);
    assert!(near(acct.realized_pnl(), 50.0));
    assert!(near(acct.avg_entry_price(), 55.0));
    assert!(near(acct.cost_basis(), 275.0));

    // Short from 55 marked at 53 is 2 per share in profit
    acct.mark_to_market(53.0);
    assert!(near(acct.unrealized_pnl(), 10.0));
}

#[test]
fn test_position_flip_short_to_long() {
    let mut acct = zero_fee_account();
    acct.on_fill(Side::Sell, 60.0, 10, true);
    acct.on_fill(Side::Buy, 58.0, 14, true);

    assert_eq!(acct.position(), 4);
    // Covered 10 short at 2 profit per share
    assert!(near(acct.realized_pnl(), 20.0));
    assert!(near(acct.avg_entry_price(), 58.0));
    assert!(near(acct.cost_basis(), 232.0));
}

#[test]
fn test_mark_to_market_moves_unrealized() {
    let mut acct = zero_fee_account();
    acct.on_fill(Side::Buy, 100.0, 5, true);

    acct.mark_to_market(105.0);
    assert!(near(acct.unrealized_pnl(), 25.0));

    acct.mark_to_market(95.0);
    assert!(near(acct.unrealized_pnl(), -25.0));

    acct.mark_to_market(100.0);
    assert!(near(acct.unrealized_pnl(), 0.0));
}

#[test]
fn test_short_mark_to_market() {
    let mut acct = zero_fee_account();
    acct.on_fill(Side::Sell, 100.0, 5, true);

    acct.mark_to_market(95.0);
    assert!(near(acct.unrealized_pnl(), 25.0));

    acct.mark_to_market(105.0);
    assert!(near(acct.unrealized_pnl(), -25.0));
}

#[test]
fn test_pnl_identity_over_fill_sequence() {
    let mut acct = Accounting::new(
        100_000.0,
        FeeSchedule {
            maker_rebate_per_share: 0.002,
            taker_fee_per_share: 0.005,
            fee_bps: 1.0,
        },
    );

    let fills = [
        (Side::Buy, 100.0, 10, true),
        (Side::Sell, 101.0, 4, true),
        (Side::Sell, 99.5, 12, false),
        (Side::Buy, 98.0, 20, true),
        (Side::Sell, 100.5, 14, true),
    ];

    for (side, price, qty, is_maker) in fills {
        acct.on_fill(side, price, qty, is_maker);
        assert!(near(acct.total_pnl(), acct.realized_pnl() + acct.unrealized_pnl()));
        assert!(near(
            acct.net_pnl(),
            acct.total_pnl() - acct.total_fees() + acct.total_rebates()
        ));
        if acct.position() == 0 {
            assert!(near(acct.cost_basis(), 0.0));
            assert!(near(acct.unrealized_pnl(), 0.0));
        } else {
            assert!(near(
                acct.avg_entry_price(),
                acct.cost_basis() / acct.position().abs() as f64
            ));
        }
    }
}

#[test]
fn test_exposures() {
    let mut acct = zero_fee_account();
    acct.on_fill(Side::Sell, 50.0, 10, true);

    assert!(near(acct.gross_exposure(52.0), 520.0));
    assert!(near(acct.net_exposure(52.0), -520.0));
}
