// Strategy behavior: inventory skew, sizing and OFI-driven spread changes

mod common;

use common::ts;
use market_maker_sim::strategy::{AvellanedaStoikovConfig, AvellanedaStoikovStrategy};
use market_maker_sim::{
    strategy_from_name, HeuristicStrategy, OrderLevel, Side, Strategy, StrategySnapshot, Trade,
};

fn snapshot(mid: f64, position: i64, max_position: i64) -> StrategySnapshot {
    StrategySnapshot {
        best_bid: mid - 0.05,
        best_ask: mid + 0.05,
        mid_price: mid,
        bid_levels: vec![OrderLevel {
            price: mid - 0.05,
            size: 10,
            order_id: 1,
            timestamp: ts(1),
        }],
        ask_levels: vec![OrderLevel {
            price: mid + 0.05,
            size: 10,
            order_id: 2,
            timestamp: ts(1),
        }],
        trades: Vec::new(),
        position,
        max_position,
        timestamp: ts(1),
        sequence_number: 1,
    }
}

fn buy_trade(size: i64) -> Trade {
    Trade {
        aggressor_side: Side::Buy,
        price: 100.0,
        size,
        trade_id: 1,
        timestamp: ts(1),
    }
}

#[test]
fn test_heuristic_flat_quotes_straddle_mid() {
    let mut strategy = HeuristicStrategy::new();
    let decision = strategy.compute_quotes(&snapshot(100.0, 0, 1000));

    assert!(decision.should_quote);
    assert!(decision.bid_price < 100.0);
    assert!(decision.ask_price > 100.0);
    assert!((decision.ask_price - decision.bid_price - 0.02).abs() < 1e-9);
    assert_eq!(decision.bid_size, decision.ask_size);
    assert!(decision.bid_size >= 1);
}

#[test]
fn test_heuristic_long_inventory_skews_quotes_down() {
    let mut strategy = HeuristicStrategy::new();
    let flat = strategy.compute_quotes(&snapshot(100.0, 0, 1000));
    let long = strategy.compute_quotes(&snapshot(100.0, 500, 1000));

    assert!(long.bid_price < flat.bid_price);
    assert!(long.ask_price < flat.ask_price);
}

#[test]
fn test_heuristic_short_inventory_skews_quotes_up() {
    let mut strategy = HeuristicStrategy::new();
    let flat = strategy.compute_quotes(&snapshot(100.0, 0, 1000));
    let short = strategy.compute_quotes(&snapshot(100.0, -500, 1000));

    assert!(short.bid_price > flat.bid_price);
    assert!(short.ask_price > flat.ask_price);
}

#[test]
fn test_heuristic_sizes_shrink_near_position_limit() {
    let mut strategy = HeuristicStrategy::new();
    let flat = strategy.compute_quotes(&snapshot(100.0, 0, 1000));
    let loaded = strategy.compute_quotes(&snapshot(100.0, 990, 1000));

    assert!(loaded.bid_size < flat.bid_size);
    assert!(loaded.bid_size >= 1);
    assert!(loaded.ask_size >= 1);
}

#[test]
fn test_avellaneda_spread_within_bps_band() {
    let config = AvellanedaStoikovConfig::default();
    let mut strategy = AvellanedaStoikovStrategy::new(config.clone());
    let decision = strategy.compute_quotes(&snapshot(100.0, 0, 1000));

    assert!(decision.should_quote);
    let spread = decision.ask_price - decision.bid_price;
    let min_spread = config.min_spread_bps * 100.0 / 10_000.0;
    let max_spread = config.max_spread_bps * 100.0 / 10_000.0;
    assert!(spread >= min_spread - 1e-9, "spread={spread}");
    assert!(spread <= max_spread + 1e-9, "spread={spread}");
}

#[test]
fn test_avellaneda_ofi_widens_spread() {
    let mut neutral = AvellanedaStoikovStrategy::new(AvellanedaStoikovConfig::default());
    let mut skewed = AvellanedaStoikovStrategy::new(AvellanedaStoikovConfig::default());

    let base = snapshot(100.0, 0, 1000);
    let mut with_flow = snapshot(100.0, 0, 1000);
    with_flow.trades = vec![buy_trade(10), buy_trade(8)];

    let quiet = neutral.compute_quotes(&base);
    let widened = skewed.compute_quotes(&with_flow);

    assert!(skewed.last_ofi() > 0.99);
    let quiet_spread = quiet.ask_price - quiet.bid_price;
    let widened_spread = widened.ask_price - widened.bid_price;
    assert!(widened_spread >= quiet_spread);
}

#[test]
fn test_avellaneda_pulls_quotes_on_toxic_flow() {
    let config = AvellanedaStoikovConfig {
        pull_on_toxic: true,
        ..Default::default()
    };
    let mut strategy = AvellanedaStoikovStrategy::new(config);

    let mut snap = snapshot(100.0, 0, 1000);
    snap.trades = vec![buy_trade(20), buy_trade(20)];

    let decision = strategy.compute_quotes(&snap);
    assert!(!decision.should_quote);
}

#[test]
fn test_avellaneda_long_inventory_lowers_reservation_and_bid_size() {
    let mut flat_strategy = AvellanedaStoikovStrategy::new(AvellanedaStoikovConfig::default());
    let mut long_strategy = AvellanedaStoikovStrategy::new(AvellanedaStoikovConfig::default());

    // Build up some volatility history so the reservation skew is non-zero
    for mid in [100.0, 100.4, 99.7, 100.2, 99.9, 100.3] {
        flat_strategy.compute_quotes(&snapshot(mid, 0, 10));
        long_strategy.compute_quotes(&snapshot(mid, 0, 10));
    }

    let flat = flat_strategy.compute_quotes(&snapshot(100.0, 0, 10));
    let long = long_strategy.compute_quotes(&snapshot(100.0, 8, 10));

    assert!(long.bid_price <= flat.bid_price);
    assert!(long.bid_size < long.ask_size);
    assert!(long.bid_size >= 1);
}

#[test]
fn test_strategy_factory_names() {
    let heuristic = strategy_from_name("heuristic").unwrap();
    assert_eq!(heuristic.name(), "heuristic");

    let avellaneda = strategy_from_name("avellaneda-stoikov").unwrap();
    assert_eq!(avellaneda.name(), "avellaneda-stoikov");

    assert!(strategy_from_name("momentum").is_none());
}
